use crate::attendance::{AttendanceError, AttendanceSession, AttendanceStatus};
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{
    get_optional_str, get_required_str, parse_date, parse_field, require_db, require_user,
};
use crate::ipc::types::{AppState, Request};
use crate::store::SqliteStore;
use serde_json::json;

/// Splits the state into the store and the session so both can be borrowed at once.
fn session_parts(state: &mut AppState) -> Result<(SqliteStore<'_>, &mut AttendanceSession), HandlerErr> {
    require_user(state)?;
    let AppState { db, attendance, .. } = state;
    let conn = db
        .as_ref()
        .ok_or_else(|| HandlerErr::new("no_workspace", "select a workspace first"))?;
    Ok((SqliteStore::new(conn), attendance))
}

/// Rejects calls made against an older selection than the one now open.
fn check_generation(session: &AttendanceSession, params: &serde_json::Value) -> Result<(), HandlerErr> {
    let Some(raw) = params.get("generation") else {
        return Ok(());
    };
    if raw.is_null() {
        return Ok(());
    }
    let ticket = raw
        .as_u64()
        .ok_or_else(|| HandlerErr::bad_params("generation must be a non-negative integer"))?;
    if ticket != session.generation() {
        return Err(AttendanceError::StaleResponse {
            ticket,
            current: session.generation(),
        }
        .into());
    }
    Ok(())
}

fn class_params(params: &serde_json::Value) -> (String, String) {
    let grade = get_optional_str(params, "grade")
        .or_else(|| get_optional_str(params, "class"))
        .unwrap_or("")
        .to_string();
    let section = get_optional_str(params, "section").unwrap_or("").to_string();
    (grade, section)
}

fn attendance_select(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let date = parse_date(params)?;
    let (grade, section) = class_params(params);
    let (store, session) = session_parts(state)?;
    session.load(&store, &grade, &section, date)?;
    Ok(json!({ "session": session.view() }))
}

fn attendance_session(state: &mut AppState) -> Result<serde_json::Value, HandlerErr> {
    let (_, session) = session_parts(state)?;
    Ok(json!({ "session": session.view() }))
}

fn attendance_reset(state: &mut AppState) -> Result<serde_json::Value, HandlerErr> {
    let (_, session) = session_parts(state)?;
    session.reset();
    Ok(json!({ "session": session.view() }))
}

fn attendance_toggle(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_str(params, "studentId")?;
    let (_, session) = session_parts(state)?;
    check_generation(session, params)?;
    let status = session.toggle(&student_id)?;
    Ok(json!({ "status": status, "session": session.view() }))
}

fn attendance_set_all(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let status: AttendanceStatus = parse_field(params, "status")?;
    let (_, session) = session_parts(state)?;
    check_generation(session, params)?;
    session.set_all(status)?;
    Ok(json!({ "session": session.view() }))
}

fn attendance_submit(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let (store, session) = session_parts(state)?;
    check_generation(session, params)?;
    let done = session.submit(&store)?;
    Ok(json!({
        "ack": done.ack,
        "records": done.records,
        "session": session.view(),
    }))
}

/// Previously stored records for a class and day; independent of the open session.
fn attendance_records(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    require_user(state)?;
    let date = parse_date(params)?;
    let (grade, section) = class_params(params);
    if grade.trim().is_empty() || section.trim().is_empty() {
        return Err(HandlerErr::bad_params("missing grade/section"));
    }
    let store = SqliteStore::new(require_db(state)?);
    let records = store.attendance_for_class(grade.trim(), section.trim(), &date)?;
    Ok(json!({ "date": date, "records": records }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "attendance.select" => attendance_select(state, &req.params),
        "attendance.session" => attendance_session(state),
        "attendance.reset" => attendance_reset(state),
        "attendance.toggle" => attendance_toggle(state, &req.params),
        "attendance.setAll" => attendance_set_all(state, &req.params),
        "attendance.submit" => attendance_submit(state, &req.params),
        "attendance.records" => attendance_records(state, &req.params),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
