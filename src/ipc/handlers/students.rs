use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{get_optional_str, get_required_str, parse_field, require_db, require_user};
use crate::ipc::types::{AppState, Request};
use crate::model::{StudentDraft, StudentPatch};
use crate::store::SqliteStore;
use serde_json::json;
use tracing::debug;

fn students_list(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    require_user(state)?;
    let store = SqliteStore::new(require_db(state)?);
    let students = store.list_students(get_optional_str(params, "search"))?;
    Ok(json!({ "students": students }))
}

fn students_get(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    require_user(state)?;
    let student_id = get_required_str(params, "studentId")?;
    let student = SqliteStore::new(require_db(state)?).get_student(&student_id)?;
    Ok(json!({ "student": student }))
}

fn students_create(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    require_user(state)?;
    let draft: StudentDraft = parse_field(params, "student")?;
    let student = SqliteStore::new(require_db(state)?).create_student(draft)?;
    Ok(json!({ "student": student }))
}

fn students_update(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    require_user(state)?;
    let student_id = get_required_str(params, "studentId")?;
    let patch: StudentPatch = parse_field(params, "patch")?;
    let student = SqliteStore::new(require_db(state)?).update_student(&student_id, patch)?;
    Ok(json!({ "student": student }))
}

/// Also takes the student out of an open attendance session so its next
/// submission only covers students that still exist.
fn students_delete(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    require_user(state)?;
    let student_id = get_required_str(params, "studentId")?;
    SqliteStore::new(require_db(state)?).delete_student(&student_id)?;
    if state.attendance.drop_student(&student_id) {
        debug!(student = %student_id, "removed deleted student from attendance session");
    }
    Ok(json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "students.list" => students_list(state, &req.params),
        "students.get" => students_get(state, &req.params),
        "students.create" => students_create(state, &req.params),
        "students.update" => students_update(state, &req.params),
        "students.delete" => students_delete(state, &req.params),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
