use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{get_optional_str, get_required_str, parse_field, require_admin, require_db};
use crate::ipc::types::{AppState, Request};
use crate::model::{TeacherDraft, TeacherPatch};
use crate::store::SqliteStore;
use serde_json::json;

// The staff registry is an admin screen; every method needs the admin role.

fn teachers_list(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    require_admin(state)?;
    let store = SqliteStore::new(require_db(state)?);
    let teachers = store.list_teachers(get_optional_str(params, "search"))?;
    Ok(json!({ "teachers": teachers }))
}

fn teachers_create(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    require_admin(state)?;
    let draft: TeacherDraft = parse_field(params, "teacher")?;
    let teacher = SqliteStore::new(require_db(state)?).create_teacher(draft)?;
    Ok(json!({ "teacher": teacher }))
}

fn teachers_update(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    require_admin(state)?;
    let teacher_id = get_required_str(params, "teacherId")?;
    let patch: TeacherPatch = parse_field(params, "patch")?;
    let teacher = SqliteStore::new(require_db(state)?).update_teacher(&teacher_id, patch)?;
    Ok(json!({ "teacher": teacher }))
}

fn teachers_delete(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    require_admin(state)?;
    let teacher_id = get_required_str(params, "teacherId")?;
    SqliteStore::new(require_db(state)?).delete_teacher(&teacher_id)?;
    Ok(json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "teachers.list" => teachers_list(state, &req.params),
        "teachers.create" => teachers_create(state, &req.params),
        "teachers.update" => teachers_update(state, &req.params),
        "teachers.delete" => teachers_delete(state, &req.params),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
