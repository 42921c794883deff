use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{get_required_str, parse_field, require_admin, require_db, require_user};
use crate::ipc::types::{AppState, Request};
use crate::model::{ClassDraft, ClassPatch};
use crate::store::SqliteStore;
use serde_json::json;

/// Any logged-in user may list classes; the attendance screen builds its picker from it.
fn classes_list(state: &AppState) -> Result<serde_json::Value, HandlerErr> {
    require_user(state)?;
    let classes = SqliteStore::new(require_db(state)?).list_classes()?;
    Ok(json!({ "classes": classes }))
}

fn classes_create(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    require_admin(state)?;
    let draft: ClassDraft = parse_field(params, "class")?;
    let class = SqliteStore::new(require_db(state)?).create_class(draft)?;
    Ok(json!({ "class": class }))
}

fn classes_update(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    require_admin(state)?;
    let class_id = get_required_str(params, "classId")?;
    let patch: ClassPatch = parse_field(params, "patch")?;
    let class = SqliteStore::new(require_db(state)?).update_class(&class_id, patch)?;
    Ok(json!({ "class": class }))
}

fn classes_delete(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    require_admin(state)?;
    let class_id = get_required_str(params, "classId")?;
    SqliteStore::new(require_db(state)?).delete_class(&class_id)?;
    Ok(json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "classes.list" => classes_list(state),
        "classes.create" => classes_create(state, &req.params),
        "classes.update" => classes_update(state, &req.params),
        "classes.delete" => classes_delete(state, &req.params),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
