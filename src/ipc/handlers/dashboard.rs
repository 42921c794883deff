use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{require_db, require_user};
use crate::ipc::types::{AppState, Request};
use crate::store::SqliteStore;
use serde_json::json;

const DEFAULT_ACTIVITY_LIMIT: u64 = 6;
const MAX_ACTIVITY_LIMIT: u64 = 100;

fn dashboard_stats(state: &AppState) -> Result<serde_json::Value, HandlerErr> {
    require_user(state)?;
    let stats = SqliteStore::new(require_db(state)?).dashboard_stats()?;
    Ok(json!(stats))
}

fn dashboard_recent_activity(
    state: &AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    require_user(state)?;
    let limit = match params.get("limit") {
        None | Some(serde_json::Value::Null) => DEFAULT_ACTIVITY_LIMIT,
        Some(v) => v
            .as_u64()
            .ok_or_else(|| HandlerErr::bad_params("limit must be a non-negative integer"))?,
    };
    let limit = limit.min(MAX_ACTIVITY_LIMIT) as usize;
    let activities = SqliteStore::new(require_db(state)?).recent_activity(limit)?;
    Ok(json!({ "activities": activities }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "dashboard.stats" => dashboard_stats(state),
        "dashboard.recentActivity" => dashboard_recent_activity(state, &req.params),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
