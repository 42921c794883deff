use rusqlite::Connection;
use serde::de::DeserializeOwned;

use crate::attendance::AttendanceDate;
use crate::ipc::error::HandlerErr;
use crate::ipc::types::AppState;
use crate::model::{User, UserRole};

pub fn get_required_str(params: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

pub fn get_optional_str<'a>(params: &'a serde_json::Value, key: &str) -> Option<&'a str> {
    params.get(key).and_then(|v| v.as_str())
}

/// Deserializes `params[key]` into `T`, reporting serde's message as bad_params.
pub fn parse_field<T: DeserializeOwned>(
    params: &serde_json::Value,
    key: &str,
) -> Result<T, HandlerErr> {
    let Some(raw) = params.get(key) else {
        return Err(HandlerErr::bad_params(format!("missing {}", key)));
    };
    serde_json::from_value(raw.clone())
        .map_err(|e| HandlerErr::bad_params(format!("invalid {}: {}", key, e)))
}

/// Missing `date` means today, matching the attendance screen's default.
pub fn parse_date(params: &serde_json::Value) -> Result<AttendanceDate, HandlerErr> {
    match get_optional_str(params, "date") {
        Some(raw) => Ok(raw.parse()?),
        None => Ok(AttendanceDate::today()),
    }
}

pub fn require_db(state: &AppState) -> Result<&Connection, HandlerErr> {
    state
        .db
        .as_ref()
        .ok_or_else(|| HandlerErr::new("no_workspace", "select a workspace first"))
}

pub fn require_user(state: &AppState) -> Result<&User, HandlerErr> {
    state
        .user
        .as_ref()
        .ok_or_else(|| HandlerErr::new("unauthenticated", "log in first"))
}

pub fn require_admin(state: &AppState) -> Result<&User, HandlerErr> {
    let user = require_user(state)?;
    if state.login_role != Some(UserRole::Admin) {
        return Err(HandlerErr::new("forbidden", "admin role required"));
    }
    Ok(user)
}
