use crate::auth;
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{get_required_str, require_admin, require_db};
use crate::ipc::types::{AppState, Request};
use crate::model::UserRole;
use crate::store::SqliteStore;
use serde_json::json;
use tracing::info;

fn parse_role(params: &serde_json::Value) -> Result<UserRole, HandlerErr> {
    let raw = get_required_str(params, "role")?;
    UserRole::parse(&raw)
        .ok_or_else(|| HandlerErr::bad_params("role must be admin or teacher"))
}

fn auth_login(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let email = get_required_str(params, "email")?;
    let password = get_required_str(params, "password")?;
    let user = auth::login(&SqliteStore::new(require_db(state)?), &email, &password)?;
    // A new login starts from a clean attendance screen.
    state.attendance.reset();
    state.login_role = Some(user.role);
    state.user = Some(user.clone());
    Ok(json!({ "user": user }))
}

fn auth_logout(state: &mut AppState) -> Result<serde_json::Value, HandlerErr> {
    if let Some(user) = state.user.take() {
        info!(user = %user.email, "logout");
    }
    state.login_role = None;
    state.attendance.reset();
    Ok(json!({ "ok": true }))
}

fn auth_me(state: &mut AppState) -> Result<serde_json::Value, HandlerErr> {
    Ok(json!({ "user": state.user }))
}

/// Lets an admin preview the screens of another role. Only the role shown for
/// the current login changes; permissions keep following the stored role.
fn auth_switch_role(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    require_admin(state)?;
    let role = parse_role(params)?;
    let Some(user) = state.user.as_mut() else {
        return Err(HandlerErr::new("unauthenticated", "log in first"));
    };
    user.role = role;
    Ok(json!({ "user": user }))
}

fn users_create(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    require_admin(state)?;
    let name = get_required_str(params, "name")?;
    let email = get_required_str(params, "email")?;
    let password = get_required_str(params, "password")?;
    let role = parse_role(params)?;
    let user = auth::register(&SqliteStore::new(require_db(state)?), &name, &email, &password, role)?;
    Ok(json!({ "user": user }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "auth.login" => auth_login(state, &req.params),
        "auth.logout" => auth_logout(state),
        "auth.me" => auth_me(state),
        "auth.switchRole" => auth_switch_role(state, &req.params),
        "users.create" => users_create(state, &req.params),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
