use crate::db;
use crate::ipc::error::{err, ok, respond, HandlerErr};
use crate::ipc::helpers::require_db;
use crate::ipc::types::{AppState, Request};
use crate::seed;
use crate::store::SqliteStore;
use serde_json::json;
use std::path::PathBuf;
use tracing::info;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string()),
            "user": state.user,
        }),
    )
}

/// Opens (or creates) the workspace database. Any logged-in user and open
/// attendance session belong to the previous workspace and are dropped.
pub fn open_workspace(state: &mut AppState, path: PathBuf) -> anyhow::Result<bool> {
    let conn = db::open_db(&path)?;
    let empty = SqliteStore::new(&conn).is_empty()?;
    state.close_workspace();
    state.workspace = Some(path.clone());
    state.db = Some(conn);
    info!(workspace = %path.display(), empty, "workspace opened");
    Ok(empty)
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    match open_workspace(state, path.clone()) {
        Ok(empty) => ok(
            &req.id,
            json!({ "workspacePath": path.to_string_lossy(), "empty": empty }),
        ),
        Err(e) => err(&req.id, "db_open_failed", format!("{e:?}"), None),
    }
}

fn workspace_seed_demo(state: &mut AppState) -> Result<serde_json::Value, HandlerErr> {
    let conn = require_db(state)?;
    let summary = seed::seed_demo(&SqliteStore::new(conn))?;
    Ok(json!({ "seeded": summary, "demoPassword": seed::DEMO_PASSWORD }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        "workspace.seedDemo" => Some(respond(&req.id, workspace_seed_demo(state))),
        _ => None,
    }
}
