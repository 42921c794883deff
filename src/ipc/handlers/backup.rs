use crate::backup;
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::handlers::core::open_workspace;
use crate::ipc::helpers::{get_required_str, require_admin};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::PathBuf;
use tracing::info;

fn current_workspace(state: &AppState) -> Result<PathBuf, HandlerErr> {
    state
        .workspace
        .clone()
        .ok_or_else(|| HandlerErr::new("no_workspace", "select a workspace first"))
}

fn backup_export(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    require_admin(state)?;
    let out_path = get_required_str(params, "outPath")?;
    if out_path.trim().is_empty() {
        return Err(HandlerErr::bad_params("missing outPath"));
    }
    let workspace_path = current_workspace(state)?;

    if let Some(conn) = state.db.as_ref() {
        let _ = conn.execute_batch("PRAGMA wal_checkpoint(FULL)");
    }

    let export = backup::export_workspace_bundle(&workspace_path, &PathBuf::from(out_path.trim()))
        .map_err(|e| {
            HandlerErr::new("io_failed", format!("{e:#}")).with_details(json!({ "path": out_path }))
        })?;
    info!(path = %out_path, "workspace exported");
    Ok(json!({
        "path": out_path,
        "bundleFormat": export.bundle_format,
        "entryCount": export.entry_count,
        "dbSha256": export.db_sha256,
    }))
}

/// Replaces the open workspace's database, then reopens it. The caller has to
/// log in again afterwards since the user table came from the bundle.
fn backup_import(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    require_admin(state)?;
    let in_path = get_required_str(params, "inPath")?;
    let src = PathBuf::from(in_path.trim());
    if !src.is_file() {
        return Err(HandlerErr::new("not_found", "bundle file not found")
            .with_details(json!({ "path": in_path })));
    }
    let workspace_path = current_workspace(state)?;

    // Drop open handle before replacing file.
    state.db = None;

    let imported = backup::import_workspace_bundle(&src, &workspace_path);
    // Reopen whatever is on disk now, whether or not the import succeeded.
    let reopened = open_workspace(state, workspace_path.clone());
    let import = imported.map_err(|e| {
        HandlerErr::new("io_failed", format!("{e:#}")).with_details(json!({ "path": in_path }))
    })?;
    reopened.map_err(|e| HandlerErr::new("db_open_failed", format!("{e:#}")))?;

    info!(path = %in_path, "workspace imported");
    Ok(json!({
        "workspacePath": workspace_path.to_string_lossy(),
        "bundleFormat": import.bundle_format,
        "dbSha256": import.db_sha256,
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "backup.exportWorkspace" => backup_export(state, &req.params),
        "backup.importWorkspace" => backup_import(state, &req.params),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
