mod attendance;
mod auth;
mod backup;
mod db;
mod ipc;
mod logging;
mod model;
mod seed;
mod store;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};

/// School ERP sidecar: JSON requests on stdin, one JSON response per line on stdout.
#[derive(Parser, Debug)]
#[command(name = "schoold", version, about)]
struct Args {
    /// Workspace directory to open at startup
    #[arg(long, env = "SCHOOLD_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Load the demo fixtures if the startup workspace is empty
    #[arg(long, requires = "workspace")]
    seed_demo: bool,

    /// Log filter directive, e.g. "schoold=debug"
    #[arg(long, env = "SCHOOLD_LOG")]
    log_level: Option<String>,
}

fn open_startup_workspace(state: &mut ipc::AppState, path: PathBuf, seed_demo: bool) -> anyhow::Result<()> {
    let empty = ipc::open_workspace(state, path.clone())
        .with_context(|| format!("failed to open workspace {}", path.display()))?;
    if seed_demo {
        if !empty {
            warn!("workspace is not empty; skipping demo seed");
            return Ok(());
        }
        let conn = state
            .db
            .as_ref()
            .context("workspace database not open")?;
        let summary = seed::seed_demo(&store::SqliteStore::new(conn))?;
        info!(
            students = summary.students,
            teachers = summary.teachers,
            classes = summary.classes,
            "demo data seeded"
        );
    }
    Ok(())
}

fn main() {
    let args = Args::parse();
    logging::init(args.log_level.as_deref());

    let mut state = ipc::AppState::default();
    if let Some(path) = args.workspace {
        if let Err(e) = open_startup_workspace(&mut state, path, args.seed_demo) {
            // Keep serving; the shell can still pick a workspace over IPC.
            error!("{e:#}");
        }
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let resp = match serde_json::from_str::<ipc::Request>(&line) {
            Ok(req) => ipc::handle_request(&mut state, req),
            Err(e) => {
                // No id to echo back.
                warn!(error = %e, "unparseable request line");
                serde_json::json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() },
                })
            }
        };
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }
    info!("stdin closed; exiting");
}
