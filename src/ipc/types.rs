use std::path::PathBuf;

use rusqlite::Connection;
use serde::Deserialize;

use crate::attendance::AttendanceSession;
use crate::model::{User, UserRole};

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

#[derive(Default)]
pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub db: Option<Connection>,
    pub user: Option<User>,
    /// Role stored for the logged-in account. Gating checks this, never the
    /// switchable role carried in `user`.
    pub login_role: Option<UserRole>,
    /// Owned by the attendance screen; replaced on every workspace switch.
    pub attendance: AttendanceSession,
}

impl AppState {
    /// Drops everything tied to the previous workspace.
    pub fn close_workspace(&mut self) {
        self.db = None;
        self.workspace = None;
        self.user = None;
        self.login_role = None;
        self.attendance = AttendanceSession::new();
    }
}
