use serde_json::json;
use tracing::warn;

use crate::attendance::AttendanceError;
use crate::auth::AuthError;
use crate::store::StoreError;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

#[derive(Debug)]
pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl HandlerErr {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn bad_params(message: impl Into<String>) -> Self {
        Self::new("bad_params", message)
    }

    pub fn response(self, id: &str) -> serde_json::Value {
        err(id, self.code, self.message, self.details)
    }
}

/// Wraps a handler outcome in the response envelope.
pub fn respond(id: &str, result: Result<serde_json::Value, HandlerErr>) -> serde_json::Value {
    match result {
        Ok(v) => ok(id, v),
        Err(e) => {
            warn!(id, code = e.code, message = %e.message, "request failed");
            e.response(id)
        }
    }
}

impl From<StoreError> for HandlerErr {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { .. } => HandlerErr::new("not_found", e.to_string()),
            StoreError::Conflict(m) => HandlerErr::new("conflict", m),
            StoreError::Invalid(m) => HandlerErr::bad_params(m),
            StoreError::Db(inner) => HandlerErr::new("db_query_failed", inner.to_string()),
        }
    }
}

impl From<AuthError> for HandlerErr {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidCredentials => HandlerErr::new("invalid_credentials", e.to_string()),
            AuthError::Store(inner) => inner.into(),
        }
    }
}

impl From<AttendanceError> for HandlerErr {
    fn from(e: AttendanceError) -> Self {
        let message = e.to_string();
        match e {
            AttendanceError::FetchFailure { grade, section, .. } => {
                HandlerErr::new("fetch_failed", message)
                    .with_details(json!({ "class": grade, "section": section }))
            }
            AttendanceError::SubmissionFailure { date, .. } => {
                HandlerErr::new("submission_failed", message)
                    .with_details(json!({ "date": date.to_string() }))
            }
            AttendanceError::StaleResponse { ticket, current } => {
                HandlerErr::new("stale_session", message)
                    .with_details(json!({ "generation": ticket, "currentGeneration": current }))
            }
            AttendanceError::InvalidPhase { phase, .. } => HandlerErr::new("invalid_phase", message)
                .with_details(json!({ "phase": phase.to_string() })),
            AttendanceError::InvalidDate(_) => HandlerErr::bad_params(message),
        }
    }
}
