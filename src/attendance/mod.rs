//! Daily attendance marking: roster load, per-student status tracking and
//! submission, driven by a per-screen session state machine.

mod record;
mod session;
mod submit;
mod tracker;

pub use record::{AttendanceDate, AttendanceRecord, AttendanceStatus, SubmitAck};
pub use session::{AttendanceSession, Phase};
pub use tracker::AttendanceTracker;

use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum AttendanceError {
    #[error("failed to load roster for class {grade}-{section}: {source}")]
    FetchFailure {
        grade: String,
        section: String,
        #[source]
        source: StoreError,
    },

    #[error("attendance submission for {date} was rejected: {source}")]
    SubmissionFailure {
        date: AttendanceDate,
        #[source]
        source: StoreError,
    },

    #[error("discarded stale response for generation {ticket} (current generation {current})")]
    StaleResponse { ticket: u64, current: u64 },

    #[error("cannot {action} while the session is {phase}")]
    InvalidPhase { action: &'static str, phase: Phase },

    #[error("invalid date {0:?}, expected YYYY-MM-DD")]
    InvalidDate(String),
}
