//! Data access. `DataService` is the narrow seam the attendance core depends on;
//! `SqliteStore` implements it on top of the workspace database and also carries
//! the registry operations used by the admin screens.

mod sqlite;

pub use sqlite::SqliteStore;

use thiserror::Error;

use crate::attendance::{AttendanceRecord, SubmitAck};
use crate::model::Student;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Invalid(String),

    #[error(transparent)]
    Db(#[from] rusqlite::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Collaborator the attendance session reads rosters from and dispatches records to.
pub trait DataService {
    /// Students with `class == grade` and `section == section`, in roster order.
    fn list_students_by_class(&self, grade: &str, section: &str) -> StoreResult<Vec<Student>>;

    fn submit_attendance(&self, records: &[AttendanceRecord]) -> StoreResult<SubmitAck>;
}
