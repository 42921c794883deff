//! Turns a status map into attendance records and hands them to the data service.

use tracing::{info, warn};

use super::{AttendanceDate, AttendanceRecord, AttendanceTracker, SubmitAck};
use crate::store::{DataService, StoreResult};

/// One record per tracked student, in roster order, stamped with `date`.
pub fn build_records(date: AttendanceDate, tracker: &AttendanceTracker) -> Vec<AttendanceRecord> {
    tracker
        .iter()
        .map(|(student_id, status)| AttendanceRecord {
            student_id: student_id.to_string(),
            date,
            status,
        })
        .collect()
}

/// Exactly one `submit_attendance` call; retry policy belongs to the caller.
pub fn dispatch<S: DataService + ?Sized>(
    service: &S,
    records: &[AttendanceRecord],
) -> StoreResult<SubmitAck> {
    match service.submit_attendance(records) {
        Ok(ack) => {
            info!(accepted = ack.accepted, "attendance dispatched");
            Ok(ack)
        }
        Err(e) => {
            warn!(error = %e, count = records.len(), "attendance dispatch rejected");
            Err(e)
        }
    }
}
