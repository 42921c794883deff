use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use tracing::debug;

use super::submit;
use super::{
    AttendanceDate, AttendanceError, AttendanceRecord, AttendanceStatus, AttendanceTracker,
    SubmitAck,
};
use crate::model::Student;
use crate::store::{DataService, StoreResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Unselected,
    Loading,
    Ready,
    Submitting,
    Submitted,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Unselected => "unselected",
            Phase::Loading => "loading",
            Phase::Ready => "ready",
            Phase::Submitting => "submitting",
            Phase::Submitted => "submitted",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub grade: String,
    pub section: String,
    pub date: AttendanceDate,
}

/// Tags one roster fetch with the generation that requested it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    pub generation: u64,
    pub grade: String,
    pub section: String,
}

/// Tags one dispatch with the generation and the records it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitTicket {
    pub generation: u64,
    pub date: AttendanceDate,
    pub records: Vec<AttendanceRecord>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    #[serde(flatten)]
    pub student: Student,
    pub status: AttendanceStatus,
}

/// What a successful submission stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Submission {
    pub ack: SubmitAck,
    pub records: Vec<AttendanceRecord>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub phase: Phase,
    pub generation: u64,
    pub selection: Option<Selection>,
    pub students: Vec<RosterEntry>,
    pub present_count: usize,
    pub absent_count: usize,
}

/// Attendance marking for one class and date.
///
/// `UNSELECTED -> LOADING -> READY -> SUBMITTING -> SUBMITTED`. Every selection
/// bumps `generation`; completions carrying an older generation are stale and
/// leave the session untouched.
#[derive(Debug, Default)]
pub struct AttendanceSession {
    generation: u64,
    phase: Phase,
    selection: Option<Selection>,
    roster: Vec<Student>,
    tracker: AttendanceTracker,
}

impl AttendanceSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[cfg(test)]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[cfg(test)]
    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    #[cfg(test)]
    pub fn tracker(&self) -> &AttendanceTracker {
        &self.tracker
    }

    /// Starts a new cycle for (grade, section, date), discarding any roster and
    /// mapping. Returns `None` (and stays UNSELECTED) when grade or section is blank.
    pub fn select(&mut self, grade: &str, section: &str, date: AttendanceDate) -> Option<LoadTicket> {
        self.generation += 1;
        self.roster.clear();
        self.tracker.clear();

        let grade = grade.trim();
        let section = section.trim();
        if grade.is_empty() || section.is_empty() {
            self.phase = Phase::Unselected;
            self.selection = None;
            return None;
        }

        self.phase = Phase::Loading;
        self.selection = Some(Selection {
            grade: grade.to_string(),
            section: section.to_string(),
            date,
        });
        Some(LoadTicket {
            generation: self.generation,
            grade: grade.to_string(),
            section: section.to_string(),
        })
    }

    /// Forgets the current selection, e.g. when the screen is left.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.phase = Phase::Unselected;
        self.selection = None;
        self.roster.clear();
        self.tracker.clear();
    }

    /// Takes a student who no longer exists out of the roster and the map, so
    /// the next submission does not reference them. Returns whether they were loaded.
    pub fn drop_student(&mut self, student_id: &str) -> bool {
        let before = self.roster.len();
        self.roster.retain(|s| s.id != student_id);
        self.tracker.remove(student_id);
        before != self.roster.len()
    }

    fn check_current(&self, ticket_generation: u64, expected: Phase) -> Result<(), AttendanceError> {
        if ticket_generation != self.generation || self.phase != expected {
            debug!(
                ticket = ticket_generation,
                current = self.generation,
                phase = %self.phase,
                "discarding stale attendance response"
            );
            return Err(AttendanceError::StaleResponse {
                ticket: ticket_generation,
                current: self.generation,
            });
        }
        Ok(())
    }

    /// Applies a roster fetch result. On success every student starts PRESENT and
    /// the roster size is returned. A failed fetch drops back to UNSELECTED.
    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        result: StoreResult<Vec<Student>>,
    ) -> Result<usize, AttendanceError> {
        self.check_current(ticket.generation, Phase::Loading)?;
        match result {
            Ok(students) => {
                let mut seen = HashSet::new();
                self.roster = students
                    .into_iter()
                    .filter(|s| seen.insert(s.id.clone()))
                    .collect();
                self.tracker.initialize(&self.roster);
                self.phase = Phase::Ready;
                Ok(self.roster.len())
            }
            Err(source) => {
                self.phase = Phase::Unselected;
                self.selection = None;
                Err(AttendanceError::FetchFailure {
                    grade: ticket.grade,
                    section: ticket.section,
                    source,
                })
            }
        }
    }

    /// Select and fetch in one step. `Ok(None)` means the selection was blank.
    pub fn load<S: DataService + ?Sized>(
        &mut self,
        service: &S,
        grade: &str,
        section: &str,
        date: AttendanceDate,
    ) -> Result<Option<usize>, AttendanceError> {
        let Some(ticket) = self.select(grade, section, date) else {
            return Ok(None);
        };
        let result = service.list_students_by_class(&ticket.grade, &ticket.section);
        self.complete_load(ticket, result).map(Some)
    }

    fn require_ready(&self, action: &'static str) -> Result<(), AttendanceError> {
        if self.phase != Phase::Ready {
            return Err(AttendanceError::InvalidPhase {
                action,
                phase: self.phase,
            });
        }
        Ok(())
    }

    /// Flips one student; an id outside the roster is ignored.
    pub fn toggle(&mut self, student_id: &str) -> Result<Option<AttendanceStatus>, AttendanceError> {
        self.require_ready("toggle attendance")?;
        Ok(self.tracker.toggle(student_id))
    }

    pub fn set_all(&mut self, status: AttendanceStatus) -> Result<(), AttendanceError> {
        self.require_ready("mark all students")?;
        self.tracker.set_all(status);
        Ok(())
    }

    /// Freezes the current map into records and moves to SUBMITTING.
    pub fn begin_submit(&mut self) -> Result<SubmitTicket, AttendanceError> {
        self.require_ready("submit attendance")?;
        let date = match &self.selection {
            Some(sel) => sel.date,
            None => {
                return Err(AttendanceError::InvalidPhase {
                    action: "submit attendance",
                    phase: Phase::Unselected,
                })
            }
        };
        let records = submit::build_records(date, &self.tracker);
        self.phase = Phase::Submitting;
        Ok(SubmitTicket {
            generation: self.generation,
            date,
            records,
        })
    }

    /// Applies the dispatch outcome. A rejection returns to READY so the user
    /// can resubmit.
    pub fn complete_submit(
        &mut self,
        ticket: SubmitTicket,
        result: StoreResult<SubmitAck>,
    ) -> Result<SubmitAck, AttendanceError> {
        self.check_current(ticket.generation, Phase::Submitting)?;
        match result {
            Ok(ack) => {
                self.phase = Phase::Submitted;
                Ok(ack)
            }
            Err(source) => {
                self.phase = Phase::Ready;
                Err(AttendanceError::SubmissionFailure {
                    date: ticket.date,
                    source,
                })
            }
        }
    }

    /// Builds the records, dispatches them once and records the outcome.
    pub fn submit<S: DataService + ?Sized>(&mut self, service: &S) -> Result<Submission, AttendanceError> {
        let ticket = self.begin_submit()?;
        let result = submit::dispatch(service, &ticket.records);
        let records = ticket.records.clone();
        let ack = self.complete_submit(ticket, result)?;
        Ok(Submission { ack, records })
    }

    pub fn view(&self) -> SessionView {
        let students = self
            .roster
            .iter()
            .filter_map(|s| {
                self.tracker.status(&s.id).map(|status| RosterEntry {
                    student: s.clone(),
                    status,
                })
            })
            .collect();
        SessionView {
            phase: self.phase,
            generation: self.generation,
            selection: self.selection.clone(),
            students,
            present_count: self.tracker.present_count(),
            absent_count: self.tracker.absent_count(),
        }
    }
}
