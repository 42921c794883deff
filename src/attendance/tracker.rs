use std::collections::HashMap;

use super::AttendanceStatus;
use crate::model::Student;

/// Per-student status map for the loaded roster, kept in roster order.
///
/// The key set always equals the roster passed to the last `initialize`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttendanceTracker {
    entries: Vec<(String, AttendanceStatus)>,
    index: HashMap<String, usize>,
}

impl AttendanceTracker {
    #[cfg(test)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any previous mapping; every roster member starts PRESENT.
    /// A repeated id keeps its first position.
    pub fn initialize(&mut self, roster: &[Student]) {
        self.entries.clear();
        self.index.clear();
        for s in roster {
            if self.index.contains_key(&s.id) {
                continue;
            }
            self.index.insert(s.id.clone(), self.entries.len());
            self.entries.push((s.id.clone(), AttendanceStatus::Present));
        }
    }

    /// Drops one student, keeping the others in roster order.
    pub fn remove(&mut self, student_id: &str) -> Option<AttendanceStatus> {
        let idx = self.index.remove(student_id)?;
        let (_, status) = self.entries.remove(idx);
        for (id, _) in &self.entries[idx..] {
            if let Some(i) = self.index.get_mut(id) {
                *i -= 1;
            }
        }
        Some(status)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }

    /// Returns the new status, or `None` when the id is not on the roster.
    pub fn toggle(&mut self, student_id: &str) -> Option<AttendanceStatus> {
        let idx = *self.index.get(student_id)?;
        let slot = &mut self.entries[idx].1;
        *slot = slot.toggled();
        Some(*slot)
    }

    pub fn set_all(&mut self, status: AttendanceStatus) {
        for (_, s) in self.entries.iter_mut() {
            *s = status;
        }
    }

    pub fn status(&self, student_id: &str) -> Option<AttendanceStatus> {
        self.index.get(student_id).map(|&i| self.entries[i].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, AttendanceStatus)> + '_ {
        self.entries.iter().map(|(id, s)| (id.as_str(), *s))
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn present_count(&self) -> usize {
        self.count(AttendanceStatus::Present)
    }

    pub fn absent_count(&self) -> usize {
        self.count(AttendanceStatus::Absent)
    }

    fn count(&self, status: AttendanceStatus) -> usize {
        self.entries.iter().filter(|(_, s)| *s == status).count()
    }
}
