//! Demo fixtures for an empty workspace (Green Valley International School).

use serde::Serialize;
use tracing::info;

use crate::auth::{self, AuthError};
use crate::model::{ActivityKind, ClassDraft, StudentDraft, TeacherDraft, UserRole};
use crate::store::{SqliteStore, StoreError};

pub const DEMO_PASSWORD: &str = "password";

const USERS: &[(&str, &str, UserRole)] = &[
    ("Dr. Priya Sharma", "admin@greenvalley.edu", UserRole::Admin),
    ("Rajesh Kumar", "rajesh@greenvalley.edu", UserRole::Teacher),
];

// (name, roll, grade, section, parent phone)
const STUDENTS: &[(&str, &str, &str, &str, &str)] = &[
    ("Aarav Mehta", "101", "10", "A", "+91 98765 43210"),
    ("Diya Patel", "102", "10", "A", "+91 98765 43211"),
    ("Vivaan Singh", "103", "10", "B", "+91 98765 43212"),
    ("Ananya Gupta", "201", "9", "A", "+91 98765 43213"),
    ("Kabir Joshi", "202", "9", "A", "+91 98765 43214"),
    ("Ishita Reddy", "203", "9", "B", "+91 98765 43215"),
    ("Reyansh Agarwal", "301", "8", "A", "+91 98765 43216"),
    ("Myra Nair", "302", "8", "A", "+91 98765 43217"),
    ("Arjun Verma", "303", "8", "B", "+91 98765 43218"),
    ("Saanvi Desai", "104", "10", "B", "+91 98765 43219"),
    ("Rudra Chopra", "204", "9", "B", "+91 98765 43220"),
    ("Anika Bhatt", "304", "8", "B", "+91 98765 43221"),
];

const TEACHERS: &[(&str, &str, &str)] = &[
    ("Rajesh Kumar", "Mathematics", "10-A"),
    ("Sunita Iyer", "Science", "10-B"),
    ("Amit Saxena", "English", "9-A"),
    ("Neha Kapoor", "Hindi", "9-B"),
    ("Vikram Malhotra", "Social Studies", "8-A"),
    ("Pooja Srinivasan", "Computer Science", "8-B"),
];

const CLASSES: &[(&str, &str, &str)] = &[
    ("10", "A", "Rajesh Kumar"),
    ("10", "B", "Sunita Iyer"),
    ("9", "A", "Amit Saxena"),
    ("9", "B", "Neha Kapoor"),
    ("8", "A", "Vikram Malhotra"),
    ("8", "B", "Pooja Srinivasan"),
];

// Oldest first so the first entry in the original feed ends up newest.
const ACTIVITIES: &[(&str, ActivityKind)] = &[
    ("Term examination schedule published", ActivityKind::Info),
    ("Class 8-A attendance below 80% this week", ActivityKind::Warning),
    ("New teacher Pooja Srinivasan added to staff", ActivityKind::Success),
    ("Parent meeting scheduled for Class 10-B on Friday", ActivityKind::Warning),
    ("Attendance marked for Class 9-A by Amit Saxena", ActivityKind::Info),
    ("New student Aarav Mehta enrolled in Class 10-A", ActivityKind::Success),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedSummary {
    pub users: usize,
    pub students: usize,
    pub teachers: usize,
    pub classes: usize,
}

/// Loads the fixtures in one transaction, so a failure leaves the workspace
/// empty. Rows go in without the per-create activity entries; the feed gets
/// only the fixture activities.
pub fn seed_demo(store: &SqliteStore<'_>) -> Result<SeedSummary, AuthError> {
    if !store.is_empty()? {
        return Err(AuthError::Store(StoreError::Conflict(
            "workspace already has data".to_string(),
        )));
    }

    store.in_transaction(|store| -> Result<(), AuthError> {
        for (grade, section, teacher) in CLASSES {
            store.insert_class(ClassDraft {
                grade: grade.to_string(),
                section: section.to_string(),
                class_teacher: teacher.to_string(),
            })?;
        }
        for (name, subject, assigned) in TEACHERS {
            store.insert_teacher(TeacherDraft {
                name: name.to_string(),
                subject: subject.to_string(),
                assigned_class: assigned.to_string(),
            })?;
        }
        for (name, roll, grade, section, phone) in STUDENTS {
            store.insert_student(StudentDraft {
                name: name.to_string(),
                roll_no: roll.to_string(),
                grade: grade.to_string(),
                section: section.to_string(),
                parent_phone: phone.to_string(),
            })?;
        }
        for (name, email, role) in USERS {
            auth::register(store, name, email, DEMO_PASSWORD, *role)?;
        }
        for (message, kind) in ACTIVITIES {
            store.record_activity(message, *kind)?;
        }
        Ok(())
    })?;

    let summary = SeedSummary {
        users: USERS.len(),
        students: STUDENTS.len(),
        teachers: TEACHERS.len(),
        classes: CLASSES.len(),
    };
    info!(?summary, "seeded demo workspace");
    Ok(summary)
}
