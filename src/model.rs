//! Registry records shared by the store, the attendance core and the IPC layer.
//!
//! JSON shapes use camelCase keys so the shell can consume them unchanged.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub name: String,
    pub roll_no: String,
    /// Grade label, e.g. "10".
    #[serde(rename = "class")]
    pub grade: String,
    pub section: String,
    pub parent_phone: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentDraft {
    pub name: String,
    #[serde(default)]
    pub roll_no: String,
    #[serde(rename = "class")]
    pub grade: String,
    pub section: String,
    #[serde(default)]
    pub parent_phone: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentPatch {
    pub name: Option<String>,
    pub roll_no: Option<String>,
    #[serde(rename = "class")]
    pub grade: Option<String>,
    pub section: Option<String>,
    pub parent_phone: Option<String>,
}

impl Student {
    pub fn apply(&mut self, patch: StudentPatch) {
        if let Some(v) = patch.name {
            self.name = v.trim().to_string();
        }
        if let Some(v) = patch.roll_no {
            self.roll_no = v.trim().to_string();
        }
        if let Some(v) = patch.grade {
            self.grade = v.trim().to_string();
        }
        if let Some(v) = patch.section {
            self.section = v.trim().to_string();
        }
        if let Some(v) = patch.parent_phone {
            self.parent_phone = v.trim().to_string();
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub id: String,
    pub name: String,
    pub subject: String,
    pub assigned_class: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherDraft {
    pub name: String,
    pub subject: String,
    #[serde(default)]
    pub assigned_class: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherPatch {
    pub name: Option<String>,
    pub subject: Option<String>,
    pub assigned_class: Option<String>,
}

impl Teacher {
    pub fn apply(&mut self, patch: TeacherPatch) {
        if let Some(v) = patch.name {
            self.name = v.trim().to_string();
        }
        if let Some(v) = patch.subject {
            self.subject = v.trim().to_string();
        }
        if let Some(v) = patch.assigned_class {
            self.assigned_class = v.trim().to_string();
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassSection {
    pub id: String,
    pub grade: String,
    pub section: String,
    pub class_teacher: String,
}

impl ClassSection {
    /// Short label used in activity messages, e.g. "10-A".
    pub fn label(&self) -> String {
        format!("{}-{}", self.grade, self.section)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassDraft {
    pub grade: String,
    pub section: String,
    #[serde(default)]
    pub class_teacher: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassPatch {
    pub grade: Option<String>,
    pub section: Option<String>,
    pub class_teacher: Option<String>,
}

impl ClassSection {
    pub fn apply(&mut self, patch: ClassPatch) {
        if let Some(v) = patch.grade {
            self.grade = v.trim().to_string();
        }
        if let Some(v) = patch.section {
            self.section = v.trim().to_string();
        }
        if let Some(v) = patch.class_teacher {
            self.class_teacher = v.trim().to_string();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Teacher,
}

impl UserRole {
    pub fn as_str(self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Teacher => "teacher",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(UserRole::Admin),
            "teacher" => Some(UserRole::Teacher),
            _ => None,
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Info,
    Success,
    Warning,
}

impl ActivityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityKind::Info => "info",
            ActivityKind::Success => "success",
            ActivityKind::Warning => "warning",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "info" => Some(ActivityKind::Info),
            "success" => Some(ActivityKind::Success),
            "warning" => Some(ActivityKind::Warning),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: String,
    pub message: String,
    pub timestamp: String,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_students: i64,
    pub total_teachers: i64,
    pub total_classes: i64,
    /// `None` until at least one attendance record exists.
    pub attendance_percent: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn student_serializes_grade_as_class() {
        let s = Student {
            id: "s1".into(),
            name: "Aarav Mehta".into(),
            roll_no: "101".into(),
            grade: "10".into(),
            section: "A".into(),
            parent_phone: "+91 98765 43210".into(),
        };
        let v = serde_json::to_value(&s).expect("serialize");
        assert_eq!(v["class"], json!("10"));
        assert_eq!(v["rollNo"], json!("101"));
        assert_eq!(v["parentPhone"], json!("+91 98765 43210"));
        assert!(v.get("grade").is_none());
    }

    #[test]
    fn patch_only_touches_given_fields() {
        let mut t = Teacher {
            id: "t1".into(),
            name: "Rajesh Kumar".into(),
            subject: "Mathematics".into(),
            assigned_class: "10-A".into(),
        };
        let patch: TeacherPatch =
            serde_json::from_value(json!({ "subject": " Physics " })).expect("patch");
        t.apply(patch);
        assert_eq!(t.subject, "Physics");
        assert_eq!(t.name, "Rajesh Kumar");
        assert_eq!(t.assigned_class, "10-A");
    }

    #[test]
    fn role_parse_is_case_insensitive() {
        assert_eq!(UserRole::parse("Admin"), Some(UserRole::Admin));
        assert_eq!(UserRole::parse(" teacher "), Some(UserRole::Teacher));
        assert_eq!(UserRole::parse("principal"), None);
    }
}
