use chrono::{SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, Row};
use serde::Serialize;
use std::cmp::Ordering;
use tracing::debug;
use uuid::Uuid;

use super::{DataService, StoreError, StoreResult};
use crate::attendance::{AttendanceDate, AttendanceRecord, AttendanceStatus, SubmitAck};
use crate::model::{
    Activity, ActivityKind, ClassDraft, ClassPatch, ClassSection, DashboardStats, Student,
    StudentDraft, StudentPatch, Teacher, TeacherDraft, TeacherPatch, User, UserRole,
};

const STUDENT_COLUMNS: &str = "id, name, roll_no, grade, section, parent_phone";

pub struct SqliteStore<'c> {
    conn: &'c Connection,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassSummary {
    #[serde(flatten)]
    pub class: ClassSection,
    pub student_count: i64,
}

pub struct UserCredentials {
    pub user: User,
    pub salt: String,
    pub hash: String,
}

fn now_utc() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn required(field: &str, value: &str) -> StoreResult<String> {
    let v = value.trim();
    if v.is_empty() {
        return Err(StoreError::Invalid(format!("{} must not be empty", field)));
    }
    Ok(v.to_string())
}

/// Numeric roll numbers sort numerically and ahead of free-form ones.
pub(crate) fn compare_roll_no(a: &str, b: &str) -> Ordering {
    match (a.trim().parse::<u64>(), b.trim().parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

fn student_from_row(r: &Row<'_>) -> rusqlite::Result<Student> {
    Ok(Student {
        id: r.get(0)?,
        name: r.get(1)?,
        roll_no: r.get(2)?,
        grade: r.get(3)?,
        section: r.get(4)?,
        parent_phone: r.get(5)?,
    })
}

fn teacher_from_row(r: &Row<'_>) -> rusqlite::Result<Teacher> {
    Ok(Teacher {
        id: r.get(0)?,
        name: r.get(1)?,
        subject: r.get(2)?,
        assigned_class: r.get(3)?,
    })
}

fn class_from_row(r: &Row<'_>) -> rusqlite::Result<ClassSection> {
    Ok(ClassSection {
        id: r.get(0)?,
        grade: r.get(1)?,
        section: r.get(2)?,
        class_teacher: r.get(3)?,
    })
}

fn role_from_sql(raw: String) -> rusqlite::Result<UserRole> {
    UserRole::parse(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            format!("unknown role {:?}", raw).into(),
        )
    })
}

fn activity_from_row(r: &Row<'_>) -> rusqlite::Result<Activity> {
    let kind: String = r.get(2)?;
    Ok(Activity {
        id: r.get(0)?,
        message: r.get(1)?,
        kind: ActivityKind::parse(&kind).unwrap_or(ActivityKind::Info),
        timestamp: r.get(3)?,
    })
}

fn student_matches(s: &Student, query: &str) -> bool {
    let lowered = query.to_lowercase();
    s.name.to_lowercase().contains(&lowered)
        || s.roll_no.contains(query)
        || s.grade.contains(query)
}

impl<'c> SqliteStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// Runs `f` in one transaction; any error rolls back everything it wrote.
    pub fn in_transaction<T, E>(&self, f: impl FnOnce(&Self) -> Result<T, E>) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(|e| E::from(StoreError::Db(e)))?;
        let out = f(self)?;
        tx.commit().map_err(|e| E::from(StoreError::Db(e)))?;
        Ok(out)
    }

    /// True when no registry table has rows yet.
    pub fn is_empty(&self) -> StoreResult<bool> {
        let n: i64 = self.conn.query_row(
            "SELECT
               (SELECT COUNT(*) FROM users)
               + (SELECT COUNT(*) FROM students)
               + (SELECT COUNT(*) FROM teachers)
               + (SELECT COUNT(*) FROM classes)",
            [],
            |r| r.get(0),
        )?;
        Ok(n == 0)
    }

    // ----- students -----

    pub fn list_students(&self, search: Option<&str>) -> StoreResult<Vec<Student>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM students ORDER BY rowid",
            STUDENT_COLUMNS
        ))?;
        let rows = stmt
            .query_map([], student_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        let query = search.map(str::trim).filter(|q| !q.is_empty());
        Ok(match query {
            Some(q) => rows.into_iter().filter(|s| student_matches(s, q)).collect(),
            None => rows,
        })
    }

    pub fn get_student(&self, id: &str) -> StoreResult<Student> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM students WHERE id = ?", STUDENT_COLUMNS),
                [id],
                student_from_row,
            )
            .optional()?
            .ok_or(StoreError::NotFound { entity: "student" })
    }

    pub fn create_student(&self, draft: StudentDraft) -> StoreResult<Student> {
        let student = self.insert_student(draft)?;
        self.record_activity(
            &format!(
                "New student {} enrolled in Class {}-{}",
                student.name, student.grade, student.section
            ),
            ActivityKind::Success,
        )?;
        Ok(student)
    }

    /// Adds the row without an activity entry.
    pub fn insert_student(&self, draft: StudentDraft) -> StoreResult<Student> {
        let student = Student {
            id: Uuid::new_v4().to_string(),
            name: required("name", &draft.name)?,
            roll_no: draft.roll_no.trim().to_string(),
            grade: required("class", &draft.grade)?,
            section: required("section", &draft.section)?,
            parent_phone: draft.parent_phone.trim().to_string(),
        };
        self.conn.execute(
            "INSERT INTO students(id, name, roll_no, grade, section, parent_phone, updated_at)
             VALUES(?, ?, ?, ?, ?, ?, ?)",
            (
                &student.id,
                &student.name,
                &student.roll_no,
                &student.grade,
                &student.section,
                &student.parent_phone,
                now_utc(),
            ),
        )?;
        Ok(student)
    }

    pub fn update_student(&self, id: &str, patch: StudentPatch) -> StoreResult<Student> {
        let mut student = self.get_student(id)?;
        student.apply(patch);
        required("name", &student.name)?;
        required("class", &student.grade)?;
        required("section", &student.section)?;
        self.conn.execute(
            "UPDATE students
             SET name = ?, roll_no = ?, grade = ?, section = ?, parent_phone = ?, updated_at = ?
             WHERE id = ?",
            (
                &student.name,
                &student.roll_no,
                &student.grade,
                &student.section,
                &student.parent_phone,
                now_utc(),
                &student.id,
            ),
        )?;
        Ok(student)
    }

    /// Removes the student and every attendance record that references them.
    pub fn delete_student(&self, id: &str) -> StoreResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        let exists = tx
            .query_row("SELECT 1 FROM students WHERE id = ?", [id], |r| {
                r.get::<_, i64>(0)
            })
            .optional()?
            .is_some();
        if !exists {
            return Err(StoreError::NotFound { entity: "student" });
        }
        tx.execute("DELETE FROM attendance_records WHERE student_id = ?", [id])?;
        tx.execute("DELETE FROM students WHERE id = ?", [id])?;
        tx.commit()?;
        Ok(())
    }

    // ----- teachers -----

    pub fn list_teachers(&self, search: Option<&str>) -> StoreResult<Vec<Teacher>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, subject, assigned_class FROM teachers ORDER BY rowid",
        )?;
        let rows = stmt
            .query_map([], teacher_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        let query = search
            .map(|q| q.trim().to_lowercase())
            .filter(|q| !q.is_empty());
        Ok(match query {
            Some(q) => rows
                .into_iter()
                .filter(|t| t.name.to_lowercase().contains(&q) || t.subject.to_lowercase().contains(&q))
                .collect(),
            None => rows,
        })
    }

    pub fn get_teacher(&self, id: &str) -> StoreResult<Teacher> {
        self.conn
            .query_row(
                "SELECT id, name, subject, assigned_class FROM teachers WHERE id = ?",
                [id],
                teacher_from_row,
            )
            .optional()?
            .ok_or(StoreError::NotFound { entity: "teacher" })
    }

    pub fn create_teacher(&self, draft: TeacherDraft) -> StoreResult<Teacher> {
        let teacher = self.insert_teacher(draft)?;
        self.record_activity(
            &format!("New teacher {} added to staff", teacher.name),
            ActivityKind::Success,
        )?;
        Ok(teacher)
    }

    pub fn insert_teacher(&self, draft: TeacherDraft) -> StoreResult<Teacher> {
        let teacher = Teacher {
            id: Uuid::new_v4().to_string(),
            name: required("name", &draft.name)?,
            subject: required("subject", &draft.subject)?,
            assigned_class: draft.assigned_class.trim().to_string(),
        };
        self.conn.execute(
            "INSERT INTO teachers(id, name, subject, assigned_class) VALUES(?, ?, ?, ?)",
            (
                &teacher.id,
                &teacher.name,
                &teacher.subject,
                &teacher.assigned_class,
            ),
        )?;
        Ok(teacher)
    }

    pub fn update_teacher(&self, id: &str, patch: TeacherPatch) -> StoreResult<Teacher> {
        let mut teacher = self.get_teacher(id)?;
        teacher.apply(patch);
        required("name", &teacher.name)?;
        required("subject", &teacher.subject)?;
        self.conn.execute(
            "UPDATE teachers SET name = ?, subject = ?, assigned_class = ? WHERE id = ?",
            (
                &teacher.name,
                &teacher.subject,
                &teacher.assigned_class,
                &teacher.id,
            ),
        )?;
        Ok(teacher)
    }

    pub fn delete_teacher(&self, id: &str) -> StoreResult<()> {
        let n = self.conn.execute("DELETE FROM teachers WHERE id = ?", [id])?;
        if n == 0 {
            return Err(StoreError::NotFound { entity: "teacher" });
        }
        Ok(())
    }

    // ----- classes -----

    pub fn list_classes(&self) -> StoreResult<Vec<ClassSummary>> {
        // Correlated subquery keeps the count independent of join fan-out.
        let mut stmt = self.conn.prepare(
            "SELECT
               c.id,
               c.grade,
               c.section,
               c.class_teacher,
               (SELECT COUNT(*) FROM students s
                 WHERE s.grade = c.grade AND s.section = c.section) AS student_count
             FROM classes c
             ORDER BY c.rowid",
        )?;
        let rows = stmt
            .query_map([], |r| {
                Ok(ClassSummary {
                    class: class_from_row(r)?,
                    student_count: r.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn get_class(&self, id: &str) -> StoreResult<ClassSection> {
        self.conn
            .query_row(
                "SELECT id, grade, section, class_teacher FROM classes WHERE id = ?",
                [id],
                class_from_row,
            )
            .optional()?
            .ok_or(StoreError::NotFound { entity: "class" })
    }

    fn ensure_class_unique(&self, grade: &str, section: &str, except_id: &str) -> StoreResult<()> {
        let taken = self
            .conn
            .query_row(
                "SELECT 1 FROM classes WHERE grade = ? AND section = ? AND id <> ?",
                (grade, section, except_id),
                |r| r.get::<_, i64>(0),
            )
            .optional()?
            .is_some();
        if taken {
            return Err(StoreError::Conflict(format!(
                "class {}-{} already exists",
                grade, section
            )));
        }
        Ok(())
    }

    pub fn create_class(&self, draft: ClassDraft) -> StoreResult<ClassSection> {
        let class = self.insert_class(draft)?;
        self.record_activity(
            &format!("Class {} created", class.label()),
            ActivityKind::Info,
        )?;
        Ok(class)
    }

    pub fn insert_class(&self, draft: ClassDraft) -> StoreResult<ClassSection> {
        let class = ClassSection {
            id: Uuid::new_v4().to_string(),
            grade: required("grade", &draft.grade)?,
            section: required("section", &draft.section)?,
            class_teacher: draft.class_teacher.trim().to_string(),
        };
        self.ensure_class_unique(&class.grade, &class.section, &class.id)?;
        self.conn.execute(
            "INSERT INTO classes(id, grade, section, class_teacher) VALUES(?, ?, ?, ?)",
            (&class.id, &class.grade, &class.section, &class.class_teacher),
        )?;
        Ok(class)
    }

    pub fn update_class(&self, id: &str, patch: ClassPatch) -> StoreResult<ClassSection> {
        let mut class = self.get_class(id)?;
        class.apply(patch);
        required("grade", &class.grade)?;
        required("section", &class.section)?;
        self.ensure_class_unique(&class.grade, &class.section, &class.id)?;
        self.conn.execute(
            "UPDATE classes SET grade = ?, section = ?, class_teacher = ? WHERE id = ?",
            (&class.grade, &class.section, &class.class_teacher, &class.id),
        )?;
        Ok(class)
    }

    /// Students keep their grade/section labels; only the class row goes away.
    pub fn delete_class(&self, id: &str) -> StoreResult<()> {
        let n = self.conn.execute("DELETE FROM classes WHERE id = ?", [id])?;
        if n == 0 {
            return Err(StoreError::NotFound { entity: "class" });
        }
        Ok(())
    }

    // ----- users -----

    pub fn find_credentials(&self, email: &str) -> StoreResult<Option<UserCredentials>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, name, email, role, avatar, password_salt, password_hash
                 FROM users WHERE email = ? COLLATE NOCASE",
                [email.trim()],
                |r| {
                    Ok(UserCredentials {
                        user: User {
                            id: r.get(0)?,
                            name: r.get(1)?,
                            email: r.get(2)?,
                            role: role_from_sql(r.get(3)?)?,
                            avatar: r.get(4)?,
                        },
                        salt: r.get(5)?,
                        hash: r.get(6)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    pub fn create_user(
        &self,
        name: &str,
        email: &str,
        role: UserRole,
        salt: &str,
        hash: &str,
    ) -> StoreResult<User> {
        let user = User {
            id: Uuid::new_v4().to_string(),
            name: required("name", name)?,
            email: required("email", email)?,
            role,
            avatar: None,
        };
        if self.find_credentials(&user.email)?.is_some() {
            return Err(StoreError::Conflict(format!(
                "a user with email {} already exists",
                user.email
            )));
        }
        self.conn.execute(
            "INSERT INTO users(id, name, email, role, avatar, password_salt, password_hash, created_at)
             VALUES(?, ?, ?, ?, NULL, ?, ?, ?)",
            (
                &user.id,
                &user.name,
                &user.email,
                role.as_str(),
                salt,
                hash,
                now_utc(),
            ),
        )?;
        Ok(user)
    }

    // ----- activity + dashboard -----

    pub fn record_activity(&self, message: &str, kind: ActivityKind) -> StoreResult<Activity> {
        let activity = Activity {
            id: Uuid::new_v4().to_string(),
            message: message.to_string(),
            timestamp: now_utc(),
            kind,
        };
        self.conn.execute(
            "INSERT INTO activities(id, message, kind, created_at) VALUES(?, ?, ?, ?)",
            (
                &activity.id,
                &activity.message,
                kind.as_str(),
                &activity.timestamp,
            ),
        )?;
        Ok(activity)
    }

    /// Newest first.
    pub fn recent_activity(&self, limit: usize) -> StoreResult<Vec<Activity>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, message, kind, created_at
             FROM activities
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?",
        )?;
        let rows = stmt
            .query_map([limit as i64], activity_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn dashboard_stats(&self) -> StoreResult<DashboardStats> {
        let (total_students, total_teachers, total_classes, present, recorded): (
            i64,
            i64,
            i64,
            i64,
            i64,
        ) = self.conn.query_row(
            "SELECT
               (SELECT COUNT(*) FROM students),
               (SELECT COUNT(*) FROM teachers),
               (SELECT COUNT(*) FROM classes),
               (SELECT COUNT(*) FROM attendance_records WHERE status = 'PRESENT'),
               (SELECT COUNT(*) FROM attendance_records)",
            [],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?)),
        )?;
        let attendance_percent = if recorded == 0 {
            None
        } else {
            Some(((present as f64) * 100.0 / (recorded as f64)).round() as i64)
        };
        Ok(DashboardStats {
            total_students,
            total_teachers,
            total_classes,
            attendance_percent,
        })
    }

    // ----- stored attendance -----

    /// Previously submitted records for one class and day, in roster order.
    pub fn attendance_for_class(
        &self,
        grade: &str,
        section: &str,
        date: &AttendanceDate,
    ) -> StoreResult<Vec<AttendanceRecord>> {
        let roster = self.list_students_by_class(grade, section)?;
        let mut stmt = self.conn.prepare(
            "SELECT ar.student_id, ar.status
             FROM attendance_records ar
             JOIN students s ON s.id = ar.student_id
             WHERE s.grade = ? AND s.section = ? AND ar.date = ?",
        )?;
        let stored = stmt
            .query_map((grade, section, date.to_string()), |r| {
                Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        let by_student: std::collections::HashMap<String, String> = stored.into_iter().collect();

        let mut out = Vec::new();
        for s in roster {
            let Some(raw) = by_student.get(&s.id) else {
                continue;
            };
            let Some(status) = AttendanceStatus::parse(raw) else {
                continue;
            };
            out.push(AttendanceRecord {
                student_id: s.id,
                date: *date,
                status,
            });
        }
        Ok(out)
    }
}

impl DataService for SqliteStore<'_> {
    fn list_students_by_class(&self, grade: &str, section: &str) -> StoreResult<Vec<Student>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM students WHERE grade = ? AND section = ?",
            STUDENT_COLUMNS
        ))?;
        let mut rows = stmt
            .query_map((grade, section), student_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.sort_by(|a, b| {
            compare_roll_no(&a.roll_no, &b.roll_no)
                .then_with(|| a.name.cmp(&b.name))
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(rows)
    }

    /// Upserts by (student, date): a later submission for the same day wins.
    fn submit_attendance(&self, records: &[AttendanceRecord]) -> StoreResult<SubmitAck> {
        if records.is_empty() {
            return Ok(SubmitAck { accepted: 0 });
        }
        let tx = self.conn.unchecked_transaction()?;
        let updated_at = now_utc();
        for r in records {
            tx.execute(
                "INSERT INTO attendance_records(student_id, date, status, updated_at)
                 VALUES(?, ?, ?, ?)
                 ON CONFLICT(student_id, date) DO UPDATE SET
                   status = excluded.status,
                   updated_at = excluded.updated_at",
                (
                    &r.student_id,
                    r.date.to_string(),
                    r.status.as_str(),
                    &updated_at,
                ),
            )?;
        }
        let absent = records
            .iter()
            .filter(|r| r.status == AttendanceStatus::Absent)
            .count();
        let kind = if absent * 5 > records.len() {
            ActivityKind::Warning
        } else {
            ActivityKind::Info
        };
        self.record_activity(
            &format!(
                "Attendance marked for {} students on {} ({} absent)",
                records.len(),
                records[0].date,
                absent
            ),
            kind,
        )?;
        tx.commit()?;
        debug!(count = records.len(), "attendance records stored");
        Ok(SubmitAck {
            accepted: records.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn memory_conn() -> Connection {
        let conn = Connection::open_in_memory().expect("open memory db");
        db::apply_schema(&conn).expect("schema");
        conn
    }

    fn draft(name: &str, roll: &str, grade: &str, section: &str) -> StudentDraft {
        StudentDraft {
            name: name.to_string(),
            roll_no: roll.to_string(),
            grade: grade.to_string(),
            section: section.to_string(),
            parent_phone: String::new(),
        }
    }

    fn record(id: &str, date: &str, status: AttendanceStatus) -> AttendanceRecord {
        AttendanceRecord {
            student_id: id.to_string(),
            date: date.parse().expect("date"),
            status,
        }
    }

    #[test]
    fn roster_filters_by_grade_and_section_in_roll_order() {
        let conn = memory_conn();
        let store = SqliteStore::new(&conn);
        store.create_student(draft("Zed", "10", "10", "A")).expect("create");
        store.create_student(draft("Amy", "9", "10", "A")).expect("create");
        store.create_student(draft("Other", "1", "10", "B")).expect("create");
        store.create_student(draft("NoRoll", "", "10", "A")).expect("create");

        let roster = store.list_students_by_class("10", "A").expect("roster");
        let names: Vec<&str> = roster.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Amy", "Zed", "NoRoll"]);
        assert!(store.list_students_by_class("11", "A").expect("roster").is_empty());
    }

    #[test]
    fn roll_numbers_compare_naturally() {
        assert_eq!(compare_roll_no("9", "10"), Ordering::Less);
        assert_eq!(compare_roll_no("10", "A1"), Ordering::Less);
        assert_eq!(compare_roll_no("B", "A"), Ordering::Greater);
    }

    #[test]
    fn student_search_matches_name_roll_and_class() {
        let conn = memory_conn();
        let store = SqliteStore::new(&conn);
        store.create_student(draft("Aarav Mehta", "101", "10", "A")).expect("create");
        store.create_student(draft("Ananya Gupta", "201", "9", "A")).expect("create");

        assert_eq!(store.list_students(Some("aarav")).expect("list").len(), 1);
        assert_eq!(store.list_students(Some("201")).expect("list").len(), 1);
        assert_eq!(store.list_students(Some("9")).expect("list").len(), 1);
        assert_eq!(store.list_students(Some("  ")).expect("list").len(), 2);
    }

    #[test]
    fn update_and_delete_unknown_student_report_not_found() {
        let conn = memory_conn();
        let store = SqliteStore::new(&conn);
        let err = store
            .update_student("missing", StudentPatch::default())
            .expect_err("update should fail");
        assert!(matches!(err, StoreError::NotFound { entity: "student" }));
        let err = store.delete_student("missing").expect_err("delete should fail");
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn blank_required_fields_are_rejected() {
        let conn = memory_conn();
        let store = SqliteStore::new(&conn);
        let err = store
            .create_student(draft("  ", "1", "10", "A"))
            .expect_err("blank name");
        assert!(matches!(err, StoreError::Invalid(_)));

        let s = store.create_student(draft("Kabir", "1", "10", "A")).expect("create");
        let err = store
            .update_student(
                &s.id,
                StudentPatch {
                    section: Some(String::new()),
                    ..Default::default()
                },
            )
            .expect_err("blank section");
        assert!(matches!(err, StoreError::Invalid(_)));
    }

    #[test]
    fn duplicate_class_is_a_conflict() {
        let conn = memory_conn();
        let store = SqliteStore::new(&conn);
        let a = store
            .create_class(ClassDraft {
                grade: "10".into(),
                section: "A".into(),
                class_teacher: "Rajesh Kumar".into(),
            })
            .expect("create");
        let err = store
            .create_class(ClassDraft {
                grade: "10".into(),
                section: "A".into(),
                class_teacher: String::new(),
            })
            .expect_err("duplicate");
        assert!(matches!(err, StoreError::Conflict(_)));

        // Renaming onto itself is fine.
        store
            .update_class(
                &a.id,
                ClassPatch {
                    class_teacher: Some("Sunita Iyer".into()),
                    ..Default::default()
                },
            )
            .expect("update");
    }

    #[test]
    fn class_summary_counts_roster() {
        let conn = memory_conn();
        let store = SqliteStore::new(&conn);
        store
            .create_class(ClassDraft {
                grade: "8".into(),
                section: "B".into(),
                class_teacher: String::new(),
            })
            .expect("create");
        store.create_student(draft("Arjun", "303", "8", "B")).expect("create");
        store.create_student(draft("Anika", "304", "8", "B")).expect("create");
        store.create_student(draft("Myra", "302", "8", "A")).expect("create");
        let classes = store.list_classes().expect("list");
        assert_eq!(classes.len(), 1);
        assert_eq!(classes[0].student_count, 2);
    }

    #[test]
    fn resubmission_for_same_day_overwrites() {
        let conn = memory_conn();
        let store = SqliteStore::new(&conn);
        let s = store.create_student(draft("Diya", "102", "10", "A")).expect("create");

        store
            .submit_attendance(&[record(&s.id, "2024-03-01", AttendanceStatus::Present)])
            .expect("first submit");
        let ack = store
            .submit_attendance(&[record(&s.id, "2024-03-01", AttendanceStatus::Absent)])
            .expect("second submit");
        assert_eq!(ack.accepted, 1);

        let date: AttendanceDate = "2024-03-01".parse().expect("date");
        let stored = store.attendance_for_class("10", "A", &date).expect("stored");
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].status, AttendanceStatus::Absent);
    }

    #[test]
    fn empty_submission_is_accepted() {
        let conn = memory_conn();
        let store = SqliteStore::new(&conn);
        let ack = store.submit_attendance(&[]).expect("empty submit");
        assert_eq!(ack.accepted, 0);
    }

    #[test]
    fn submission_for_unknown_student_persists_nothing() {
        let conn = memory_conn();
        let store = SqliteStore::new(&conn);
        let s = store.create_student(draft("Vivaan", "103", "10", "B")).expect("create");
        let err = store.submit_attendance(&[
            record(&s.id, "2024-03-01", AttendanceStatus::Present),
            record("ghost", "2024-03-01", AttendanceStatus::Absent),
        ]);
        assert!(matches!(err, Err(StoreError::Db(_))));
        let stats = store.dashboard_stats().expect("stats");
        assert_eq!(stats.attendance_percent, None);
    }

    #[test]
    fn deleting_student_removes_their_records() {
        let conn = memory_conn();
        let store = SqliteStore::new(&conn);
        let s = store.create_student(draft("Rudra", "204", "9", "B")).expect("create");
        store
            .submit_attendance(&[record(&s.id, "2024-03-01", AttendanceStatus::Present)])
            .expect("submit");
        store.delete_student(&s.id).expect("delete");
        let n: i64 = conn
            .query_row("SELECT COUNT(*) FROM attendance_records", [], |r| r.get(0))
            .expect("count");
        assert_eq!(n, 0);
    }

    #[test]
    fn dashboard_percent_rounds_present_share() {
        let conn = memory_conn();
        let store = SqliteStore::new(&conn);
        let a = store.create_student(draft("A", "1", "9", "A")).expect("create");
        let b = store.create_student(draft("B", "2", "9", "A")).expect("create");
        let c = store.create_student(draft("C", "3", "9", "A")).expect("create");
        store
            .submit_attendance(&[
                record(&a.id, "2024-03-01", AttendanceStatus::Present),
                record(&b.id, "2024-03-01", AttendanceStatus::Present),
                record(&c.id, "2024-03-01", AttendanceStatus::Absent),
            ])
            .expect("submit");
        let stats = store.dashboard_stats().expect("stats");
        assert_eq!(stats.total_students, 3);
        assert_eq!(stats.attendance_percent, Some(67));
    }

    #[test]
    fn recent_activity_is_newest_first_and_limited() {
        let conn = memory_conn();
        let store = SqliteStore::new(&conn);
        for i in 0..5 {
            store
                .record_activity(&format!("event {}", i), ActivityKind::Info)
                .expect("record");
        }
        let recent = store.recent_activity(3).expect("recent");
        let msgs: Vec<&str> = recent.iter().map(|a| a.message.as_str()).collect();
        assert_eq!(msgs, vec!["event 4", "event 3", "event 2"]);
    }

    #[test]
    fn user_email_lookup_ignores_case() {
        let conn = memory_conn();
        let store = SqliteStore::new(&conn);
        store
            .create_user("Dr. Priya Sharma", "admin@greenvalley.edu", UserRole::Admin, "salt", "hash")
            .expect("create user");
        let creds = store
            .find_credentials("ADMIN@GreenValley.edu ")
            .expect("lookup")
            .expect("user exists");
        assert_eq!(creds.user.role, UserRole::Admin);
        let err = store
            .create_user("Other", "Admin@greenvalley.edu", UserRole::Teacher, "s", "h")
            .expect_err("duplicate email");
        assert!(matches!(err, StoreError::Conflict(_)));
    }
}
