//! Encoding and decoding helpers between domain types and the plain values
//! stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings. Role and subject sets live in
//! link tables and are read back as sorted id lists.

use chrono::{DateTime, Utc};
use univera_core::{
  org::{Course, Department, Subject},
  person::{FacultyRecord, LocalUser},
  role::{Capacity, RoleId},
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Capacity ────────────────────────────────────────────────────────────────

/// The `(table, column)` holding `capacity`.
pub fn capacity_column(capacity: Capacity) -> (&'static str, &'static str) {
  match capacity {
    Capacity::Principal => ("departments", "principal_id"),
    Capacity::Dean => ("departments", "dean_id"),
    Capacity::Admin => ("departments", "admin_id"),
    Capacity::HeadOfDepartment => ("courses", "hod_id"),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// A `users` row plus its `user_roles` links.
pub struct RawUser {
  pub id:            String,
  pub name:          String,
  pub email:         String,
  pub phone:         String,
  pub department_id: Option<i64>,
  pub created_at:    String,
  pub role_ids:      Vec<i64>,
}

impl RawUser {
  pub fn into_user(self) -> Result<LocalUser> {
    Ok(LocalUser {
      id:            self.id,
      name:          self.name,
      email:         self.email,
      phone:         self.phone,
      department_id: self.department_id,
      role_ids:      self.role_ids.into_iter().map(RoleId).collect(),
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

/// A `faculty` row plus its `faculty_subjects` links.
pub struct RawFaculty {
  pub id:            String,
  pub course_id:     i64,
  pub department_id: i64,
  pub position:      String,
  pub university_id: i64,
  pub created_at:    String,
  pub subject_ids:   Vec<i64>,
}

impl RawFaculty {
  pub fn into_faculty(self) -> Result<FacultyRecord> {
    Ok(FacultyRecord {
      id:            self.id,
      course_id:     self.course_id,
      department_id: self.department_id,
      position:      self.position,
      university_id: self.university_id,
      subject_ids:   self.subject_ids.into_iter().collect(),
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

// ─── Row mappers ─────────────────────────────────────────────────────────────

pub const DEPARTMENT_COLUMNS: &str = "id, name, principal_id, dean_id, admin_id";

pub fn department_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Department> {
  Ok(Department {
    id:           row.get(0)?,
    name:         row.get(1)?,
    principal_id: row.get(2)?,
    dean_id:      row.get(3)?,
    admin_id:     row.get(4)?,
  })
}

pub const COURSE_COLUMNS: &str = "id, name, department_id, hod_id";

pub fn course_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Course> {
  Ok(Course {
    id:            row.get(0)?,
    name:          row.get(1)?,
    department_id: row.get(2)?,
    hod_id:        row.get(3)?,
  })
}

pub const SUBJECT_COLUMNS: &str = "id, name, course_id";

pub fn subject_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Subject> {
  Ok(Subject {
    id:        row.get(0)?,
    name:      row.get(1)?,
    course_id: row.get(2)?,
  })
}
