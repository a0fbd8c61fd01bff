//! People as seen by the provisioning workflow: the transient profile, the
//! external identity, the local user record and the faculty extension.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  ProvisionError, Result,
  role::{AccountRole, Capacity, RoleGrant, RoleId, UnitKind},
};

// ─── Input ───────────────────────────────────────────────────────────────────

/// Where a faculty member teaches. Only meaningful for
/// [`AccountRole::Faculty`] profiles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacultyPlacement {
  pub position:      String,
  pub university_id: i64,
  pub subject_ids:   BTreeSet<i64>,
}

/// Everything needed to provision one person. Never persisted.
#[derive(Debug, Clone)]
pub struct PersonProfile {
  pub name:           String,
  pub email:          String,
  pub password:       String,
  pub phone:          String,
  pub requested_role: AccountRole,
  pub grant:          RoleGrant,
  pub department_id:  Option<i64>,
  pub course_id:      Option<i64>,
  pub faculty:        Option<FacultyPlacement>,
}

impl PersonProfile {
  /// Normalise the profile and check it is internally consistent.
  ///
  /// Emails are compared case-insensitively by both stores, so they are
  /// trimmed and lower-cased here.
  pub fn validated(mut self) -> Result<Self> {
    self.name = self.name.trim().to_owned();
    self.email = self.email.trim().to_lowercase();

    if self.name.is_empty() {
      return Err(invalid("name is required"));
    }
    match self.email.split_once('@') {
      Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {}
      _ => return Err(invalid("email is not a valid address")),
    }
    if self.password.is_empty() {
      return Err(invalid("password is required"));
    }
    if self.department_id.is_some_and(|id| id <= 0) {
      return Err(invalid("departmentId must be positive"));
    }
    if self.course_id.is_some_and(|id| id <= 0) {
      return Err(invalid("courseId must be positive"));
    }

    match (&self.faculty, self.requested_role) {
      (Some(placement), AccountRole::Faculty) => {
        if placement.position.trim().is_empty() {
          return Err(invalid("position is required for faculty"));
        }
        if placement.university_id <= 0 {
          return Err(invalid("universityId must be positive"));
        }
        if self.department_id.is_none() || self.course_id.is_none() {
          return Err(invalid("faculty needs a departmentId and a courseId"));
        }
      }
      (None, AccountRole::Faculty) => {
        return Err(invalid("faculty needs a placement"));
      }
      (Some(_), role) => {
        return Err(invalid(format!("a placement is only valid for faculty, not {role}")));
      }
      (None, _) => {}
    }

    Ok(self)
  }

  /// The unit id this profile names for `capacity`, if any.
  pub fn unit_for(&self, capacity: Capacity) -> Option<i64> {
    match capacity.unit_kind() {
      UnitKind::Department => self.department_id,
      UnitKind::Course => self.course_id,
    }
  }

  pub fn wants_faculty_record(&self) -> bool {
    self.requested_role == AccountRole::Faculty
  }
}

fn invalid(message: impl Into<String>) -> ProvisionError {
  ProvisionError::Validation(message.into())
}

// ─── Identity system ─────────────────────────────────────────────────────────

/// Input for a new external account.
#[derive(Debug, Clone)]
pub struct NewIdentity {
  pub name:     String,
  pub email:    String,
  pub password: String,
  pub role:     AccountRole,
}

/// An account in the external identity system, keyed by email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityRecord {
  pub external_id: String,
  pub name:        String,
  pub email:       String,
  /// Role metadata; absent or unrecognised on accounts made elsewhere.
  pub role:        Option<AccountRole>,
}

// ─── Relational store ────────────────────────────────────────────────────────

/// Input for a new local user. `id` is the external identity id.
#[derive(Debug, Clone)]
pub struct NewLocalUser {
  pub id:            String,
  pub name:          String,
  pub email:         String,
  pub phone:         String,
  pub department_id: Option<i64>,
  pub role_ids:      BTreeSet<RoleId>,
}

/// The local user record. Its `id` always equals the external identity id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalUser {
  pub id:            String,
  pub name:          String,
  pub email:         String,
  pub phone:         String,
  pub department_id: Option<i64>,
  pub role_ids:      BTreeSet<RoleId>,
  pub created_at:    DateTime<Utc>,
}

/// Input for a faculty upsert.
#[derive(Debug, Clone)]
pub struct NewFaculty {
  pub id:            String,
  pub course_id:     i64,
  pub department_id: i64,
  pub position:      String,
  pub university_id: i64,
  pub subject_ids:   BTreeSet<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacultyRecord {
  pub id:            String,
  pub course_id:     i64,
  pub department_id: i64,
  pub position:      String,
  pub university_id: i64,
  pub subject_ids:   BTreeSet<i64>,
  pub created_at:    DateTime<Utc>,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn student() -> PersonProfile {
    PersonProfile {
      name:           "  Ada ".into(),
      email:          " Ada@Example.COM ".into(),
      password:       "pw".into(),
      phone:          String::new(),
      requested_role: AccountRole::Student,
      grant:          RoleGrant::default(),
      department_id:  None,
      course_id:      None,
      faculty:        None,
    }
  }

  #[test]
  fn normalises_name_and_email() {
    let p = student().validated().unwrap();
    assert_eq!(p.name, "Ada");
    assert_eq!(p.email, "ada@example.com");
  }

  #[test]
  fn rejects_bad_email() {
    let mut p = student();
    p.email = "nobody".into();
    assert!(matches!(p.validated(), Err(ProvisionError::Validation(_))));
  }

  #[test]
  fn faculty_requires_placement_and_units() {
    let mut p = student();
    p.requested_role = AccountRole::Faculty;
    assert!(p.clone().validated().is_err());

    p.faculty = Some(FacultyPlacement {
      position:      "Lecturer".into(),
      university_id: 1,
      subject_ids:   BTreeSet::new(),
    });
    assert!(p.clone().validated().is_err());

    p.department_id = Some(1);
    p.course_id = Some(2);
    assert!(p.validated().is_ok());
  }

  #[test]
  fn placement_on_non_faculty_is_rejected() {
    let mut p = student();
    p.faculty = Some(FacultyPlacement {
      position:      "Lecturer".into(),
      university_id: 1,
      subject_ids:   BTreeSet::new(),
    });
    assert!(p.validated().is_err());
  }

  #[test]
  fn unit_for_follows_capacity_kind() {
    let mut p = student();
    p.department_id = Some(3);
    p.course_id = Some(7);
    assert_eq!(p.unit_for(Capacity::Principal), Some(3));
    assert_eq!(p.unit_for(Capacity::HeadOfDepartment), Some(7));
  }
}
