//! Catalog entities: roles, departments, courses and subjects.

use serde::{Deserialize, Serialize};

use crate::role::{Capacity, RoleId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
  pub id:   RoleId,
  pub name: String,
}

/// Input for a new role. `id` is only given for well-known roles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRole {
  pub id:   Option<RoleId>,
  pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
  pub id:           i64,
  pub name:         String,
  pub principal_id: Option<String>,
  pub dean_id:      Option<String>,
  pub admin_id:     Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDepartment {
  pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
  pub id:            i64,
  pub name:          String,
  pub department_id: i64,
  pub hod_id:        Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCourse {
  pub name:          String,
  pub department_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
  pub id:        i64,
  pub name:      String,
  pub course_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSubject {
  pub name:      String,
  pub course_id: Option<i64>,
}

/// Result of placing a holder in a capacity: who held it before.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
  pub capacity:        Capacity,
  pub unit_id:         i64,
  pub holder:          Option<String>,
  pub previous_holder: Option<String>,
}

impl Department {
  /// Current holder of a department-level capacity.
  pub fn holder(&self, capacity: Capacity) -> Option<&str> {
    match capacity {
      Capacity::Principal => self.principal_id.as_deref(),
      Capacity::Dean => self.dean_id.as_deref(),
      Capacity::Admin => self.admin_id.as_deref(),
      Capacity::HeadOfDepartment => None,
    }
  }
}
