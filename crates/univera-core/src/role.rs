//! Role identifiers, account roles and leadership capacities.
//!
//! Three reserved role ids confer a leadership capacity over an
//! organizational unit. They are translated into [`Capacity`] values once, by
//! [`RoleGrant::from_role_ids`], so nothing downstream branches on bare
//! integers.

use std::{collections::BTreeSet, fmt};

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

// ─── RoleId ──────────────────────────────────────────────────────────────────

/// Primary key of a row in the relational `roles` table.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RoleId(pub i64);

impl RoleId {
  pub const FACULTY: RoleId = RoleId(4);
  pub const PRINCIPAL: RoleId = RoleId(9);
  pub const HEAD_OF_DEPARTMENT: RoleId = RoleId(10);
  pub const DEAN: RoleId = RoleId(11);
}

impl fmt::Display for RoleId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

// ─── Organizational units ────────────────────────────────────────────────────

/// The kind of organizational unit a capacity is held over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum UnitKind {
  Department,
  Course,
}

/// A single-holder leadership capacity of an organizational unit.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Capacity {
  /// Principal of a department.
  Principal,
  /// Head of a course.
  HeadOfDepartment,
  /// Dean of a department.
  Dean,
  /// Administrator of a department. Never conferred by a role id.
  Admin,
}

impl Capacity {
  /// The capacity conferred by a reserved role id, if any.
  pub fn from_role_id(id: RoleId) -> Option<Self> {
    match id {
      RoleId::PRINCIPAL => Some(Self::Principal),
      RoleId::HEAD_OF_DEPARTMENT => Some(Self::HeadOfDepartment),
      RoleId::DEAN => Some(Self::Dean),
      _ => None,
    }
  }

  pub fn unit_kind(self) -> UnitKind {
    match self {
      Self::Principal | Self::Dean | Self::Admin => UnitKind::Department,
      Self::HeadOfDepartment => UnitKind::Course,
    }
  }
}

// ─── Account roles ───────────────────────────────────────────────────────────

/// The coarse role carried in identity-system metadata and session claims.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AccountRole {
  SuperUser,
  Admin,
  DepartmentAdmin,
  UniversityAdminStaff,
  Faculty,
  Student,
  Staff,
}

// ─── Grants ──────────────────────────────────────────────────────────────────

/// A requested set of role ids together with the capacities they confer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleGrant {
  role_ids:   BTreeSet<RoleId>,
  capacities: BTreeSet<Capacity>,
}

impl RoleGrant {
  pub fn from_role_ids(ids: impl IntoIterator<Item = RoleId>) -> Self {
    let role_ids: BTreeSet<RoleId> = ids.into_iter().collect();
    let capacities = role_ids
      .iter()
      .copied()
      .filter_map(Capacity::from_role_id)
      .collect();
    Self { role_ids, capacities }
  }

  /// Add one more role id, translating it if it is reserved.
  pub fn with_role(mut self, id: RoleId) -> Self {
    self.role_ids.insert(id);
    if let Some(capacity) = Capacity::from_role_id(id) {
      self.capacities.insert(capacity);
    }
    self
  }

  pub fn role_ids(&self) -> &BTreeSet<RoleId> { &self.role_ids }

  pub fn capacities(&self) -> impl Iterator<Item = Capacity> + '_ {
    self.capacities.iter().copied()
  }

  pub fn confers(&self, capacity: Capacity) -> bool {
    self.capacities.contains(&capacity)
  }
}
