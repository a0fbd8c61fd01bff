//! The already-verified caller of an operation.

use crate::role::AccountRole;

/// Roles allowed to create users.
pub const PROVISIONERS: &[AccountRole] =
  &[AccountRole::DepartmentAdmin, AccountRole::SuperUser];

/// Roles allowed to delete users, assign department admins and edit the
/// catalog.
pub const SUPER_USERS: &[AccountRole] = &[AccountRole::SuperUser];

/// Account roles that only a super user may hand out.
pub const PRIVILEGED: &[AccountRole] =
  &[AccountRole::SuperUser, AccountRole::Admin, AccountRole::DepartmentAdmin];

/// The caller of an operation, as established by whatever front layer
/// verified its session. Nothing in this crate re-checks it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Principal {
  /// External identity id of the caller, when known.
  pub subject: Option<String>,
  /// `None` when the claim is absent or not a known role.
  pub role:    Option<AccountRole>,
}

impl Principal {
  /// Build a principal from a raw role claim. Unknown claims yield no role.
  pub fn from_claim(subject: Option<String>, role_claim: Option<&str>) -> Self {
    Self {
      subject,
      role: role_claim.and_then(|r| r.trim().parse().ok()),
    }
  }

  pub fn has_any_role(&self, allowed: &[AccountRole]) -> bool {
    self.role.is_some_and(|r| allowed.contains(&r))
  }

  /// Whether this principal may create an account carrying `role`.
  pub fn may_grant(&self, role: AccountRole) -> bool {
    if PRIVILEGED.contains(&role) {
      self.has_any_role(SUPER_USERS)
    } else {
      self.has_any_role(PROVISIONERS)
    }
  }
}
