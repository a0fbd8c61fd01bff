//! Error types for `univera-core`.

use thiserror::Error;

use crate::role::Capacity;

/// Opaque error from a collaborator (identity system or relational store).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum ProvisionError {
  #[error("invalid profile: {0}")]
  Validation(String),

  #[error("unknown {kind} {id}")]
  UnknownReference { kind: &'static str, id: i64 },

  #[error("identity creation failed: {0}")]
  IdentityCreation(#[source] BoxError),

  #[error("identity deletion failed: {0}")]
  IdentityDeletion(#[source] BoxError),

  #[error("local record error: {0}")]
  LocalRecord(#[source] BoxError),

  #[error("assignment error: {0}")]
  Assignment(#[from] AssignmentError),

  #[error("faculty record error: {0}")]
  FacultyRecord(#[source] BoxError),

  #[error("user not found: {0}")]
  UserNotFound(String),
}

impl ProvisionError {
  pub(crate) fn identity(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::IdentityCreation(Box::new(e))
  }

  pub(crate) fn local(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::LocalRecord(Box::new(e))
  }
}

/// Failure to place a user in a leadership capacity of an organizational unit.
#[derive(Debug, Error)]
pub enum AssignmentError {
  #[error("{field} is required to assign {capacity}")]
  MissingIdentifier {
    capacity: Capacity,
    field:    &'static str,
  },

  #[error("no {} with id {unit_id} to assign {capacity}", .capacity.unit_kind())]
  UnitNotFound { capacity: Capacity, unit_id: i64 },

  #[error("store error while assigning {capacity}: {source}")]
  Store {
    capacity: Capacity,
    #[source]
    source:   BoxError,
  },
}

pub type Result<T, E = ProvisionError> = std::result::Result<T, E>;
