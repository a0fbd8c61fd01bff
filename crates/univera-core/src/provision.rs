//! The provisioning workflow.
//!
//! [`Provisioner::provision`] runs a fixed sequence of steps against the
//! identity system and the relational store:
//!
//! 1. pre-flight: every referenced role, unit and subject must exist;
//! 2. resolve the external identity by email, creating it if absent;
//! 3. create the local user, or union the requested roles into it;
//! 4. apply the leadership capacities the grant confers;
//! 5. upsert the faculty record for faculty profiles.
//!
//! Each completed step records its inverse in a journal. If a later step
//! fails the journal is replayed newest-first, so a failed call leaves
//! neither an orphaned external account nor a half-configured user behind.

use std::{collections::BTreeSet, fmt, sync::Arc};

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::{
  AssignmentError, BoxError, ProvisionError, Result,
  directory::Directory,
  identity::IdentityProvider,
  org::Assignment,
  person::{
    FacultyRecord, IdentityRecord, LocalUser, NewFaculty, NewIdentity, NewLocalUser,
    PersonProfile,
  },
  role::{Capacity, RoleId, UnitKind},
};

// ─── Outcomes ────────────────────────────────────────────────────────────────

/// The result of a successful [`Provisioner::provision`] call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Provisioned {
  pub identity:         IdentityRecord,
  /// `false` when an existing account with the same email was reused.
  pub identity_created: bool,
  pub user:             LocalUser,
  pub faculty:          Option<FacultyRecord>,
}

/// The result of a successful [`Provisioner::deprovision`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Deprovisioned {
  pub identity_deleted: bool,
  pub local_deleted:    bool,
}

// ─── Journal ─────────────────────────────────────────────────────────────────

/// The inverse of one completed step.
#[derive(Debug)]
enum Undo {
  DeleteIdentity(String),
  DeleteUser(String),
  DisconnectRoles {
    user_id: String,
    roles:   BTreeSet<RoleId>,
  },
  RestoreHolder {
    capacity: Capacity,
    unit_id:  i64,
    previous: Option<String>,
  },
}

impl fmt::Display for Undo {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::DeleteIdentity(id) => write!(f, "delete identity {id}"),
      Self::DeleteUser(id) => write!(f, "delete local user {id}"),
      Self::DisconnectRoles { user_id, roles } => {
        write!(f, "disconnect {} role(s) from {user_id}", roles.len())
      }
      Self::RestoreHolder { capacity, unit_id, .. } => {
        write!(f, "restore {capacity} of {} {unit_id}", capacity.unit_kind())
      }
    }
  }
}

// ─── Provisioner ─────────────────────────────────────────────────────────────

/// Orchestrates user provisioning across an [`IdentityProvider`] and a
/// [`Directory`].
pub struct Provisioner<D, I> {
  directory: Arc<D>,
  identity:  Arc<I>,
}

impl<D, I> Clone for Provisioner<D, I> {
  fn clone(&self) -> Self {
    Self {
      directory: Arc::clone(&self.directory),
      identity:  Arc::clone(&self.identity),
    }
  }
}

impl<D, I> Provisioner<D, I>
where
  D: Directory,
  I: IdentityProvider,
{
  pub fn new(directory: Arc<D>, identity: Arc<I>) -> Self {
    Self { directory, identity }
  }

  pub fn directory(&self) -> &Arc<D> { &self.directory }

  pub fn identity(&self) -> &Arc<I> { &self.identity }

  /// Provision `profile`. See the module docs for the step sequence.
  pub async fn provision(&self, profile: PersonProfile) -> Result<Provisioned> {
    let profile = profile.validated()?;
    self.preflight(&profile).await?;

    let mut journal = Vec::new();
    match self.run(&profile, &mut journal).await {
      Ok(provisioned) => {
        info!(
          email = %profile.email,
          user_id = %provisioned.user.id,
          identity_created = provisioned.identity_created,
          faculty = provisioned.faculty.is_some(),
          "user provisioned"
        );
        Ok(provisioned)
      }
      Err(e) => {
        warn!(
          email = %profile.email,
          error = %e,
          steps = journal.len(),
          "provisioning failed; compensating"
        );
        self.compensate(journal).await;
        Err(e)
      }
    }
  }

  /// Delete the local user with id `user_id`, then its external account.
  ///
  /// The local record goes first so a failure never leaves a user the
  /// identity system no longer knows about.
  pub async fn deprovision(&self, user_id: &str) -> Result<Deprovisioned> {
    let local_deleted = self
      .directory
      .delete_user(user_id)
      .await
      .map_err(ProvisionError::local)?;
    let identity_deleted = match self.identity.delete_account(user_id).await {
      Ok(deleted) => deleted,
      Err(e) => {
        error!(user_id, local_deleted, error = %e, "external account left behind");
        return Err(ProvisionError::IdentityDeletion(Box::new(e)));
      }
    };

    if !identity_deleted && !local_deleted {
      return Err(ProvisionError::UserNotFound(user_id.to_owned()));
    }
    info!(user_id, identity_deleted, local_deleted, "user deprovisioned");
    Ok(Deprovisioned { identity_deleted, local_deleted })
  }

  /// Place an existing local user in `capacity` of the matching unit.
  pub async fn assign(
    &self,
    capacity: Capacity,
    unit_id: i64,
    user_id: &str,
  ) -> Result<Assignment> {
    if user_id.is_empty() {
      return Err(AssignmentError::MissingIdentifier { capacity, field: "userId" }.into());
    }
    if unit_id <= 0 {
      return Err(missing_unit(capacity).into());
    }
    let user = self
      .directory
      .get_user(user_id)
      .await
      .map_err(ProvisionError::local)?;
    if user.is_none() {
      return Err(ProvisionError::UserNotFound(user_id.to_owned()));
    }
    self.place(capacity, unit_id, user_id).await
  }

  // ── Steps ─────────────────────────────────────────────────────────────

  async fn run(&self, profile: &PersonProfile, journal: &mut Vec<Undo>) -> Result<Provisioned> {
    let (identity, identity_created) = self.resolve_identity(profile).await?;
    if identity_created {
      journal.push(Undo::DeleteIdentity(identity.external_id.clone()));
    }

    let user = self.reconcile_user(profile, &identity, journal).await?;

    for capacity in profile.grant.capacities() {
      let unit_id = profile
        .unit_for(capacity)
        .ok_or_else(|| missing_unit(capacity))?;
      let assignment = self.place(capacity, unit_id, &user.id).await?;
      if assignment.previous_holder != assignment.holder {
        journal.push(Undo::RestoreHolder {
          capacity,
          unit_id,
          previous: assignment.previous_holder,
        });
      }
    }

    let faculty = self.materialize_faculty(profile, &user.id).await?;

    Ok(Provisioned { identity, identity_created, user, faculty })
  }

  /// Verify every reference the later steps rely on, before anything is
  /// written anywhere.
  async fn preflight(&self, profile: &PersonProfile) -> Result<()> {
    let missing_roles = self
      .directory
      .missing_roles(profile.grant.role_ids())
      .await
      .map_err(ProvisionError::local)?;
    if let Some(role) = missing_roles.first() {
      return Err(ProvisionError::UnknownReference { kind: "role", id: role.0 });
    }

    if let Some(id) = profile.department_id
      && !self.unit_exists(UnitKind::Department, id).await?
    {
      return Err(ProvisionError::UnknownReference { kind: "department", id });
    }
    if let Some(id) = profile.course_id
      && !self.unit_exists(UnitKind::Course, id).await?
    {
      return Err(ProvisionError::UnknownReference { kind: "course", id });
    }

    for capacity in profile.grant.capacities() {
      if profile.unit_for(capacity).is_none() {
        return Err(missing_unit(capacity).into());
      }
    }

    if let Some(placement) = &profile.faculty {
      let missing = self
        .directory
        .missing_subjects(&placement.subject_ids)
        .await
        .map_err(ProvisionError::local)?;
      if let Some(id) = missing.first() {
        return Err(ProvisionError::UnknownReference { kind: "subject", id: *id });
      }
    }

    Ok(())
  }

  async fn unit_exists(&self, kind: UnitKind, id: i64) -> Result<bool> {
    let exists = match kind {
      UnitKind::Department => self.directory.get_department(id).await.map(|d| d.is_some()),
      UnitKind::Course => self.directory.get_course(id).await.map(|c| c.is_some()),
    };
    exists.map_err(ProvisionError::local)
  }

  async fn resolve_identity(&self, profile: &PersonProfile) -> Result<(IdentityRecord, bool)> {
    let existing = self
      .identity
      .find_by_email(&profile.email)
      .await
      .map_err(ProvisionError::identity)?;

    if let Some(found) = existing {
      debug!(email = %profile.email, external_id = %found.external_id, "reusing identity");
      return Ok((found, false));
    }

    let created = self
      .identity
      .create_account(NewIdentity {
        name:     profile.name.clone(),
        email:    profile.email.clone(),
        password: profile.password.clone(),
        role:     profile.requested_role,
      })
      .await
      .map_err(ProvisionError::identity)?
      .ok_or_else(|| ProvisionError::IdentityCreation("identity provider returned no account".into()))?;

    debug!(email = %profile.email, external_id = %created.external_id, "identity created");
    Ok((created, true))
  }

  async fn reconcile_user(
    &self,
    profile: &PersonProfile,
    identity: &IdentityRecord,
    journal: &mut Vec<Undo>,
  ) -> Result<LocalUser> {
    let id = identity.external_id.as_str();
    let existing = self
      .directory
      .get_user(id)
      .await
      .map_err(ProvisionError::local)?;

    let Some(current) = existing else {
      let user = self
        .directory
        .create_user(NewLocalUser {
          id:            id.to_owned(),
          name:          profile.name.clone(),
          email:         profile.email.clone(),
          phone:         profile.phone.clone(),
          department_id: profile.department_id,
          role_ids:      profile.grant.role_ids().clone(),
        })
        .await
        .map_err(ProvisionError::local)?;
      journal.push(Undo::DeleteUser(user.id.clone()));
      return Ok(user);
    };

    let added: BTreeSet<RoleId> = profile
      .grant
      .role_ids()
      .difference(&current.role_ids)
      .copied()
      .collect();
    if added.is_empty() {
      return Ok(current);
    }

    let user = self
      .directory
      .connect_roles(id, &added)
      .await
      .map_err(ProvisionError::local)?
      .ok_or_else(|| ProvisionError::LocalRecord(format!("local user {id} vanished").into()))?;
    journal.push(Undo::DisconnectRoles { user_id: id.to_owned(), roles: added });
    Ok(user)
  }

  async fn place(&self, capacity: Capacity, unit_id: i64, user_id: &str) -> Result<Assignment> {
    if user_id.is_empty() {
      return Err(AssignmentError::MissingIdentifier { capacity, field: "userId" }.into());
    }
    let assignment = self
      .directory
      .assign_capacity(capacity, unit_id, Some(user_id))
      .await
      .map_err(|e| AssignmentError::Store { capacity, source: Box::new(e) })?
      .ok_or(AssignmentError::UnitNotFound { capacity, unit_id })?;
    info!(
      %capacity,
      unit_id,
      user_id,
      previous = assignment.previous_holder.as_deref().unwrap_or("-"),
      "capacity assigned"
    );
    Ok(assignment)
  }

  async fn materialize_faculty(
    &self,
    profile: &PersonProfile,
    user_id: &str,
  ) -> Result<Option<FacultyRecord>> {
    if !profile.wants_faculty_record() {
      return Ok(None);
    }
    let (Some(placement), Some(course_id), Some(department_id)) =
      (&profile.faculty, profile.course_id, profile.department_id)
    else {
      return Err(ProvisionError::Validation("faculty needs a placement".into()));
    };

    let record = self
      .directory
      .upsert_faculty(NewFaculty {
        id: user_id.to_owned(),
        course_id,
        department_id,
        position: placement.position.clone(),
        university_id: placement.university_id,
        subject_ids: placement.subject_ids.clone(),
      })
      .await
      .map_err(|e| ProvisionError::FacultyRecord(Box::new(e)))?;
    Ok(Some(record))
  }

  // ── Compensation ──────────────────────────────────────────────────────

  /// Replay `journal` newest-first. Failures are logged and skipped so one
  /// stuck inverse does not strand the others.
  async fn compensate(&self, journal: Vec<Undo>) {
    for undo in journal.into_iter().rev() {
      let outcome: std::result::Result<(), BoxError> = match &undo {
        Undo::DeleteIdentity(id) => self
          .identity
          .delete_account(id)
          .await
          .map(drop)
          .map_err(boxed),
        Undo::DeleteUser(id) => self
          .directory
          .delete_user(id)
          .await
          .map(drop)
          .map_err(boxed),
        Undo::DisconnectRoles { user_id, roles } => self
          .directory
          .disconnect_roles(user_id, roles)
          .await
          .map(drop)
          .map_err(boxed),
        Undo::RestoreHolder { capacity, unit_id, previous } => self
          .directory
          .assign_capacity(*capacity, *unit_id, previous.as_deref())
          .await
          .map(drop)
          .map_err(boxed),
      };

      match outcome {
        Ok(()) => debug!(step = %undo, "compensated"),
        Err(e) => error!(step = %undo, error = %e, "compensation failed"),
      }
    }
  }
}

fn boxed(e: impl std::error::Error + Send + Sync + 'static) -> BoxError { Box::new(e) }

fn missing_unit(capacity: Capacity) -> AssignmentError {
  let field = match capacity.unit_kind() {
    UnitKind::Department => "departmentId",
    UnitKind::Course => "courseId",
  };
  AssignmentError::MissingIdentifier { capacity, field }
}
