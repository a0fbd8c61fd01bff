//! Handlers for `/users` and `/faculty` endpoints.
//!
//! | Method   | Path            | Notes |
//! |----------|-----------------|-------|
//! | `POST`   | `/users`        | Privileged roles need a super user; faculty need a placement |
//! | `GET`    | `/users/{id}`   | 404 if not found |
//! | `DELETE` | `/users/{id}`   | Removes the external account and the local user |
//! | `GET`    | `/faculty/{id}` | 404 if not found |

use axum::{
  Json,
  body::Bytes,
  extract::{Path, State},
  response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use univera_core::{
  Provisioner,
  directory::Directory,
  identity::IdentityProvider,
  person::{FacultyPlacement, FacultyRecord, LocalUser, PersonProfile},
  principal::{PROVISIONERS, SUPER_USERS},
  provision::Deprovisioned,
  role::{AccountRole, RoleGrant, RoleId},
};

use crate::{
  body::{IdField, filled, missing_fields, parse_body},
  error::ApiError,
  principal::Caller,
  teachers::{CREATE_FAILED, created},
};

// ─── Create ──────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserBody {
  pub name:          Option<String>,
  pub email:         Option<String>,
  pub password:      Option<String>,
  pub phone:         Option<String>,
  /// Account role, e.g. `"student"` or `"faculty"`.
  pub role:          Option<String>,
  #[serde(default)]
  pub role_ids:      Vec<i64>,
  pub department_id: Option<IdField>,
  pub course_id:     Option<IdField>,
  pub position:      Option<String>,
  pub university_id: Option<IdField>,
  #[serde(default)]
  pub subject_ids:   Vec<i64>,
}

impl CreateUserBody {
  pub fn into_profile(self) -> Result<PersonProfile, ApiError> {
    let (Some(name), Some(email), Some(password), Some(role)) = (
      filled(self.name),
      filled(self.email),
      self.password.filter(|p| !p.is_empty()),
      filled(self.role),
    ) else {
      return Err(ApiError::BadRequest(
        "Missing required fields: name, email, password and role are required".into(),
      ));
    };
    let requested_role: AccountRole = role
      .trim()
      .parse()
      .map_err(|_| ApiError::BadRequest(format!("unknown role {role:?}")))?;

    let mut grant = RoleGrant::from_role_ids(self.role_ids.into_iter().map(RoleId));
    let faculty = if requested_role == AccountRole::Faculty {
      grant = grant.with_role(RoleId::FACULTY);
      let position = filled(self.position);
      let university_id = self.university_id.as_ref().and_then(IdField::value);
      let (Some(position), Some(university_id)) = (&position, university_id) else {
        return Err(missing_fields(&[
          ("position", position.is_some()),
          ("universityId", university_id.is_some()),
        ]));
      };
      Some(FacultyPlacement {
        position: position.clone(),
        university_id,
        subject_ids: self.subject_ids.into_iter().collect(),
      })
    } else {
      None
    };

    Ok(PersonProfile {
      name,
      email,
      password,
      phone: self.phone.unwrap_or_default(),
      requested_role,
      grant,
      department_id: self.department_id.as_ref().and_then(IdField::value),
      course_id: self.course_id.as_ref().and_then(IdField::value),
      faculty,
    })
  }
}

/// `POST /users`
pub async fn create<D, I>(
  State(provisioner): State<Provisioner<D, I>>,
  caller: Caller,
  body: Bytes,
) -> Result<impl IntoResponse, ApiError>
where
  D: Directory + 'static,
  I: IdentityProvider + 'static,
{
  caller.require(PROVISIONERS)?;
  let profile = parse_body::<CreateUserBody>(&body)?.into_profile()?;
  if !caller.0.may_grant(profile.requested_role) {
    tracing::warn!(role = %profile.requested_role, "caller may not grant role");
    return Err(ApiError::Unauthorized);
  }

  let provisioned = provisioner
    .provision(profile)
    .await
    .map_err(|e| ApiError::provisioning(CREATE_FAILED, e))?;
  Ok(created(provisioned))
}

// ─── Read ────────────────────────────────────────────────────────────────────

/// `GET /users/{id}`
pub async fn get_one<D, I>(
  State(provisioner): State<Provisioner<D, I>>,
  caller: Caller,
  Path(id): Path<String>,
) -> Result<Json<LocalUser>, ApiError>
where
  D: Directory + 'static,
  I: IdentityProvider + 'static,
{
  caller.require_known()?;
  let user = provisioner
    .directory()
    .get_user(&id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("user {id} not found")))?;
  Ok(Json(user))
}

/// `GET /faculty/{id}`
pub async fn get_faculty<D, I>(
  State(provisioner): State<Provisioner<D, I>>,
  caller: Caller,
  Path(id): Path<String>,
) -> Result<Json<FacultyRecord>, ApiError>
where
  D: Directory + 'static,
  I: IdentityProvider + 'static,
{
  caller.require_known()?;
  let faculty = provisioner
    .directory()
    .get_faculty(&id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("faculty {id} not found")))?;
  Ok(Json(faculty))
}

// ─── Delete ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedBody {
  pub message: &'static str,
  #[serde(flatten)]
  pub outcome: Deprovisioned,
}

/// `DELETE /users/{id}`
pub async fn delete_one<D, I>(
  State(provisioner): State<Provisioner<D, I>>,
  caller: Caller,
  Path(id): Path<String>,
) -> Result<Json<DeletedBody>, ApiError>
where
  D: Directory + 'static,
  I: IdentityProvider + 'static,
{
  caller.require(SUPER_USERS)?;
  let outcome = provisioner
    .deprovision(&id)
    .await
    .map_err(|e| ApiError::lookup("Error deleting User", e))?;
  Ok(Json(DeletedBody { message: "User deleted successfully", outcome }))
}
