//! Handler for `POST /list/teacher/create`.
//!
//! Creates a faculty member: an external account, a local user holding the
//! requested roles plus the faculty role, any leadership capacities those
//! roles confer, and the faculty record itself.
//!
//! Body (camelCase; id fields accept a number or a numeric string):
//!
//! ```json
//! { "name": "A", "email": "a@x.com", "password": "p",
//!   "roleIds": [9], "departmentId": 1, "courseId": 2,
//!   "position": "Lecturer", "universityId": 3, "subjectIds": [1, 2] }
//! ```

use axum::{
  Json,
  body::Bytes,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use univera_core::{
  Provisioned, Provisioner,
  directory::Directory,
  identity::IdentityProvider,
  person::{FacultyPlacement, FacultyRecord, LocalUser, PersonProfile},
  principal::PROVISIONERS,
  role::{AccountRole, RoleGrant, RoleId},
};

use crate::{
  body::{IdField, filled, missing_fields, parse_body},
  error::ApiError,
  principal::Caller,
};

pub(crate) const CREATE_FAILED: &str = "Error creating User";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTeacherBody {
  pub name:          Option<String>,
  pub email:         Option<String>,
  pub password:      Option<String>,
  pub role_ids:      Option<Vec<i64>>,
  pub department_id: Option<IdField>,
  pub course_id:     Option<IdField>,
  pub position:      Option<String>,
  pub university_id: Option<IdField>,
  pub subject_ids:   Option<Vec<i64>>,
}

impl CreateTeacherBody {
  /// Check every required field is present and truthy, then build the
  /// profile. `subjectIds` must be present but may be empty.
  pub fn into_profile(self) -> Result<PersonProfile, ApiError> {
    let name = filled(self.name);
    let email = filled(self.email);
    let password = self.password.filter(|p| !p.is_empty());
    let role_ids = self.role_ids.filter(|r| !r.is_empty());
    let department_id = self.department_id.as_ref().and_then(IdField::value);
    let course_id = self.course_id.as_ref().and_then(IdField::value);
    let position = filled(self.position);
    let university_id = self.university_id.as_ref().and_then(IdField::value);

    match (
      name,
      email,
      password,
      role_ids,
      department_id,
      course_id,
      position,
      university_id,
      self.subject_ids,
    ) {
      (
        Some(name),
        Some(email),
        Some(password),
        Some(role_ids),
        Some(department_id),
        Some(course_id),
        Some(position),
        Some(university_id),
        Some(subject_ids),
      ) => Ok(PersonProfile {
        name,
        email,
        password,
        phone: String::new(),
        requested_role: AccountRole::Faculty,
        grant: RoleGrant::from_role_ids(role_ids.into_iter().map(RoleId))
          .with_role(RoleId::FACULTY),
        department_id: Some(department_id),
        course_id: Some(course_id),
        faculty: Some(FacultyPlacement {
          position,
          university_id,
          subject_ids: subject_ids.into_iter().collect(),
        }),
      }),
      (
        name,
        email,
        password,
        role_ids,
        department_id,
        course_id,
        position,
        university_id,
        subject_ids,
      ) => Err(missing_fields(&[
        ("name", name.is_some()),
        ("email", email.is_some()),
        ("password", password.is_some()),
        ("roleIds", role_ids.is_some()),
        ("departmentId", department_id.is_some()),
        ("courseId", course_id.is_some()),
        ("position", position.is_some()),
        ("universityId", university_id.is_some()),
        ("subjectIds", subject_ids.is_some()),
      ])),
    }
  }
}

// ─── Response ────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedBody {
  pub message:          &'static str,
  pub identity_created: bool,
  pub user:             LocalUser,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub faculty:          Option<FacultyRecord>,
}

/// 201 with the created (or extended) user.
pub(crate) fn created(provisioned: Provisioned) -> (StatusCode, Json<CreatedBody>) {
  let message = if provisioned.faculty.is_some() {
    "Faculty created successfully"
  } else {
    "User created successfully"
  };
  (
    StatusCode::CREATED,
    Json(CreatedBody {
      message,
      identity_created: provisioned.identity_created,
      user: provisioned.user,
      faculty: provisioned.faculty,
    }),
  )
}

// ─── Handler ─────────────────────────────────────────────────────────────────

/// `POST /list/teacher/create`
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
  let profile = parse_body::<CreateTeacherBody>(&body)?.into_profile()?;

  let provisioned = provisioner
    .provision(profile)
    .await
    .map_err(|e| ApiError::provisioning(CREATE_FAILED, e))?;
  Ok(created(provisioned))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn full() -> CreateTeacherBody {
    serde_json::from_value(serde_json::json!({
      "name": "A", "email": "a@x.com", "password": "p",
      "roleIds": [9], "departmentId": "1", "courseId": 2,
      "position": "Lecturer", "universityId": 3, "subjectIds": [1, 2],
    }))
    .unwrap()
  }

  #[test]
  fn faculty_role_is_appended() {
    let profile = full().into_profile().unwrap();
    let ids: Vec<i64> = profile.grant.role_ids().iter().map(|r| r.0).collect();
    assert_eq!(ids, vec![4, 9]);
    assert_eq!(profile.requested_role, AccountRole::Faculty);
    assert_eq!(profile.department_id, Some(1));
    assert!(profile.phone.is_empty());
  }

  #[test]
  fn falsy_fields_are_missing() {
    let mut body = full();
    body.role_ids = Some(vec![]);
    body.position = Some(" ".into());
    body.university_id = Some(IdField::Number(0));
    let err = body.into_profile().unwrap_err();
    assert!(matches!(
      err,
      ApiError::BadRequest(m) if m == "Missing required fields: roleIds, position, universityId"
    ));
  }

  #[test]
  fn empty_subject_list_is_allowed_but_absent_is_not() {
    let mut body = full();
    body.subject_ids = Some(vec![]);
    assert!(body.into_profile().is_ok());

    let mut body = full();
    body.subject_ids = None;
    assert!(body.into_profile().is_err());
  }
}
