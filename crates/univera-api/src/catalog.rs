//! Handlers for the academic catalog.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/roles`, `/departments`, `/courses`, `/subjects` | Any known caller |
//! | `POST` | `/roles` | Body: `{"id"?: 12, "name": "..."}`; super users only |
//! | `POST` | `/departments` | Body: `{"name": "..."}`; super users only |
//! | `POST` | `/courses` | Body: `{"name": "...", "departmentId": 1}`; super users only |
//! | `POST` | `/subjects` | Body: `{"name": "...", "courseId"?: 1}`; super users only |
//! | `GET`  | `/departments/{id}`, `/courses/{id}` | Includes capacity holders |
//! | `POST` | `/departments/{id}/admin` | Body: `{"userId": "..."}`; super users only |

use axum::{
  Json,
  body::Bytes,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use univera_core::{
  Provisioner,
  directory::Directory,
  identity::IdentityProvider,
  org::{
    Assignment, Course, Department, NewCourse, NewDepartment, NewRole, NewSubject,
    Role, Subject,
  },
  principal::SUPER_USERS,
  role::{Capacity, RoleId},
};

use crate::{
  body::{IdField, filled, parse_body},
  error::ApiError,
  principal::Caller,
};

// ─── Roles ───────────────────────────────────────────────────────────────────

/// `GET /roles`
pub async fn list_roles<D, I>(
  State(provisioner): State<Provisioner<D, I>>,
  caller: Caller,
) -> Result<Json<Vec<Role>>, ApiError>
where
  D: Directory + 'static,
  I: IdentityProvider + 'static,
{
  caller.require_known()?;
  let roles = provisioner.directory().list_roles().await.map_err(ApiError::store)?;
  Ok(Json(roles))
}

#[derive(Debug, Deserialize)]
pub struct CreateRoleBody {
  pub id:   Option<i64>,
  pub name: Option<String>,
}

/// `POST /roles`
pub async fn create_role<D, I>(
  State(provisioner): State<Provisioner<D, I>>,
  caller: Caller,
  body: Bytes,
) -> Result<impl IntoResponse, ApiError>
where
  D: Directory + 'static,
  I: IdentityProvider + 'static,
{
  caller.require(SUPER_USERS)?;
  let body: CreateRoleBody = parse_body(&body)?;
  let name = filled(body.name).ok_or_else(|| ApiError::BadRequest("name is required".into()))?;
  if body.id.is_some_and(|id| id <= 0) {
    return Err(ApiError::BadRequest("id must be positive".into()));
  }

  let name = name.trim().to_owned();
  let id = body.id.map(RoleId);

  let directory = provisioner.directory();
  let existing = directory.list_roles().await.map_err(ApiError::store)?;
  if let Some(taken) = existing
    .iter()
    .find(|r| r.name == name || Some(r.id) == id)
  {
    return Err(ApiError::BadRequest(format!(
      "role {} ({}) already exists",
      taken.id, taken.name
    )));
  }

  let role = directory
    .add_role(NewRole { id, name })
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(role)))
}

// ─── Departments ─────────────────────────────────────────────────────────────

/// `GET /departments`
pub async fn list_departments<D, I>(
  State(provisioner): State<Provisioner<D, I>>,
  caller: Caller,
) -> Result<Json<Vec<Department>>, ApiError>
where
  D: Directory + 'static,
  I: IdentityProvider + 'static,
{
  caller.require_known()?;
  let departments = provisioner
    .directory()
    .list_departments()
    .await
    .map_err(ApiError::store)?;
  Ok(Json(departments))
}

#[derive(Debug, Deserialize)]
pub struct CreateDepartmentBody {
  pub name: Option<String>,
}

/// `POST /departments`
pub async fn create_department<D, I>(
  State(provisioner): State<Provisioner<D, I>>,
  caller: Caller,
  body: Bytes,
) -> Result<impl IntoResponse, ApiError>
where
  D: Directory + 'static,
  I: IdentityProvider + 'static,
{
  caller.require(SUPER_USERS)?;
  let body: CreateDepartmentBody = parse_body(&body)?;
  let name = filled(body.name).ok_or_else(|| ApiError::BadRequest("name is required".into()))?;

  let department = provisioner
    .directory()
    .add_department(NewDepartment { name: name.trim().to_owned() })
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(department)))
}

/// `GET /departments/{id}`
pub async fn get_department<D, I>(
  State(provisioner): State<Provisioner<D, I>>,
  caller: Caller,
  Path(id): Path<i64>,
) -> Result<Json<Department>, ApiError>
where
  D: Directory + 'static,
  I: IdentityProvider + 'static,
{
  caller.require_known()?;
  let department = provisioner
    .directory()
    .get_department(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("department {id} not found")))?;
  Ok(Json(department))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignAdminBody {
  pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AssignedBody {
  pub message:    &'static str,
  pub assignment: Assignment,
}

/// `POST /departments/{id}/admin`
pub async fn assign_admin<D, I>(
  State(provisioner): State<Provisioner<D, I>>,
  caller: Caller,
  Path(id): Path<i64>,
  body: Bytes,
) -> Result<Json<AssignedBody>, ApiError>
where
  D: Directory + 'static,
  I: IdentityProvider + 'static,
{
  caller.require(SUPER_USERS)?;
  let body: AssignAdminBody = parse_body(&body)?;
  let user_id = filled(body.user_id).unwrap_or_default();

  let assignment = provisioner
    .assign(Capacity::Admin, id, user_id.trim())
    .await
    .map_err(|e| ApiError::lookup("Error assigning admin", e))?;
  Ok(Json(AssignedBody { message: "Admin assigned successfully", assignment }))
}

// ─── Courses ─────────────────────────────────────────────────────────────────

/// `GET /courses`
pub async fn list_courses<D, I>(
  State(provisioner): State<Provisioner<D, I>>,
  caller: Caller,
) -> Result<Json<Vec<Course>>, ApiError>
where
  D: Directory + 'static,
  I: IdentityProvider + 'static,
{
  caller.require_known()?;
  let courses = provisioner.directory().list_courses().await.map_err(ApiError::store)?;
  Ok(Json(courses))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCourseBody {
  pub name:          Option<String>,
  pub department_id: Option<IdField>,
}

/// `POST /courses`
pub async fn create_course<D, I>(
  State(provisioner): State<Provisioner<D, I>>,
  caller: Caller,
  body: Bytes,
) -> Result<impl IntoResponse, ApiError>
where
  D: Directory + 'static,
  I: IdentityProvider + 'static,
{
  caller.require(SUPER_USERS)?;
  let body: CreateCourseBody = parse_body(&body)?;
  let (Some(name), Some(department_id)) = (
    filled(body.name),
    body.department_id.as_ref().and_then(IdField::value),
  ) else {
    return Err(ApiError::BadRequest("name and departmentId are required".into()));
  };

  let directory = provisioner.directory();
  if directory
    .get_department(department_id)
    .await
    .map_err(ApiError::store)?
    .is_none()
  {
    return Err(ApiError::BadRequest(format!("unknown department {department_id}")));
  }

  let course = directory
    .add_course(NewCourse { name: name.trim().to_owned(), department_id })
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(course)))
}

/// `GET /courses/{id}`
pub async fn get_course<D, I>(
  State(provisioner): State<Provisioner<D, I>>,
  caller: Caller,
  Path(id): Path<i64>,
) -> Result<Json<Course>, ApiError>
where
  D: Directory + 'static,
  I: IdentityProvider + 'static,
{
  caller.require_known()?;
  let course = provisioner
    .directory()
    .get_course(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("course {id} not found")))?;
  Ok(Json(course))
}

// ─── Subjects ────────────────────────────────────────────────────────────────

/// `GET /subjects`
pub async fn list_subjects<D, I>(
  State(provisioner): State<Provisioner<D, I>>,
  caller: Caller,
) -> Result<Json<Vec<Subject>>, ApiError>
where
  D: Directory + 'static,
  I: IdentityProvider + 'static,
{
  caller.require_known()?;
  let subjects = provisioner.directory().list_subjects().await.map_err(ApiError::store)?;
  Ok(Json(subjects))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubjectBody {
  pub name:      Option<String>,
  pub course_id: Option<IdField>,
}

/// `POST /subjects`
pub async fn create_subject<D, I>(
  State(provisioner): State<Provisioner<D, I>>,
  caller: Caller,
  body: Bytes,
) -> Result<impl IntoResponse, ApiError>
where
  D: Directory + 'static,
  I: IdentityProvider + 'static,
{
  caller.require(SUPER_USERS)?;
  let body: CreateSubjectBody = parse_body(&body)?;
  let name = filled(body.name).ok_or_else(|| ApiError::BadRequest("name is required".into()))?;
  let course_id = body.course_id.as_ref().and_then(IdField::value);

  let directory = provisioner.directory();
  if let Some(course_id) = course_id
    && directory
      .get_course(course_id)
      .await
      .map_err(ApiError::store)?
      .is_none()
  {
    return Err(ApiError::BadRequest(format!("unknown course {course_id}")));
  }

  let subject = directory
    .add_subject(NewSubject { name: name.trim().to_owned(), course_id })
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(subject)))
}
