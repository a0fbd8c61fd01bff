//! The `Directory` trait and its supporting types.
//!
//! The trait is implemented by relational store backends (e.g.
//! `univera-store-sqlite`). The provisioner and the HTTP layer depend on this
//! abstraction, not on any concrete backend.

use std::{collections::BTreeSet, future::Future};

use crate::{
  org::{
    Assignment, Course, Department, NewCourse, NewDepartment, NewRole, NewSubject,
    Role, Subject,
  },
  person::{FacultyRecord, LocalUser, NewFaculty, NewLocalUser},
  role::{Capacity, RoleId},
};

/// Abstraction over the relational store of users and academic entities.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait Directory: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Retrieve a local user with its role set. Returns `None` if not found.
  fn get_user<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<Option<LocalUser>, Self::Error>> + Send + 'a;

  /// Create a local user and connect it to `role_ids`.
  fn create_user(
    &self,
    user: NewLocalUser,
  ) -> impl Future<Output = Result<LocalUser, Self::Error>> + Send + '_;

  /// Add `roles` to the user's role set (union). Returns `None` if the user
  /// does not exist.
  fn connect_roles<'a>(
    &'a self,
    id: &'a str,
    roles: &'a BTreeSet<RoleId>,
  ) -> impl Future<Output = Result<Option<LocalUser>, Self::Error>> + Send + 'a;

  /// Remove `roles` from the user's role set. Returns `None` if the user
  /// does not exist.
  fn disconnect_roles<'a>(
    &'a self,
    id: &'a str,
    roles: &'a BTreeSet<RoleId>,
  ) -> impl Future<Output = Result<Option<LocalUser>, Self::Error>> + Send + 'a;

  /// Delete a local user together with its role links and faculty record.
  /// Capacities it held are cleared. Returns `false` if not found.
  fn delete_user<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  // ── Capacities ────────────────────────────────────────────────────────

  /// Overwrite the holder of `capacity` on unit `unit_id`. `holder = None`
  /// clears it. Returns `None` if no such unit exists.
  fn assign_capacity<'a>(
    &'a self,
    capacity: Capacity,
    unit_id: i64,
    holder: Option<&'a str>,
  ) -> impl Future<Output = Result<Option<Assignment>, Self::Error>> + Send + 'a;

  // ── Faculty ───────────────────────────────────────────────────────────

  /// Create the faculty record, or update its placement and add the subjects
  /// if it already exists.
  fn upsert_faculty(
    &self,
    faculty: NewFaculty,
  ) -> impl Future<Output = Result<FacultyRecord, Self::Error>> + Send + '_;

  fn get_faculty<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<Option<FacultyRecord>, Self::Error>> + Send + 'a;

  // ── Catalog ───────────────────────────────────────────────────────────

  fn list_roles(&self) -> impl Future<Output = Result<Vec<Role>, Self::Error>> + Send + '_;

  fn add_role(&self, role: NewRole) -> impl Future<Output = Result<Role, Self::Error>> + Send + '_;

  /// The subset of `ids` with no matching role.
  fn missing_roles<'a>(
    &'a self,
    ids: &'a BTreeSet<RoleId>,
  ) -> impl Future<Output = Result<Vec<RoleId>, Self::Error>> + Send + 'a;

  fn list_departments(
    &self,
  ) -> impl Future<Output = Result<Vec<Department>, Self::Error>> + Send + '_;

  fn add_department(
    &self,
    department: NewDepartment,
  ) -> impl Future<Output = Result<Department, Self::Error>> + Send + '_;

  fn get_department(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Department>, Self::Error>> + Send + '_;

  fn list_courses(&self) -> impl Future<Output = Result<Vec<Course>, Self::Error>> + Send + '_;

  fn add_course(
    &self,
    course: NewCourse,
  ) -> impl Future<Output = Result<Course, Self::Error>> + Send + '_;

  fn get_course(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Course>, Self::Error>> + Send + '_;

  fn list_subjects(
    &self,
  ) -> impl Future<Output = Result<Vec<Subject>, Self::Error>> + Send + '_;

  fn add_subject(
    &self,
    subject: NewSubject,
  ) -> impl Future<Output = Result<Subject, Self::Error>> + Send + '_;

  /// The subset of `ids` with no matching subject.
  fn missing_subjects<'a>(
    &'a self,
    ids: &'a BTreeSet<i64>,
  ) -> impl Future<Output = Result<Vec<i64>, Self::Error>> + Send + 'a;
}
