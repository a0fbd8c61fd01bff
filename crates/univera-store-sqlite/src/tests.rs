//! Integration tests for `SqliteStore` against an in-memory database.

use std::collections::BTreeSet;

use univera_core::{
  directory::Directory,
  org::{NewCourse, NewDepartment, NewRole, NewSubject},
  person::{NewFaculty, NewLocalUser},
  role::{Capacity, RoleId},
};

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn roles(ids: &[i64]) -> BTreeSet<RoleId> { ids.iter().copied().map(RoleId).collect() }

fn new_user(id: &str, email: &str, role_ids: &[i64]) -> NewLocalUser {
  NewLocalUser {
    id:            id.into(),
    name:          "Ada Lovelace".into(),
    email:         email.into(),
    phone:         String::new(),
    department_id: None,
    role_ids:      roles(role_ids),
  }
}

/// Department 1 with course 1 and subjects 1 and 2.
async fn seeded() -> SqliteStore {
  let s = store().await;
  s.add_department(NewDepartment { name: "Science".into() }).await.unwrap();
  s.add_course(NewCourse { name: "Physics".into(), department_id: 1 })
    .await
    .unwrap();
  s.add_subject(NewSubject { name: "Mechanics".into(), course_id: Some(1) })
    .await
    .unwrap();
  s.add_subject(NewSubject { name: "Optics".into(), course_id: Some(1) })
    .await
    .unwrap();
  s
}

// ─── Catalog ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn well_known_roles_are_seeded() {
  let s = store().await;
  let ids: Vec<i64> = s.list_roles().await.unwrap().iter().map(|r| r.id.0).collect();
  assert_eq!(ids, vec![4, 9, 10, 11]);
}

#[tokio::test]
async fn reopening_schema_is_idempotent() {
  let s = store().await;
  s.init_schema().await.unwrap();
  assert_eq!(s.list_roles().await.unwrap().len(), 4);
}

#[tokio::test]
async fn add_role_with_and_without_id() {
  let s = store().await;
  let student = s
    .add_role(NewRole { id: Some(RoleId(2)), name: "student".into() })
    .await
    .unwrap();
  assert_eq!(student.id, RoleId(2));

  let staff = s.add_role(NewRole { id: None, name: "staff".into() }).await.unwrap();
  assert_eq!(staff.id, RoleId(12));
}

#[tokio::test]
async fn duplicate_role_name_is_rejected() {
  let s = store().await;
  let result = s.add_role(NewRole { id: None, name: "faculty".into() }).await;
  assert!(result.is_err());
}

#[tokio::test]
async fn missing_roles_reports_only_unknown_ids() {
  let s = store().await;
  let missing = s.missing_roles(&roles(&[4, 5, 9, 42])).await.unwrap();
  assert_eq!(missing, vec![RoleId(5), RoleId(42)]);
}

#[tokio::test]
async fn departments_courses_and_subjects_round_trip() {
  let s = seeded().await;

  let dept = s.get_department(1).await.unwrap().unwrap();
  assert_eq!(dept.name, "Science");
  assert!(dept.principal_id.is_none());

  let course = s.get_course(1).await.unwrap().unwrap();
  assert_eq!(course.department_id, 1);
  assert!(course.hod_id.is_none());

  assert_eq!(s.list_departments().await.unwrap().len(), 1);
  assert_eq!(s.list_courses().await.unwrap().len(), 1);
  assert_eq!(s.list_subjects().await.unwrap().len(), 2);
  assert!(s.get_department(7).await.unwrap().is_none());
  assert!(s.get_course(7).await.unwrap().is_none());
}

#[tokio::test]
async fn course_needs_an_existing_department() {
  let s = store().await;
  let result = s
    .add_course(NewCourse { name: "Orphan".into(), department_id: 99 })
    .await;
  assert!(result.is_err());
}

#[tokio::test]
async fn missing_subjects_reports_only_unknown_ids() {
  let s = seeded().await;
  let wanted: BTreeSet<i64> = [1, 2, 3].into();
  assert_eq!(s.missing_subjects(&wanted).await.unwrap(), vec![3]);
}

// ─── Users ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get_user_with_roles() {
  let s = store().await;
  let created = s
    .create_user(new_user("user_1", "ada@example.com", &[4, 9]))
    .await
    .unwrap();
  assert_eq!(created.role_ids, roles(&[4, 9]));

  let fetched = s.get_user("user_1").await.unwrap().unwrap();
  assert_eq!(fetched.email, "ada@example.com");
  assert_eq!(fetched.role_ids, roles(&[4, 9]));
  assert_eq!(fetched.created_at, created.created_at);
}

#[tokio::test]
async fn get_user_missing_returns_none() {
  let s = store().await;
  assert!(s.get_user("user_nobody").await.unwrap().is_none());
}

#[tokio::test]
async fn create_user_with_unknown_role_leaves_nothing_behind() {
  let s = store().await;
  let result = s.create_user(new_user("user_1", "ada@example.com", &[4, 77])).await;
  assert!(result.is_err());
  assert!(s.get_user("user_1").await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_email_is_rejected_case_insensitively() {
  let s = store().await;
  s.create_user(new_user("user_1", "ada@example.com", &[4])).await.unwrap();
  let result = s.create_user(new_user("user_2", "ADA@example.com", &[4])).await;
  assert!(result.is_err());
}

#[tokio::test]
async fn connect_roles_is_a_union() {
  let s = store().await;
  s.create_user(new_user("user_1", "ada@example.com", &[4, 9])).await.unwrap();

  let updated = s
    .connect_roles("user_1", &roles(&[4, 10]))
    .await
    .unwrap()
    .unwrap();
  assert_eq!(updated.role_ids, roles(&[4, 9, 10]));
}

#[tokio::test]
async fn connect_roles_on_missing_user_returns_none() {
  let s = store().await;
  assert!(s.connect_roles("user_x", &roles(&[4])).await.unwrap().is_none());
}

#[tokio::test]
async fn disconnect_roles_removes_only_given_roles() {
  let s = store().await;
  s.create_user(new_user("user_1", "ada@example.com", &[4, 9, 11])).await.unwrap();

  let updated = s
    .disconnect_roles("user_1", &roles(&[9, 11]))
    .await
    .unwrap()
    .unwrap();
  assert_eq!(updated.role_ids, roles(&[4]));
}

#[tokio::test]
async fn delete_user_cascades_and_clears_capacities() {
  let s = seeded().await;
  s.create_user(new_user("user_1", "ada@example.com", &[4, 9])).await.unwrap();
  s.assign_capacity(Capacity::Principal, 1, Some("user_1")).await.unwrap();
  s.upsert_faculty(NewFaculty {
    id:            "user_1".into(),
    course_id:     1,
    department_id: 1,
    position:      "Lecturer".into(),
    university_id: 3,
    subject_ids:   [1].into(),
  })
  .await
  .unwrap();

  assert!(s.delete_user("user_1").await.unwrap());
  assert!(s.get_user("user_1").await.unwrap().is_none());
  assert!(s.get_faculty("user_1").await.unwrap().is_none());
  let dept = s.get_department(1).await.unwrap().unwrap();
  assert!(dept.principal_id.is_none());

  assert!(!s.delete_user("user_1").await.unwrap());
}

// ─── Capacities ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn assign_capacity_reports_displaced_holder() {
  let s = seeded().await;
  s.create_user(new_user("user_1", "a@example.com", &[9])).await.unwrap();
  s.create_user(new_user("user_2", "b@example.com", &[9])).await.unwrap();

  let first = s
    .assign_capacity(Capacity::Principal, 1, Some("user_1"))
    .await
    .unwrap()
    .unwrap();
  assert_eq!(first.holder.as_deref(), Some("user_1"));
  assert!(first.previous_holder.is_none());

  let second = s
    .assign_capacity(Capacity::Principal, 1, Some("user_2"))
    .await
    .unwrap()
    .unwrap();
  assert_eq!(second.previous_holder.as_deref(), Some("user_1"));

  let dept = s.get_department(1).await.unwrap().unwrap();
  assert_eq!(dept.principal_id.as_deref(), Some("user_2"));
}

#[tokio::test]
async fn capacities_are_independent_columns() {
  let s = seeded().await;
  s.create_user(new_user("user_1", "a@example.com", &[9, 10, 11])).await.unwrap();

  s.assign_capacity(Capacity::Dean, 1, Some("user_1")).await.unwrap();
  s.assign_capacity(Capacity::HeadOfDepartment, 1, Some("user_1")).await.unwrap();
  s.assign_capacity(Capacity::Admin, 1, Some("user_1")).await.unwrap();

  let dept = s.get_department(1).await.unwrap().unwrap();
  assert!(dept.principal_id.is_none());
  assert_eq!(dept.dean_id.as_deref(), Some("user_1"));
  assert_eq!(dept.admin_id.as_deref(), Some("user_1"));
  let course = s.get_course(1).await.unwrap().unwrap();
  assert_eq!(course.hod_id.as_deref(), Some("user_1"));
}

#[tokio::test]
async fn assign_capacity_can_clear_holder() {
  let s = seeded().await;
  s.create_user(new_user("user_1", "a@example.com", &[11])).await.unwrap();
  s.assign_capacity(Capacity::Dean, 1, Some("user_1")).await.unwrap();

  let cleared = s.assign_capacity(Capacity::Dean, 1, None).await.unwrap().unwrap();
  assert_eq!(cleared.previous_holder.as_deref(), Some("user_1"));
  assert!(s.get_department(1).await.unwrap().unwrap().dean_id.is_none());
}

#[tokio::test]
async fn assign_capacity_on_missing_unit_returns_none() {
  let s = seeded().await;
  s.create_user(new_user("user_1", "a@example.com", &[10])).await.unwrap();
  let result = s
    .assign_capacity(Capacity::HeadOfDepartment, 42, Some("user_1"))
    .await
    .unwrap();
  assert!(result.is_none());
}

// ─── Faculty ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn upsert_faculty_creates_then_unions_subjects() {
  let s = seeded().await;
  s.create_user(new_user("user_1", "a@example.com", &[4])).await.unwrap();

  let created = s
    .upsert_faculty(NewFaculty {
      id:            "user_1".into(),
      course_id:     1,
      department_id: 1,
      position:      "Lecturer".into(),
      university_id: 3,
      subject_ids:   [1].into(),
    })
    .await
    .unwrap();
  assert_eq!(created.subject_ids, [1].into());

  let updated = s
    .upsert_faculty(NewFaculty {
      id:            "user_1".into(),
      course_id:     1,
      department_id: 1,
      position:      "Professor".into(),
      university_id: 3,
      subject_ids:   [2].into(),
    })
    .await
    .unwrap();
  assert_eq!(updated.position, "Professor");
  assert_eq!(updated.subject_ids, [1, 2].into());
  assert_eq!(updated.created_at, created.created_at);

  let fetched = s.get_faculty("user_1").await.unwrap().unwrap();
  assert_eq!(fetched.subject_ids, [1, 2].into());
}

#[tokio::test]
async fn faculty_requires_local_user() {
  let s = seeded().await;
  let result = s
    .upsert_faculty(NewFaculty {
      id:            "user_ghost".into(),
      course_id:     1,
      department_id: 1,
      position:      "Lecturer".into(),
      university_id: 3,
      subject_ids:   BTreeSet::new(),
    })
    .await;
  assert!(result.is_err());
}
