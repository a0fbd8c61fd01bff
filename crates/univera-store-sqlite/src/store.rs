//! [`SqliteStore`]: the SQLite implementation of [`Directory`].

use std::{collections::BTreeSet, path::Path};

use chrono::Utc;
use rusqlite::{OptionalExtension as _, params};

use univera_core::{
  directory::Directory,
  org::{
    Assignment, Course, Department, NewCourse, NewDepartment, NewRole, NewSubject,
    Role, Subject,
  },
  person::{FacultyRecord, LocalUser, NewFaculty, NewLocalUser},
  role::{Capacity, RoleId},
};

use crate::{
  encode::{
    COURSE_COLUMNS, DEPARTMENT_COLUMNS, RawFaculty, RawUser, SUBJECT_COLUMNS,
    capacity_column, course_from_row, department_from_row, encode_dt, subject_from_row,
  },
  schema::SCHEMA,
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Univera relational store backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  pub(crate) async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Row loaders (run on the database thread) ────────────────────────────────

fn load_user(conn: &rusqlite::Connection, id: &str) -> rusqlite::Result<Option<RawUser>> {
  let row = conn
    .query_row(
      "SELECT id, name, email, phone, department_id, created_at FROM users WHERE id = ?1",
      params![id],
      |row| {
        Ok(RawUser {
          id:            row.get(0)?,
          name:          row.get(1)?,
          email:         row.get(2)?,
          phone:         row.get(3)?,
          department_id: row.get(4)?,
          created_at:    row.get(5)?,
          role_ids:      Vec::new(),
        })
      },
    )
    .optional()?;

  let Some(mut raw) = row else { return Ok(None) };
  let mut stmt =
    conn.prepare("SELECT role_id FROM user_roles WHERE user_id = ?1 ORDER BY role_id")?;
  raw.role_ids = stmt
    .query_map(params![id], |r| r.get(0))?
    .collect::<rusqlite::Result<Vec<i64>>>()?;
  Ok(Some(raw))
}

fn load_faculty(conn: &rusqlite::Connection, id: &str) -> rusqlite::Result<Option<RawFaculty>> {
  let row = conn
    .query_row(
      "SELECT id, course_id, department_id, position, university_id, created_at
       FROM faculty WHERE id = ?1",
      params![id],
      |row| {
        Ok(RawFaculty {
          id:            row.get(0)?,
          course_id:     row.get(1)?,
          department_id: row.get(2)?,
          position:      row.get(3)?,
          university_id: row.get(4)?,
          created_at:    row.get(5)?,
          subject_ids:   Vec::new(),
        })
      },
    )
    .optional()?;

  let Some(mut raw) = row else { return Ok(None) };
  let mut stmt = conn.prepare(
    "SELECT subject_id FROM faculty_subjects WHERE faculty_id = ?1 ORDER BY subject_id",
  )?;
  raw.subject_ids = stmt
    .query_map(params![id], |r| r.get(0))?
    .collect::<rusqlite::Result<Vec<i64>>>()?;
  Ok(Some(raw))
}

/// The subset of `ids` with no row in `table`.
fn missing_ids(conn: &rusqlite::Connection, table: &str, ids: &[i64]) -> rusqlite::Result<Vec<i64>> {
  let mut stmt = conn.prepare(&format!("SELECT 1 FROM {table} WHERE id = ?1"))?;
  let mut missing = Vec::new();
  for id in ids {
    if !stmt.exists(params![id])? {
      missing.push(*id);
    }
  }
  Ok(missing)
}

fn list_rows<T>(
  conn: &rusqlite::Connection,
  sql: &str,
  map: fn(&rusqlite::Row<'_>) -> rusqlite::Result<T>,
) -> rusqlite::Result<Vec<T>> {
  let mut stmt = conn.prepare(sql)?;
  let rows = stmt.query_map([], map)?.collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

fn role_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Role> {
  Ok(Role {
    id:   RoleId(row.get(0)?),
    name: row.get(1)?,
  })
}

// ─── Directory impl ──────────────────────────────────────────────────────────

impl Directory for SqliteStore {
  type Error = Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn get_user(&self, id: &str) -> Result<Option<LocalUser>> {
    let id = id.to_owned();
    let raw = self
      .conn
      .call(move |conn| Ok(load_user(conn, &id)?))
      .await?;
    raw.map(RawUser::into_user).transpose()
  }

  async fn create_user(&self, user: NewLocalUser) -> Result<LocalUser> {
    let created_at = encode_dt(Utc::now());
    let role_ids: Vec<i64> = user.role_ids.iter().map(|r| r.0).collect();
    let id = user.id.clone();

    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO users (id, name, email, phone, department_id, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          params![
            user.id,
            user.name,
            user.email,
            user.phone,
            user.department_id,
            created_at,
          ],
        )?;
        {
          let mut stmt =
            tx.prepare("INSERT INTO user_roles (user_id, role_id) VALUES (?1, ?2)")?;
          for role_id in &role_ids {
            stmt.execute(params![user.id, role_id])?;
          }
        }
        let raw = load_user(&tx, &user.id)?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.ok_or(Error::Vanished(id))?.into_user()
  }

  async fn connect_roles(&self, id: &str, roles: &BTreeSet<RoleId>) -> Result<Option<LocalUser>> {
    let id = id.to_owned();
    let role_ids: Vec<i64> = roles.iter().map(|r| r.0).collect();

    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if load_user(&tx, &id)?.is_none() {
          return Ok(None);
        }
        {
          let mut stmt =
            tx.prepare("INSERT OR IGNORE INTO user_roles (user_id, role_id) VALUES (?1, ?2)")?;
          for role_id in &role_ids {
            stmt.execute(params![id, role_id])?;
          }
        }
        let raw = load_user(&tx, &id)?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn disconnect_roles(
    &self,
    id: &str,
    roles: &BTreeSet<RoleId>,
  ) -> Result<Option<LocalUser>> {
    let id = id.to_owned();
    let role_ids: Vec<i64> = roles.iter().map(|r| r.0).collect();

    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt =
            tx.prepare("DELETE FROM user_roles WHERE user_id = ?1 AND role_id = ?2")?;
          for role_id in &role_ids {
            stmt.execute(params![id, role_id])?;
          }
        }
        let raw = load_user(&tx, &id)?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn delete_user(&self, id: &str) -> Result<bool> {
    let id = id.to_owned();
    let deleted = self
      .conn
      .call(move |conn| Ok(conn.execute("DELETE FROM users WHERE id = ?1", params![id])?))
      .await?;
    Ok(deleted > 0)
  }

  // ── Capacities ────────────────────────────────────────────────────────────

  async fn assign_capacity(
    &self,
    capacity: Capacity,
    unit_id: i64,
    holder: Option<&str>,
  ) -> Result<Option<Assignment>> {
    let (table, column) = capacity_column(capacity);
    let holder = holder.map(str::to_owned);

    let previous = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let previous: Option<Option<String>> = tx
          .query_row(
            &format!("SELECT {column} FROM {table} WHERE id = ?1"),
            params![unit_id],
            |r| r.get(0),
          )
          .optional()?;
        if previous.is_some() {
          tx.execute(
            &format!("UPDATE {table} SET {column} = ?1 WHERE id = ?2"),
            params![holder, unit_id],
          )?;
        }
        tx.commit()?;
        Ok(previous.map(|p| (p, holder)))
      })
      .await?;

    Ok(previous.map(|(previous_holder, holder)| Assignment {
      capacity,
      unit_id,
      holder,
      previous_holder,
    }))
  }

  // ── Faculty ───────────────────────────────────────────────────────────────

  async fn upsert_faculty(&self, faculty: NewFaculty) -> Result<FacultyRecord> {
    let created_at = encode_dt(Utc::now());
    let subject_ids: Vec<i64> = faculty.subject_ids.iter().copied().collect();
    let id = faculty.id.clone();

    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO faculty (id, course_id, department_id, position, university_id, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)
           ON CONFLICT(id) DO UPDATE SET
             course_id     = excluded.course_id,
             department_id = excluded.department_id,
             position      = excluded.position,
             university_id = excluded.university_id",
          params![
            faculty.id,
            faculty.course_id,
            faculty.department_id,
            faculty.position,
            faculty.university_id,
            created_at,
          ],
        )?;
        {
          let mut stmt = tx.prepare(
            "INSERT OR IGNORE INTO faculty_subjects (faculty_id, subject_id) VALUES (?1, ?2)",
          )?;
          for subject_id in &subject_ids {
            stmt.execute(params![faculty.id, subject_id])?;
          }
        }
        let raw = load_faculty(&tx, &faculty.id)?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.ok_or(Error::Vanished(id))?.into_faculty()
  }

  async fn get_faculty(&self, id: &str) -> Result<Option<FacultyRecord>> {
    let id = id.to_owned();
    let raw = self
      .conn
      .call(move |conn| Ok(load_faculty(conn, &id)?))
      .await?;
    raw.map(RawFaculty::into_faculty).transpose()
  }

  // ── Catalog ───────────────────────────────────────────────────────────────

  async fn list_roles(&self) -> Result<Vec<Role>> {
    Ok(
      self
        .conn
        .call(|conn| Ok(list_rows(conn, "SELECT id, name FROM roles ORDER BY id", role_from_row)?))
        .await?,
    )
  }

  async fn add_role(&self, role: NewRole) -> Result<Role> {
    let requested = role.id.map(|r| r.0);
    let name = role.name.clone();
    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO roles (id, name) VALUES (?1, ?2)",
          params![requested, role.name],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;
    Ok(Role { id: RoleId(id), name })
  }

  async fn missing_roles(&self, ids: &BTreeSet<RoleId>) -> Result<Vec<RoleId>> {
    let ids: Vec<i64> = ids.iter().map(|r| r.0).collect();
    let missing = self
      .conn
      .call(move |conn| Ok(missing_ids(conn, "roles", &ids)?))
      .await?;
    Ok(missing.into_iter().map(RoleId).collect())
  }

  async fn list_departments(&self) -> Result<Vec<Department>> {
    let sql = format!("SELECT {DEPARTMENT_COLUMNS} FROM departments ORDER BY id");
    Ok(
      self
        .conn
        .call(move |conn| Ok(list_rows(conn, &sql, department_from_row)?))
        .await?,
    )
  }

  async fn add_department(&self, department: NewDepartment) -> Result<Department> {
    let name = department.name.clone();
    let id = self
      .conn
      .call(move |conn| {
        conn.execute("INSERT INTO departments (name) VALUES (?1)", params![department.name])?;
        Ok(conn.last_insert_rowid())
      })
      .await?;
    Ok(Department {
      id,
      name,
      principal_id: None,
      dean_id: None,
      admin_id: None,
    })
  }

  async fn get_department(&self, id: i64) -> Result<Option<Department>> {
    let sql = format!("SELECT {DEPARTMENT_COLUMNS} FROM departments WHERE id = ?1");
    Ok(
      self
        .conn
        .call(move |conn| Ok(conn.query_row(&sql, params![id], department_from_row).optional()?))
        .await?,
    )
  }

  async fn list_courses(&self) -> Result<Vec<Course>> {
    let sql = format!("SELECT {COURSE_COLUMNS} FROM courses ORDER BY id");
    Ok(
      self
        .conn
        .call(move |conn| Ok(list_rows(conn, &sql, course_from_row)?))
        .await?,
    )
  }

  async fn add_course(&self, course: NewCourse) -> Result<Course> {
    let NewCourse { name, department_id } = course;
    let stored_name = name.clone();
    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO courses (name, department_id) VALUES (?1, ?2)",
          params![name, department_id],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;
    Ok(Course {
      id,
      name: stored_name,
      department_id,
      hod_id: None,
    })
  }

  async fn get_course(&self, id: i64) -> Result<Option<Course>> {
    let sql = format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = ?1");
    Ok(
      self
        .conn
        .call(move |conn| Ok(conn.query_row(&sql, params![id], course_from_row).optional()?))
        .await?,
    )
  }

  async fn list_subjects(&self) -> Result<Vec<Subject>> {
    let sql = format!("SELECT {SUBJECT_COLUMNS} FROM subjects ORDER BY id");
    Ok(
      self
        .conn
        .call(move |conn| Ok(list_rows(conn, &sql, subject_from_row)?))
        .await?,
    )
  }

  async fn add_subject(&self, subject: NewSubject) -> Result<Subject> {
    let NewSubject { name, course_id } = subject;
    let stored_name = name.clone();
    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO subjects (name, course_id) VALUES (?1, ?2)",
          params![name, course_id],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;
    Ok(Subject { id, name: stored_name, course_id })
  }

  async fn missing_subjects(&self, ids: &BTreeSet<i64>) -> Result<Vec<i64>> {
    let ids: Vec<i64> = ids.iter().copied().collect();
    Ok(
      self
        .conn
        .call(move |conn| Ok(missing_ids(conn, "subjects", &ids)?))
        .await?,
    )
  }
}
