//! SQL schema for the Univera SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS` / `OR IGNORE`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS roles (
    id    INTEGER PRIMARY KEY,
    name  TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS departments (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    name          TEXT NOT NULL,
    principal_id  TEXT REFERENCES users(id) ON DELETE SET NULL,
    dean_id       TEXT REFERENCES users(id) ON DELETE SET NULL,
    admin_id      TEXT REFERENCES users(id) ON DELETE SET NULL
);

-- id is the external identity id; never generated here.
CREATE TABLE IF NOT EXISTS users (
    id             TEXT PRIMARY KEY,
    name           TEXT NOT NULL,
    email          TEXT NOT NULL UNIQUE COLLATE NOCASE,
    phone          TEXT NOT NULL DEFAULT '',
    department_id  INTEGER REFERENCES departments(id),
    created_at     TEXT NOT NULL   -- ISO 8601 UTC
);

CREATE TABLE IF NOT EXISTS user_roles (
    user_id  TEXT    NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    role_id  INTEGER NOT NULL REFERENCES roles(id),
    PRIMARY KEY (user_id, role_id)
);

CREATE TABLE IF NOT EXISTS courses (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    name           TEXT NOT NULL,
    department_id  INTEGER NOT NULL REFERENCES departments(id),
    hod_id         TEXT REFERENCES users(id) ON DELETE SET NULL
);

CREATE TABLE IF NOT EXISTS subjects (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    name       TEXT NOT NULL,
    course_id  INTEGER REFERENCES courses(id)
);

CREATE TABLE IF NOT EXISTS faculty (
    id             TEXT PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
    course_id      INTEGER NOT NULL REFERENCES courses(id),
    department_id  INTEGER NOT NULL REFERENCES departments(id),
    position       TEXT NOT NULL,
    university_id  INTEGER NOT NULL,
    created_at     TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS faculty_subjects (
    faculty_id  TEXT    NOT NULL REFERENCES faculty(id) ON DELETE CASCADE,
    subject_id  INTEGER NOT NULL REFERENCES subjects(id),
    PRIMARY KEY (faculty_id, subject_id)
);

CREATE INDEX IF NOT EXISTS courses_department_idx ON courses(department_id);
CREATE INDEX IF NOT EXISTS subjects_course_idx    ON subjects(course_id);

-- Role ids with fixed meaning; see univera_core::role::RoleId.
INSERT OR IGNORE INTO roles (id, name) VALUES
    (4,  'faculty'),
    (9,  'principal'),
    (10, 'head_of_department'),
    (11, 'dean');

PRAGMA user_version = 1;
";
