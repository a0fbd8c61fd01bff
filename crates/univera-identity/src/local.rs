//! [`LocalIdentityProvider`]: accounts in a private SQLite file.

use std::path::Path;

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use chrono::Utc;
use rand_core::OsRng;
use rusqlite::{OptionalExtension as _, params};
use uuid::Uuid;

use univera_core::{
  identity::IdentityProvider,
  person::{IdentityRecord, NewIdentity},
  role::AccountRole,
};

use crate::{Error, Result};

const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS identities (
    id             TEXT PRIMARY KEY,
    name           TEXT NOT NULL,
    email          TEXT NOT NULL UNIQUE COLLATE NOCASE,
    password_hash  TEXT NOT NULL,   -- argon2 PHC string
    role           TEXT,
    created_at     TEXT NOT NULL
);
";

/// An identity system living next to the relational store.
///
/// Cloning is cheap: the inner connection is reference-counted.
#[derive(Clone)]
pub struct LocalIdentityProvider {
  conn: tokio_rusqlite::Connection,
}

struct Row {
  record:        IdentityRecord,
  password_hash: String,
}

impl LocalIdentityProvider {
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::init(conn).await
  }

  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::init(conn).await
  }

  async fn init(conn: tokio_rusqlite::Connection) -> Result<Self> {
    conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(Self { conn })
  }

  /// Check `password` against the stored hash. Returns the account only when
  /// it exists and the password matches.
  pub async fn verify_password(
    &self,
    email: &str,
    password: &str,
  ) -> Result<Option<IdentityRecord>> {
    let Some(row) = self.load(email).await? else {
      return Ok(None);
    };
    let hash = PasswordHash::new(&row.password_hash)
      .map_err(|e| Error::PasswordHash(e.to_string()))?;
    let matches = Argon2::default()
      .verify_password(password.as_bytes(), &hash)
      .is_ok();
    Ok(matches.then_some(row.record))
  }

  async fn load(&self, email: &str) -> Result<Option<Row>> {
    let email = email.to_owned();
    let row = self
      .conn
      .call(move |conn| {
        let row = conn
          .query_row(
            "SELECT id, name, email, role, password_hash FROM identities WHERE email = ?1",
            params![email],
            |row| {
              let role: Option<String> = row.get(3)?;
              Ok(Row {
                record:        IdentityRecord {
                  external_id: row.get(0)?,
                  name:        row.get(1)?,
                  email:       row.get(2)?,
                  role:        role.and_then(|r| r.parse::<AccountRole>().ok()),
                },
                password_hash: row.get(4)?,
              })
            },
          )
          .optional()?;
        Ok(row)
      })
      .await?;
    Ok(row)
  }
}

fn hash_password(password: &str) -> Result<String> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|h| h.to_string())
    .map_err(|e| Error::PasswordHash(e.to_string()))
}

impl IdentityProvider for LocalIdentityProvider {
  type Error = Error;

  async fn find_by_email(&self, email: &str) -> Result<Option<IdentityRecord>> {
    Ok(self.load(email).await?.map(|row| row.record))
  }

  async fn create_account(&self, account: NewIdentity) -> Result<Option<IdentityRecord>> {
    let password_hash = hash_password(&account.password)?;
    let record = IdentityRecord {
      external_id: format!("user_{}", Uuid::new_v4().simple()),
      name:        account.name,
      email:       account.email,
      role:        Some(account.role),
    };
    let created_at = Utc::now().to_rfc3339();

    let row = record.clone();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO identities (id, name, email, password_hash, role, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          params![
            row.external_id,
            row.name,
            row.email,
            password_hash,
            row.role.map(|r| r.to_string()),
            created_at,
          ],
        )?;
        Ok(())
      })
      .await?;

    tracing::debug!(external_id = %record.external_id, "created local identity");
    Ok(Some(record))
  }

  async fn delete_account(&self, external_id: &str) -> Result<bool> {
    let id = external_id.to_owned();
    let deleted = self
      .conn
      .call(move |conn| Ok(conn.execute("DELETE FROM identities WHERE id = ?1", params![id])?))
      .await?;
    Ok(deleted > 0)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn account(email: &str) -> NewIdentity {
    NewIdentity {
      name:     "Ada Lovelace".into(),
      email:    email.into(),
      password: "correct horse".into(),
      role:     AccountRole::Faculty,
    }
  }

  async fn provider() -> LocalIdentityProvider {
    LocalIdentityProvider::open_in_memory()
      .await
      .expect("in-memory identity store")
  }

  #[tokio::test]
  async fn create_then_find_by_email() {
    let p = provider().await;
    let created = p.create_account(account("ada@example.com")).await.unwrap().unwrap();
    assert!(created.external_id.starts_with("user_"));
    assert_eq!(created.role, Some(AccountRole::Faculty));

    let found = p.find_by_email("ADA@example.com").await.unwrap().unwrap();
    assert_eq!(found, created);
  }

  #[tokio::test]
  async fn find_missing_returns_none() {
    let p = provider().await;
    assert!(p.find_by_email("nobody@example.com").await.unwrap().is_none());
  }

  #[tokio::test]
  async fn duplicate_email_is_rejected() {
    let p = provider().await;
    p.create_account(account("ada@example.com")).await.unwrap();
    assert!(p.create_account(account("ada@example.com")).await.is_err());
  }

  #[tokio::test]
  async fn password_is_hashed_and_verifiable() {
    let p = provider().await;
    p.create_account(account("ada@example.com")).await.unwrap();

    let row = p.load("ada@example.com").await.unwrap().unwrap();
    assert!(row.password_hash.starts_with("$argon2"));

    assert!(
      p.verify_password("ada@example.com", "correct horse")
        .await
        .unwrap()
        .is_some()
    );
    assert!(
      p.verify_password("ada@example.com", "wrong")
        .await
        .unwrap()
        .is_none()
    );
  }

  #[tokio::test]
  async fn delete_account_reports_existence() {
    let p = provider().await;
    let created = p.create_account(account("ada@example.com")).await.unwrap().unwrap();

    assert!(p.delete_account(&created.external_id).await.unwrap());
    assert!(!p.delete_account(&created.external_id).await.unwrap());
    assert!(p.find_by_email("ada@example.com").await.unwrap().is_none());
  }
}
