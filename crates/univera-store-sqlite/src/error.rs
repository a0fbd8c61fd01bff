//! Error type for `univera-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A row written in the same transaction could not be read back.
  #[error("row vanished after write: {0}")]
  Vanished(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
