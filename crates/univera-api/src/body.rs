//! Request-body helpers.
//!
//! Bodies are taken as raw bytes and decoded only after the caller has been
//! authorized, so an unauthorized request never has its payload inspected.

use axum::body::Bytes;
use serde::{Deserialize, de::DeserializeOwned};

use crate::error::ApiError;

/// Decode a JSON body, answering 400 on malformed input.
pub fn parse_body<T: DeserializeOwned>(bytes: &Bytes) -> Result<T, ApiError> {
  serde_json::from_slice(bytes).map_err(|e| ApiError::BadRequest(format!("invalid body: {e}")))
}

/// A numeric id sent either as a JSON number or as a numeric string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IdField {
  Number(i64),
  Text(String),
}

impl IdField {
  /// The id, or `None` when it is zero, blank or not a number.
  pub fn value(&self) -> Option<i64> {
    let id = match self {
      IdField::Number(n) => *n,
      IdField::Text(s) => s.trim().parse().ok()?,
    };
    (id != 0).then_some(id)
  }
}

/// A present, non-blank string.
pub fn filled(value: Option<String>) -> Option<String> {
  value.filter(|v| !v.trim().is_empty())
}

/// A single 400 naming every field whose check is `false`.
pub fn missing_fields(checks: &[(&'static str, bool)]) -> ApiError {
  let absent: Vec<&str> = checks
    .iter()
    .filter(|(_, present)| !present)
    .map(|(name, _)| *name)
    .collect();
  ApiError::BadRequest(format!("Missing required fields: {}", absent.join(", ")))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn id_field_accepts_numbers_and_numeric_strings() {
    let n: IdField = serde_json::from_str("7").unwrap();
    let s: IdField = serde_json::from_str("\" 7 \"").unwrap();
    assert_eq!(n.value(), Some(7));
    assert_eq!(s.value(), Some(7));
  }

  #[test]
  fn id_field_treats_zero_and_junk_as_absent() {
    for raw in ["0", "\"0\"", "\"\"", "\"abc\""] {
      let f: IdField = serde_json::from_str(raw).unwrap();
      assert_eq!(f.value(), None, "{raw}");
    }
  }

  #[test]
  fn missing_fields_lists_every_absent_name() {
    let err = missing_fields(&[("name", false), ("email", true), ("position", false)]);
    assert!(matches!(err, ApiError::BadRequest(m) if m == "Missing required fields: name, position"));
  }
}
