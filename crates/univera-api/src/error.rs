//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every error renders as `{"message": "..."}`. Internal errors are logged
//! with their full source chain and answered with a fixed, generic message.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use univera_core::{AssignmentError, BoxError, ProvisionError};

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("Unauthorized")]
  Unauthorized,

  #[error("{0}")]
  BadRequest(String),

  #[error("{0}")]
  NotFound(String),

  #[error("{message}: {source}")]
  Internal {
    /// The text sent to the client.
    message: &'static str,
    #[source]
    source:  BoxError,
  },
}

impl ApiError {
  /// Wrap a store error.
  pub fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Internal { message: "Internal server error", source: Box::new(e) }
  }

  /// Map a failed provisioning call. Only validation failures reach the
  /// client; everything else becomes `message`.
  pub fn provisioning(message: &'static str, e: ProvisionError) -> Self {
    match e {
      ProvisionError::Validation(m) => Self::BadRequest(m),
      other => Self::Internal { message, source: Box::new(other) },
    }
  }

  /// Map a failed call on an existing user, where missing things are the
  /// caller's concern.
  pub fn lookup(message: &'static str, e: ProvisionError) -> Self {
    match e {
      ProvisionError::Validation(m) => Self::BadRequest(m),
      ProvisionError::UserNotFound(id) => Self::NotFound(format!("user {id} not found")),
      ProvisionError::Assignment(a @ AssignmentError::UnitNotFound { .. }) => {
        Self::NotFound(a.to_string())
      }
      ProvisionError::Assignment(a @ AssignmentError::MissingIdentifier { .. }) => {
        Self::BadRequest(a.to_string())
      }
      other => Self::Internal { message, source: Box::new(other) },
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_owned()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::Internal { message, source } => {
        tracing::error!(error = %source, "{message}");
        (StatusCode::INTERNAL_SERVER_ERROR, (*message).to_owned())
      }
    };
    (status, Json(json!({ "message": message }))).into_response()
  }
}
