//! Caller identification.
//!
//! Sessions are verified before a request reaches this crate. The verifying
//! layer stores a [`Principal`] in the request extensions; [`Caller`] reads it
//! back in handlers. [`inject_principal`] is such a layer for deployments
//! behind a gateway that forwards the verified claims as headers.

use std::{convert::Infallible, sync::Arc};

use axum::{
  extract::{FromRequestParts, Request, State},
  http::{HeaderName, request::Parts},
  middleware::Next,
  response::Response,
};
use univera_core::{Principal, role::AccountRole};

use crate::error::ApiError;

/// The principal of the current request. Absent extensions yield an
/// anonymous principal, which every guarded route rejects.
#[derive(Debug, Clone)]
pub struct Caller(pub Principal);

impl Caller {
  /// Fail with 401 unless the caller holds one of `allowed`.
  pub fn require(&self, allowed: &[AccountRole]) -> Result<(), ApiError> {
    if self.0.has_any_role(allowed) {
      Ok(())
    } else {
      Err(ApiError::Unauthorized)
    }
  }

  /// Fail with 401 for anonymous callers.
  pub fn require_known(&self) -> Result<(), ApiError> {
    if self.0.subject.is_some() || self.0.role.is_some() {
      Ok(())
    } else {
      Err(ApiError::Unauthorized)
    }
  }
}

impl<S: Send + Sync> FromRequestParts<S> for Caller {
  type Rejection = Infallible;

  async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
    Ok(Caller(parts.extensions.get::<Principal>().cloned().unwrap_or_default()))
  }
}

// ─── Trusted headers ─────────────────────────────────────────────────────────

/// Names of the headers a trusted gateway sets after verifying the session.
#[derive(Debug, Clone)]
pub struct PrincipalHeaders {
  pub role:    HeaderName,
  pub subject: HeaderName,
}

impl Default for PrincipalHeaders {
  fn default() -> Self {
    Self {
      role:    HeaderName::from_static("x-session-role"),
      subject: HeaderName::from_static("x-session-subject"),
    }
  }
}

/// Middleware: build a [`Principal`] from the configured headers.
///
/// Only mount this behind a gateway that strips these headers from client
/// traffic.
pub async fn inject_principal(
  State(headers): State<Arc<PrincipalHeaders>>,
  mut req: Request,
  next: Next,
) -> Response {
  // The header borrow must end before `next.run` so the future stays `Send`.
  let (subject, role) = {
    let read = |name: &HeaderName| {
      req
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
    };
    (read(&headers.subject), read(&headers.role))
  };

  let principal = Principal::from_claim(subject, role.as_deref());
  tracing::debug!(subject = ?principal.subject, role = ?principal.role, "principal");
  req.extensions_mut().insert(principal);
  next.run(req).await
}
