//! Wiring for the Univera server binary: configuration types and the
//! top-level router.

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  http::{HeaderName, header::InvalidHeaderName},
  middleware,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use univera_api::{PrincipalHeaders, inject_principal};
use univera_core::{Provisioner, directory::Directory, identity::IdentityProvider};
use univera_identity::{
  AnyIdentityProvider, HttpIdentityConfig, HttpIdentityProvider, LocalIdentityProvider,
};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `UNIVERA_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:          String,
  #[serde(default = "default_port")]
  pub port:          u16,
  #[serde(default = "default_database_path")]
  pub database_path: PathBuf,
  #[serde(default)]
  pub principal:     PrincipalConfig,
  #[serde(default)]
  pub identity:      IdentityConfig,
}

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 3000 }

fn default_database_path() -> PathBuf { PathBuf::from("univera.db") }

/// Headers a trusted gateway uses to forward the verified session claims.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PrincipalConfig {
  pub role_header:    String,
  pub subject_header: String,
}

impl Default for PrincipalConfig {
  fn default() -> Self {
    Self {
      role_header:    "x-session-role".to_owned(),
      subject_header: "x-session-subject".to_owned(),
    }
  }
}

impl PrincipalConfig {
  pub fn headers(&self) -> Result<PrincipalHeaders, InvalidHeaderName> {
    Ok(PrincipalHeaders {
      role:    HeaderName::try_from(self.role_header.as_str())?,
      subject: HeaderName::try_from(self.subject_header.as_str())?,
    })
  }
}

/// Which identity system backs the deployment.
#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum IdentityConfig {
  /// Accounts in a private SQLite file next to the relational store.
  Local { path: PathBuf },
  /// A hosted identity service.
  Http(HttpIdentityConfig),
}

impl Default for IdentityConfig {
  fn default() -> Self { Self::Local { path: PathBuf::from("univera-identity.db") } }
}

impl IdentityConfig {
  /// Open the configured backend. `resolve` maps configured paths (e.g. to
  /// expand `~`).
  pub async fn open(
    &self,
    resolve: impl Fn(&PathBuf) -> PathBuf,
  ) -> univera_identity::Result<AnyIdentityProvider> {
    Ok(match self {
      Self::Local { path } => LocalIdentityProvider::open(resolve(path)).await?.into(),
      Self::Http(config) => HttpIdentityProvider::new(config.clone())?.into(),
    })
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The full application: the API router behind the trusted-header principal
/// layer and request tracing.
pub fn app<D, I>(provisioner: Provisioner<D, I>, headers: PrincipalHeaders) -> Router
where
  D: Directory + 'static,
  I: IdentityProvider + 'static,
{
  univera_api::api_router(provisioner)
    .layer(middleware::from_fn_with_state(Arc::new(headers), inject_principal))
    .layer(TraceLayer::new_for_http())
}
