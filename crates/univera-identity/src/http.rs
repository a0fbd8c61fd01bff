//! [`HttpIdentityProvider`]: a hosted identity service reached over its
//! backend REST API.
//!
//! Endpoints used, relative to `base_url`:
//!
//! | Operation       | Request                          |
//! |-----------------|----------------------------------|
//! | find by email   | `GET /users?email_address=<e>`   |
//! | create account  | `POST /users`                    |
//! | delete account  | `DELETE /users/<id>`             |
//!
//! Every request carries `Authorization: Bearer <secret_key>`.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};

use univera_core::{
  identity::IdentityProvider,
  person::{IdentityRecord, NewIdentity},
  role::AccountRole,
};

use crate::{Error, Result};

/// Connection settings for the identity service.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpIdentityConfig {
  pub base_url:   String,
  pub secret_key: String,
}

/// Cheap to clone: the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct HttpIdentityProvider {
  client: Client,
  config: HttpIdentityConfig,
}

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RemoteUser {
  id:              String,
  #[serde(default)]
  first_name:      Option<String>,
  #[serde(default)]
  last_name:       Option<String>,
  #[serde(default)]
  email_addresses: Vec<RemoteEmail>,
  #[serde(default)]
  public_metadata: RemoteMetadata,
}

#[derive(Debug, Deserialize)]
struct RemoteEmail {
  email_address: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct RemoteMetadata {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  role: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreateUser<'a> {
  first_name:      &'a str,
  email_address:   [&'a str; 1],
  password:        &'a str,
  public_metadata: RemoteMetadata,
}

impl RemoteUser {
  fn into_record(self, fallback_email: &str) -> IdentityRecord {
    let name = [self.first_name, self.last_name]
      .into_iter()
      .flatten()
      .filter(|part| !part.is_empty())
      .collect::<Vec<_>>()
      .join(" ");
    let email = self
      .email_addresses
      .into_iter()
      .next()
      .map(|e| e.email_address)
      .unwrap_or_else(|| fallback_email.to_owned());
    IdentityRecord {
      external_id: self.id,
      name,
      email,
      role: self
        .public_metadata
        .role
        .and_then(|r| r.parse::<AccountRole>().ok()),
    }
  }
}

// ─── Client ──────────────────────────────────────────────────────────────────

impl HttpIdentityProvider {
  pub fn new(config: HttpIdentityConfig) -> Result<Self> {
    let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
  }

  fn auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    req.bearer_auth(&self.config.secret_key)
  }
}

/// Turn a non-success response into [`Error::Status`].
async fn check(method: &'static str, path: String, resp: Response) -> Result<Response> {
  if resp.status().is_success() {
    return Ok(resp);
  }
  let status = resp.status().as_u16();
  let body = resp.text().await.unwrap_or_default();
  Err(Error::Status { method, path, status, body })
}

impl IdentityProvider for HttpIdentityProvider {
  type Error = Error;

  async fn find_by_email(&self, email: &str) -> Result<Option<IdentityRecord>> {
    let resp = self
      .auth(self.client.get(self.url("/users")))
      .query(&[("email_address", email)])
      .send()
      .await?;
    let users: Vec<RemoteUser> = check("GET", "/users".into(), resp).await?.json().await?;
    Ok(users.into_iter().next().map(|u| u.into_record(email)))
  }

  async fn create_account(&self, account: NewIdentity) -> Result<Option<IdentityRecord>> {
    let body = CreateUser {
      first_name:      &account.name,
      email_address:   [&account.email],
      password:        &account.password,
      public_metadata: RemoteMetadata { role: Some(account.role.to_string()) },
    };
    let resp = self
      .auth(self.client.post(self.url("/users")))
      .json(&body)
      .send()
      .await?;
    let user: Option<RemoteUser> = check("POST", "/users".into(), resp).await?.json().await?;
    let record = user.map(|u| u.into_record(&account.email));
    if let Some(record) = &record {
      tracing::debug!(external_id = %record.external_id, "created remote identity");
    }
    Ok(record)
  }

  async fn delete_account(&self, external_id: &str) -> Result<bool> {
    let path = format!("/users/{external_id}");
    let resp = self
      .auth(self.client.delete(self.url(&path)))
      .send()
      .await?;
    if resp.status() == StatusCode::NOT_FOUND {
      return Ok(false);
    }
    check("DELETE", path, resp).await?;
    Ok(true)
  }
}
