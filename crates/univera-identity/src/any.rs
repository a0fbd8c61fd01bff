//! [`AnyIdentityProvider`]: runtime choice between the bundled backends.

use univera_core::{
  identity::IdentityProvider,
  person::{IdentityRecord, NewIdentity},
};

use crate::{Error, HttpIdentityProvider, LocalIdentityProvider, Result};

#[derive(Clone)]
pub enum AnyIdentityProvider {
  Local(LocalIdentityProvider),
  Http(HttpIdentityProvider),
}

impl From<LocalIdentityProvider> for AnyIdentityProvider {
  fn from(p: LocalIdentityProvider) -> Self { Self::Local(p) }
}

impl From<HttpIdentityProvider> for AnyIdentityProvider {
  fn from(p: HttpIdentityProvider) -> Self { Self::Http(p) }
}

impl IdentityProvider for AnyIdentityProvider {
  type Error = Error;

  async fn find_by_email(&self, email: &str) -> Result<Option<IdentityRecord>> {
    match self {
      Self::Local(p) => p.find_by_email(email).await,
      Self::Http(p) => p.find_by_email(email).await,
    }
  }

  async fn create_account(&self, account: NewIdentity) -> Result<Option<IdentityRecord>> {
    match self {
      Self::Local(p) => p.create_account(account).await,
      Self::Http(p) => p.create_account(account).await,
    }
  }

  async fn delete_account(&self, external_id: &str) -> Result<bool> {
    match self {
      Self::Local(p) => p.delete_account(external_id).await,
      Self::Http(p) => p.delete_account(external_id).await,
    }
  }
}
