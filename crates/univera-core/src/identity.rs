//! The `IdentityProvider` trait: the external system of record for
//! credentials and sessions.
//!
//! Implemented by `univera-identity`. The provisioning workflow only needs to
//! look accounts up by email, create them, and delete them again when a later
//! step fails.

use std::future::Future;

use crate::person::{IdentityRecord, NewIdentity};

pub trait IdentityProvider: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Find the account registered under `email`, if any.
  fn find_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<IdentityRecord>, Self::Error>> + Send + 'a;

  /// Create a new account. `None` means the provider accepted the request
  /// but returned no account.
  fn create_account(
    &self,
    account: NewIdentity,
  ) -> impl Future<Output = Result<Option<IdentityRecord>, Self::Error>> + Send + '_;

  /// Delete an account. Returns `false` if no such account existed.
  fn delete_account<'a>(
    &'a self,
    external_id: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;
}
