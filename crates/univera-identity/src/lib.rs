//! Identity-system backends for Univera.
//!
//! - [`LocalIdentityProvider`] keeps accounts in its own SQLite file with
//!   argon2 password hashes. Suitable for development and single-node setups.
//! - [`HttpIdentityProvider`] talks to a hosted identity service over its
//!   backend REST API (Clerk-compatible `/users` endpoints).
//! - [`AnyIdentityProvider`] picks one of them at runtime from configuration.

mod any;
mod http;
mod local;

pub mod error;

pub use any::AnyIdentityProvider;
pub use error::{Error, Result};
pub use http::{HttpIdentityConfig, HttpIdentityProvider};
pub use local::LocalIdentityProvider;
