//! Core types and trait definitions for Univera role provisioning.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! identity system and the relational store are reached only through the
//! [`identity::IdentityProvider`] and [`directory::Directory`] traits.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod directory;
pub mod error;
pub mod identity;
pub mod org;
pub mod person;
pub mod principal;
pub mod provision;
pub mod role;

pub use error::{AssignmentError, BoxError, ProvisionError, Result};
pub use principal::Principal;
pub use provision::{Provisioned, Provisioner};
