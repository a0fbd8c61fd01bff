//! JSON REST API for Univera.
//!
//! Exposes an axum [`Router`] backed by a [`Provisioner`] over any
//! [`Directory`] and [`IdentityProvider`]. Session verification, TLS and
//! transport concerns are the caller's responsibility: the router expects an
//! already-verified [`univera_core::Principal`] in the request extensions (see
//! [`principal`]).
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", univera_api::api_router(provisioner.clone()))
//! ```

pub mod body;
pub mod catalog;
pub mod error;
pub mod principal;
pub mod teachers;
pub mod users;

use axum::{
  Router,
  routing::{get, post},
};
use univera_core::{Provisioner, directory::Directory, identity::IdentityProvider};

pub use error::ApiError;
pub use principal::{Caller, PrincipalHeaders, inject_principal};

/// Build a fully-materialised API router for `provisioner`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<D, I>(provisioner: Provisioner<D, I>) -> Router<()>
where
  D: Directory + 'static,
  I: IdentityProvider + 'static,
{
  Router::new()
    // Provisioning
    .route("/list/teacher/create", post(teachers::create::<D, I>))
    .route("/users", post(users::create::<D, I>))
    .route(
      "/users/{id}",
      get(users::get_one::<D, I>).delete(users::delete_one::<D, I>),
    )
    .route("/faculty/{id}", get(users::get_faculty::<D, I>))
    // Catalog
    .route(
      "/roles",
      get(catalog::list_roles::<D, I>).post(catalog::create_role::<D, I>),
    )
    .route(
      "/departments",
      get(catalog::list_departments::<D, I>).post(catalog::create_department::<D, I>),
    )
    .route("/departments/{id}", get(catalog::get_department::<D, I>))
    .route("/departments/{id}/admin", post(catalog::assign_admin::<D, I>))
    .route(
      "/courses",
      get(catalog::list_courses::<D, I>).post(catalog::create_course::<D, I>),
    )
    .route("/courses/{id}", get(catalog::get_course::<D, I>))
    .route(
      "/subjects",
      get(catalog::list_subjects::<D, I>).post(catalog::create_subject::<D, I>),
    )
    .with_state(provisioner)
}

// ─── Integration tests ────────────────────────────────────────────────────────
