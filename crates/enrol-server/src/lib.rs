//! HTTP layer for Enrol.
//!
//! Exposes an axum [`Router`] for public registration and the admin
//! dashboard, backed by any [`RegistryStore`] and [`ObjectStore`].

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod objects;
pub mod registry;
pub mod retry;

pub use error::Error;

use std::sync::Arc;

use axum::{
  Router,
  extract::DefaultBodyLimit,
  routing::{get, post, put},
};
use enrol_core::{objects::ObjectStore, store::RegistryStore};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use auth::AuthConfig;
use handlers::{admin, public, uploads};
use registry::Registry;

/// Room for the text fields and multipart framing around an upload.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S, O> {
  pub registry: Arc<Registry<S, O>>,
  pub auth:     Arc<AuthConfig>,
}

impl<S, O> Clone for AppState<S, O> {
  fn clone(&self) -> Self {
    Self {
      registry: Arc::clone(&self.registry),
      auth:     Arc::clone(&self.auth),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the axum [`Router`] for the registration server.
pub fn router<S, O>(state: AppState<S, O>) -> Router
where
  S: RegistryStore + 'static,
  O: ObjectStore + 'static,
{
  let form_limit = DefaultBodyLimit::max(
    state.registry.rules().max_upload_bytes + FORM_OVERHEAD_BYTES,
  );

  let public = Router::new()
    .route("/", get(public::health))
    .route(
      "/api/register",
      post(public::register::<S, O>).layer(form_limit.clone()),
    )
    .route(
      "/api/settings/registration",
      get(public::registration_status::<S, O>),
    )
    .route("/uploads/{key}", get(uploads::serve::<S, O>));

  let admin = Router::new()
    .route("/api/admin/login", post(admin::login::<S, O>))
    .route(
      "/api/admin/participants",
      get(admin::list::<S, O>).post(admin::create::<S, O>).layer(form_limit),
    )
    .route(
      "/api/admin/participants/export",
      get(admin::export::<S, O>),
    )
    .route(
      "/api/admin/participants/{id}",
      put(admin::update::<S, O>).delete(admin::remove::<S, O>),
    )
    .route(
      "/api/admin/settings/toggle-registration",
      post(admin::toggle::<S, O>),
    );

  public
    .merge(admin)
    .layer(TraceLayer::new_for_http())
    .layer(CorsLayer::permissive())
    .with_state(state)
}
