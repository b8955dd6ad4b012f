//! Unauthenticated endpoints: health, registration and gate status.

use axum::{
  Json,
  extract::{Multipart, State, multipart::MultipartRejection},
  http::StatusCode,
  response::IntoResponse,
};
use enrol_core::{objects::ObjectStore, store::RegistryStore};
use serde_json::json;

use crate::{AppState, error::Result, handlers::read_participant_form};

/// `GET /`
pub async fn health() -> &'static str { "Registration API is running!" }

// ─── Register ─────────────────────────────────────────────────────────────────

/// `POST /api/register`: multipart form with an optional `image` file.
///
/// The gate is checked before the body is read, so a closed gate never
/// costs an upload.
pub async fn register<S, O>(
  State(state): State<AppState<S, O>>,
  multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse>
where
  S: RegistryStore + 'static,
  O: ObjectStore + 'static,
{
  state.registry.ensure_open().await?;

  let limit = state.registry.rules().max_upload_bytes;
  let (form, proof) = read_participant_form(multipart, limit).await?;
  let participant = state.registry.register(form, proof).await?;

  Ok((
    StatusCode::CREATED,
    Json(json!({
      "message": "Registration successful!",
      "participant": participant,
    })),
  ))
}

// ─── Gate status ──────────────────────────────────────────────────────────────

/// `GET /api/settings/registration`
pub async fn registration_status<S, O>(
  State(state): State<AppState<S, O>>,
) -> Result<impl IntoResponse>
where
  S: RegistryStore + 'static,
  O: ObjectStore + 'static,
{
  let open = state.registry.is_open().await?;
  Ok(Json(json!({ "isOpen": open })))
}
