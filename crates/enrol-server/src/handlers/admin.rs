//! Administrator endpoints. Everything except `login` requires a bearer
//! token, enforced by the [`AdminIdentity`] extractor.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/api/admin/login` | `{email, password}` |
//! | `GET`    | `/api/admin/participants` | newest first |
//! | `POST`   | `/api/admin/participants` | JSON or multipart, image optional, ignores the gate |
//! | `PUT`    | `/api/admin/participants/{id}` | JSON or multipart, present fields only; an image replaces the payment proof |
//! | `DELETE` | `/api/admin/participants/{id}` | also deletes the payment proof |
//! | `GET`    | `/api/admin/participants/export` | CSV, `204` when empty |
//! | `POST`   | `/api/admin/settings/toggle-registration` | |

use axum::{
  Json,
  extract::{
    Path, Request, State,
    rejection::{JsonRejection, PathRejection},
  },
  http::{StatusCode, header},
  response::{IntoResponse, Response},
};
use enrol_core::{objects::ObjectStore, store::RegistryStore};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::{
  AppState, Error,
  auth::{AdminIdentity, IssuedToken},
  error::Result,
  handlers::read_admin_form,
};

// ─── Login ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  #[serde(default)]
  pub email:    String,
  #[serde(default)]
  pub password: String,
}

/// `POST /api/admin/login`
pub async fn login<S, O>(
  State(state): State<AppState<S, O>>,
  body: Result<Json<LoginBody>, JsonRejection>,
) -> Result<Json<IssuedToken>>
where
  S: RegistryStore + 'static,
  O: ObjectStore + 'static,
{
  let Json(body) = body.map_err(|e| Error::Validation(e.body_text()))?;
  Ok(Json(state.auth.login(&body.email, &body.password)?))
}

// ─── Participants ─────────────────────────────────────────────────────────────

/// `GET /api/admin/participants`
pub async fn list<S, O>(
  State(state): State<AppState<S, O>>,
  _admin: AdminIdentity,
) -> Result<impl IntoResponse>
where
  S: RegistryStore + 'static,
  O: ObjectStore + 'static,
{
  Ok(Json(state.registry.list().await?))
}

/// `POST /api/admin/participants`
pub async fn create<S, O>(
  State(state): State<AppState<S, O>>,
  admin: AdminIdentity,
  req: Request,
) -> Result<impl IntoResponse>
where
  S: RegistryStore + 'static,
  O: ObjectStore + 'static,
{
  let limit = state.registry.rules().max_upload_bytes;
  let (form, proof) = read_admin_form(req, limit).await?;
  let participant = state.registry.create(form, proof, &admin.email).await?;

  Ok((
    StatusCode::CREATED,
    Json(json!({
      "message": "Participant created successfully!",
      "participant": participant,
    })),
  ))
}

/// `PUT /api/admin/participants/{id}`
pub async fn update<S, O>(
  State(state): State<AppState<S, O>>,
  admin: AdminIdentity,
  id: Result<Path<Uuid>, PathRejection>,
  req: Request,
) -> Result<impl IntoResponse>
where
  S: RegistryStore + 'static,
  O: ObjectStore + 'static,
{
  // An id that is not a UUID cannot name a participant.
  let Path(id) = id.map_err(|_| Error::NotFound)?;
  let limit = state.registry.rules().max_upload_bytes;
  let (form, proof) = read_admin_form(req, limit).await?;
  let participant = state
    .registry
    .update(id, form, proof, &admin.email)
    .await?;

  Ok(Json(json!({
    "message": "Participant updated successfully.",
    "participant": participant,
  })))
}

/// `DELETE /api/admin/participants/{id}`
pub async fn remove<S, O>(
  State(state): State<AppState<S, O>>,
  admin: AdminIdentity,
  id: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse>
where
  S: RegistryStore + 'static,
  O: ObjectStore + 'static,
{
  let Path(id) = id.map_err(|_| Error::NotFound)?;
  state.registry.remove(id, &admin.email).await?;
  Ok(Json(json!({ "message": "Participant deleted successfully." })))
}

// ─── Export ───────────────────────────────────────────────────────────────────

/// `GET /api/admin/participants/export`
pub async fn export<S, O>(
  State(state): State<AppState<S, O>>,
  _admin: AdminIdentity,
) -> Result<Response>
where
  S: RegistryStore + 'static,
  O: ObjectStore + 'static,
{
  let Some(csv) = state.registry.export_csv().await? else {
    return Ok(StatusCode::NO_CONTENT.into_response());
  };

  Ok(
    (
      [
        (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
        (
          header::CONTENT_DISPOSITION,
          "attachment; filename=\"registrations.csv\"",
        ),
      ],
      csv,
    )
      .into_response(),
  )
}

// ─── Admission gate ───────────────────────────────────────────────────────────

/// `POST /api/admin/settings/toggle-registration`
pub async fn toggle<S, O>(
  State(state): State<AppState<S, O>>,
  admin: AdminIdentity,
) -> Result<impl IntoResponse>
where
  S: RegistryStore + 'static,
  O: ObjectStore + 'static,
{
  let gate = state.registry.toggle(&admin.email).await?;
  Ok(Json(json!({
    "message": format!("Registration is now {gate}."),
    "isOpen": gate.is_open(),
  })))
}
