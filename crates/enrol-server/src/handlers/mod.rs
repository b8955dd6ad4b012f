//! HTTP handlers, one module per audience.
//!
//! | Module     | Routes |
//! |------------|--------|
//! | [`public`] | `/`, `/api/register`, `/api/settings/registration` |
//! | [`admin`]  | `/api/admin/*` |
//! | [`uploads`]| `/uploads/{key}` |

pub mod admin;
pub mod public;
pub mod uploads;

use axum::{
  Json,
  extract::{
    FromRequest, Multipart, Request,
    multipart::{Field, MultipartError, MultipartRejection},
  },
  http::{StatusCode, header},
};
use bytes::BytesMut;
use enrol_core::{participant::ParticipantForm, validation::UploadError};

use crate::{Error, error::Result, registry::Upload};

/// Multipart field names that carry the payment-proof file.
const FILE_FIELDS: &[&str] = &["image", "paymentProof"];

/// Read an admin participant body: multipart with an optional image, or a
/// plain JSON form. Anything that is not multipart is parsed as JSON.
pub(crate) async fn read_admin_form(
  req: Request,
  max_upload_bytes: usize,
) -> Result<(ParticipantForm, Option<Upload>)> {
  let multipart = req
    .headers()
    .get(header::CONTENT_TYPE)
    .and_then(|v| v.to_str().ok())
    .is_some_and(|v| v.trim_start().to_ascii_lowercase().starts_with("multipart/"));

  if multipart {
    return read_participant_form(
      Multipart::from_request(req, &()).await,
      max_upload_bytes,
    )
    .await;
  }

  let Json(form) = Json::<ParticipantForm>::from_request(req, &())
    .await
    .map_err(|e| Error::Validation(e.body_text()))?;
  Ok((form, None))
}

/// Read a participant form and its optional payment proof from a multipart
/// body. The file is cut off as soon as it exceeds `max_upload_bytes`.
pub(crate) async fn read_participant_form(
  multipart: Result<Multipart, MultipartRejection>,
  max_upload_bytes: usize,
) -> Result<(ParticipantForm, Option<Upload>)> {
  let mut multipart = multipart.map_err(|e| Error::Validation(e.body_text()))?;
  let mut form = ParticipantForm::default();
  let mut upload = None;

  while let Some(field) = multipart
    .next_field()
    .await
    .map_err(|e| multipart_error(e, max_upload_bytes))?
  {
    let Some(name) = field.name().map(str::to_owned) else {
      continue;
    };

    if FILE_FIELDS.contains(&name.as_str()) {
      upload = read_file(field, max_upload_bytes).await?;
      continue;
    }

    let value = field
      .text()
      .await
      .map_err(|e| multipart_error(e, max_upload_bytes))?;
    if !form.set_text(&name, value) {
      tracing::debug!(field = %name, "ignoring unknown form field");
    }
  }

  Ok((form, upload))
}

/// `None` for the empty part browsers send when no file was chosen.
async fn read_file(mut field: Field<'_>, limit: usize) -> Result<Option<Upload>> {
  let unnamed = field.file_name().is_none_or(str::is_empty);
  let content_type = field.content_type().map(str::to_owned);

  let mut buf = BytesMut::new();
  while let Some(chunk) = field
    .chunk()
    .await
    .map_err(|e| multipart_error(e, limit))?
  {
    if buf.len() + chunk.len() > limit {
      return Err(UploadError::TooLarge { limit }.into());
    }
    buf.extend_from_slice(&chunk);
  }

  if unnamed && buf.is_empty() {
    return Ok(None);
  }
  Ok(Some(Upload { content_type, bytes: buf.freeze() }))
}

fn multipart_error(e: MultipartError, limit: usize) -> Error {
  if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
    UploadError::TooLarge { limit }.into()
  } else {
    Error::Validation(e.body_text())
  }
}
