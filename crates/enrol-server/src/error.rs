//! Error taxonomy and axum `IntoResponse` implementation.
//!
//! Every error becomes a `{ "message": ... }` body. Internal failures are
//! logged in full and answered with a generic message.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use enrol_core::{participant::UniqueField, store::StoreError, validation::UploadError};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Malformed or missing input.
  #[error("{0}")]
  Validation(String),

  #[error("Error: This {0} is already registered.")]
  DuplicateField(UniqueField),

  #[error("Registration is currently closed.")]
  RegistrationClosed,

  #[error("Unauthorized: No token provided.")]
  Unauthenticated,

  #[error("Forbidden: Token is not valid.")]
  Forbidden,

  /// Unknown email and wrong password are deliberately indistinguishable.
  #[error("Invalid credentials.")]
  InvalidCredentials,

  #[error("Participant not found.")]
  NotFound,

  #[error("File not found.")]
  ObjectNotFound,

  #[error("File upload error: {0}")]
  Upload(#[from] UploadError),

  #[error("Image upload is required. Only .png, .jpg, .jpeg formats are allowed.")]
  UploadRequired,

  #[error("internal error: {0}")]
  Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Map a store failure, surfacing uniqueness violations by field.
  pub fn store<E: StoreError>(e: E) -> Self {
    match e.duplicate_field() {
      Some(field) => Error::DuplicateField(field),
      None => Error::Internal(Box::new(e)),
    }
  }

  pub fn internal(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Error::Internal(Box::new(e))
  }

  pub fn status(&self) -> StatusCode {
    match self {
      Error::Validation(_)
      | Error::DuplicateField(_)
      | Error::InvalidCredentials
      | Error::Upload(_)
      | Error::UploadRequired => StatusCode::BAD_REQUEST,
      Error::Unauthenticated => StatusCode::UNAUTHORIZED,
      Error::RegistrationClosed | Error::Forbidden => StatusCode::FORBIDDEN,
      Error::NotFound | Error::ObjectNotFound => StatusCode::NOT_FOUND,
      Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl From<enrol_core::Error> for Error {
  fn from(e: enrol_core::Error) -> Self { Error::Validation(e.to_string()) }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let status = self.status();
    let message = match &self {
      Error::Internal(e) => {
        tracing::error!(error = %e, "request failed");
        "An unexpected error occurred on the server.".to_owned()
      }
      other => other.to_string(),
    };
    (status, Json(json!({ "message": message }))).into_response()
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn duplicate_message_names_the_field() {
    assert_eq!(
      Error::DuplicateField(UniqueField::Nim).to_string(),
      "Error: This nim is already registered."
    );
    assert_eq!(
      Error::DuplicateField(UniqueField::InstitutionalEmail).to_string(),
      "Error: This institutionalEmail is already registered."
    );
  }

  #[test]
  fn status_codes() {
    assert_eq!(Error::RegistrationClosed.status(), StatusCode::FORBIDDEN);
    assert_eq!(Error::Unauthenticated.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(Error::Forbidden.status(), StatusCode::FORBIDDEN);
    assert_eq!(Error::InvalidCredentials.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
      Error::internal(std::io::Error::other("disk")).status(),
      StatusCode::INTERNAL_SERVER_ERROR
    );
  }
}
