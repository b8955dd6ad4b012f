//! Error type for `enrol-store-sqlite`.

use enrol_core::{participant::UniqueField, store::StoreError};
use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] enrol_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A write collided with an existing value in a unique column.
  #[error("duplicate value for unique field {0}")]
  Duplicate(UniqueField),
}

impl StoreError for Error {
  fn duplicate_field(&self) -> Option<UniqueField> {
    match self {
      Error::Duplicate(field) => Some(*field),
      _ => None,
    }
  }

  fn is_transient(&self) -> bool {
    match self {
      Error::Database(tokio_rusqlite::Error::Rusqlite(e)) => matches!(
        e.sqlite_error_code(),
        Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
      ),
      _ => false,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
