//! Error types for `enrol-core`.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  #[error("{0} is required")]
  MissingField(&'static str),

  #[error("{field} {reason}")]
  InvalidField { field: &'static str, reason: String },

  #[error("unknown major: {0:?}")]
  UnknownMajor(String),
}

impl Error {
  pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
    Self::InvalidField { field, reason: reason.into() }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
