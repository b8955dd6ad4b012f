//! The admission gate, a single stored flag deciding whether public
//! registrations are accepted.
//!
//! An absent record means the gate is closed. Only a toggle writes the flag,
//! so the first toggle on a fresh store opens registration.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Setting key under which the gate flag is stored.
pub const REGISTRATION_STATUS_KEY: &str = "registrationStatus";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateState {
  Open,
  Closed,
}

impl GateState {
  /// Interpret the stored flag; a missing record reads as closed.
  pub fn from_flag(flag: Option<bool>) -> Self {
    match flag {
      Some(true) => Self::Open,
      Some(false) | None => Self::Closed,
    }
  }

  pub fn is_open(self) -> bool { matches!(self, Self::Open) }
}

impl From<bool> for GateState {
  fn from(open: bool) -> Self { Self::from_flag(Some(open)) }
}

impl fmt::Display for GateState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Open => "OPEN",
      Self::Closed => "CLOSED",
    })
  }
}
