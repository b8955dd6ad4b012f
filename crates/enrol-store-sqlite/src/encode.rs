//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings with a fixed microsecond precision so that
//! lexical order matches chronological order. UUIDs are stored as hyphenated
//! lowercase strings. Majors are stored as their display string.

use chrono::{DateTime, SecondsFormat, Utc};
use enrol_core::participant::{Major, Participant, UniqueField};
use rusqlite::ErrorCode;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Major ────────────────────────────────────────────────────────────────────

pub fn encode_major(m: Major) -> &'static str { m.as_str() }

pub fn decode_major(s: &str) -> Result<Major> {
  Ok(Major::try_from(s.to_owned())?)
}

// ─── Constraint violations ────────────────────────────────────────────────────

/// Recognise a `UNIQUE constraint failed: participants.<column>` error.
pub fn unique_violation(e: &rusqlite::Error) -> Option<UniqueField> {
  let rusqlite::Error::SqliteFailure(code, Some(msg)) = e else {
    return None;
  };
  if code.code != ErrorCode::ConstraintViolation
    || !msg.starts_with("UNIQUE constraint failed")
  {
    return None;
  }
  if msg.contains("participants.nim") {
    Some(UniqueField::Nim)
  } else if msg.contains("participants.institutional_email") {
    Some(UniqueField::InstitutionalEmail)
  } else {
    None
  }
}

// ─── Raw rows ─────────────────────────────────────────────────────────────────

/// Column list matching [`RawParticipant::from_row`].
pub const PARTICIPANT_COLUMNS: &str = "participant_id, name, nim, \
  institutional_email, personal_email, phone, major, payment_proof, \
  registered_at";

/// A participant row exactly as read from SQLite.
pub struct RawParticipant {
  pub participant_id:      String,
  pub name:                String,
  pub nim:                 i64,
  pub institutional_email: String,
  pub personal_email:      String,
  pub phone:               String,
  pub major:               String,
  pub payment_proof:       Option<String>,
  pub registered_at:       String,
}

impl RawParticipant {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      participant_id:      row.get(0)?,
      name:                row.get(1)?,
      nim:                 row.get(2)?,
      institutional_email: row.get(3)?,
      personal_email:      row.get(4)?,
      phone:               row.get(5)?,
      major:               row.get(6)?,
      payment_proof:       row.get(7)?,
      registered_at:       row.get(8)?,
    })
  }

  pub fn into_participant(self) -> Result<Participant> {
    Ok(Participant {
      id:                  decode_uuid(&self.participant_id)?,
      name:                self.name,
      nim:                 self.nim,
      institutional_email: self.institutional_email,
      personal_email:      self.personal_email,
      phone:               self.phone,
      major:               decode_major(&self.major)?,
      payment_proof:       self.payment_proof,
      registered_at:       decode_dt(&self.registered_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn timestamps_sort_lexically() {
    let a = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    let b = Utc.timestamp_opt(1_700_000_000, 500_000).unwrap();
    let c = Utc.timestamp_opt(1_700_000_001, 0).unwrap();
    let (ea, eb, ec) = (encode_dt(a), encode_dt(b), encode_dt(c));
    assert!(ea < eb && eb < ec, "{ea} {eb} {ec}");
    assert_eq!(decode_dt(&eb).unwrap(), b);
  }

  #[test]
  fn unknown_major_column_is_an_error() {
    assert!(decode_major("Basket Weaving").is_err());
    assert_eq!(decode_major("Interior Design").unwrap(), Major::InteriorDesign);
  }
}
