//! Participant types: the registered attendee record and its inputs.
//!
//! A participant is created once (publicly or by an administrator), may be
//! patched by an administrator, and is eventually deleted for good. There is
//! no soft-delete and no intermediate approval state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};
use uuid::Uuid;

use crate::Error;

// ─── Major ───────────────────────────────────────────────────────────────────

/// The study programme a participant is enrolled in.
///
/// The display string is both the wire value and the stored column value.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Display,
  EnumIter,
  EnumString,
  IntoStaticStr,
  Serialize,
  Deserialize,
)]
#[serde(try_from = "String", into = "&'static str")]
pub enum Major {
  #[strum(serialize = "Computer Science")]
  ComputerScience,
  #[strum(serialize = "Visual Communication Design")]
  VisualCommunicationDesign,
  #[strum(serialize = "Public Relations")]
  PublicRelations,
  #[strum(serialize = "Communication")]
  Communication,
  #[strum(serialize = "Entrepreneurship Business Creation")]
  EntrepreneurshipBusinessCreation,
  #[strum(serialize = "Digital Business Innovation")]
  DigitalBusinessInnovation,
  #[strum(serialize = "Interactive Design & Technology")]
  InteractiveDesignTechnology,
  #[strum(serialize = "Digital Psychology")]
  DigitalPsychology,
  #[strum(serialize = "Interior Design")]
  InteriorDesign,
}

impl Major {
  pub fn as_str(self) -> &'static str { self.into() }
}

impl TryFrom<String> for Major {
  type Error = Error;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    value
      .trim()
      .parse()
      .map_err(|_| Error::UnknownMajor(value))
  }
}

// ─── Unique fields ───────────────────────────────────────────────────────────

/// A participant field the store keeps unique across all records.
///
/// The display string is the wire name of the field, used verbatim in
/// user-facing duplicate messages.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr, Serialize,
)]
#[serde(rename_all = "camelCase")]
pub enum UniqueField {
  #[strum(serialize = "nim")]
  Nim,
  #[strum(serialize = "institutionalEmail")]
  InstitutionalEmail,
}

// ─── Participant ─────────────────────────────────────────────────────────────

/// A registered attendee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
  pub id:                  Uuid,
  pub name:                String,
  /// Student number; unique across all participants.
  pub nim:                 i64,
  /// Unique across all participants, compared case-insensitively.
  pub institutional_email: String,
  pub personal_email:      String,
  pub phone:               String,
  pub major:               Major,
  /// Retrieval URI of the uploaded payment proof, if any.
  pub payment_proof:       Option<String>,
  /// Server-assigned timestamp; never changes after creation.
  pub registered_at:       DateTime<Utc>,
}

/// Validated input to [`crate::store::RegistryStore::create_participant`].
/// `id` and `registered_at` are always set by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewParticipant {
  pub name:                String,
  pub nim:                 i64,
  pub institutional_email: String,
  pub personal_email:      String,
  pub phone:               String,
  pub major:               Major,
  pub payment_proof:       Option<String>,
}

/// Validated partial replacement; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParticipantPatch {
  pub name:                Option<String>,
  pub nim:                 Option<i64>,
  pub institutional_email: Option<String>,
  pub personal_email:      Option<String>,
  pub phone:               Option<String>,
  pub major:               Option<Major>,
  /// Retrieval URI of a replacement payment proof.
  pub payment_proof:       Option<String>,
}

impl ParticipantPatch {
  pub fn is_empty(&self) -> bool { *self == Self::default() }

  /// The record as it would look after this patch is applied.
  pub fn apply_to(&self, current: &Participant) -> Participant {
    Participant {
      name: self.name.clone().unwrap_or_else(|| current.name.clone()),
      nim: self.nim.unwrap_or(current.nim),
      institutional_email: self
        .institutional_email
        .clone()
        .unwrap_or_else(|| current.institutional_email.clone()),
      personal_email: self
        .personal_email
        .clone()
        .unwrap_or_else(|| current.personal_email.clone()),
      phone: self.phone.clone().unwrap_or_else(|| current.phone.clone()),
      major: self.major.unwrap_or(current.major),
      payment_proof: self
        .payment_proof
        .clone()
        .or_else(|| current.payment_proof.clone()),
      ..current.clone()
    }
  }
}

// ─── Raw input ───────────────────────────────────────────────────────────────

/// A student number as submitted: JSON clients may send a number, form
/// clients always send text.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum NimInput {
  Number(i64),
  Text(String),
}

/// Unvalidated participant fields as received from a form or JSON body.
///
/// Used for creation (every field mandatory) and for patches (absent fields
/// are left unchanged). See [`crate::validation::RegistrationRules`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantForm {
  #[serde(alias = "fullName")]
  pub name:                Option<String>,
  pub nim:                 Option<NimInput>,
  pub institutional_email: Option<String>,
  pub personal_email:      Option<String>,
  pub phone:               Option<String>,
  pub major:               Option<String>,
}

impl ParticipantForm {
  /// Assign a text field by its wire name. Returns `false` for names that
  /// are not participant fields.
  pub fn set_text(&mut self, field: &str, value: String) -> bool {
    match field {
      "name" | "fullName" => self.name = Some(value),
      "nim" => self.nim = Some(NimInput::Text(value)),
      "institutionalEmail" => self.institutional_email = Some(value),
      "personalEmail" => self.personal_email = Some(value),
      "phone" => self.phone = Some(value),
      "major" => self.major = Some(value),
      _ => return false,
    }
    true
  }
}
