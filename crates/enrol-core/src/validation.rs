//! Field rules shared by public registration and administrator edits.
//!
//! The service is the authority for these checks; any client-side form
//! validation is a convenience only.

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  participant::{
    Major, NewParticipant, NimInput, Participant, ParticipantForm,
    ParticipantPatch,
  },
};

fn default_institutional_domain() -> String { "binus.ac.id".to_owned() }

fn default_phone_prefixes() -> Vec<String> {
  vec!["08".to_owned(), "+62".to_owned()]
}

fn default_phone_min_len() -> usize { 10 }

fn default_phone_max_len() -> usize { 15 }

fn default_require_payment_proof() -> bool { true }

/// 5 MiB.
fn default_max_upload_bytes() -> usize { 5 * 1024 * 1024 }

/// Acceptance rules for participant fields and payment-proof uploads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationRules {
  /// Institutional emails must end with `@<institutional_domain>`.
  #[serde(default = "default_institutional_domain")]
  pub institutional_domain:  String,
  #[serde(default = "default_phone_prefixes")]
  pub phone_prefixes:        Vec<String>,
  /// Inclusive bounds on the phone length, leading `+` included.
  #[serde(default = "default_phone_min_len")]
  pub phone_min_len:         usize,
  #[serde(default = "default_phone_max_len")]
  pub phone_max_len:         usize,
  /// Whether public registrations must carry a payment-proof image.
  #[serde(default = "default_require_payment_proof")]
  pub require_payment_proof: bool,
  #[serde(default = "default_max_upload_bytes")]
  pub max_upload_bytes:      usize,
}

impl Default for RegistrationRules {
  fn default() -> Self {
    Self {
      institutional_domain:  default_institutional_domain(),
      phone_prefixes:        default_phone_prefixes(),
      phone_min_len:         default_phone_min_len(),
      phone_max_len:         default_phone_max_len(),
      require_payment_proof: default_require_payment_proof(),
      max_upload_bytes:      default_max_upload_bytes(),
    }
  }
}

impl RegistrationRules {
  /// Validate a complete creation form. Every field is mandatory; the
  /// payment proof is attached separately by the caller.
  pub fn validate_new(&self, form: ParticipantForm) -> Result<NewParticipant> {
    let name = self.name(required(form.name, "name")?)?;
    let nim = self.nim(form.nim.ok_or(Error::MissingField("nim"))?)?;
    let institutional_email = self.institutional_email(required(
      form.institutional_email,
      "institutionalEmail",
    )?)?;
    let personal_email =
      self.personal_email(required(form.personal_email, "personalEmail")?)?;
    let phone = self.phone(required(form.phone, "phone")?)?;
    let major = self.major(required(form.major, "major")?)?;

    distinct_emails(&institutional_email, &personal_email)?;

    Ok(NewParticipant {
      name,
      nim,
      institutional_email,
      personal_email,
      phone,
      major,
      payment_proof: None,
    })
  }

  /// Validate the present fields of a partial update with the same rules as
  /// creation, then check the merged record still has distinct emails. The
  /// payment proof is attached separately by the caller.
  pub fn validate_patch(
    &self,
    current: &Participant,
    form: ParticipantForm,
  ) -> Result<ParticipantPatch> {
    let patch = ParticipantPatch {
      name:                form.name.map(|v| self.name(v)).transpose()?,
      nim:                 form.nim.map(|v| self.nim(v)).transpose()?,
      institutional_email: form
        .institutional_email
        .map(|v| self.institutional_email(v))
        .transpose()?,
      personal_email:      form
        .personal_email
        .map(|v| self.personal_email(v))
        .transpose()?,
      phone:               form.phone.map(|v| self.phone(v)).transpose()?,
      major:               form.major.map(|v| self.major(v)).transpose()?,
      payment_proof:       None,
    };

    let merged = patch.apply_to(current);
    distinct_emails(&merged.institutional_email, &merged.personal_email)?;

    Ok(patch)
  }

  /// Check an uploaded payment proof against the size cap, the declared
  /// content type and the file signature.
  pub fn check_upload(
    &self,
    content_type: Option<&str>,
    bytes: &[u8],
  ) -> Result<ImageKind, UploadError> {
    if bytes.is_empty() {
      return Err(UploadError::Empty);
    }
    if bytes.len() > self.max_upload_bytes {
      return Err(UploadError::TooLarge { limit: self.max_upload_bytes });
    }

    let declared = content_type.unwrap_or_default();
    if !matches!(declared, "image/png" | "image/jpg" | "image/jpeg") {
      return Err(UploadError::UnsupportedType(declared.to_owned()));
    }

    ImageKind::sniff(bytes)
      .ok_or_else(|| UploadError::UnsupportedType(declared.to_owned()))
  }

  // ── Individual fields ────────────────────────────────────────────────────

  fn name(&self, raw: String) -> Result<String> {
    let name = raw.trim();
    if name.is_empty() {
      return Err(Error::MissingField("name"));
    }
    if name.chars().count() > 200 {
      return Err(Error::invalid("name", "must be at most 200 characters"));
    }
    Ok(name.to_owned())
  }

  fn nim(&self, raw: NimInput) -> Result<i64> {
    let nim = match raw {
      NimInput::Number(n) => n,
      NimInput::Text(s) => {
        let s = s.trim();
        if s.is_empty() {
          return Err(Error::MissingField("nim"));
        }
        if !s.bytes().all(|b| b.is_ascii_digit()) {
          return Err(Error::invalid("nim", "must contain digits only"));
        }
        s.parse()
          .map_err(|_| Error::invalid("nim", "is out of range"))?
      }
    };
    if nim <= 0 {
      return Err(Error::invalid("nim", "must be a positive number"));
    }
    Ok(nim)
  }

  fn institutional_email(&self, raw: String) -> Result<String> {
    let email = normalise_email("institutionalEmail", &raw)?;
    let suffix = format!("@{}", self.institutional_domain.to_ascii_lowercase());
    if !email.ends_with(&suffix) {
      return Err(Error::invalid(
        "institutionalEmail",
        format!("must end with {suffix}"),
      ));
    }
    Ok(email)
  }

  fn personal_email(&self, raw: String) -> Result<String> {
    normalise_email("personalEmail", &raw)
  }

  fn phone(&self, raw: String) -> Result<String> {
    let phone: String = raw
      .chars()
      .filter(|c| !c.is_whitespace() && *c != '-')
      .collect();
    if phone.is_empty() {
      return Err(Error::MissingField("phone"));
    }

    let digits = phone.strip_prefix('+').unwrap_or(&phone);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
      return Err(Error::invalid("phone", "must contain digits only"));
    }
    if !self.phone_prefixes.iter().any(|p| phone.starts_with(p.as_str())) {
      return Err(Error::invalid(
        "phone",
        format!("must start with one of {}", self.phone_prefixes.join(", ")),
      ));
    }
    let len = phone.len();
    if len < self.phone_min_len || len > self.phone_max_len {
      return Err(Error::invalid(
        "phone",
        format!(
          "must be between {} and {} characters long",
          self.phone_min_len, self.phone_max_len
        ),
      ));
    }
    Ok(phone)
  }

  fn major(&self, raw: String) -> Result<Major> { Major::try_from(raw) }
}

fn required(value: Option<String>, field: &'static str) -> Result<String> {
  value.ok_or(Error::MissingField(field))
}

fn normalise_email(field: &'static str, raw: &str) -> Result<String> {
  let email = raw.trim().to_lowercase();
  if email.is_empty() {
    return Err(Error::MissingField(field));
  }
  let valid = match email.split_once('@') {
    Some((local, domain)) => {
      !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
    }
    None => false,
  };
  if !valid {
    return Err(Error::invalid(field, "is not a valid email address"));
  }
  Ok(email)
}

fn distinct_emails(institutional: &str, personal: &str) -> Result<()> {
  if institutional.eq_ignore_ascii_case(personal) {
    return Err(Error::invalid(
      "personalEmail",
      "must differ from the institutional email",
    ));
  }
  Ok(())
}

// ─── Uploads ─────────────────────────────────────────────────────────────────

/// Why an uploaded payment proof was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
  #[error("file is empty")]
  Empty,

  #[error("file exceeds the {limit} byte limit")]
  TooLarge { limit: usize },

  #[error("unsupported file type {0:?}; only .png, .jpg, .jpeg are allowed")]
  UnsupportedType(String),
}

/// An accepted image format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
  Png,
  Jpeg,
}

impl ImageKind {
  const PNG_SIGNATURE: &'static [u8] = b"\x89PNG\r\n\x1a\n";
  const JPEG_SIGNATURE: &'static [u8] = &[0xFF, 0xD8, 0xFF];

  /// Identify the format from the leading bytes.
  pub fn sniff(bytes: &[u8]) -> Option<Self> {
    if bytes.starts_with(Self::PNG_SIGNATURE) {
      Some(Self::Png)
    } else if bytes.starts_with(Self::JPEG_SIGNATURE) {
      Some(Self::Jpeg)
    } else {
      None
    }
  }

  pub fn content_type(self) -> &'static str {
    match self {
      Self::Png => "image/png",
      Self::Jpeg => "image/jpeg",
    }
  }

  pub fn extension(self) -> &'static str {
    match self {
      Self::Png => "png",
      Self::Jpeg => "jpg",
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::Utc;
  use uuid::Uuid;

  use super::*;

  const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

  fn form() -> ParticipantForm {
    ParticipantForm {
      name:                Some("  Ada Lovelace ".into()),
      nim:                 Some(NimInput::Text("2501234567".into())),
      institutional_email: Some("Ada.Lovelace@BINUS.ac.id".into()),
      personal_email:      Some("ada@example.com".into()),
      phone:               Some("0812-3456-7890".into()),
      major:               Some("Computer Science".into()),
    }
  }

  fn rules() -> RegistrationRules { RegistrationRules::default() }

  #[test]
  fn valid_form_is_normalised() {
    let p = rules().validate_new(form()).unwrap();
    assert_eq!(p.name, "Ada Lovelace");
    assert_eq!(p.nim, 2501234567);
    assert_eq!(p.institutional_email, "ada.lovelace@binus.ac.id");
    assert_eq!(p.phone, "081234567890");
    assert_eq!(p.major, Major::ComputerScience);
    assert_eq!(p.payment_proof, None);
  }

  #[test]
  fn missing_field_is_named() {
    let mut f = form();
    f.phone = None;
    assert_eq!(rules().validate_new(f), Err(Error::MissingField("phone")));
  }

  #[test]
  fn nim_must_be_numeric() {
    let mut f = form();
    f.nim = Some(NimInput::Text("25A1".into()));
    assert!(matches!(
      rules().validate_new(f),
      Err(Error::InvalidField { field: "nim", .. })
    ));
  }

  #[test]
  fn institutional_email_needs_domain_suffix() {
    let mut f = form();
    f.institutional_email = Some("ada@gmail.com".into());
    assert!(matches!(
      rules().validate_new(f),
      Err(Error::InvalidField { field: "institutionalEmail", .. })
    ));

    let mut f = form();
    f.institutional_email = Some("ada@notbinus.ac.id".into());
    assert!(rules().validate_new(f).is_err());
  }

  #[test]
  fn personal_email_must_differ() {
    let mut f = form();
    f.personal_email = Some("ADA.lovelace@binus.ac.id".into());
    assert!(matches!(
      rules().validate_new(f),
      Err(Error::InvalidField { field: "personalEmail", .. })
    ));
  }

  #[test]
  fn phone_prefix_and_length() {
    let r = rules();
    for bad in ["0712345678901", "08123", "08123456789012345", "08abc4567890"] {
      let mut f = form();
      f.phone = Some(bad.into());
      assert!(
        matches!(r.validate_new(f), Err(Error::InvalidField { field: "phone", .. })),
        "{bad} should be rejected"
      );
    }
    let mut f = form();
    f.phone = Some("+6281234567890".into());
    assert_eq!(r.validate_new(f).unwrap().phone, "+6281234567890");
  }

  #[test]
  fn unknown_major() {
    let mut f = form();
    f.major = Some("Alchemy".into());
    assert_eq!(
      rules().validate_new(f),
      Err(Error::UnknownMajor("Alchemy".into()))
    );
  }

  #[test]
  fn patch_validates_only_present_fields_against_merged_record() {
    let current = Participant {
      id:                  Uuid::new_v4(),
      name:                "Ada".into(),
      nim:                 1,
      institutional_email: "ada@binus.ac.id".into(),
      personal_email:      "ada@example.com".into(),
      phone:               "081234567890".into(),
      major:               Major::ComputerScience,
      payment_proof:       None,
      registered_at:       Utc::now(),
    };

    let ok = rules()
      .validate_patch(&current, ParticipantForm {
        major: Some("Digital Psychology".into()),
        ..Default::default()
      })
      .unwrap();
    assert_eq!(ok.major, Some(Major::DigitalPsychology));
    assert_eq!(ok.name, None);

    let clash = rules().validate_patch(&current, ParticipantForm {
      personal_email: Some("ada@binus.ac.id".into()),
      ..Default::default()
    });
    assert!(clash.is_err());
  }

  #[test]
  fn upload_checks() {
    let r = RegistrationRules { max_upload_bytes: 32, ..rules() };

    assert_eq!(r.check_upload(Some("image/png"), PNG), Ok(ImageKind::Png));
    assert_eq!(
      r.check_upload(Some("image/jpeg"), &[0xFF, 0xD8, 0xFF, 0xE0]),
      Ok(ImageKind::Jpeg)
    );
    assert_eq!(r.check_upload(Some("image/png"), &[]), Err(UploadError::Empty));
    assert_eq!(
      r.check_upload(Some("image/png"), &[0x89; 33]),
      Err(UploadError::TooLarge { limit: 32 })
    );
    assert!(matches!(
      r.check_upload(Some("application/pdf"), PNG),
      Err(UploadError::UnsupportedType(_))
    ));
    // Declared type is fine but the bytes are not an image.
    assert!(matches!(
      r.check_upload(Some("image/png"), b"GIF89a"),
      Err(UploadError::UnsupportedType(_))
    ));
  }
}
