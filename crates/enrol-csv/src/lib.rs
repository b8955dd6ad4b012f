//! CSV export codec for Enrol participants.
//!
//! Pure synchronous; no HTTP or database dependencies. Every value, empty
//! ones included, is wrapped in double quotes with embedded quotes doubled,
//! so the output re-parses under any RFC 4180 reader.
//!
//! # Quick start
//!
//! ```no_run
//! let csv = enrol_csv::serialize(&[]);
//! assert!(csv.starts_with("\"id\","));
//! ```

use chrono::SecondsFormat;
use enrol_core::participant::Participant;

/// Header names, in the fixed export column order.
pub const COLUMNS: [&str; 9] = [
  "id",
  "name",
  "nim",
  "institutionalEmail",
  "personalEmail",
  "phone",
  "major",
  "paymentProof",
  "registeredAt",
];

/// Serialise `participants` as a header row followed by one row each.
/// Rows are `\n`-terminated.
pub fn serialize(participants: &[Participant]) -> String {
  let mut out = String::new();
  push_row(&mut out, COLUMNS.iter().copied());
  for p in participants {
    push_row(&mut out, row(p).iter().map(String::as_str));
  }
  out
}

/// The field values of one participant, in [`COLUMNS`] order.
///
/// `registeredAt` keeps its full stored precision, formatted exactly as the
/// JSON API renders it.
pub fn row(p: &Participant) -> [String; 9] {
  [
    p.id.to_string(),
    p.name.clone(),
    p.nim.to_string(),
    p.institutional_email.clone(),
    p.personal_email.clone(),
    p.phone.clone(),
    p.major.to_string(),
    p.payment_proof.clone().unwrap_or_default(),
    p.registered_at.to_rfc3339_opts(SecondsFormat::AutoSi, true),
  ]
}

fn push_row<'a>(out: &mut String, values: impl Iterator<Item = &'a str>) {
  for (i, value) in values.enumerate() {
    if i > 0 {
      out.push(',');
    }
    push_quoted(out, value);
  }
  out.push('\n');
}

fn push_quoted(out: &mut String, value: &str) {
  out.push('"');
  out.push_str(&value.replace('"', "\"\""));
  out.push('"');
}
