//! Runtime server configuration, deserialised from `config.toml` layered with
//! `ENROL__*` environment variables.

use std::path::PathBuf;

use enrol_core::validation::RegistrationRules;
use serde::Deserialize;

use crate::{auth::AdminAccount, retry::ReadRetry};

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 5000 }

fn default_public_base_url() -> String { "http://localhost:5000".to_owned() }

fn default_store_path() -> PathBuf { PathBuf::from("enrol.sqlite3") }

fn default_upload_dir() -> PathBuf { PathBuf::from("uploads") }

/// One hour.
fn default_token_ttl_secs() -> u64 { 3600 }

#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:            String,
  #[serde(default = "default_port")]
  pub port:            u16,
  /// Externally visible origin; upload URIs are built from it.
  #[serde(default = "default_public_base_url")]
  pub public_base_url: String,
  #[serde(default = "default_store_path")]
  pub store_path:      PathBuf,
  #[serde(default = "default_upload_dir")]
  pub upload_dir:      PathBuf,
  /// HMAC secret for admin access tokens.
  pub jwt_secret:      String,
  #[serde(default = "default_token_ttl_secs")]
  pub token_ttl_secs:  u64,
  #[serde(default)]
  pub admins:          Vec<AdminAccount>,
  #[serde(default)]
  pub registration:    RegistrationRules,
  #[serde(default)]
  pub read_retry:      ReadRetry,
}

impl ServerConfig {
  /// Base URI under which stored uploads are served.
  pub fn uploads_base_url(&self) -> String {
    format!("{}/uploads", self.public_base_url.trim_end_matches('/'))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_fill_everything_but_the_secret() {
    let cfg: ServerConfig = serde_json::from_value(serde_json::json!({
      "jwt_secret": "s3cret",
      "public_base_url": "https://reg.example.org/",
    }))
    .unwrap();

    assert_eq!(cfg.port, 5000);
    assert_eq!(cfg.token_ttl_secs, 3600);
    assert!(cfg.admins.is_empty());
    assert_eq!(cfg.registration, RegistrationRules::default());
    assert_eq!(cfg.read_retry, ReadRetry::default());
    assert_eq!(cfg.uploads_base_url(), "https://reg.example.org/uploads");
  }

  #[test]
  fn secret_is_required() {
    assert!(serde_json::from_value::<ServerConfig>(serde_json::json!({})).is_err());
  }
}
