//! Administrator login and bearer-token verification.
//!
//! Admin passwords live in configuration as argon2 PHC strings. A successful
//! login yields an HS256 JWT carrying the admin's email; every admin request
//! re-verifies it statelessly.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use chrono::Utc;
use enrol_core::{objects::ObjectStore, store::RegistryStore};
use jsonwebtoken::{
  Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};

use crate::{AppState, Error, error::Result};

/// An administrator entry from configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminAccount {
  pub email:         String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
}

/// JWT claims carried by an admin access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
  pub sub:   String,
  pub email: String,
  pub iat:   i64,
  pub exp:   i64,
}

/// A freshly signed access token.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedToken {
  pub access_token: String,
  pub token_type:   &'static str,
  pub expires_in:   u64,
}

/// Credentials and signing keys accepted by this server instance.
pub struct AuthConfig {
  admins:     Vec<AdminAccount>,
  encoding:   EncodingKey,
  decoding:   DecodingKey,
  validation: Validation,
  ttl_secs:   u64,
  /// Verified against when the email is unknown, so both failure modes cost
  /// one argon2 verification.
  dummy_hash: String,
}

impl AuthConfig {
  pub fn new(
    admins: Vec<AdminAccount>,
    jwt_secret: &str,
    ttl_secs: u64,
  ) -> Result<Self, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let dummy_hash = Argon2::default()
      .hash_password(b"enrol-unknown-admin", &salt)?
      .to_string();

    Ok(Self {
      admins,
      encoding: EncodingKey::from_secret(jwt_secret.as_bytes()),
      decoding: DecodingKey::from_secret(jwt_secret.as_bytes()),
      validation: Validation::new(Algorithm::HS256),
      ttl_secs,
      dummy_hash,
    })
  }

  fn account(&self, email: &str) -> Option<&AdminAccount> {
    self.admins.iter().find(|a| a.email.eq_ignore_ascii_case(email))
  }

  /// Check an email/password pair and issue a token on success.
  pub fn login(&self, email: &str, password: &str) -> Result<IssuedToken> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
      return Err(Error::Validation(
        "Email and password are required.".to_owned(),
      ));
    }

    let account = self.account(email);
    let hash = account.map_or(self.dummy_hash.as_str(), |a| a.password_hash.as_str());
    let verified = verify_password(password, hash);

    match account {
      Some(account) if verified => {
        tracing::info!(admin = %account.email, "admin logged in");
        self.issue(&account.email)
      }
      _ => {
        tracing::warn!(email, "rejected admin login");
        Err(Error::InvalidCredentials)
      }
    }
  }

  /// Sign a token for `email`, valid for the configured TTL.
  pub fn issue(&self, email: &str) -> Result<IssuedToken> {
    let iat = Utc::now().timestamp();
    let ttl = i64::try_from(self.ttl_secs).unwrap_or(i64::MAX);
    let claims = Claims {
      sub: email.to_owned(),
      email: email.to_owned(),
      iat,
      exp: iat.saturating_add(ttl),
    };
    let access_token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
      .map_err(Error::internal)?;

    Ok(IssuedToken {
      access_token,
      token_type: "Bearer",
      expires_in: self.ttl_secs,
    })
  }

  /// Verify signature and expiry, and that the subject is still an admin.
  pub fn verify(&self, token: &str) -> Result<Claims> {
    let data = decode::<Claims>(token, &self.decoding, &self.validation)
      .map_err(|_| Error::Forbidden)?;
    if self.account(&data.claims.email).is_none() {
      return Err(Error::Forbidden);
    }
    Ok(data.claims)
  }
}

fn verify_password(password: &str, phc: &str) -> bool {
  match PasswordHash::new(phc) {
    Ok(parsed) => Argon2::default()
      .verify_password(password.as_bytes(), &parsed)
      .is_ok(),
    Err(e) => {
      tracing::warn!(error = %e, "unparseable admin password hash");
      false
    }
  }
}

/// Proof that the request carried a valid admin token.
#[derive(Debug, Clone)]
pub struct AdminIdentity {
  pub email: String,
}

/// Verify the bearer token directly from headers.
///
/// A missing header or one without a `Bearer` token is `Unauthenticated`; a
/// token that fails verification is `Forbidden`.
pub fn verify_bearer(headers: &HeaderMap, auth: &AuthConfig) -> Result<AdminIdentity> {
  let token = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(str::trim)
    .filter(|t| !t.is_empty())
    .ok_or(Error::Unauthenticated)?;

  let claims = auth.verify(token)?;
  Ok(AdminIdentity { email: claims.email })
}

impl<S, O> FromRequestParts<AppState<S, O>> for AdminIdentity
where
  S: RegistryStore + 'static,
  O: ObjectStore + 'static,
{
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S, O>,
  ) -> Result<Self, Self::Rejection> {
    verify_bearer(&parts.headers, &state.auth)
  }
}

#[cfg(test)]
mod tests {
  use axum::http::HeaderValue;

  use super::*;

  const SECRET: &str = "test-secret";

  fn hash(password: &str) -> String {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .unwrap()
      .to_string()
  }

  fn auth() -> AuthConfig {
    AuthConfig::new(
      vec![AdminAccount {
        email:         "admin@example.com".into(),
        password_hash: hash("secret"),
      }],
      SECRET,
      3600,
    )
    .unwrap()
  }

  fn bearer(token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
      header::AUTHORIZATION,
      HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
    );
    headers
  }

  #[test]
  fn login_then_verify() {
    let auth = auth();
    let issued = auth.login("Admin@Example.com", "secret").unwrap();
    assert_eq!(issued.expires_in, 3600);

    let identity = verify_bearer(&bearer(&issued.access_token), &auth).unwrap();
    assert_eq!(identity.email, "admin@example.com");
  }

  #[test]
  fn wrong_password_and_unknown_email_look_the_same() {
    let auth = auth();
    let wrong = auth.login("admin@example.com", "nope").unwrap_err();
    let unknown = auth.login("ghost@example.com", "secret").unwrap_err();
    assert!(matches!(wrong, Error::InvalidCredentials));
    assert!(matches!(unknown, Error::InvalidCredentials));
    assert_eq!(wrong.to_string(), unknown.to_string());
  }

  #[test]
  fn empty_fields_are_a_validation_error() {
    assert!(matches!(
      auth().login("", "secret"),
      Err(Error::Validation(_))
    ));
  }

  #[test]
  fn missing_or_non_bearer_header_is_unauthenticated() {
    let auth = auth();
    assert!(matches!(
      verify_bearer(&HeaderMap::new(), &auth),
      Err(Error::Unauthenticated)
    ));

    let mut basic = HeaderMap::new();
    basic.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic Zm9vOmJhcg=="));
    assert!(matches!(verify_bearer(&basic, &auth), Err(Error::Unauthenticated)));
  }

  #[test]
  fn garbage_and_foreign_tokens_are_forbidden() {
    let auth = auth();
    assert!(matches!(
      verify_bearer(&bearer("not.a.jwt"), &auth),
      Err(Error::Forbidden)
    ));

    let other = AuthConfig::new(Vec::new(), "another-secret", 3600).unwrap();
    let foreign = encode(
      &Header::new(Algorithm::HS256),
      &Claims {
        sub:   "admin@example.com".into(),
        email: "admin@example.com".into(),
        iat:   Utc::now().timestamp(),
        exp:   Utc::now().timestamp() + 3600,
      },
      &other.encoding,
    )
    .unwrap();
    assert!(matches!(verify_bearer(&bearer(&foreign), &auth), Err(Error::Forbidden)));
  }

  #[test]
  fn expired_token_is_forbidden() {
    let auth = auth();
    let now = Utc::now().timestamp();
    let expired = encode(
      &Header::new(Algorithm::HS256),
      &Claims {
        sub:   "admin@example.com".into(),
        email: "admin@example.com".into(),
        iat:   now - 7200,
        exp:   now - 3600,
      },
      &auth.encoding,
    )
    .unwrap();
    assert!(matches!(verify_bearer(&bearer(&expired), &auth), Err(Error::Forbidden)));
  }

  #[test]
  fn token_for_removed_admin_is_forbidden() {
    let auth = auth();
    let token = auth.issue("former@example.com").unwrap();
    assert!(matches!(
      verify_bearer(&bearer(&token.access_token), &auth),
      Err(Error::Forbidden)
    ));
  }
}
