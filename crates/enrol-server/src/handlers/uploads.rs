//! `GET /uploads/{key}`: serve stored payment proofs.
//!
//! Keys are random and never reused, so responses are immutable and carry a
//! strong ETag over the content.

use axum::{
  extract::{Path, State},
  http::{HeaderMap, HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use enrol_core::{objects::ObjectStore, store::RegistryStore};
use sha2::{Digest, Sha256};

use crate::{AppState, Error, error::Result};

pub async fn serve<S, O>(
  State(state): State<AppState<S, O>>,
  Path(key): Path<String>,
  headers: HeaderMap,
) -> Result<Response>
where
  S: RegistryStore + 'static,
  O: ObjectStore + 'static,
{
  let object = state
    .registry
    .objects()
    .fetch(&key)
    .await
    .map_err(Error::internal)?
    .ok_or(Error::ObjectNotFound)?;

  let etag = compute_etag(&object.bytes);
  let fresh = headers
    .get(header::IF_NONE_MATCH)
    .and_then(|v| v.to_str().ok())
    .is_some_and(|v| v.split(',').any(|t| t.trim() == etag || t.trim() == "*"));

  let content_type = HeaderValue::from_str(&object.content_type)
    .unwrap_or(HeaderValue::from_static("application/octet-stream"));
  let response_headers = [
    (header::CONTENT_TYPE, content_type),
    (header::ETAG, HeaderValue::from_str(&etag).map_err(Error::internal)?),
    (
      header::CACHE_CONTROL,
      HeaderValue::from_static("public, max-age=31536000, immutable"),
    ),
  ];

  if fresh {
    return Ok((StatusCode::NOT_MODIFIED, response_headers).into_response());
  }
  Ok((response_headers, object.bytes).into_response())
}

/// Quoted hex SHA-256 of `bytes`.
pub fn compute_etag(bytes: &[u8]) -> String {
  format!("\"{}\"", hex::encode(Sha256::digest(bytes)))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn etag_is_quoted_and_content_addressed() {
    let a = compute_etag(b"abc");
    assert_eq!(
      a,
      "\"ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad\""
    );
    assert_ne!(a, compute_etag(b"abd"));
  }
}
