//! The `ObjectStore` trait: where uploaded payment proofs live.
//!
//! No binary data is kept in the registry itself; participants hold only the
//! retrieval URI returned by [`ObjectStore::put`].

use std::future::Future;

use bytes::Bytes;

/// An object to be written.
#[derive(Debug, Clone)]
pub struct NewObject {
  pub content_type: &'static str,
  /// File extension without the leading dot, e.g. `png`.
  pub extension:    &'static str,
  pub bytes:        Bytes,
}

/// Where a written object can be found again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
  /// Backend-local key.
  pub key: String,
  /// Public retrieval URI, recorded on the participant.
  pub uri: String,
}

/// A fetched object.
#[derive(Debug, Clone)]
pub struct ObjectData {
  pub content_type: String,
  pub bytes:        Bytes,
}

/// Abstraction over an object storage backend.
pub trait ObjectStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist `object` under a freshly generated key.
  fn put(
    &self,
    object: NewObject,
  ) -> impl Future<Output = Result<StoredObject, Self::Error>> + Send + '_;

  /// Fetch an object by key. Returns `None` if it does not exist.
  fn fetch<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<Option<ObjectData>, Self::Error>> + Send + 'a;

  /// Delete the object a URI issued by [`ObjectStore::put`] points at.
  /// Returns `false` if there was nothing to delete.
  fn delete<'a>(
    &'a self,
    uri: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;
}
