//! [`DiskObjectStore`]: payment proofs kept as files under `upload_dir`.
//!
//! Keys are random and flat (no directories), so a key can be validated with
//! a character whitelist before it ever touches the filesystem.

use std::{
  io,
  path::{Path, PathBuf},
};

use bytes::Bytes;
use enrol_core::objects::{NewObject, ObjectData, ObjectStore, StoredObject};
use uuid::Uuid;

#[derive(Clone)]
pub struct DiskObjectStore {
  root:     PathBuf,
  /// URI prefix for issued references, without a trailing slash.
  base_uri: String,
}

impl DiskObjectStore {
  /// Use `root` (created if missing) and issue URIs under `base_uri`.
  pub async fn open(root: impl AsRef<Path>, base_uri: &str) -> io::Result<Self> {
    let root = root.as_ref().to_path_buf();
    tokio::fs::create_dir_all(&root).await?;
    Ok(Self {
      root,
      base_uri: base_uri.trim_end_matches('/').to_owned(),
    })
  }

  fn key_from_uri<'a>(&self, uri: &'a str) -> Option<&'a str> {
    uri
      .strip_prefix(self.base_uri.as_str())?
      .strip_prefix('/')
      .filter(|key| is_valid_key(key))
  }
}

fn is_valid_key(key: &str) -> bool {
  !key.is_empty()
    && !key.starts_with('.')
    && key
      .bytes()
      .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
}

fn content_type_for(key: &str) -> &'static str {
  match key.rsplit_once('.').map(|(_, ext)| ext) {
    Some("png") => "image/png",
    Some("jpg" | "jpeg") => "image/jpeg",
    _ => "application/octet-stream",
  }
}

impl ObjectStore for DiskObjectStore {
  type Error = io::Error;

  async fn put(&self, object: NewObject) -> io::Result<StoredObject> {
    let key = format!(
      "payment-proof-{}.{}",
      Uuid::new_v4().simple(),
      object.extension
    );

    // Write then rename so readers never observe a partial file.
    let tmp = self.root.join(format!(".{key}.part"));
    tokio::fs::write(&tmp, &object.bytes).await?;
    tokio::fs::rename(&tmp, self.root.join(&key)).await?;

    let uri = format!("{}/{key}", self.base_uri);
    Ok(StoredObject { key, uri })
  }

  async fn fetch(&self, key: &str) -> io::Result<Option<ObjectData>> {
    if !is_valid_key(key) {
      return Ok(None);
    }
    match tokio::fs::read(self.root.join(key)).await {
      Ok(bytes) => Ok(Some(ObjectData {
        content_type: content_type_for(key).to_owned(),
        bytes:        Bytes::from(bytes),
      })),
      Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
      Err(e) => Err(e),
    }
  }

  async fn delete(&self, uri: &str) -> io::Result<bool> {
    let Some(key) = self.key_from_uri(uri) else {
      return Ok(false);
    };
    match tokio::fs::remove_file(self.root.join(key)).await {
      Ok(()) => Ok(true),
      Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
      Err(e) => Err(e),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  async fn store() -> (DiskObjectStore, PathBuf) {
    let dir = std::env::temp_dir().join(format!("enrol-objects-{}", Uuid::new_v4()));
    let store = DiskObjectStore::open(&dir, "http://localhost:5000/uploads/")
      .await
      .unwrap();
    (store, dir)
  }

  fn png() -> NewObject {
    NewObject {
      content_type: "image/png",
      extension:    "png",
      bytes:        Bytes::from_static(b"\x89PNG\r\n\x1a\nrest"),
    }
  }

  #[tokio::test]
  async fn put_fetch_delete() {
    let (store, dir) = store().await;

    let stored = store.put(png()).await.unwrap();
    assert!(stored.uri.starts_with("http://localhost:5000/uploads/payment-proof-"));
    assert!(stored.uri.ends_with(".png"));
    assert_eq!(stored.uri, format!("http://localhost:5000/uploads/{}", stored.key));

    let fetched = store.fetch(&stored.key).await.unwrap().unwrap();
    assert_eq!(fetched.content_type, "image/png");
    assert_eq!(fetched.bytes, png().bytes);

    assert!(store.delete(&stored.uri).await.unwrap());
    assert!(!store.delete(&stored.uri).await.unwrap());
    assert!(store.fetch(&stored.key).await.unwrap().is_none());

    tokio::fs::remove_dir_all(dir).await.unwrap();
  }

  #[tokio::test]
  async fn traversal_and_foreign_uris_are_refused() {
    let (store, dir) = store().await;

    assert!(store.fetch("../Cargo.toml").await.unwrap().is_none());
    assert!(store.fetch(".hidden").await.unwrap().is_none());
    assert!(!store.delete("http://elsewhere/uploads/x.png").await.unwrap());
    assert!(
      !store
        .delete("http://localhost:5000/uploads/../../etc/passwd")
        .await
        .unwrap()
    );

    tokio::fs::remove_dir_all(dir).await.unwrap();
  }
}
