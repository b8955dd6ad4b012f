//! Bounded retry for idempotent store reads.
//!
//! Writes are never retried: a repeated registration write could admit the
//! same submission twice.

use std::{future::Future, time::Duration};

use enrol_core::store::StoreError;
use serde::Deserialize;

fn default_attempts() -> u32 { 3 }

fn default_backoff_ms() -> u64 { 50 }

/// Retry policy for reads that fail with a transient store error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ReadRetry {
  /// Total attempts, the first one included. `1` disables retrying.
  #[serde(default = "default_attempts")]
  pub attempts:   u32,
  /// Delay before the n-th retry is `n * backoff_ms`.
  #[serde(default = "default_backoff_ms")]
  pub backoff_ms: u64,
}

impl Default for ReadRetry {
  fn default() -> Self {
    Self { attempts: default_attempts(), backoff_ms: default_backoff_ms() }
  }
}

impl ReadRetry {
  pub async fn run<T, E, F, Fut>(&self, what: &str, mut op: F) -> Result<T, E>
  where
    E: StoreError,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
  {
    let mut attempt = 1;
    loop {
      match op().await {
        Ok(value) => return Ok(value),
        Err(e) if e.is_transient() && attempt < self.attempts => {
          tracing::warn!(error = %e, attempt, "{what} failed, retrying");
          tokio::time::sleep(Duration::from_millis(
            self.backoff_ms * u64::from(attempt),
          ))
          .await;
          attempt += 1;
        }
        Err(e) => return Err(e),
      }
    }
  }
}
