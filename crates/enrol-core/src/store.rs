//! The `RegistryStore` trait: persistence for participants and settings.
//!
//! The trait is implemented by storage backends (e.g. `enrol-store-sqlite`).
//! The backend, not the service layer, is the arbiter of uniqueness: two
//! concurrent creations with the same `nim` race on the backend's unique
//! index and the loser reports [`StoreError::duplicate_field`].

use std::future::Future;

use uuid::Uuid;

use crate::participant::{
  NewParticipant, Participant, ParticipantPatch, UniqueField,
};

/// What the service layer needs to know about a backend failure.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  /// The unique field a write collided on, if that is why it failed.
  fn duplicate_field(&self) -> Option<UniqueField>;

  /// Whether retrying the same read may succeed (e.g. a busy database).
  fn is_transient(&self) -> bool;
}

/// Abstraction over a registry backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait RegistryStore: Send + Sync {
  type Error: StoreError;

  // ── Participants ──────────────────────────────────────────────────────

  /// Persist a new participant. `id` and `registered_at` are set by the
  /// store. Fails with a duplicate-field error on a uniqueness violation.
  fn create_participant(
    &self,
    input: NewParticipant,
  ) -> impl Future<Output = Result<Participant, Self::Error>> + Send + '_;

  /// Retrieve a participant by id. Returns `None` if not found.
  fn get_participant(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Participant>, Self::Error>> + Send + '_;

  /// All participants, most recently registered first.
  fn list_participants(
    &self,
  ) -> impl Future<Output = Result<Vec<Participant>, Self::Error>> + Send + '_;

  /// Report which unique field, if any, an existing participant already
  /// holds. Advisory only; it cannot stand in for the unique index.
  fn find_duplicate<'a>(
    &'a self,
    nim: i64,
    institutional_email: &'a str,
  ) -> impl Future<Output = Result<Option<UniqueField>, Self::Error>> + Send + 'a;

  /// Replace the fields present in `patch`. Returns `None` if the
  /// participant does not exist.
  fn update_participant(
    &self,
    id: Uuid,
    patch: ParticipantPatch,
  ) -> impl Future<Output = Result<Option<Participant>, Self::Error>> + Send + '_;

  /// Permanently delete a participant, returning the removed record.
  fn delete_participant(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Participant>, Self::Error>> + Send + '_;

  // ── Settings ──────────────────────────────────────────────────────────

  /// Read a boolean setting. Returns `None` if no record exists.
  fn get_flag<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<Option<bool>, Self::Error>> + Send + 'a;

  /// Atomically negate a boolean setting and return the new value. An
  /// absent record counts as `false`, so the first toggle writes `true`.
  fn toggle_flag<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;
}
