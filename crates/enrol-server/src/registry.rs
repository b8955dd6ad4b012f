//! The registration ledger: public admission, the admin directory, and the
//! admission gate, on top of any [`RegistryStore`] and [`ObjectStore`].
//!
//! Uniqueness is decided by the store. The duplicate pre-check here only
//! exists to give a precise message before an upload is written.
//!
//! Uploads are written before the record. If the record write fails the
//! object is deleted again. A replaced or removed payment proof is deleted
//! once the record no longer points at it. All cleanups are best effort and
//! only logged on failure.

use std::sync::Arc;

use bytes::Bytes;
use enrol_core::{
  gate::{GateState, REGISTRATION_STATUS_KEY},
  objects::{NewObject, ObjectStore, StoredObject},
  participant::{Participant, ParticipantForm},
  store::RegistryStore,
  validation::RegistrationRules,
};
use uuid::Uuid;

use crate::{Error, error::Result, retry::ReadRetry};

/// An uploaded payment-proof file, as received.
#[derive(Debug, Clone)]
pub struct Upload {
  pub content_type: Option<String>,
  pub bytes:        Bytes,
}

pub struct Registry<S, O> {
  store:   Arc<S>,
  objects: Arc<O>,
  rules:   RegistrationRules,
  retry:   ReadRetry,
}

impl<S, O> Registry<S, O>
where
  S: RegistryStore,
  O: ObjectStore,
{
  pub fn new(
    store: Arc<S>,
    objects: Arc<O>,
    rules: RegistrationRules,
    retry: ReadRetry,
  ) -> Self {
    Self { store, objects, rules, retry }
  }

  pub fn rules(&self) -> &RegistrationRules { &self.rules }

  pub fn objects(&self) -> &O { &self.objects }

  // ── Admission gate ────────────────────────────────────────────────────────

  /// Current gate state; an absent setting reads as closed.
  pub async fn gate(&self) -> Result<GateState> {
    let flag = self
      .retry
      .run("read admission gate", move || {
        self.store.get_flag(REGISTRATION_STATUS_KEY)
      })
      .await
      .map_err(Error::store)?;
    Ok(GateState::from_flag(flag))
  }

  pub async fn is_open(&self) -> Result<bool> { Ok(self.gate().await?.is_open()) }

  /// Reject with `RegistrationClosed` unless the gate is open.
  pub async fn ensure_open(&self) -> Result<()> {
    if self.is_open().await? {
      Ok(())
    } else {
      Err(Error::RegistrationClosed)
    }
  }

  /// Flip the gate and return its new state.
  pub async fn toggle(&self, actor: &str) -> Result<GateState> {
    let open = self
      .store
      .toggle_flag(REGISTRATION_STATUS_KEY)
      .await
      .map_err(Error::store)?;
    let state = GateState::from(open);
    tracing::info!(%state, admin = actor, "admission gate toggled");
    Ok(state)
  }

  // ── Admission ─────────────────────────────────────────────────────────────

  /// Public registration: the gate must be open and, if configured, a
  /// payment proof must be attached.
  pub async fn register(
    &self,
    form: ParticipantForm,
    proof: Option<Upload>,
  ) -> Result<Participant> {
    self.ensure_open().await?;
    let participant = self
      .admit(form, proof, self.rules.require_payment_proof)
      .await?;
    tracing::info!(id = %participant.id, nim = participant.nim, "participant registered");
    Ok(participant)
  }

  /// Administrator creation: ignores the gate, payment proof optional.
  pub async fn create(
    &self,
    form: ParticipantForm,
    proof: Option<Upload>,
    actor: &str,
  ) -> Result<Participant> {
    let participant = self.admit(form, proof, false).await?;
    tracing::info!(id = %participant.id, admin = actor, "participant created");
    Ok(participant)
  }

  async fn admit(
    &self,
    form: ParticipantForm,
    proof: Option<Upload>,
    proof_required: bool,
  ) -> Result<Participant> {
    let mut input = self.rules.validate_new(form)?;

    let image = match proof {
      Some(upload) => Some(self.image(upload)?),
      None if proof_required => return Err(Error::UploadRequired),
      None => None,
    };

    if let Some(field) = self
      .store
      .find_duplicate(input.nim, &input.institutional_email)
      .await
      .map_err(Error::store)?
    {
      return Err(Error::DuplicateField(field));
    }

    let stored = self.put_image(image).await?;
    input.payment_proof = stored.as_ref().map(|o| o.uri.clone());

    match self.store.create_participant(input).await {
      Ok(participant) => Ok(participant),
      Err(e) => {
        if let Some(object) = stored {
          self.discard(&object.uri).await;
        }
        Err(Error::store(e))
      }
    }
  }

  // ── Directory ─────────────────────────────────────────────────────────────

  /// All participants, most recently registered first.
  pub async fn list(&self) -> Result<Vec<Participant>> {
    self
      .retry
      .run("list participants", move || self.store.list_participants())
      .await
      .map_err(Error::store)
  }

  /// Patch a participant. Present fields are validated with the creation
  /// rules; uniqueness is left to the store. An attached image replaces the
  /// payment proof.
  pub async fn update(
    &self,
    id: Uuid,
    form: ParticipantForm,
    proof: Option<Upload>,
    actor: &str,
  ) -> Result<Participant> {
    let current = self
      .retry
      .run("read participant", move || self.store.get_participant(id))
      .await
      .map_err(Error::store)?
      .ok_or(Error::NotFound)?;

    let mut patch = self.rules.validate_patch(&current, form)?;
    let image = proof.map(|upload| self.image(upload)).transpose()?;
    if patch.is_empty() && image.is_none() {
      return Ok(current);
    }

    let stored = self.put_image(image).await?;
    patch.payment_proof = stored.as_ref().map(|o| o.uri.clone());

    let result = self.store.update_participant(id, patch).await;
    let updated = match (result, stored) {
      (Ok(Some(updated)), stored) => {
        if stored.is_some()
          && let Some(old) = &current.payment_proof
          && updated.payment_proof.as_ref() != Some(old)
        {
          self.discard(old).await;
        }
        updated
      }
      (result, Some(object)) => {
        self.discard(&object.uri).await;
        result.map_err(Error::store)?.ok_or(Error::NotFound)?
      }
      (result, None) => result.map_err(Error::store)?.ok_or(Error::NotFound)?,
    };
    tracing::info!(%id, admin = actor, "participant updated");
    Ok(updated)
  }

  /// Permanently delete a participant and its payment proof.
  pub async fn remove(&self, id: Uuid, actor: &str) -> Result<Participant> {
    let removed = self
      .store
      .delete_participant(id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::NotFound)?;

    if let Some(uri) = &removed.payment_proof {
      self.discard(uri).await;
    }
    tracing::info!(%id, admin = actor, "participant deleted");
    Ok(removed)
  }

  /// CSV of every participant, or `None` when there is nothing to export.
  pub async fn export_csv(&self) -> Result<Option<String>> {
    let participants = self.list().await?;
    if participants.is_empty() {
      return Ok(None);
    }
    Ok(Some(enrol_csv::serialize(&participants)))
  }

  /// Check an upload and describe the object to store for it.
  fn image(&self, upload: Upload) -> Result<NewObject> {
    let kind = self
      .rules
      .check_upload(upload.content_type.as_deref(), &upload.bytes)?;
    Ok(NewObject {
      content_type: kind.content_type(),
      extension:    kind.extension(),
      bytes:        upload.bytes,
    })
  }

  async fn put_image(&self, image: Option<NewObject>) -> Result<Option<StoredObject>> {
    match image {
      Some(object) => Ok(Some(self.objects.put(object).await.map_err(Error::internal)?)),
      None => Ok(None),
    }
  }

  async fn discard(&self, uri: &str) {
    if let Err(e) = self.objects.delete(uri).await {
      tracing::warn!(error = %e, uri, "failed to delete stored payment proof");
    }
  }
}
