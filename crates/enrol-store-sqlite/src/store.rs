//! [`SqliteStore`], the SQLite implementation of [`RegistryStore`].

use std::path::Path;

use chrono::{SubsecRound as _, Utc};
use enrol_core::{
  participant::{NewParticipant, Participant, ParticipantPatch, UniqueField},
  store::RegistryStore,
};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{
    PARTICIPANT_COLUMNS, RawParticipant, encode_dt, encode_major, encode_uuid,
    unique_violation,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An Enrol registry backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

fn select_by_id(
  conn: &rusqlite::Connection,
  id: &str,
) -> rusqlite::Result<Option<RawParticipant>> {
  conn
    .query_row(
      &format!(
        "SELECT {PARTICIPANT_COLUMNS} FROM participants WHERE participant_id = ?1"
      ),
      rusqlite::params![id],
      RawParticipant::from_row,
    )
    .optional()
}

// ─── RegistryStore impl ──────────────────────────────────────────────────────

impl RegistryStore for SqliteStore {
  type Error = Error;

  // ── Participants ──────────────────────────────────────────────────────────

  async fn create_participant(&self, input: NewParticipant) -> Result<Participant> {
    // Stored at microsecond precision; the returned record must match reads.
    let participant = Participant {
      id:                  Uuid::new_v4(),
      name:                input.name,
      nim:                 input.nim,
      institutional_email: input.institutional_email,
      personal_email:      input.personal_email,
      phone:               input.phone,
      major:               input.major,
      payment_proof:       input.payment_proof,
      registered_at:       Utc::now().trunc_subsecs(6),
    };

    let id_str    = encode_uuid(participant.id);
    let name      = participant.name.clone();
    let nim       = participant.nim;
    let inst      = participant.institutional_email.clone();
    let personal  = participant.personal_email.clone();
    let phone     = participant.phone.clone();
    let major_str = encode_major(participant.major);
    let proof     = participant.payment_proof.clone();
    let at_str    = encode_dt(participant.registered_at);

    let duplicate = self
      .conn
      .call(move |conn| {
        let inserted = conn.execute(
          "INSERT INTO participants (
             participant_id, name, nim, institutional_email, personal_email,
             phone, major, payment_proof, registered_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          rusqlite::params![
            id_str, name, nim, inst, personal, phone, major_str, proof, at_str,
          ],
        );
        match inserted {
          Ok(_) => Ok(None),
          Err(e) => match unique_violation(&e) {
            Some(field) => Ok(Some(field)),
            None => Err(e.into()),
          },
        }
      })
      .await?;

    if let Some(field) = duplicate {
      return Err(Error::Duplicate(field));
    }
    Ok(participant)
  }

  async fn get_participant(&self, id: Uuid) -> Result<Option<Participant>> {
    let id_str = encode_uuid(id);

    let raw = self
      .conn
      .call(move |conn| Ok(select_by_id(conn, &id_str)?))
      .await?;

    raw.map(RawParticipant::into_participant).transpose()
  }

  async fn list_participants(&self) -> Result<Vec<Participant>> {
    let raws: Vec<RawParticipant> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {PARTICIPANT_COLUMNS} FROM participants
           ORDER BY registered_at DESC, rowid DESC"
        ))?;
        let rows = stmt
          .query_map([], RawParticipant::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawParticipant::into_participant).collect()
  }

  async fn find_duplicate(
    &self,
    nim: i64,
    institutional_email: &str,
  ) -> Result<Option<UniqueField>> {
    let email = institutional_email.to_owned();

    let found = self
      .conn
      .call(move |conn| {
        let nim_taken = conn
          .query_row(
            "SELECT 1 FROM participants WHERE nim = ?1",
            rusqlite::params![nim],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if nim_taken {
          return Ok(Some(UniqueField::Nim));
        }

        let email_taken = conn
          .query_row(
            "SELECT 1 FROM participants WHERE institutional_email = ?1",
            rusqlite::params![email],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        Ok(email_taken.then_some(UniqueField::InstitutionalEmail))
      })
      .await?;

    Ok(found)
  }

  async fn update_participant(
    &self,
    id:    Uuid,
    patch: ParticipantPatch,
  ) -> Result<Option<Participant>> {
    let id_str    = encode_uuid(id);
    let major_str = patch.major.map(encode_major);

    let (raw, duplicate) = self
      .conn
      .call(move |conn| {
        let updated = conn.execute(
          "UPDATE participants SET
             name                = COALESCE(?2, name),
             nim                 = COALESCE(?3, nim),
             institutional_email = COALESCE(?4, institutional_email),
             personal_email      = COALESCE(?5, personal_email),
             phone               = COALESCE(?6, phone),
             major               = COALESCE(?7, major),
             payment_proof       = COALESCE(?8, payment_proof)
           WHERE participant_id = ?1",
          rusqlite::params![
            id_str,
            patch.name,
            patch.nim,
            patch.institutional_email,
            patch.personal_email,
            patch.phone,
            major_str,
            patch.payment_proof,
          ],
        );
        match updated {
          Ok(0) => Ok((None, None)),
          Ok(_) => Ok((select_by_id(conn, &id_str)?, None)),
          Err(e) => match unique_violation(&e) {
            Some(field) => Ok((None, Some(field))),
            None => Err(e.into()),
          },
        }
      })
      .await?;

    if let Some(field) = duplicate {
      return Err(Error::Duplicate(field));
    }
    raw.map(RawParticipant::into_participant).transpose()
  }

  async fn delete_participant(&self, id: Uuid) -> Result<Option<Participant>> {
    let id_str = encode_uuid(id);

    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let existing = select_by_id(&tx, &id_str)?;
        if existing.is_some() {
          tx.execute(
            "DELETE FROM participants WHERE participant_id = ?1",
            rusqlite::params![id_str],
          )?;
        }
        tx.commit()?;
        Ok(existing)
      })
      .await?;

    raw.map(RawParticipant::into_participant).transpose()
  }

  // ── Settings ──────────────────────────────────────────────────────────────

  async fn get_flag(&self, key: &str) -> Result<Option<bool>> {
    let key = key.to_owned();

    let raw: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT value_json FROM settings WHERE key = ?1",
              rusqlite::params![key],
              |r| r.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(|s| serde_json::from_str(&s)).transpose().map_err(Error::Json)
  }

  async fn toggle_flag(&self, key: &str) -> Result<bool> {
    let key    = key.to_owned();
    let at_str = encode_dt(Utc::now());

    // Read and write inside one transaction so concurrent toggles serialise
    // on the database write lock.
    let next = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(
          rusqlite::TransactionBehavior::Immediate,
        )?;
        let current: Option<String> = tx
          .query_row(
            "SELECT value_json FROM settings WHERE key = ?1",
            rusqlite::params![key],
            |r| r.get(0),
          )
          .optional()?;
        let current = match current {
          Some(s) => serde_json::from_str::<bool>(&s)
            .map_err(|e| tokio_rusqlite::Error::Other(Box::new(e)))?,
          None => false,
        };
        let next = !current;
        tx.execute(
          "INSERT INTO settings (key, value_json, updated_at) VALUES (?1, ?2, ?3)
           ON CONFLICT(key) DO UPDATE SET
             value_json = excluded.value_json,
             updated_at = excluded.updated_at",
          rusqlite::params![key, next.to_string(), at_str],
        )?;
        tx.commit()?;
        Ok(next)
      })
      .await?;

    Ok(next)
  }
}
