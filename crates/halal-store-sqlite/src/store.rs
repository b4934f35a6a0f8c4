//! [`SqliteStore`] — the SQLite implementation of [`StateStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use halal_core::store::{StateKey, StateSlot, StateStore};

use crate::{
  encode::{
    decode_dt, decode_slot, decode_value, encode_dt, encode_slot, encode_uuid, encode_value,
    RawSlotRow,
  },
  schema::SCHEMA,
  Error, Result,
};

const UPSERT: &str = "
  INSERT INTO viewer_state (viewer_id, slot, value_json, updated_at)
  VALUES (?1, ?2, ?3, ?4)
  ON CONFLICT (viewer_id, slot)
  DO UPDATE SET value_json = excluded.value_json, updated_at = excluded.updated_at
";

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Halal Match state store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

/// One saved slot and when it was last written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SavedSlot {
  pub slot:       StateSlot,
  pub updated_at: DateTime<Utc>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
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

  /// Every slot saved for `viewer_id`, ordered by slot name.
  pub async fn saved_slots(&self, viewer_id: Uuid) -> Result<Vec<SavedSlot>> {
    let id_str = encode_uuid(viewer_id);

    let rows: Vec<RawSlotRow> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT slot, updated_at FROM viewer_state WHERE viewer_id = ?1 ORDER BY slot",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], |row| {
            Ok(RawSlotRow {
              slot:       row.get(0)?,
              updated_at: row.get(1)?,
            })
          })?
          .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
      })
      .await?;

    rows
      .into_iter()
      .map(|raw| {
        Ok(SavedSlot {
          slot:       decode_slot(&raw.slot)?,
          updated_at: decode_dt(&raw.updated_at)?,
        })
      })
      .collect()
  }
}

#[cfg(test)]
impl SqliteStore {
  pub(crate) async fn execute_batch(&self, sql: &'static str) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(sql)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── StateStore impl ─────────────────────────────────────────────────────────

impl StateStore for SqliteStore {
  type Error = Error;

  async fn load(&self, key: StateKey) -> Result<Option<serde_json::Value>> {
    let id_str   = encode_uuid(key.viewer_id);
    let slot_str = encode_slot(key.slot);

    let raw: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT value_json FROM viewer_state WHERE viewer_id = ?1 AND slot = ?2",
              rusqlite::params![id_str, slot_str],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    raw.as_deref().map(decode_value).transpose()
  }

  async fn save(&self, key: StateKey, value: serde_json::Value) -> Result<()> {
    self.save_all(vec![(key, value)]).await
  }

  async fn save_all(&self, entries: Vec<(StateKey, serde_json::Value)>) -> Result<()> {
    let at_str = encode_dt(Utc::now());
    let rows = entries
      .iter()
      .map(|(key, value)| -> Result<(String, String, String)> {
        Ok((encode_uuid(key.viewer_id), encode_slot(key.slot), encode_value(value)?))
      })
      .collect::<Result<Vec<_>>>()?;
    let count = rows.len();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(UPSERT)?;
          for (id_str, slot_str, value_str) in &rows {
            stmt.execute(rusqlite::params![id_str, slot_str, value_str, at_str])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    tracing::trace!(count, "slots written");
    Ok(())
  }
}
