//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, UUIDs are hyphenated lowercase strings and
//! slot documents are compact JSON.

use chrono::{DateTime, Utc};
use halal_core::store::StateSlot;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── StateSlot ───────────────────────────────────────────────────────────────

pub fn encode_slot(slot: StateSlot) -> String { slot.to_string() }

pub fn decode_slot(s: &str) -> Result<StateSlot> {
  s.parse().map_err(|_| Error::UnknownSlot(s.to_owned()))
}

// ─── Documents ───────────────────────────────────────────────────────────────

pub fn encode_value(value: &serde_json::Value) -> Result<String> {
  Ok(serde_json::to_string(value)?)
}

pub fn decode_value(s: &str) -> Result<serde_json::Value> { Ok(serde_json::from_str(s)?) }

// ─── Raw row types ───────────────────────────────────────────────────────────

/// Columns of a `viewer_state` listing, before decoding.
pub struct RawSlotRow {
  pub slot:       String,
  pub updated_at: String,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn slot_names_are_lowercase() {
    assert_eq!(encode_slot(StateSlot::Decisions), "decisions");
    assert_eq!(decode_slot("profile").unwrap(), StateSlot::Profile);
  }

  #[test]
  fn unknown_slot_is_rejected() {
    assert!(matches!(decode_slot("likes"), Err(Error::UnknownSlot(ref s)) if s == "likes"));
  }

  #[test]
  fn bad_timestamp_is_a_parse_error() {
    assert!(matches!(decode_dt("yesterday"), Err(Error::DateParse(_))));
  }
}
