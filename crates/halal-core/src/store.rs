//! The `StateStore` trait: the persistence collaborator.
//!
//! Per-viewer state is kept as one JSON document per slot, the same shape the
//! per-device key/value storage of a client would hold. Backends (e.g.
//! `halal-store-sqlite`) implement the trait; the session depends only on it.

use std::{
  collections::HashMap,
  fmt,
  future::Future,
  sync::{Arc, Mutex, PoisonError},
};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use uuid::Uuid;

// ─── Keys ────────────────────────────────────────────────────────────────────

/// A piece of per-viewer state that is saved as a unit.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StateSlot {
  Decisions,
  Filters,
  Quota,
  Matches,
  Profile,
  /// Saved [`QueuePosition`](crate::discovery::QueuePosition).
  Queue,
  /// A liked-me set fixed for the viewer by a generating candidate source.
  Admirers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateKey {
  pub viewer_id: Uuid,
  pub slot:      StateSlot,
}

impl StateKey {
  pub fn new(viewer_id: Uuid, slot: StateSlot) -> Self { Self { viewer_id, slot } }
}

impl fmt::Display for StateKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.slot, self.viewer_id)
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a per-viewer key/value persistence backend.
///
/// `save` replaces the whole document for the key. `save_all` does the same
/// for several keys and either writes every document or none. All methods
/// return `Send` futures so a session can live on a multi-threaded runtime.
pub trait StateStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// The stored document for `key`, or `None` if nothing was saved yet.
  fn load(
    &self,
    key: StateKey,
  ) -> impl Future<Output = Result<Option<serde_json::Value>, Self::Error>> + Send + '_;

  /// Store `value` under `key`, replacing any previous document.
  fn save(
    &self,
    key: StateKey,
    value: serde_json::Value,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Store every `(key, value)` pair as one atomic write.
  fn save_all(
    &self,
    entries: Vec<(StateKey, serde_json::Value)>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

// ─── In-memory backend ───────────────────────────────────────────────────────

/// A process-local store. Cloning shares the underlying map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
  slots: Arc<Mutex<HashMap<StateKey, serde_json::Value>>>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  /// Number of documents held, across all viewers.
  pub fn len(&self) -> usize {
    self.slots.lock().unwrap_or_else(PoisonError::into_inner).len()
  }

  pub fn is_empty(&self) -> bool { self.len() == 0 }
}

impl StateStore for MemoryStore {
  type Error = std::convert::Infallible;

  async fn load(&self, key: StateKey) -> Result<Option<serde_json::Value>, Self::Error> {
    let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
    Ok(slots.get(&key).cloned())
  }

  async fn save(&self, key: StateKey, value: serde_json::Value) -> Result<(), Self::Error> {
    let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
    slots.insert(key, value);
    Ok(())
  }

  async fn save_all(
    &self,
    entries: Vec<(StateKey, serde_json::Value)>,
  ) -> Result<(), Self::Error> {
    let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
    slots.extend(entries);
    Ok(())
  }
}
