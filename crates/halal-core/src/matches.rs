//! Confirmed mutual likes.
//!
//! The registry is append-only: there is no unmatch operation and the `active`
//! flag is always written as `true`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::profile::ProfileId;

/// A mutual like between the viewer and a candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
  pub match_id:     Uuid,
  pub viewer_id:    Uuid,
  pub candidate_id: ProfileId,
  pub created_at:   DateTime<Utc>,
  pub active:       bool,
}

impl Match {
  pub fn new(viewer_id: Uuid, candidate_id: ProfileId, created_at: DateTime<Utc>) -> Self {
    Self {
      match_id: Uuid::new_v4(),
      viewer_id,
      candidate_id,
      created_at,
      active: true,
    }
  }
}

/// The viewer's matches in creation order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchRegistry {
  matches: Vec<Match>,
}

impl MatchRegistry {
  pub fn new() -> Self { Self::default() }

  /// Append `m`, unless an active match with the same candidate already
  /// exists. Returns whether it was appended.
  pub fn add(&mut self, m: Match) -> bool {
    if self.contains(&m.candidate_id) {
      tracing::warn!(candidate = %m.candidate_id, "ignoring duplicate match");
      return false;
    }
    self.matches.push(m);
    true
  }

  pub fn list(&self) -> &[Match] { &self.matches }

  pub fn get(&self, candidate_id: &ProfileId) -> Option<&Match> {
    self
      .matches
      .iter()
      .find(|m| m.active && &m.candidate_id == candidate_id)
  }

  pub fn contains(&self, candidate_id: &ProfileId) -> bool {
    self.get(candidate_id).is_some()
  }

  pub fn len(&self) -> usize { self.matches.len() }

  pub fn is_empty(&self) -> bool { self.matches.is_empty() }
}
