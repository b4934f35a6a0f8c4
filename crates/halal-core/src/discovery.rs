//! The discovery queue: filtered candidates ordered by distance, with a
//! single "current" cursor.
//!
//! The queue holds indices into the session's candidate pool, never the
//! candidates themselves. Any change to the inputs (filters, location) is
//! handled by rebuilding, which drops the cursor position.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{
  filter::{filter_candidates, FilterSettings},
  geo::{distance_km, Coordinates},
  profile::{Candidate, ProfileId},
};

/// Inputs the queue is derived from.
#[derive(Debug, Clone, Copy)]
pub struct QueueContext<'a> {
  pub pool:     &'a [Candidate],
  pub liked:    &'a HashSet<ProfileId>,
  pub disliked: &'a HashSet<ProfileId>,
  pub settings: &'a FilterSettings,
  /// The viewer's last known position, if any.
  pub origin:   Option<Coordinates>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct QueueEntry {
  index:       usize,
  distance_km: Option<u32>,
}

/// A candidate as presented by the queue.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ranked<'a> {
  pub candidate:   &'a Candidate,
  /// `None` when either side's location is unknown.
  pub distance_km: Option<u32>,
}

/// Where browsing stopped: the origin the queue was ranked from and the
/// candidate under the cursor. Saved so a later session resumes there.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueuePosition {
  pub origin:  Option<Coordinates>,
  pub current: Option<ProfileId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryQueue {
  entries: Vec<QueueEntry>,
  cursor:  usize,
}

impl DiscoveryQueue {
  pub fn build(ctx: QueueContext<'_>) -> Self {
    let indices = filter_candidates(ctx.pool, ctx.liked, ctx.disliked, ctx.settings);

    let mut entries: Vec<QueueEntry> = indices
      .into_iter()
      .map(|index| {
        let distance_km = match (ctx.origin, ctx.pool[index].location.as_ref()) {
          (Some(origin), Some(loc)) => distance_km(origin, loc.coordinates()),
          _ => None,
        };
        QueueEntry { index, distance_km }
      })
      .filter(|e| {
        e.distance_km
          .is_none_or(|d| d <= ctx.settings.max_distance_km)
      })
      .collect();

    // Stable: equal distances keep filter order. Unknown sorts last.
    entries.sort_by_key(|e| e.distance_km.map_or(u64::MAX, u64::from));

    tracing::debug!(
      candidates = entries.len(),
      located = ctx.origin.is_some(),
      "discovery queue rebuilt"
    );

    Self { entries, cursor: 0 }
  }

  /// Discard the current ordering and cursor and derive a fresh one.
  pub fn rebuild(&mut self, ctx: QueueContext<'_>) { *self = Self::build(ctx); }

  /// The candidate under the cursor, or `None` when nothing is available.
  pub fn current<'a>(&self, pool: &'a [Candidate]) -> Option<Ranked<'a>> {
    self.entries.get(self.cursor).map(|e| e.resolve(pool))
  }

  /// Move to the next candidate. Past the end, rebuild from the filter and
  /// start again at the head.
  pub fn advance(&mut self, ctx: QueueContext<'_>) {
    self.cursor += 1;
    if self.cursor >= self.entries.len() {
      self.rebuild(ctx);
    }
  }

  /// Drop a candidate from the current ordering without moving to a
  /// different one.
  pub fn forget(&mut self, pool: &[Candidate], id: &ProfileId) {
    if let Some(pos) = self.entries.iter().position(|e| &pool[e.index].id == id) {
      self.entries.remove(pos);
      if pos < self.cursor {
        self.cursor -= 1;
      }
    }
  }

  /// Put the cursor on `id`. Returns `false`, leaving the cursor alone, when
  /// `id` is not queued.
  pub fn seek(&mut self, pool: &[Candidate], id: &ProfileId) -> bool {
    match self.entries.iter().position(|e| &pool[e.index].id == id) {
      Some(pos) => {
        self.cursor = pos;
        true
      }
      None => false,
    }
  }

  /// Candidates from the cursor onwards, in queue order.
  pub fn upcoming<'a>(&self, pool: &'a [Candidate]) -> impl Iterator<Item = Ranked<'a>> {
    self.entries[self.cursor.min(self.entries.len())..]
      .iter()
      .map(move |e| e.resolve(pool))
  }

  pub fn len(&self) -> usize { self.entries.len() }

  pub fn is_empty(&self) -> bool { self.entries.is_empty() }

  /// How many candidates are left, including the current one.
  pub fn remaining(&self) -> usize { self.entries.len().saturating_sub(self.cursor) }
}

impl QueueEntry {
  fn resolve(self, pool: &[Candidate]) -> Ranked<'_> {
    Ranked { candidate: &pool[self.index], distance_km: self.distance_km }
  }
}
