//! [`DiscoverySession`] — one viewer's browsing session.
//!
//! The session owns the viewer's decisions, quota, filters and matches, and
//! mirrors every change to the injected [`StateStore`]. Each mutation takes
//! `&mut self`, so a viewer's decisions are applied strictly in order.
//!
//! A mutation is applied in memory first and then written with a single
//! [`StateStore::save_all`]. If that write fails the in-memory state is rolled
//! back, so memory and store never disagree about an accepted like.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;

use crate::{
  decision::{Decision, DecisionContext, DecisionRecorder, Outcome, Verdict},
  discovery::{DiscoveryQueue, QueueContext, QueuePosition, Ranked},
  filter::FilterSettings,
  geo::{Coordinates, Location},
  location::LocationProvider,
  matches::{Match, MatchRegistry},
  profile::{Candidate, ProfileId, Viewer, ViewerIdentity, ViewerProfile},
  quota::{QuotaPolicy, QuotaSnapshot, QuotaState},
  source::CandidateSource,
  store::{StateKey, StateSlot, StateStore},
  Error, Result,
};

/// Result of asking the location provider for a fix.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationRefresh {
  Updated(Coordinates),
  /// The provider failed; the previous origin (if any) is kept.
  Unavailable { reason: String },
}

/// A match together with the profile it refers to. The contact handle is
/// readable here and nowhere else.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchedProfile<'a> {
  pub matched:        &'a Match,
  pub candidate:      &'a Candidate,
  pub contact_handle: Option<&'a str>,
}

pub struct DiscoverySession<S: StateStore> {
  store:     S,
  policy:    QuotaPolicy,
  viewer:    Viewer,
  pool:      Vec<Candidate>,
  liked_me:  HashSet<ProfileId>,
  filters:   FilterSettings,
  decisions: DecisionRecorder,
  matches:   MatchRegistry,
  origin:    Option<Coordinates>,
  queue:     DiscoveryQueue,
}

/// Everything a failed save must put back.
struct Checkpoint {
  viewer:    Viewer,
  filters:   FilterSettings,
  decisions: DecisionRecorder,
  matches:   MatchRegistry,
  origin:    Option<Coordinates>,
  queue:     DiscoveryQueue,
}

fn queue_ctx<'a>(
  pool: &'a [Candidate],
  decisions: &'a DecisionRecorder,
  filters: &'a FilterSettings,
  origin: Option<Coordinates>,
) -> QueueContext<'a> {
  QueueContext {
    pool,
    liked: decisions.liked_ids(),
    disliked: decisions.disliked_ids(),
    settings: filters,
    origin,
  }
}

async fn load_slot<S, T>(store: &S, key: StateKey) -> Result<Option<T>>
where
  S: StateStore,
  T: DeserializeOwned,
{
  let raw = store.load(key).await.map_err(|e| Error::Store(Box::new(e)))?;
  Ok(raw.map(serde_json::from_value::<T>).transpose()?)
}

impl<S: StateStore> DiscoverySession<S> {
  /// Load the viewer's saved state from `store`, fetch the candidate pool
  /// from `source`, and build the first queue.
  pub async fn open<C: CandidateSource>(
    identity: ViewerIdentity,
    store: S,
    source: &C,
    policy: QuotaPolicy,
  ) -> Result<Self> {
    let id = identity.viewer_id;
    let key = |slot| StateKey::new(id, slot);

    let decisions: DecisionRecorder =
      load_slot(&store, key(StateSlot::Decisions)).await?.unwrap_or_default();
    let filters: FilterSettings =
      load_slot(&store, key(StateSlot::Filters)).await?.unwrap_or_default();
    let quota: QuotaState = load_slot(&store, key(StateSlot::Quota)).await?.unwrap_or_default();
    let matches: MatchRegistry =
      load_slot(&store, key(StateSlot::Matches)).await?.unwrap_or_default();
    let profile: Option<ViewerProfile> =
      load_slot::<S, Option<ViewerProfile>>(&store, key(StateSlot::Profile)).await?.flatten();
    let position: QueuePosition =
      load_slot(&store, key(StateSlot::Queue)).await?.unwrap_or_default();

    let mut pool = source
      .candidates()
      .await
      .map_err(|e| Error::Source(Box::new(e)))?;
    let liked_me = source
      .liked_me(id)
      .await
      .map_err(|e| Error::Source(Box::new(e)))?;

    // Never show the viewer their own profile.
    if let Some(own) = profile.as_ref() {
      pool.retain(|c| c.id != own.profile.id);
    }

    let origin = position.origin.or_else(|| {
      profile
        .as_ref()
        .and_then(|p| p.profile.location.as_ref())
        .map(Location::coordinates)
    });

    let viewer = Viewer { quota, profile, ..Viewer::new(identity) };
    let mut queue = DiscoveryQueue::build(queue_ctx(&pool, &decisions, &filters, origin));
    if let Some(current) = position.current.as_ref() {
      queue.seek(&pool, current);
    }

    tracing::info!(
      viewer = %id,
      tier = %viewer.tier,
      pool = pool.len(),
      decided = decisions.decisions().len(),
      matches = matches.len(),
      "discovery session opened"
    );

    Ok(Self {
      store,
      policy,
      viewer,
      pool,
      liked_me,
      filters,
      decisions,
      matches,
      origin,
      queue,
    })
  }

  fn position(&self) -> QueuePosition {
    QueuePosition {
      origin:  self.origin,
      current: self.current().map(|r| r.candidate.id.clone()),
    }
  }

  /// Write `slots` from the in-memory state in one `save_all`.
  async fn persist(&self, slots: &[StateSlot]) -> Result<()> {
    let mut entries = Vec::with_capacity(slots.len());
    for &slot in slots {
      let value = match slot {
        StateSlot::Decisions => serde_json::to_value(&self.decisions)?,
        StateSlot::Filters => serde_json::to_value(&self.filters)?,
        StateSlot::Quota => serde_json::to_value(self.viewer.quota)?,
        StateSlot::Matches => serde_json::to_value(&self.matches)?,
        StateSlot::Profile => serde_json::to_value(&self.viewer.profile)?,
        StateSlot::Queue => serde_json::to_value(self.position())?,
        StateSlot::Admirers => serde_json::to_value(&self.liked_me)?,
      };
      entries.push((StateKey::new(self.viewer.viewer_id, slot), value));
    }
    self
      .store
      .save_all(entries)
      .await
      .map_err(|e| Error::Store(Box::new(e)))?;
    tracing::debug!(viewer = %self.viewer.viewer_id, ?slots, "state saved");
    Ok(())
  }

  fn checkpoint(&self) -> Checkpoint {
    Checkpoint {
      viewer:    self.viewer.clone(),
      filters:   self.filters.clone(),
      decisions: self.decisions.clone(),
      matches:   self.matches.clone(),
      origin:    self.origin,
      queue:     self.queue.clone(),
    }
  }

  fn restore(&mut self, checkpoint: Checkpoint) {
    self.viewer = checkpoint.viewer;
    self.filters = checkpoint.filters;
    self.decisions = checkpoint.decisions;
    self.matches = checkpoint.matches;
    self.origin = checkpoint.origin;
    self.queue = checkpoint.queue;
  }

  /// Persist `slots`, or roll memory back to `checkpoint` if the write fails.
  async fn commit(&mut self, checkpoint: Checkpoint, slots: &[StateSlot]) -> Result<()> {
    if let Err(e) = self.persist(slots).await {
      tracing::warn!(error = %e, "save failed, change rolled back");
      self.restore(checkpoint);
      return Err(e);
    }
    Ok(())
  }

  fn rebuild_queue(&mut self) {
    self
      .queue
      .rebuild(queue_ctx(&self.pool, &self.decisions, &self.filters, self.origin));
  }

  // ── Browsing ──────────────────────────────────────────────────────────────

  /// The candidate to show now, or `None` when there is nobody left.
  pub fn current(&self) -> Option<Ranked<'_>> { self.queue.current(&self.pool) }

  fn advance_cursor(&mut self) {
    self
      .queue
      .advance(queue_ctx(&self.pool, &self.decisions, &self.filters, self.origin));
  }

  /// Skip the current candidate without deciding. The new position is saved.
  pub async fn advance(&mut self) -> Result<()> {
    let checkpoint = self.checkpoint();
    self.advance_cursor();
    self.commit(checkpoint, &[StateSlot::Queue]).await
  }

  pub fn upcoming(&self) -> impl Iterator<Item = Ranked<'_>> { self.queue.upcoming(&self.pool) }

  pub fn remaining(&self) -> usize { self.queue.remaining() }

  pub fn candidate(&self, id: &ProfileId) -> Option<&Candidate> {
    self.pool.iter().find(|c| &c.id == id)
  }

  // ── Decisions ─────────────────────────────────────────────────────────────

  /// Record a like or dislike on `candidate_id` and move past it.
  ///
  /// Quota exhaustion and repeated decisions are reported through the
  /// returned [`Outcome`]; nothing is recorded in either case.
  pub async fn decide(
    &mut self,
    candidate_id: &ProfileId,
    verdict: Verdict,
    now: DateTime<Utc>,
  ) -> Result<Outcome> {
    if self.candidate(candidate_id).is_none() {
      return Err(Error::UnknownCandidate(candidate_id.clone()));
    }
    let was_current = self
      .current()
      .is_some_and(|r| &r.candidate.id == candidate_id);

    let checkpoint = self.checkpoint();
    let ctx = DecisionContext {
      viewer:   &mut self.viewer,
      policy:   &self.policy,
      liked_me: &self.liked_me,
      registry: &mut self.matches,
    };
    let outcome = self.decisions.decide(ctx, candidate_id, verdict, now);

    if !outcome.is_recorded() {
      return Ok(outcome);
    }

    if was_current {
      self.advance_cursor();
    } else {
      self.queue.forget(&self.pool, candidate_id);
    }

    let mut slots = Vec::with_capacity(4);
    if verdict == Verdict::Like {
      slots.push(StateSlot::Quota);
    }
    slots.push(StateSlot::Decisions);
    if matches!(outcome, Outcome::Matched(_)) {
      slots.push(StateSlot::Matches);
    }
    slots.push(StateSlot::Queue);
    self.commit(checkpoint, &slots).await?;

    Ok(outcome)
  }

  pub async fn like(&mut self, candidate_id: &ProfileId, now: DateTime<Utc>) -> Result<Outcome> {
    self.decide(candidate_id, Verdict::Like, now).await
  }

  pub async fn dislike(&mut self, candidate_id: &ProfileId, now: DateTime<Utc>) -> Result<Outcome> {
    self.decide(candidate_id, Verdict::Dislike, now).await
  }

  pub fn decisions(&self) -> &[Decision] { self.decisions.decisions() }

  pub fn quota(&self, now: DateTime<Utc>) -> QuotaSnapshot {
    self.policy.snapshot(&self.viewer.quota, self.viewer.tier, now)
  }

  // ── Matches ───────────────────────────────────────────────────────────────

  pub fn matches(&self) -> &[Match] { self.matches.list() }

  /// Matches joined with their profiles, in creation order. Matches whose
  /// profile is no longer in the pool are left out.
  pub fn matched_profiles(&self) -> Vec<MatchedProfile<'_>> {
    self
      .matches
      .list()
      .iter()
      .filter_map(|m| {
        let candidate = self.candidate(&m.candidate_id)?;
        Some(MatchedProfile {
          matched: m,
          candidate,
          contact_handle: candidate.contact_handle(),
        })
      })
      .collect()
  }

  /// Who has liked the viewer, in pool order. Premium only.
  pub fn liked_me(&self) -> Result<Vec<&Candidate>> {
    if !self.viewer.tier.is_premium() {
      return Err(Error::PremiumRequired);
    }
    Ok(
      self
        .pool
        .iter()
        .filter(|c| self.liked_me.contains(&c.id))
        .collect(),
    )
  }

  // ── Preferences ───────────────────────────────────────────────────────────

  pub fn filters(&self) -> &FilterSettings { &self.filters }

  /// Replace the filter settings and rebuild the queue from scratch.
  pub async fn update_filters(&mut self, settings: FilterSettings) -> Result<()> {
    settings.validate()?;
    let checkpoint = self.checkpoint();
    self.filters = settings;
    self.rebuild_queue();
    self.commit(checkpoint, &[StateSlot::Filters, StateSlot::Queue]).await
  }

  pub async fn reset_filters(&mut self) -> Result<()> {
    self.update_filters(FilterSettings::default()).await
  }

  // ── Location ──────────────────────────────────────────────────────────────

  pub fn origin(&self) -> Option<Coordinates> { self.origin }

  /// Ask `provider` for a fix. On success the queue is rebuilt around the new
  /// origin; on failure the previous origin stays in place.
  pub async fn refresh_location<P: LocationProvider>(
    &mut self,
    provider: &P,
  ) -> Result<LocationRefresh> {
    let coords = match provider.current_position().await {
      Ok(c) => c,
      Err(e) => {
        tracing::warn!(error = %e, "location unavailable");
        return Ok(LocationRefresh::Unavailable { reason: e.to_string() });
      }
    };

    // Same inputs give the same ordering; keep the cursor where it is.
    if self.origin == Some(coords) {
      return Ok(LocationRefresh::Updated(coords));
    }

    let checkpoint = self.checkpoint();
    self.origin = Some(coords);
    let mut slots = vec![StateSlot::Queue];
    if let Some(profile) = self.viewer.profile.as_mut() {
      let location = match profile.profile.location.take() {
        Some(prev) => Location {
          latitude: coords.latitude,
          longitude: coords.longitude,
          ..prev
        },
        None => Location::from(coords),
      };
      profile.profile.location = Some(location);
      slots.push(StateSlot::Profile);
    }
    self.rebuild_queue();
    self.commit(checkpoint, &slots).await?;
    Ok(LocationRefresh::Updated(coords))
  }

  // ── Viewer ────────────────────────────────────────────────────────────────

  pub fn viewer(&self) -> &Viewer { &self.viewer }

  /// Create or replace the viewer's own profile.
  pub async fn save_profile(&mut self, profile: ViewerProfile) -> Result<()> {
    let checkpoint = self.checkpoint();
    let pool = self.pool.clone();
    self.pool.retain(|c| c.id != profile.profile.id);
    if let Some(loc) = profile.profile.location.as_ref() {
      self.origin = Some(loc.coordinates());
    }
    self.viewer.profile = Some(profile);
    self.rebuild_queue();
    if let Err(e) = self.commit(checkpoint, &[StateSlot::Profile, StateSlot::Queue]).await {
      self.pool = pool;
      return Err(e);
    }
    Ok(())
  }

  pub fn store(&self) -> &S { &self.store }
}
