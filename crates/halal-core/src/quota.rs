//! Daily like allowance, tied to subscription tier.
//!
//! The counter resets on the first like of a new calendar day. Days are cut
//! at midnight in the policy's UTC offset, not on a rolling 24-hour window.

use chrono::{DateTime, FixedOffset, NaiveDate, Offset as _, Utc};
use serde::{Deserialize, Serialize};

use crate::profile::Tier;

pub const STANDARD_DAILY_LIKES: u32 = 10;
pub const PREMIUM_DAILY_LIKES: u32 = 100;

/// Per-viewer like counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaState {
  /// Likes issued on the day of `last_like_at`.
  pub like_count:   u32,
  pub last_like_at: Option<DateTime<Utc>>,
}

/// A read-only view of the quota for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaSnapshot {
  pub used:      u32,
  pub limit:     u32,
  pub remaining: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaPolicy {
  pub standard_daily_likes: u32,
  pub premium_daily_likes:  u32,
  /// Offset used to decide which calendar day a timestamp falls on.
  pub utc_offset:           FixedOffset,
}

impl Default for QuotaPolicy {
  fn default() -> Self {
    Self {
      standard_daily_likes: STANDARD_DAILY_LIKES,
      premium_daily_likes:  PREMIUM_DAILY_LIKES,
      utc_offset:           Utc.fix(),
    }
  }
}

impl QuotaPolicy {
  pub fn daily_limit(&self, tier: Tier) -> u32 {
    match tier {
      Tier::Standard => self.standard_daily_likes,
      Tier::Premium => self.premium_daily_likes,
    }
  }

  /// The calendar day `at` falls on.
  pub fn calendar_day(&self, at: DateTime<Utc>) -> NaiveDate {
    at.with_timezone(&self.utc_offset).date_naive()
  }

  fn is_same_day(&self, state: &QuotaState, now: DateTime<Utc>) -> bool {
    state
      .last_like_at
      .is_some_and(|last| self.calendar_day(last) == self.calendar_day(now))
  }

  /// Likes counted against today. A stale counter from an earlier day is 0.
  pub fn used_today(&self, state: &QuotaState, now: DateTime<Utc>) -> u32 {
    if self.is_same_day(state, now) { state.like_count } else { 0 }
  }

  pub fn is_exhausted(
    &self,
    state: &QuotaState,
    tier: Tier,
    now: DateTime<Utc>,
  ) -> bool {
    if !self.is_same_day(state, now) {
      return false;
    }
    state.like_count >= self.daily_limit(tier)
  }

  /// Count one accepted like. The only mutator of [`QuotaState`].
  pub fn record_like(&self, state: &mut QuotaState, now: DateTime<Utc>) {
    state.like_count = if self.is_same_day(state, now) {
      state.like_count.saturating_add(1)
    } else {
      1
    };
    state.last_like_at = Some(now);
  }

  pub fn remaining(&self, state: &QuotaState, tier: Tier, now: DateTime<Utc>) -> u32 {
    self
      .daily_limit(tier)
      .saturating_sub(self.used_today(state, now))
  }

  pub fn snapshot(
    &self,
    state: &QuotaState,
    tier: Tier,
    now: DateTime<Utc>,
  ) -> QuotaSnapshot {
    QuotaSnapshot {
      used:      self.used_today(state, now),
      limit:     self.daily_limit(tier),
      remaining: self.remaining(state, tier, now),
    }
  }
}
