//! Like/dislike decisions and mutual-like detection.
//!
//! Per (viewer, candidate) pair the state machine is:
//!
//! ```text
//! Undecided ─like──▶ Liked ─(candidate liked viewer)─▶ Matched
//!     └─────dislike─▶ Disliked
//! ```
//!
//! Every state after `Undecided` is terminal. A decision is never overwritten.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::{
  matches::{Match, MatchRegistry},
  profile::{ProfileId, Viewer},
  quota::QuotaPolicy,
};

// ─── Records ─────────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Verdict {
  Like,
  Dislike,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
  pub decision_id:  Uuid,
  pub viewer_id:    Uuid,
  pub candidate_id: ProfileId,
  pub verdict:      Verdict,
  pub decided_at:   DateTime<Utc>,
}

// ─── Outcome ─────────────────────────────────────────────────────────────────

/// What happened to a decision. Delivered to the UI collaborator as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
  Liked,
  Disliked,
  /// The like completed a mutual pair.
  Matched(Match),
  /// The daily like allowance is used up. Nothing was recorded.
  QuotaExceeded { limit: u32 },
  /// The pair was decided earlier. Nothing was recorded.
  AlreadyDecided { verdict: Verdict },
}

impl Outcome {
  /// Whether the decision was recorded.
  pub fn is_recorded(&self) -> bool {
    matches!(self, Self::Liked | Self::Disliked | Self::Matched(_))
  }
}

// ─── Recorder ────────────────────────────────────────────────────────────────

/// Everything [`DecisionRecorder::decide`] reads or mutates besides the
/// decision log itself.
pub struct DecisionContext<'a> {
  pub viewer:   &'a mut Viewer,
  pub policy:   &'a QuotaPolicy,
  /// Candidates known to have liked the viewer.
  pub liked_me: &'a HashSet<ProfileId>,
  pub registry: &'a mut MatchRegistry,
}

/// The viewer's decision log plus lookup sets for the liked and disliked ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Decision>", into = "Vec<Decision>")]
pub struct DecisionRecorder {
  decisions: Vec<Decision>,
  liked:     HashSet<ProfileId>,
  disliked:  HashSet<ProfileId>,
}

impl From<Vec<Decision>> for DecisionRecorder {
  fn from(decisions: Vec<Decision>) -> Self {
    let mut recorder = Self::default();
    for d in decisions {
      if recorder.verdict_for(&d.candidate_id).is_none() {
        recorder.push(d);
      }
    }
    recorder
  }
}

impl From<DecisionRecorder> for Vec<Decision> {
  fn from(r: DecisionRecorder) -> Self { r.decisions }
}

impl DecisionRecorder {
  pub fn new() -> Self { Self::default() }

  pub fn decisions(&self) -> &[Decision] { &self.decisions }

  pub fn liked_ids(&self) -> &HashSet<ProfileId> { &self.liked }

  pub fn disliked_ids(&self) -> &HashSet<ProfileId> { &self.disliked }

  pub fn verdict_for(&self, candidate_id: &ProfileId) -> Option<Verdict> {
    if self.liked.contains(candidate_id) {
      Some(Verdict::Like)
    } else if self.disliked.contains(candidate_id) {
      Some(Verdict::Dislike)
    } else {
      None
    }
  }

  fn push(&mut self, d: Decision) {
    match d.verdict {
      Verdict::Like => self.liked.insert(d.candidate_id.clone()),
      Verdict::Dislike => self.disliked.insert(d.candidate_id.clone()),
    };
    self.decisions.push(d);
  }

  /// Record `verdict` on `candidate_id`.
  ///
  /// A like is refused outright when the viewer's quota is exhausted; an
  /// accepted like consumes one unit of quota and becomes a match when the
  /// candidate is in `ctx.liked_me`.
  pub fn decide(
    &mut self,
    ctx: DecisionContext<'_>,
    candidate_id: &ProfileId,
    verdict: Verdict,
    now: DateTime<Utc>,
  ) -> Outcome {
    if let Some(existing) = self.verdict_for(candidate_id) {
      tracing::debug!(candidate = %candidate_id, %existing, "already decided");
      return Outcome::AlreadyDecided { verdict: existing };
    }

    let viewer_id = ctx.viewer.viewer_id;
    let decision = Decision {
      decision_id: Uuid::new_v4(),
      viewer_id,
      candidate_id: candidate_id.clone(),
      verdict,
      decided_at: now,
    };

    match verdict {
      Verdict::Dislike => {
        self.push(decision);
        Outcome::Disliked
      }
      Verdict::Like => {
        let tier = ctx.viewer.tier;
        if ctx.policy.is_exhausted(&ctx.viewer.quota, tier, now) {
          let limit = ctx.policy.daily_limit(tier);
          tracing::warn!(%viewer_id, %tier, limit, "daily like quota exceeded");
          return Outcome::QuotaExceeded { limit };
        }

        ctx.policy.record_like(&mut ctx.viewer.quota, now);
        self.push(decision);

        if !ctx.liked_me.contains(candidate_id) {
          return Outcome::Liked;
        }

        let m = Match::new(viewer_id, candidate_id.clone(), now);
        if ctx.registry.add(m.clone()) {
          tracing::info!(%viewer_id, candidate = %candidate_id, "new match");
          Outcome::Matched(m)
        } else {
          Outcome::Liked
        }
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;
  use crate::profile::{Tier, ViewerIdentity};

  struct Fixture {
    viewer:   Viewer,
    policy:   QuotaPolicy,
    liked_me: HashSet<ProfileId>,
    registry: MatchRegistry,
    recorder: DecisionRecorder,
  }

  impl Fixture {
    fn new(tier: Tier, liked_me: &[&str]) -> Self {
      Self {
        viewer:   Viewer::new(ViewerIdentity { viewer_id: Uuid::new_v4(), tier }),
        policy:   QuotaPolicy::default(),
        liked_me: liked_me.iter().map(|s| ProfileId::from(*s)).collect(),
        registry: MatchRegistry::new(),
        recorder: DecisionRecorder::new(),
      }
    }

    fn decide(&mut self, id: &str, verdict: Verdict, now: DateTime<Utc>) -> Outcome {
      let ctx = DecisionContext {
        viewer:   &mut self.viewer,
        policy:   &self.policy,
        liked_me: &self.liked_me,
        registry: &mut self.registry,
      };
      self.recorder.decide(ctx, &ProfileId::from(id), verdict, now)
    }
  }

  fn t0() -> DateTime<Utc> { Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap() }

  #[test]
  fn like_of_admirer_is_a_match() {
    let mut f = Fixture::new(Tier::Standard, &["c"]);
    let outcome = f.decide("c", Verdict::Like, t0());

    let m = match outcome {
      Outcome::Matched(m) => m,
      other => panic!("expected match, got {other:?}"),
    };
    assert_eq!(m.candidate_id.as_str(), "c");
    assert_eq!(m.viewer_id, f.viewer.viewer_id);
    assert_eq!(m.created_at, t0());
    assert!(m.active);

    assert_eq!(f.registry.list(), &[m]);
    assert_eq!(f.recorder.decisions().len(), 1);
    assert_eq!(f.recorder.decisions()[0].verdict, Verdict::Like);
    assert_eq!(f.recorder.decisions()[0].decided_at, t0());
    assert_eq!(f.viewer.quota.like_count, 1);
  }

  #[test]
  fn like_without_admirer_is_plain() {
    let mut f = Fixture::new(Tier::Standard, &[]);
    assert_eq!(f.decide("c", Verdict::Like, t0()), Outcome::Liked);
    assert!(f.registry.is_empty());
    assert!(f.recorder.liked_ids().contains(&ProfileId::from("c")));
  }

  #[test]
  fn dislike_never_consumes_quota_or_matches() {
    let mut f = Fixture::new(Tier::Standard, &["c"]);
    assert_eq!(f.decide("c", Verdict::Dislike, t0()), Outcome::Disliked);
    assert_eq!(f.viewer.quota.like_count, 0);
    assert!(f.registry.is_empty());
    assert!(f.recorder.disliked_ids().contains(&ProfileId::from("c")));
  }

  #[test]
  fn second_decision_is_ignored() {
    let mut f = Fixture::new(Tier::Standard, &["c"]);
    f.decide("c", Verdict::Like, t0());
    let registry_before = f.registry.clone();

    assert_eq!(
      f.decide("c", Verdict::Like, t0()),
      Outcome::AlreadyDecided { verdict: Verdict::Like }
    );
    assert_eq!(
      f.decide("c", Verdict::Dislike, t0()),
      Outcome::AlreadyDecided { verdict: Verdict::Like }
    );
    assert_eq!(f.recorder.decisions().len(), 1);
    assert_eq!(f.registry, registry_before);
    assert_eq!(f.viewer.quota.like_count, 1);
  }

  fn exhaust(tier: Tier, limit: u32) {
    let mut f = Fixture::new(tier, &[]);
    for i in 0..limit {
      assert_eq!(f.decide(&format!("c{i}"), Verdict::Like, t0()), Outcome::Liked);
    }
    assert_eq!(f.viewer.quota.like_count, limit);

    let outcome = f.decide("extra", Verdict::Like, t0());
    assert_eq!(outcome, Outcome::QuotaExceeded { limit });
    assert_eq!(f.viewer.quota.like_count, limit);
    assert_eq!(f.recorder.verdict_for(&ProfileId::from("extra")), None);
    assert_eq!(f.recorder.decisions().len(), limit as usize);

    // Dislikes are still accepted once likes run out.
    assert_eq!(f.decide("extra", Verdict::Dislike, t0()), Outcome::Disliked);
  }

  #[test]
  fn standard_quota_blocks_eleventh_like() { exhaust(Tier::Standard, 10); }

  #[test]
  fn premium_quota_blocks_hundred_and_first_like() { exhaust(Tier::Premium, 100); }

  #[test]
  fn quota_resets_next_day() {
    let mut f = Fixture::new(Tier::Standard, &[]);
    f.viewer.quota.like_count = 10;
    f.viewer.quota.last_like_at = Some(t0());
    assert!(matches!(f.decide("a", Verdict::Like, t0()), Outcome::QuotaExceeded { .. }));

    let tomorrow = t0() + chrono::Duration::days(1);
    assert_eq!(f.decide("a", Verdict::Like, tomorrow), Outcome::Liked);
    assert_eq!(f.viewer.quota.like_count, 1);
  }

  #[test]
  fn decision_log_roundtrips_and_dedupes() {
    let mut f = Fixture::new(Tier::Standard, &[]);
    f.decide("a", Verdict::Like, t0());
    f.decide("b", Verdict::Dislike, t0());

    let mut raw: Vec<Decision> = f.recorder.clone().into();
    raw.push(Decision { verdict: Verdict::Dislike, ..raw[0].clone() });

    let back = DecisionRecorder::from(raw);
    assert_eq!(back, f.recorder);
    assert_eq!(back.verdict_for(&ProfileId::from("a")), Some(Verdict::Like));
  }
}
