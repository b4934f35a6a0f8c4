//! Viewer filter preferences and the candidate predicate chain.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use crate::{
  profile::{Candidate, Intent, MaritalStatus, ProfileId, ReligiousLevel},
  Error, Result,
};

/// Nobody younger than this is ever shown, whatever the settings say.
pub const MINIMUM_AGE: u32 = 18;

/// Viewer-scoped search preferences. Replaced wholesale on update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
  pub min_age:                u32,
  pub max_age:                u32,
  /// Applied by the discovery queue, and only when both locations are known.
  pub max_distance_km:        u32,
  /// Accepted religious levels; empty admits all.
  pub religious_levels:       BTreeSet<ReligiousLevel>,
  /// Accepted marital statuses; empty admits all.
  pub marital_statuses:       BTreeSet<MaritalStatus>,
  pub intent:                 Intent,
  pub require_contact_handle: bool,
}

impl Default for FilterSettings {
  fn default() -> Self {
    Self {
      min_age:                MINIMUM_AGE,
      max_age:                50,
      max_distance_km:        50,
      religious_levels:       ReligiousLevel::iter().collect(),
      marital_statuses:       MaritalStatus::iter().collect(),
      intent:                 Intent::Both,
      require_contact_handle: false,
    }
  }
}

impl FilterSettings {
  pub fn validate(&self) -> Result<()> {
    if self.min_age > self.max_age {
      return Err(Error::InvalidFilter(format!(
        "min_age {} is greater than max_age {}",
        self.min_age, self.max_age
      )));
    }
    if self.max_age < MINIMUM_AGE {
      return Err(Error::InvalidFilter(format!(
        "max_age {} is below the minimum age {MINIMUM_AGE}",
        self.max_age
      )));
    }
    Ok(())
  }

  /// The lower age bound actually applied.
  pub fn effective_min_age(&self) -> u32 { self.min_age.max(MINIMUM_AGE) }

  /// Every predicate except the "already decided" exclusion.
  pub fn admits(&self, candidate: &Candidate) -> bool {
    if candidate.age < self.effective_min_age() || candidate.age > self.max_age {
      return false;
    }
    if !self.religious_levels.is_empty()
      && !self.religious_levels.contains(&candidate.religious_level)
    {
      return false;
    }
    if !self.marital_statuses.is_empty()
      && !self.marital_statuses.contains(&candidate.marital_status)
    {
      return false;
    }
    if !self.intent.is_compatible_with(candidate.intent) {
      return false;
    }
    if self.require_contact_handle && !candidate.has_contact_handle() {
      return false;
    }
    true
  }
}

/// Indices into `pool` of the candidates the viewer may still see, in pool
/// order.
pub fn filter_candidates(
  pool: &[Candidate],
  liked: &HashSet<ProfileId>,
  disliked: &HashSet<ProfileId>,
  settings: &FilterSettings,
) -> Vec<usize> {
  pool
    .iter()
    .enumerate()
    .filter(|(_, c)| !liked.contains(&c.id) && !disliked.contains(&c.id))
    .filter(|(_, c)| settings.admits(c))
    .map(|(i, _)| i)
    .collect()
}
