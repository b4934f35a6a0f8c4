//! Built-in candidate pool for local use.

use std::{collections::HashSet, convert::Infallible};

use anyhow::Context as _;
use halal_core::{
  geo::Location,
  profile::{Candidate, Intent, MaritalStatus, ProfileId, ReligiousLevel},
  source::CandidateSource,
  store::{StateKey, StateSlot, StateStore},
};
use rand_core::RngCore;
use uuid::Uuid;

fn moscow(latitude: f64, longitude: f64) -> Location {
  Location {
    latitude,
    longitude,
    city: Some("Moscow".into()),
    country: Some("Russia".into()),
  }
}

/// The five demo profiles, in pool order.
pub fn seed_candidates() -> Vec<Candidate> {
  use Intent::*;
  use MaritalStatus::*;
  use ReligiousLevel::*;

  vec![
    Candidate::new("profile1", "Amina", 24, Practicing, Single, Marriage)
      .with_bio("Reads the Quran daily and loves cooking. Looking for a decent life partner.")
      .with_photos(["https://images.unsplash.com/photo-1544005313-94ddf0286df2"])
      .with_location(moscow(55.7558, 37.6173))
      .with_interests(["cooking", "reading", "religion"])
      .with_contact_handle("amina_muslim"),
    Candidate::new("profile2", "Fatima", 27, Moderate, Single, Marriage)
      .with_bio("Primary school teacher. Loves children and travel.")
      .with_photos(["https://images.unsplash.com/photo-1554151228-14d9def656e4"])
      .with_location(moscow(55.7, 37.6))
      .with_interests(["teaching", "traveling", "kids"])
      .with_contact_handle("fatima_teacher"),
    Candidate::new("profile3", "Yasmin", 23, Practicing, Single, Marriage)
      .with_bio("Medical student. Values family traditions and honesty.")
      .with_photos(["https://images.unsplash.com/photo-1531123897727-8f129e1688ce"])
      .with_location(moscow(55.8, 37.5))
      .with_interests(["medicine", "family", "honesty"])
      .with_contact_handle("yasmin_med"),
    Candidate::new("profile4", "Leila", 29, Moderate, Divorced, Friendship)
      .with_bio("Works in IT. Looking for someone serious. Enjoys an active lifestyle.")
      .with_photos(["https://images.unsplash.com/photo-1494790108377-be9c29b29330"])
      .with_location(moscow(55.75, 37.61))
      .with_interests(["tech", "fitness", "travel"])
      .with_contact_handle("leila_it"),
    Candidate::new("profile5", "Ibrahim", 28, Practicing, Single, Marriage)
      .with_bio("Civil engineer. Into sports and travel. Looking for a serious relationship.")
      .with_photos(["https://images.unsplash.com/photo-1507003211169-0a1dd7228f2d"])
      .with_location(moscow(55.76, 37.62))
      .with_interests(["engineering", "sports", "travel"])
      .with_contact_handle("ibrahim_engineer"),
  ]
}

/// Uniform in `0..span` by rejection, so small spans carry no modulo bias.
fn below(rng: &mut impl RngCore, span: u32) -> u32 {
  let zone = u32::MAX - u32::MAX % span;
  loop {
    let v = rng.next_u32();
    if v < zone {
      return v % span;
    }
  }
}

/// Pick `count` distinct ids from `pool` (partial Fisher–Yates).
fn pick_admirers(pool: &[Candidate], count: usize, rng: &mut impl RngCore) -> HashSet<ProfileId> {
  let mut ids: Vec<&ProfileId> = pool.iter().map(|c| &c.id).collect();
  let count = count.min(ids.len());
  for i in 0..count {
    let span = (ids.len() - i) as u32;
    let j = i + below(rng, span) as usize;
    ids.swap(i, j);
  }
  ids.into_iter().take(count).cloned().collect()
}

/// The seed pool, with a random subset standing in for the people who liked
/// the viewer. The subset is drawn on first use and kept in the viewer's
/// `admirers` slot, so later runs see the same people.
#[derive(Debug, Clone)]
pub struct SeedSource {
  candidates: Vec<Candidate>,
  liked_me:   HashSet<ProfileId>,
}

impl SeedSource {
  pub async fn load_or_draw<S: StateStore>(
    store: &S,
    viewer_id: Uuid,
    liked_me_count: usize,
    rng: &mut impl RngCore,
  ) -> anyhow::Result<Self> {
    let candidates = seed_candidates();
    let key = StateKey::new(viewer_id, StateSlot::Admirers);

    let saved = store
      .load(key)
      .await
      .context("failed to load the liked-me set")?;
    let liked_me = match saved {
      Some(value) => serde_json::from_value(value).context("failed to decode the liked-me set")?,
      None => {
        let drawn = pick_admirers(&candidates, liked_me_count, rng);
        store
          .save(key, serde_json::to_value(&drawn)?)
          .await
          .context("failed to save the liked-me set")?;
        tracing::debug!(admirers = drawn.len(), "seed liked-me set drawn");
        drawn
      }
    };

    Ok(Self { candidates, liked_me })
  }
}

impl CandidateSource for SeedSource {
  type Error = Infallible;

  async fn candidates(&self) -> Result<Vec<Candidate>, Infallible> { Ok(self.candidates.clone()) }

  async fn liked_me(&self, _viewer_id: Uuid) -> Result<HashSet<ProfileId>, Infallible> {
    Ok(self.liked_me.clone())
  }
}

#[cfg(test)]
mod tests {
  use halal_core::store::MemoryStore;
  use rand_core::OsRng;

  use super::*;

  #[test]
  fn seed_has_five_unique_adults() {
    let pool = seed_candidates();
    assert_eq!(pool.len(), 5);
    let ids: HashSet<_> = pool.iter().map(|c| &c.id).collect();
    assert_eq!(ids.len(), 5);
    assert!(pool.iter().all(|c| c.age >= 18 && c.has_contact_handle()));
  }

  #[tokio::test]
  async fn admirers_are_a_subset_of_the_pool() {
    let source = SeedSource::load_or_draw(&MemoryStore::new(), Uuid::nil(), 3, &mut OsRng)
      .await
      .unwrap();
    let liked = source.liked_me(Uuid::nil()).await.unwrap();
    let pool = source.candidates().await.unwrap();

    assert_eq!(liked.len(), 3);
    assert!(liked.iter().all(|id| pool.iter().any(|c| &c.id == id)));
  }

  #[tokio::test]
  async fn admirers_are_drawn_once_per_viewer() {
    let store = MemoryStore::new();
    let viewer = Uuid::new_v4();

    let first = SeedSource::load_or_draw(&store, viewer, 2, &mut OsRng).await.unwrap();
    for _ in 0..5 {
      let again = SeedSource::load_or_draw(&store, viewer, 2, &mut OsRng).await.unwrap();
      assert_eq!(again.liked_me, first.liked_me);
    }
    assert_eq!(store.len(), 1);
  }

  #[test]
  fn admirer_count_is_capped_by_pool_size() {
    let pool = seed_candidates();
    assert_eq!(pick_admirers(&pool, 10, &mut OsRng).len(), 5);
    assert!(pick_admirers(&pool, 0, &mut OsRng).is_empty());
  }

  #[test]
  fn below_stays_in_range() {
    for span in [1, 2, 3, 5, 7] {
      for _ in 0..100 {
        assert!(below(&mut OsRng, span) < span);
      }
    }
  }
}
