//! Integration tests for `SqliteStore` against an in-memory database.

use std::collections::HashSet;

use chrono::{TimeZone, Utc};
use halal_core::{
  decision::Outcome,
  filter::FilterSettings,
  geo::Location,
  profile::{Candidate, Intent, MaritalStatus, ProfileId, ReligiousLevel, Tier, ViewerIdentity},
  quota::QuotaPolicy,
  source::StaticSource,
  store::{StateKey, StateSlot, StateStore},
  DiscoverySession,
};
use serde_json::json;
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

// ─── Raw slots ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_slot_loads_as_none() {
  let s = store().await;
  let got = s.load(StateKey::new(Uuid::new_v4(), StateSlot::Filters)).await.unwrap();
  assert!(got.is_none());
}

#[tokio::test]
async fn save_then_load_returns_document() {
  let s = store().await;
  let key = StateKey::new(Uuid::new_v4(), StateSlot::Quota);
  let doc = json!({ "like_count": 4, "last_like_at": "2024-05-01T10:00:00Z" });

  s.save(key, doc.clone()).await.unwrap();
  assert_eq!(s.load(key).await.unwrap(), Some(doc));
}

#[tokio::test]
async fn save_replaces_previous_document() {
  let s = store().await;
  let key = StateKey::new(Uuid::new_v4(), StateSlot::Filters);

  s.save(key, json!({ "max_age": 40 })).await.unwrap();
  s.save(key, json!({ "max_age": 30 })).await.unwrap();

  assert_eq!(s.load(key).await.unwrap(), Some(json!({ "max_age": 30 })));
  let slots = s.saved_slots(key.viewer_id).await.unwrap();
  assert_eq!(slots.len(), 1);
}

#[tokio::test]
async fn viewers_do_not_share_slots() {
  let s = store().await;
  let alice = Uuid::new_v4();
  let bob = Uuid::new_v4();

  s.save(StateKey::new(alice, StateSlot::Matches), json!([]))
    .await
    .unwrap();

  assert!(s.load(StateKey::new(bob, StateSlot::Matches)).await.unwrap().is_none());
  assert!(s.saved_slots(bob).await.unwrap().is_empty());
}

#[tokio::test]
async fn saved_slots_are_listed_by_name() {
  let s = store().await;
  let viewer = Uuid::new_v4();
  for slot in [StateSlot::Quota, StateSlot::Decisions, StateSlot::Filters] {
    s.save(StateKey::new(viewer, slot), json!({})).await.unwrap();
  }

  let slots: Vec<StateSlot> = s
    .saved_slots(viewer)
    .await
    .unwrap()
    .into_iter()
    .map(|saved| saved.slot)
    .collect();
  assert_eq!(slots, vec![StateSlot::Decisions, StateSlot::Filters, StateSlot::Quota]);
}

#[tokio::test]
async fn save_all_writes_every_slot() {
  let s = store().await;
  let viewer = Uuid::new_v4();
  s.save_all(vec![
    (StateKey::new(viewer, StateSlot::Quota), json!({ "like_count": 1 })),
    (StateKey::new(viewer, StateSlot::Decisions), json!([])),
  ])
  .await
  .unwrap();

  assert_eq!(s.saved_slots(viewer).await.unwrap().len(), 2);
  s.save_all(Vec::new()).await.unwrap();
  assert_eq!(s.saved_slots(viewer).await.unwrap().len(), 2);
}

#[tokio::test]
async fn save_all_is_all_or_nothing() {
  let s = store().await;
  s.execute_batch(
    "CREATE TRIGGER refuse_admirers BEFORE INSERT ON viewer_state
     WHEN NEW.slot = 'admirers'
     BEGIN SELECT RAISE(ABORT, 'refused'); END;",
  )
  .await
  .unwrap();

  let viewer = Uuid::new_v4();
  let result = s
    .save_all(vec![
      (StateKey::new(viewer, StateSlot::Quota), json!({ "like_count": 1 })),
      (StateKey::new(viewer, StateSlot::Admirers), json!(["a"])),
    ])
    .await;

  assert!(result.is_err());
  assert!(s.load(StateKey::new(viewer, StateSlot::Quota)).await.unwrap().is_none());
}

#[tokio::test]
async fn skip_is_remembered_across_sessions() {
  let s = store().await;
  let source = pool();
  let identity = ViewerIdentity { viewer_id: Uuid::new_v4(), tier: Tier::Standard };

  {
    let mut session =
      DiscoverySession::open(identity, s.clone(), &source, QuotaPolicy::default())
        .await
        .unwrap();
    session.advance().await.unwrap();
    assert_eq!(session.current().unwrap().candidate.name, "Fatima");
  }

  let session = DiscoverySession::open(identity, s, &source, QuotaPolicy::default())
    .await
    .unwrap();
  assert_eq!(session.current().unwrap().candidate.name, "Fatima");
}

// ─── Sessions ────────────────────────────────────────────────────────────────

fn pool() -> StaticSource {
  let near = |lat, lon| Location {
    latitude: lat,
    longitude: lon,
    city: Some("Moscow".into()),
    country: Some("Russia".into()),
  };
  let candidates = vec![
    Candidate::new("a", "Amina", 25, ReligiousLevel::Practicing, MaritalStatus::Single, Intent::Marriage)
      .with_location(near(55.7558, 37.6173)),
    Candidate::new("b", "Fatima", 27, ReligiousLevel::Moderate, MaritalStatus::Single, Intent::Marriage)
      .with_location(near(55.7, 37.6))
      .with_contact_handle("@fatima"),
    Candidate::new("c", "Ibrahim", 31, ReligiousLevel::Practicing, MaritalStatus::Divorced, Intent::Both)
      .with_location(near(55.8, 37.5)),
  ];
  let liked_me: HashSet<ProfileId> = [ProfileId::from("b")].into_iter().collect();
  StaticSource::new(candidates, liked_me)
}

#[tokio::test]
async fn session_state_survives_reopen() {
  let s = store().await;
  let source = pool();
  let identity = ViewerIdentity { viewer_id: Uuid::new_v4(), tier: Tier::Standard };
  let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

  {
    let mut session =
      DiscoverySession::open(identity, s.clone(), &source, QuotaPolicy::default())
        .await
        .unwrap();
    assert_eq!(session.current().unwrap().candidate.name, "Amina");

    assert_eq!(session.dislike(&"a".into(), now).await.unwrap(), Outcome::Disliked);
    let outcome = session.like(&"b".into(), now).await.unwrap();
    assert!(matches!(outcome, Outcome::Matched(_)));

    let filters = FilterSettings { max_age: 30, ..FilterSettings::default() };
    session.update_filters(filters).await.unwrap();
    assert!(session.current().is_none());
  }

  let saved = s.saved_slots(identity.viewer_id).await.unwrap();
  assert_eq!(saved.len(), 5);

  let session = DiscoverySession::open(identity, s.clone(), &source, QuotaPolicy::default())
    .await
    .unwrap();
  assert_eq!(session.decisions().len(), 2);
  assert_eq!(session.matches().len(), 1);
  assert_eq!(session.filters().max_age, 30);
  assert_eq!(session.quota(now).used, 1);
  assert!(session.current().is_none());

  let matched = session.matched_profiles();
  assert_eq!(matched[0].contact_handle, Some("@fatima"));
}
