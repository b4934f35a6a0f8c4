//! Profiles: the candidates a viewer browses, and the viewer themselves.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use uuid::Uuid;

use crate::{geo::Location, quota::QuotaState};

// ─── Identifiers ─────────────────────────────────────────────────────────────

/// Opaque identifier of a candidate profile, as issued by the candidate source.
#[derive(
  Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ProfileId(String);

impl ProfileId {
  pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for ProfileId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl From<&str> for ProfileId {
  fn from(s: &str) -> Self { Self(s.to_owned()) }
}

impl From<String> for ProfileId {
  fn from(s: String) -> Self { Self(s) }
}

// ─── Closed attribute sets ───────────────────────────────────────────────────

/// How strictly a person practises their religion.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ReligiousLevel {
  Practicing,
  Moderate,
  Cultural,
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MaritalStatus {
  Single,
  Divorced,
  Widowed,
}

/// What kind of relationship a person is looking for.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Intent {
  Marriage,
  Friendship,
  /// Open to either; compatible with every other intent.
  #[default]
  Both,
}

impl Intent {
  /// Whether two intents are compatible. `Both` on either side always is.
  pub fn is_compatible_with(self, other: Intent) -> bool {
    match (self, other) {
      (Intent::Both, _) | (_, Intent::Both) => true,
      (Intent::Marriage, Intent::Marriage) => true,
      (Intent::Friendship, Intent::Friendship) => true,
      (Intent::Marriage, Intent::Friendship)
      | (Intent::Friendship, Intent::Marriage) => false,
    }
  }
}

/// Subscription tier of the viewer.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Tier {
  #[default]
  Standard,
  Premium,
}

impl Tier {
  pub fn is_premium(self) -> bool { matches!(self, Self::Premium) }
}

// ─── Candidate ───────────────────────────────────────────────────────────────

/// Another user's profile as seen during discovery.
///
/// The external contact handle is not publicly readable: it is revealed only
/// through a confirmed match (see
/// [`crate::session::DiscoverySession::matched_profiles`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
  pub id:              ProfileId,
  pub name:            String,
  pub age:             u32,
  #[serde(default)]
  pub bio:             String,
  /// Photo references in display order.
  #[serde(default)]
  pub photos:          Vec<String>,
  pub location:        Option<Location>,
  #[serde(default)]
  pub interests:       Vec<String>,
  pub religious_level: ReligiousLevel,
  pub marital_status:  MaritalStatus,
  pub intent:          Intent,
  #[serde(default)]
  contact_handle:      Option<String>,
}

impl Candidate {
  /// A candidate with the required attributes; everything else empty.
  pub fn new(
    id: impl Into<ProfileId>,
    name: impl Into<String>,
    age: u32,
    religious_level: ReligiousLevel,
    marital_status: MaritalStatus,
    intent: Intent,
  ) -> Self {
    Self {
      id: id.into(),
      name: name.into(),
      age,
      bio: String::new(),
      photos: Vec::new(),
      location: None,
      interests: Vec::new(),
      religious_level,
      marital_status,
      intent,
      contact_handle: None,
    }
  }

  pub fn with_bio(mut self, bio: impl Into<String>) -> Self {
    self.bio = bio.into();
    self
  }

  pub fn with_photos<I, S>(mut self, photos: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.photos = photos.into_iter().map(Into::into).collect();
    self
  }

  pub fn with_location(mut self, location: Location) -> Self {
    self.location = Some(location);
    self
  }

  pub fn with_interests<I, S>(mut self, interests: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.interests = interests.into_iter().map(Into::into).collect();
    self
  }

  pub fn with_contact_handle(mut self, handle: impl Into<String>) -> Self {
    self.contact_handle = Some(handle.into());
    self
  }

  /// Whether the candidate exposes a non-blank external contact handle.
  pub fn has_contact_handle(&self) -> bool {
    self
      .contact_handle
      .as_deref()
      .is_some_and(|h| !h.trim().is_empty())
  }

  pub(crate) fn contact_handle(&self) -> Option<&str> {
    self.contact_handle.as_deref().filter(|h| !h.trim().is_empty())
  }
}

// ─── Viewer ──────────────────────────────────────────────────────────────────

/// What the identity provider tells us about the current user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewerIdentity {
  pub viewer_id: Uuid,
  pub tier:      Tier,
}

/// The viewer's own profile: the candidate shape plus ownership fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerProfile {
  pub user_id: Uuid,
  pub email:   String,
  #[serde(flatten)]
  pub profile: Candidate,
}

impl ViewerProfile {
  /// The owner may always read their own handle.
  pub fn contact_handle(&self) -> Option<&str> { self.profile.contact_handle() }
}

/// The user currently browsing candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewer {
  pub viewer_id: Uuid,
  pub tier:      Tier,
  pub quota:     QuotaState,
  pub profile:   Option<ViewerProfile>,
}

impl Viewer {
  pub fn new(identity: ViewerIdentity) -> Self {
    Self {
      viewer_id: identity.viewer_id,
      tier:      identity.tier,
      quota:     QuotaState::default(),
      profile:   None,
    }
  }
}
