//! The candidate data source: the pool to browse and who has liked the viewer.

use std::{collections::HashSet, convert::Infallible, future::Future};

use uuid::Uuid;

use crate::profile::{Candidate, ProfileId};

pub trait CandidateSource: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// A read-only snapshot of every candidate profile.
  fn candidates(&self) -> impl Future<Output = Result<Vec<Candidate>, Self::Error>> + Send + '_;

  /// Ids of the candidates who have liked `viewer_id`.
  fn liked_me(
    &self,
    viewer_id: Uuid,
  ) -> impl Future<Output = Result<HashSet<ProfileId>, Self::Error>> + Send + '_;
}

/// A fixed pool with a fixed liked-me set, the same for every viewer.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
  pub candidates: Vec<Candidate>,
  pub liked_me:   HashSet<ProfileId>,
}

impl StaticSource {
  pub fn new(candidates: Vec<Candidate>, liked_me: HashSet<ProfileId>) -> Self {
    Self { candidates, liked_me }
  }
}

impl CandidateSource for StaticSource {
  type Error = Infallible;

  async fn candidates(&self) -> Result<Vec<Candidate>, Infallible> { Ok(self.candidates.clone()) }

  async fn liked_me(&self, _viewer_id: Uuid) -> Result<HashSet<ProfileId>, Infallible> {
    Ok(self.liked_me.clone())
  }
}
