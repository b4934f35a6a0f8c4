//! Error types for `halal-core`.
//!
//! Recoverable conditions of the matching flow (quota exhausted, duplicate
//! decision, location unavailable, empty pool) are typed outcomes, not errors.
//! See [`crate::decision::Outcome`] and [`crate::session::LocationRefresh`].

use thiserror::Error;

use crate::profile::ProfileId;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid filter settings: {0}")]
  InvalidFilter(String),

  #[error("invalid coordinates: latitude {latitude}, longitude {longitude}")]
  InvalidCoordinates { latitude: f64, longitude: f64 },

  #[error("candidate not found: {0}")]
  UnknownCandidate(ProfileId),

  #[error("a premium subscription is required")]
  PremiumRequired,

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("candidate source error: {0}")]
  Source(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
