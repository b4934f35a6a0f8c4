//! The location provider: where the viewer currently is.

use std::{future::Future, time::Duration};

use thiserror::Error;

use crate::geo::Coordinates;

#[derive(Debug, Error)]
pub enum LocationError {
  #[error("location is not available on this device")]
  Unavailable,

  #[error("location request timed out after {0:?}")]
  TimedOut(Duration),

  #[error("location provider error: {0}")]
  Provider(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub trait LocationProvider: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// A single position fix. No retry on failure.
  fn current_position(&self) -> impl Future<Output = Result<Coordinates, Self::Error>> + Send + '_;
}

/// Always reports the same position, or always fails when there is none.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FixedLocation(pub Option<Coordinates>);

impl LocationProvider for FixedLocation {
  type Error = LocationError;

  async fn current_position(&self) -> Result<Coordinates, LocationError> {
    self.0.ok_or(LocationError::Unavailable)
  }
}
