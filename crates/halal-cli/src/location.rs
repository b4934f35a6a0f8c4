//! Location providers used by the binary.

use std::time::Duration;

use halal_core::{
  geo::Coordinates,
  location::{LocationError, LocationProvider},
};

/// Bounds a provider's single request by `timeout`. No retry.
#[derive(Debug, Clone)]
pub struct TimeoutLocation<P> {
  inner:   P,
  timeout: Duration,
}

impl<P: LocationProvider> TimeoutLocation<P> {
  pub fn new(inner: P, timeout: Duration) -> Self { Self { inner, timeout } }
}

impl<P: LocationProvider> LocationProvider for TimeoutLocation<P> {
  type Error = LocationError;

  async fn current_position(&self) -> Result<Coordinates, LocationError> {
    match tokio::time::timeout(self.timeout, self.inner.current_position()).await {
      Ok(Ok(coords)) => Ok(coords),
      Ok(Err(e)) => Err(LocationError::Provider(Box::new(e))),
      Err(_) => Err(LocationError::TimedOut(self.timeout)),
    }
  }
}
