//! Great-circle distance between two points on the Earth's surface.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Mean Earth radius used by the Haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
  pub latitude:  f64,
  pub longitude: f64,
}

impl Coordinates {
  /// Build a coordinate pair, rejecting non-finite or out-of-range values.
  pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
    let valid = latitude.is_finite()
      && longitude.is_finite()
      && (-90.0..=90.0).contains(&latitude)
      && (-180.0..=180.0).contains(&longitude);
    if !valid {
      return Err(Error::InvalidCoordinates { latitude, longitude });
    }
    Ok(Self { latitude, longitude })
  }
}

/// Where a profile says it is. City and country are display-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
  pub latitude:  f64,
  pub longitude: f64,
  pub city:      Option<String>,
  pub country:   Option<String>,
}

impl Location {
  pub fn coordinates(&self) -> Coordinates {
    Coordinates { latitude: self.latitude, longitude: self.longitude }
  }
}

impl From<Coordinates> for Location {
  fn from(c: Coordinates) -> Self {
    Self {
      latitude:  c.latitude,
      longitude: c.longitude,
      city:      None,
      country:   None,
    }
  }
}

/// Haversine distance between `a` and `b`, rounded to whole kilometres.
///
/// Inputs are not validated here. `None` when the result is not a finite
/// number, e.g. for a stored location holding NaN.
pub fn distance_km(a: Coordinates, b: Coordinates) -> Option<u32> {
  let d_lat = (b.latitude - a.latitude).to_radians();
  let d_lon = (b.longitude - a.longitude).to_radians();
  let h = (d_lat / 2.0).sin().powi(2)
    + a.latitude.to_radians().cos()
      * b.latitude.to_radians().cos()
      * (d_lon / 2.0).sin().powi(2);
  let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
  let km = EARTH_RADIUS_KM * c;
  km.is_finite().then(|| km.round() as u32)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn at(latitude: f64, longitude: f64) -> Coordinates {
    Coordinates::new(latitude, longitude).unwrap()
  }

  #[test]
  fn same_point_is_zero() {
    let moscow = at(55.7558, 37.6173);
    assert_eq!(distance_km(moscow, moscow), Some(0));
  }

  #[test]
  fn distance_is_symmetric() {
    let pairs = [
      (at(55.7558, 37.6173), at(55.8, 37.5)),
      (at(51.5074, -0.1278), at(40.7128, -74.0060)),
      (at(-33.8688, 151.2093), at(35.6762, 139.6503)),
      (at(0.0, 179.9), at(0.0, -179.9)),
    ];
    for (a, b) in pairs {
      assert_eq!(distance_km(a, b), distance_km(b, a));
    }
  }

  #[test]
  fn known_distances() {
    // London to New York is roughly 5570 km.
    let d = distance_km(at(51.5074, -0.1278), at(40.7128, -74.0060)).unwrap();
    assert!((5560..=5580).contains(&d), "got {d}");

    // Two points in central Moscow a few kilometres apart.
    let d = distance_km(at(55.7558, 37.6173), at(55.7, 37.6));
    assert_eq!(d, Some(6));
  }

  #[test]
  fn antimeridian_is_short() {
    let d = distance_km(at(0.0, 179.9), at(0.0, -179.9)).unwrap();
    assert!(d < 30, "got {d}");
  }

  #[test]
  fn non_finite_input_has_no_distance() {
    let broken = Coordinates { latitude: f64::NAN, longitude: 37.6 };
    assert_eq!(distance_km(at(55.7558, 37.6173), broken), None);

    let infinite = Coordinates { latitude: 0.0, longitude: f64::INFINITY };
    assert_eq!(distance_km(infinite, at(0.0, 0.0)), None);
  }

  #[test]
  fn rejects_out_of_range() {
    assert!(Coordinates::new(90.5, 0.0).is_err());
    assert!(Coordinates::new(0.0, -180.5).is_err());
    assert!(Coordinates::new(f64::NAN, 0.0).is_err());
    assert!(Coordinates::new(-90.0, 180.0).is_ok());
  }
}
