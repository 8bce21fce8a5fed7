//! Coordinate types and validation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum valid latitude in degrees.
pub const MIN_LAT: f64 = -90.0;

/// Maximum valid latitude in degrees.
pub const MAX_LAT: f64 = 90.0;

/// Minimum valid longitude in degrees.
pub const MIN_LNG: f64 = -180.0;

/// Maximum valid longitude in degrees.
pub const MAX_LNG: f64 = 180.0;

/// Errors raised when a coordinate fails validation.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CoordError {
    /// Latitude or longitude is NaN or infinite.
    #[error("Non-finite coordinate: ({lat}, {lng})")]
    NonFinite { lat: f64, lng: f64 },

    /// Latitude outside [-90, 90].
    #[error("Invalid latitude: {0}")]
    InvalidLatitude(f64),

    /// Longitude outside [-180, 180].
    #[error("Invalid longitude: {0}")]
    InvalidLongitude(f64),
}

/// A WGS84 position in decimal degrees.
///
/// The struct itself does not enforce validity so that raw host input can be
/// carried up to the point where it is checked. Everything that enters the
/// route model or the leg tracker goes through [`Coordinate::validate`] or
/// [`Coordinate::is_valid`] first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees, positive north.
    pub lat: f64,
    /// Longitude in degrees, positive east.
    pub lng: f64,
}

impl Coordinate {
    /// Create a coordinate without validation.
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Create a coordinate, rejecting non-finite or out-of-range values.
    pub fn try_new(lat: f64, lng: f64) -> Result<Self, CoordError> {
        Self::new(lat, lng).validate()
    }

    /// Check the coordinate and hand it back if usable.
    pub fn validate(self) -> Result<Self, CoordError> {
        if !self.lat.is_finite() || !self.lng.is_finite() {
            return Err(CoordError::NonFinite {
                lat: self.lat,
                lng: self.lng,
            });
        }
        if !(MIN_LAT..=MAX_LAT).contains(&self.lat) {
            return Err(CoordError::InvalidLatitude(self.lat));
        }
        if !(MIN_LNG..=MAX_LNG).contains(&self.lng) {
            return Err(CoordError::InvalidLongitude(self.lng));
        }
        Ok(self)
    }

    /// Whether the coordinate is finite and within range.
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from((lat, lng): (f64, f64)) -> Self {
        Self::new(lat, lng)
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_coordinate() {
        let c = Coordinate::try_new(35.6812, 139.7671).unwrap();
        assert!(c.is_valid());
    }

    #[test]
    fn test_boundaries_are_inclusive() {
        assert!(Coordinate::new(90.0, 180.0).is_valid());
        assert!(Coordinate::new(-90.0, -180.0).is_valid());
    }

    #[test]
    fn test_non_finite_rejected() {
        assert!(matches!(
            Coordinate::try_new(f64::NAN, 0.0),
            Err(CoordError::NonFinite { .. })
        ));
        assert!(matches!(
            Coordinate::try_new(0.0, f64::INFINITY),
            Err(CoordError::NonFinite { .. })
        ));
    }

    #[test]
    fn test_out_of_range_rejected() {
        assert_eq!(
            Coordinate::try_new(91.0, 0.0),
            Err(CoordError::InvalidLatitude(91.0))
        );
        assert_eq!(
            Coordinate::try_new(0.0, -180.5),
            Err(CoordError::InvalidLongitude(-180.5))
        );
    }

    #[test]
    fn test_error_display() {
        let err = CoordError::InvalidLatitude(123.0);
        assert_eq!(err.to_string(), "Invalid latitude: 123");
    }
}
