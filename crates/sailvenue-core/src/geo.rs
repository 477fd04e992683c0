use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A WGS-84 GPS fix in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeoError {
    #[error("latitude {0} is not a finite value in [-90, 90]")]
    Latitude(f64),

    #[error("longitude {0} is not a finite value in [-180, 180]")]
    Longitude(f64),
}

impl GeoPoint {
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check that both coordinates are finite and in range.
    ///
    /// Out-of-range input is rejected, never clamped.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::Latitude`] or [`GeoError::Longitude`] naming the
    /// offending value.
    pub fn validate(&self) -> Result<(), GeoError> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(GeoError::Latitude(self.latitude));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(GeoError::Longitude(self.longitude));
        }
        Ok(())
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.5}, {:.5})", self.latitude, self.longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_boundary_values() {
        assert!(GeoPoint::new(90.0, 180.0).validate().is_ok());
        assert!(GeoPoint::new(-90.0, -180.0).validate().is_ok());
        assert!(GeoPoint::new(0.0, 0.0).validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_latitude() {
        assert_eq!(
            GeoPoint::new(90.5, 0.0).validate().unwrap_err(),
            GeoError::Latitude(90.5)
        );
    }

    #[test]
    fn rejects_out_of_range_longitude() {
        assert_eq!(
            GeoPoint::new(0.0, -181.0).validate().unwrap_err(),
            GeoError::Longitude(-181.0)
        );
    }

    #[test]
    fn rejects_non_finite_values() {
        assert!(GeoPoint::new(f64::NAN, 0.0).validate().is_err());
        assert!(GeoPoint::new(0.0, f64::INFINITY).validate().is_err());
    }

    #[test]
    fn serializes_with_field_names() {
        let json = serde_json::to_value(GeoPoint::new(22.2793, 114.1628)).expect("serialize");
        assert_eq!(json["latitude"], 22.2793);
        assert_eq!(json["longitude"], 114.1628);
    }
}
