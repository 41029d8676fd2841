use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPosition {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPosition {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Options passed to every position lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeolocationOptions {
    pub high_accuracy: bool,
    pub timeout: Duration,
    /// Zero means a cached fix is never acceptable.
    pub maximum_age: Duration,
}

impl Default for GeolocationOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_millis(10_000),
            maximum_age: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GeolocationFailure {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("position unavailable")]
    PositionUnavailable,
    #[error("location request timed out")]
    Timeout,
    #[error("geolocation is not supported")]
    Unsupported,
}

impl GeolocationFailure {
    pub fn user_message(self) -> &'static str {
        match self {
            Self::PermissionDenied => "Please allow location access to find nearby stops.",
            Self::PositionUnavailable => "Location information unavailable.",
            Self::Timeout => "Location request timed out.",
            Self::Unsupported => "Geolocation is not supported on this device.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_match_device_lookup_policy() {
        let o = GeolocationOptions::default();
        assert!(o.high_accuracy);
        assert_eq!(o.timeout, Duration::from_secs(10));
        assert_eq!(o.maximum_age, Duration::ZERO);
    }

    #[test]
    fn each_failure_has_its_own_message() {
        assert_eq!(
            GeolocationFailure::Timeout.user_message(),
            "Location request timed out."
        );
        assert_ne!(
            GeolocationFailure::PermissionDenied.user_message(),
            GeolocationFailure::PositionUnavailable.user_message()
        );
    }

    #[test]
    fn rejects_out_of_range_positions() {
        assert!(GeoPosition::new(1.29, 103.85).is_valid());
        assert!(!GeoPosition::new(91.0, 0.0).is_valid());
        assert!(!GeoPosition::new(f64::NAN, 0.0).is_valid());
    }
}
