use crate::error::GeometryError;
use crate::models::Coordinates;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// One reading from the location source, treated as an immutable snapshot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    pub coordinates: Coordinates,
    /// Course over ground, degrees clockwise from north
    #[serde(default)]
    pub bearing: f64,
    /// Meters per second
    #[serde(default)]
    pub speed: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl LocationFix {
    pub fn new(
        coordinates: Coordinates,
        bearing: f64,
        speed: f64,
        timestamp: OffsetDateTime,
    ) -> Self {
        LocationFix {
            coordinates,
            bearing,
            speed,
            timestamp,
        }
    }

    pub fn is_unset(&self) -> bool {
        self.coordinates.is_unset()
    }

    pub fn validate(&self) -> Result<(), GeometryError> {
        self.coordinates.validate()?;
        if !self.bearing.is_finite() {
            return Err(GeometryError::InvalidBearing(self.bearing));
        }
        if !self.speed.is_finite() || self.speed < 0.0 {
            return Err(GeometryError::InvalidDistance(self.speed));
        }
        Ok(())
    }
}
