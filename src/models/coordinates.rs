use crate::error::GeometryError;
use geo::Point;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Result<Self, GeometryError> {
        let coords = Coordinates { lat, lng };
        coords.validate()?;
        Ok(coords)
    }

    /// Rejects NaN and out-of-range values. Needed for values that arrive
    /// through serde and skip `new`.
    pub fn validate(&self) -> Result<(), GeometryError> {
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(GeometryError::InvalidLatitude(self.lat));
        }
        if !(-180.0..=180.0).contains(&self.lng) {
            return Err(GeometryError::InvalidLongitude(self.lng));
        }
        Ok(())
    }

    /// Location providers report (0, 0) when they have no position yet.
    pub fn is_unset(&self) -> bool {
        self.lat == 0.0 && self.lng == 0.0
    }

    pub fn to_point(self) -> Point<f64> {
        Point::new(self.lng, self.lat)
    }

    pub fn from_point(point: Point<f64>) -> Result<Self, GeometryError> {
        Coordinates::new(point.y(), wrap_longitude(point.x()))
    }
}

/// Wrap a longitude into [-180, 180]
pub fn wrap_longitude(lng: f64) -> f64 {
    if (-180.0..=180.0).contains(&lng) {
        return lng;
    }
    let wrapped = (lng + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped == -180.0 && lng > 0.0 {
        180.0
    } else {
        wrapped
    }
}
