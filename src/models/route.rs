use crate::error::GeometryError;
use crate::models::polyline::POLYLINE_PRECISION;
use crate::models::{Coordinates, RoutePolyline};
use serde::{Deserialize, Serialize};

/// A route as handed over by the directions service.
/// The encoded geometry doubles as the route identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectionsRoute {
    /// Precision-6 encoded polyline
    pub geometry: String,
    #[serde(default)]
    pub distance_m: f64,
}

impl DirectionsRoute {
    pub fn new(geometry: impl Into<String>, distance_m: f64) -> Self {
        DirectionsRoute {
            geometry: geometry.into(),
            distance_m,
        }
    }

    pub fn from_polyline(polyline: &RoutePolyline, distance_m: f64) -> Self {
        Self::new(polyline.encode(POLYLINE_PRECISION), distance_m)
    }

    pub fn decode_geometry(&self) -> Result<RoutePolyline, GeometryError> {
        RoutePolyline::decode(&self.geometry, POLYLINE_PRECISION)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteStep {
    pub geometry: RoutePolyline,
    /// Where the maneuver that starts this step happens
    pub maneuver_location: Coordinates,
    #[serde(default)]
    pub intersections: Vec<Coordinates>,
    #[serde(default)]
    pub distance_m: f64,
}

impl RouteStep {
    /// Builds a step whose maneuver sits on its first point
    pub fn new(geometry: RoutePolyline) -> Self {
        let maneuver_location = geometry.first();
        RouteStep {
            geometry,
            maneuver_location,
            intersections: Vec::new(),
            distance_m: 0.0,
        }
    }

    pub fn with_intersections(mut self, intersections: Vec<Coordinates>) -> Self {
        self.intersections = intersections;
        self
    }

    pub fn with_distance(mut self, distance_m: f64) -> Self {
        self.distance_m = distance_m;
        self
    }
}

/// Snapshot from the external progress tracker. Read-only for the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteProgress {
    #[serde(default)]
    pub leg_index: usize,
    #[serde(default)]
    pub step_index: usize,
    /// Meters left on the current step, i.e. distance to the next maneuver
    pub step_distance_remaining_m: f64,
    pub current_step: RouteStep,
    /// `None` on the last step of the route
    #[serde(default)]
    pub upcoming_step: Option<RouteStep>,
}

impl RouteProgress {
    pub fn new(current_step: RouteStep, step_distance_remaining_m: f64) -> Self {
        RouteProgress {
            leg_index: 0,
            step_index: 0,
            step_distance_remaining_m,
            current_step,
            upcoming_step: None,
        }
    }

    pub fn with_upcoming_step(mut self, step: RouteStep) -> Self {
        self.upcoming_step = Some(step);
        self
    }

    pub fn with_indices(mut self, leg_index: usize, step_index: usize) -> Self {
        self.leg_index = leg_index;
        self.step_index = step_index;
        self
    }
}
