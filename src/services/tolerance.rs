use crate::config::NavigationOptions;
use crate::constants::INTERSECTION_TOLERANCE_DIVISOR;
use crate::error::GeometryError;
use crate::models::{Coordinates, DistanceUnit, LocationFix, RouteProgress};
use crate::services::geometry;

/// Breakdown of the off-route radius, kept for logging
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OffRouteRadius {
    pub dynamic_m: f64,
    pub accuracy_m: f64,
    pub radius_m: f64,
}

/// Radius (m) beyond which `fix` counts as off the current step
pub fn off_route_radius(
    fix: &LocationFix,
    progress: &RouteProgress,
    options: &NavigationOptions,
) -> Result<OffRouteRadius, GeometryError> {
    let dynamic_m = dynamic_tolerance(&fix.coordinates, progress, options)?;
    let accuracy_m = accuracy_tolerance(fix, options);
    let radius_m = dynamic_m.max(accuracy_m).max(options.accuracy_floor_m);

    tracing::debug!(
        dynamic_m,
        accuracy_m,
        radius_m,
        "Off-route radius {:.1}m (dynamic {:.1}m, accuracy {:.1}m)",
        radius_m,
        dynamic_m,
        accuracy_m
    );

    Ok(OffRouteRadius {
        dynamic_m,
        accuracy_m,
        radius_m,
    })
}

/// Tolerance from the route geometry around the agent: halved when the
/// nearest intersection (or, lacking those, the nearest step vertex) is
/// inside the maneuver zone.
pub fn dynamic_tolerance(
    position: &Coordinates,
    progress: &RouteProgress,
    options: &NavigationOptions,
) -> Result<f64, GeometryError> {
    let step = &progress.current_step;
    let candidates = if step.intersections.is_empty() {
        step.geometry.points()
    } else {
        step.intersections.as_slice()
    };

    let threshold = options.off_route_threshold_m;
    let Some((closest, distance_m)) = geometry::nearest_point(position, candidates)? else {
        return Ok(threshold);
    };

    if closest == *position {
        return Ok(threshold);
    }

    if distance_m <= options.maneuver_zone_radius_m {
        Ok(threshold / INTERSECTION_TOLERANCE_DIVISOR)
    } else {
        Ok(threshold)
    }
}

/// How far the agent may have moved since the fix at its current speed
pub fn accuracy_tolerance(fix: &LocationFix, options: &NavigationOptions) -> f64 {
    fix.speed.max(0.0) * options.dead_reckoning_time_interval_s
}

/// Where the agent should be after the dead-reckoning interval
pub fn dead_reckoning_position(
    fix: &LocationFix,
    options: &NavigationOptions,
) -> Result<Coordinates, GeometryError> {
    geometry::destination(
        &fix.coordinates,
        accuracy_tolerance(fix, options),
        fix.bearing,
        DistanceUnit::Meters,
    )
}
