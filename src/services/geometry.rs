//! Great-circle primitives on a spherical earth.
//!
//! Distances, bearings and destinations go through `geo`'s haversine metric
//! space. Projection onto a polyline is done on a local equirectangular plane
//! per segment, which is accurate for the short segments routes are made of,
//! and the resulting distance is then measured on the sphere.

use crate::error::GeometryError;
use crate::models::{Coordinates, DistanceUnit, RoutePolyline};
use geo::{Bearing, Destination, Distance, Haversine};

/// Closest point of a polyline to some location
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestPoint {
    pub coordinates: Coordinates,
    pub distance_m: f64,
    /// Index of the segment (its start vertex) holding the closest point
    pub segment_index: usize,
}

/// Initial bearing from `a` to `b`, degrees clockwise from north in [0, 360)
pub fn bearing(a: &Coordinates, b: &Coordinates) -> Result<f64, GeometryError> {
    a.validate()?;
    b.validate()?;
    Ok(Haversine.bearing(a.to_point(), b.to_point()).rem_euclid(360.0))
}

/// Great-circle distance between `a` and `b` in `unit`
pub fn distance(a: &Coordinates, b: &Coordinates, unit: DistanceUnit) -> Result<f64, GeometryError> {
    a.validate()?;
    b.validate()?;
    Ok(unit.from_meters(haversine_m(a, b)))
}

/// Point reached by travelling `distance` (in `unit`) from `origin` along `bearing`
pub fn destination(
    origin: &Coordinates,
    distance: f64,
    bearing: f64,
    unit: DistanceUnit,
) -> Result<Coordinates, GeometryError> {
    origin.validate()?;
    if !distance.is_finite() || distance < 0.0 {
        return Err(GeometryError::InvalidDistance(distance));
    }
    if !bearing.is_finite() {
        return Err(GeometryError::InvalidBearing(bearing));
    }

    let meters = unit.to_meters(distance);
    if meters == 0.0 {
        return Ok(*origin);
    }

    let projected = Haversine.destination(origin.to_point(), bearing, meters);
    Coordinates::from_point(projected)
}

/// Closest point on `line` to `point`. Single-point lines degrade to a plain
/// point-to-point distance.
pub fn nearest_point_on_line(
    point: &Coordinates,
    line: &RoutePolyline,
) -> Result<NearestPoint, GeometryError> {
    point.validate()?;

    let points = line.points();
    if points.len() == 1 {
        return Ok(NearestPoint {
            coordinates: points[0],
            distance_m: haversine_m(point, &points[0]),
            segment_index: 0,
        });
    }

    let mut nearest = NearestPoint {
        coordinates: points[0],
        distance_m: f64::INFINITY,
        segment_index: 0,
    };

    for (i, window) in points.windows(2).enumerate() {
        let closest = project_onto_segment(point, &window[0], &window[1]);
        let dist = haversine_m(point, &closest);

        if dist < nearest.distance_m {
            nearest = NearestPoint {
                coordinates: closest,
                distance_m: dist,
                segment_index: i,
            };
        }
    }

    Ok(nearest)
}

/// Candidate closest to `point`, with its distance in meters
pub fn nearest_point(
    point: &Coordinates,
    candidates: &[Coordinates],
) -> Result<Option<(Coordinates, f64)>, GeometryError> {
    point.validate()?;

    Ok(candidates
        .iter()
        .map(|c| (*c, haversine_m(point, c)))
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal)))
}

/// Unwrap `target` so that interpolating from `current` turns at most 180°.
/// The result may fall outside [0, 360).
pub fn shortest_rotation(current: f64, target: f64) -> f64 {
    let mut target = target;
    while current - target > 180.0 {
        target += 360.0;
    }
    while current - target < -180.0 {
        target -= 360.0;
    }
    target
}

fn haversine_m(a: &Coordinates, b: &Coordinates) -> f64 {
    Haversine.distance(a.to_point(), b.to_point())
}

/// Project on a plane centred on the segment start, with longitude scaled by
/// the cosine of the latitude
fn project_onto_segment(point: &Coordinates, start: &Coordinates, end: &Coordinates) -> Coordinates {
    let scale = start.lat.to_radians().cos();
    let dx = (end.lng - start.lng) * scale;
    let dy = end.lat - start.lat;
    let len_sq = dx * dx + dy * dy;

    if len_sq < 1e-20 {
        return *start;
    }

    let px = (point.lng - start.lng) * scale;
    let py = point.lat - start.lat;
    let t = ((px * dx + py * dy) / len_sq).clamp(0.0, 1.0);

    Coordinates {
        lat: start.lat + t * (end.lat - start.lat),
        lng: start.lng + t * (end.lng - start.lng),
    }
}
