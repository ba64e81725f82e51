use routeguide::models::{
    Coordinates, DirectionsRoute, LocationFix, RoutePolyline, RouteProgress, RouteStep,
};
use time::macros::datetime;
use time::{Duration, OffsetDateTime};

/// Start of every test trace
#[allow(dead_code)]
pub const T0: OffsetDateTime = datetime!(2024-05-01 08:00:00 UTC);

/// Fixture longitudes are offsets from this meridian, keeping the route
/// clear of the unset (0, 0) fix
#[allow(dead_code)]
pub const ORIGIN_LNG: f64 = 1.0;

/// Point at `lat`, `lng_offset` degrees east of [`ORIGIN_LNG`]
#[allow(dead_code)]
pub fn coords(lat: f64, lng_offset: f64) -> Coordinates {
    Coordinates::new(lat, ORIGIN_LNG + lng_offset).unwrap()
}

/// ~1.1 km east along the equator from (0, ORIGIN_LNG), then ~1.1 km north
#[allow(dead_code)]
pub fn l_shaped_polyline() -> RoutePolyline {
    RoutePolyline::new(vec![
        coords(0.0, 0.0),
        coords(0.0, 0.01),
        coords(0.01, 0.01),
    ])
    .unwrap()
}

#[allow(dead_code)]
pub fn l_shaped_route() -> DirectionsRoute {
    DirectionsRoute::from_polyline(&l_shaped_polyline(), 2224.0)
}

/// The eastbound leg
#[allow(dead_code)]
pub fn first_step() -> RouteStep {
    RouteStep::new(RoutePolyline::new(vec![coords(0.0, 0.0), coords(0.0, 0.01)]).unwrap())
        .with_distance(1112.0)
}

/// The northbound leg, starting with a left turn at the end of the first
#[allow(dead_code)]
pub fn second_step() -> RouteStep {
    RouteStep::new(RoutePolyline::new(vec![coords(0.0, 0.01), coords(0.01, 0.01)]).unwrap())
        .with_distance(1112.0)
}

/// On the first step with the turn ahead
#[allow(dead_code)]
pub fn progress(step_distance_remaining_m: f64) -> RouteProgress {
    RouteProgress::new(first_step(), step_distance_remaining_m).with_upcoming_step(second_step())
}

/// On the last step of the route
#[allow(dead_code)]
pub fn final_step_progress(step_distance_remaining_m: f64) -> RouteProgress {
    RouteProgress::new(second_step(), step_distance_remaining_m).with_indices(0, 1)
}

/// Stationary eastbound fix, `ms` milliseconds after [`T0`]
#[allow(dead_code)]
pub fn fix_at(lat: f64, lng_offset: f64, ms: i64) -> LocationFix {
    LocationFix::new(coords(lat, lng_offset), 90.0, 0.0, T0 + Duration::milliseconds(ms))
}

#[allow(dead_code)]
pub fn unset_fix(ms: i64) -> LocationFix {
    LocationFix::new(
        Coordinates { lat: 0.0, lng: 0.0 },
        0.0,
        0.0,
        T0 + Duration::milliseconds(ms),
    )
}

#[allow(dead_code)]
pub fn approx_eq(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() <= tolerance
}
