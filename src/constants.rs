//! Stable navigation constants.
//!
//! Values here are algorithm coefficients and default fallbacks for the
//! env-var-based configuration in [`crate::config`]. They should rarely change.

// --- Off-route defaults (used when NAV_* env vars are absent) ---

/// Minimum distance (meters) the agent must travel from the last reroute mark
/// before another off-route decision may be emitted.
pub const DEFAULT_MINIMUM_DISTANCE_BEFORE_REROUTING_M: f64 = 50.0;
/// Seconds of travel at the current speed that a fix may be "behind" the agent.
pub const DEFAULT_DEAD_RECKONING_TIME_INTERVAL_S: f64 = 1.0;
/// Radius (meters) around an upcoming step within which the maneuver is
/// considered completed.
pub const DEFAULT_MANEUVER_ZONE_RADIUS_M: f64 = 40.0;
/// Base dynamic off-route tolerance (meters) away from intersections.
pub const DEFAULT_OFF_ROUTE_THRESHOLD_M: f64 = 50.0;
/// Lower bound (meters) of the off-route radius, whatever the inputs.
pub const DEFAULT_ACCURACY_FLOOR_M: f64 = 10.0;

/// Dynamic tolerance is divided by this near an intersection.
pub const INTERSECTION_TOLERANCE_DIVISOR: f64 = 2.0;

/// Samples of increasing distance-to-maneuver needed before the agent is
/// considered to be moving away from it.
pub const MOVING_AWAY_SAMPLE_COUNT: usize = 3;
/// Minimum growth (meters) of the distance to the upcoming maneuver across
/// those samples.
pub const MOVING_AWAY_MIN_BACKUP_M: f64 = 50.0;

// --- Camera ---

/// Full camera tilt (degrees) away from maneuvers.
pub const CAMERA_TILT_DEG: f64 = 45.0;
/// Zoom level used in portrait orientation.
pub const CAMERA_ZOOM_PORTRAIT: f64 = 17.0;
/// Zoom level used in landscape orientation.
pub const CAMERA_ZOOM_LANDSCAPE: f64 = 16.0;
/// Default look-ahead distance (meters) when the map fills the screen.
pub const DEFAULT_CAMERA_TARGET_DISTANCE_M: f64 = 100.0;

/// Tilt taper bands: (distance remaining strictly above, tilt, look-ahead factor).
/// Anything at or below the last threshold gets zero tilt and no look-ahead.
pub const TILT_TAPER_BANDS: [(f64, f64, f64); 4] = [
    (200.0, CAMERA_TILT_DEG, 1.0),
    (150.0, 35.0, 0.75),
    (100.0, 25.0, 0.50),
    (50.0, 15.0, 0.25),
];

// --- Transition timings (milliseconds) ---

pub const FOLLOW_POSITION_DURATION_MS: i64 = 1_000;
pub const FOLLOW_ZOOM_DURATION_MS: i64 = 1_000;
pub const FOLLOW_BEARING_DURATION_MS: i64 = 1_000;
pub const FOLLOW_TILT_DURATION_MS: i64 = 2_500;
/// Each of the two sequential approach phases (zoom, then position).
pub const APPROACH_PHASE_DURATION_MS: i64 = 3_000;
pub const RECENTER_DURATION_MS: i64 = 750;
