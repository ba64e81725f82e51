//! Camera state engine.
//!
//! Computes where a following map camera should look on every fix and how it
//! should get there. The engine itself only holds static configuration and the
//! decoded geometry of the last route; everything that changes during a
//! session lives in [`CameraState`], which the caller owns.
//!
//! Modes move `Idle -> Approach -> Following <-> ManualOverride`. Approach is
//! left through [`CameraEngine::transition_completed`] or, failing that, by the
//! first fix that arrives after the approach transition has run its course.

use crate::config::CameraConfig;
use crate::constants::*;
use crate::error::{ConfigurationError, GeometryError};
use crate::models::{
    CameraPose, ChannelTiming, DirectionsRoute, DistanceUnit, Easing, LocationFix,
    RoutePolyline, RouteProgress, Transition, TransitionSpec,
};
use crate::services::geometry;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraMode {
    /// No route started yet
    #[default]
    Idle,
    /// Previewing the start of a fresh route
    Approach,
    /// Tracking every fix
    Following,
    /// The user moved the map; targets are suppressed until re-enabled
    ManualOverride,
}

/// What the renderer should play back
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraUpdate {
    pub mode: CameraMode,
    /// Start value, already accounting for any interrupted transition
    pub from: CameraPose,
    pub pose: CameraPose,
    pub transition: TransitionSpec,
}

/// Mutable camera state for one session
#[derive(Debug, Clone, Default)]
pub struct CameraState {
    mode: CameraMode,
    current: Option<CameraPose>,
    transition: Option<Transition>,
    last_following: Option<CameraPose>,
}

impl CameraState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from the pose the map is currently showing
    pub fn with_pose(pose: CameraPose) -> Self {
        CameraState {
            current: Some(pose),
            ..Self::default()
        }
    }

    pub fn mode(&self) -> CameraMode {
        self.mode
    }

    pub fn is_tracking(&self) -> bool {
        self.mode != CameraMode::ManualOverride
    }

    pub fn is_animating(&self) -> bool {
        self.transition.is_some()
    }

    /// Last target computed while following, used to re-center
    pub fn last_following_pose(&self) -> Option<CameraPose> {
        self.last_following
    }

    /// Pose at `now`, sampling any transition in flight
    pub fn current_pose(&self, now: OffsetDateTime) -> Option<CameraPose> {
        match &self.transition {
            Some(transition) => Some(transition.sample(now)),
            None => self.current,
        }
    }

    /// Report a pose the renderer reached on its own (e.g. the user panned)
    pub fn set_current_pose(&mut self, pose: CameraPose) {
        self.transition = None;
        self.current = Some(pose);
    }

    /// `to.bearing` stays in [0, 360); the start bearing is unwrapped around
    /// it so the turn never exceeds 180 degrees
    fn begin(&mut self, to: CameraPose, spec: TransitionSpec, now: OffsetDateTime) -> CameraUpdate {
        let mut from = self.current_pose(now).unwrap_or(to);
        from.bearing = geometry::shortest_rotation(to.bearing, from.bearing);
        self.current = Some(from);
        self.transition = Some(Transition::new(from, to, spec, now));

        CameraUpdate {
            mode: self.mode,
            from,
            pose: to,
            transition: spec,
        }
    }

    fn settle_if_finished(&mut self, now: OffsetDateTime) -> bool {
        match self.transition {
            Some(transition) if transition.is_finished(now) => {
                self.current = Some(transition.to);
                self.transition = None;
                true
            }
            Some(_) => false,
            None => true,
        }
    }

    fn complete_transition(&mut self) {
        if let Some(transition) = self.transition.take() {
            self.current = Some(transition.to);
        }
    }

    fn cancel_transition(&mut self, now: OffsetDateTime) {
        if let Some(transition) = self.transition.take() {
            self.current = Some(transition.sample(now));
        }
    }
}

struct CachedRoute {
    geometry: String,
    polyline: RoutePolyline,
    initial_bearing: f64,
}

pub struct CameraEngine {
    config: CameraConfig,
    cached_route: Option<CachedRoute>,
}

impl CameraEngine {
    pub fn new(config: CameraConfig) -> Result<Self, ConfigurationError> {
        config.validate()?;
        Ok(Self {
            config,
            cached_route: None,
        })
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    /// Decoded geometry of `route`, reused while the route stays the same
    pub fn route_polyline(&mut self, route: &DirectionsRoute) -> Result<&RoutePolyline, GeometryError> {
        Ok(&self.cached(route)?.polyline)
    }

    fn cached(&mut self, route: &DirectionsRoute) -> Result<&CachedRoute, GeometryError> {
        let stale = self
            .cached_route
            .as_ref()
            .map_or(true, |cached| cached.geometry != route.geometry);

        if stale {
            let polyline = route.decode_geometry()?;
            let points = polyline.points();
            let initial_bearing = match points {
                [first, second, ..] => geometry::bearing(first, second)?,
                _ => 0.0,
            };
            debug!(
                points = polyline.len(),
                initial_bearing,
                "Decoded route geometry ({} points, initial bearing {:.1})",
                polyline.len(),
                initial_bearing
            );
            self.cached_route = Some(CachedRoute {
                geometry: route.geometry.clone(),
                polyline,
                initial_bearing,
            });
        }

        self.cached_route
            .as_ref()
            .ok_or(GeometryError::EmptyPolyline)
    }

    /// Pose previewing the route start: slightly ahead of its first point,
    /// facing along its first segment
    pub fn approach_pose(&mut self, route: &DirectionsRoute) -> Result<CameraPose, GeometryError> {
        let target_distance = self.config.target_distance_m;
        let zoom = self.config.orientation.zoom();
        let cached = self.cached(route)?;

        let target = geometry::destination(
            &cached.polyline.first(),
            target_distance,
            cached.initial_bearing,
            DistanceUnit::Meters,
        )?;

        Ok(CameraPose::new(target, cached.initial_bearing, CAMERA_TILT_DEG, zoom))
    }

    /// Begin a session's route: animate to the approach pose and enter Approach
    pub fn start_route(
        &mut self,
        state: &mut CameraState,
        route: &DirectionsRoute,
        now: OffsetDateTime,
    ) -> Result<CameraUpdate, GeometryError> {
        let pose = self.approach_pose(route)?;

        state.mode = CameraMode::Approach;
        info!(
            lat = pose.target.lat,
            lng = pose.target.lng,
            bearing = pose.bearing,
            "Camera approaching route start"
        );
        Ok(state.begin(pose, approach_transition(), now))
    }

    /// The renderer finished playing the current transition
    pub fn transition_completed(&self, state: &mut CameraState) {
        state.complete_transition();
        if state.mode == CameraMode::Approach {
            state.mode = CameraMode::Following;
            info!("Approach finished, camera following");
        }
    }

    /// Compute the next target for `fix`, if the camera is tracking
    pub fn on_location(
        &self,
        state: &mut CameraState,
        fix: &LocationFix,
        progress: &RouteProgress,
        now: OffsetDateTime,
    ) -> Result<Option<CameraUpdate>, GeometryError> {
        if fix.is_unset() {
            debug!("Ignoring unset location fix");
            return Ok(None);
        }
        fix.validate()?;

        if state.mode == CameraMode::Approach {
            if !state.settle_if_finished(now) {
                return Ok(None);
            }
            state.mode = CameraMode::Following;
            info!("Approach elapsed, camera following");
        }

        if state.mode != CameraMode::Following {
            return Ok(None);
        }

        let pose = self.following_pose(fix, progress)?;
        state.last_following = Some(pose);

        debug!(
            tilt = pose.tilt,
            bearing = pose.bearing,
            distance_remaining_m = progress.step_distance_remaining_m,
            "Camera target tilt {:.0}, bearing {:.1}",
            pose.tilt,
            pose.bearing
        );
        Ok(Some(state.begin(pose, follow_transition(), now)))
    }

    /// Target pose for `fix` while following
    pub fn following_pose(
        &self,
        fix: &LocationFix,
        progress: &RouteProgress,
    ) -> Result<CameraPose, GeometryError> {
        let tilt = tilt_for_distance(progress.step_distance_remaining_m);
        let lookahead = lookahead_for_tilt(self.config.target_distance_m, tilt);
        let bearing = fix.bearing.rem_euclid(360.0);
        let target = geometry::destination(
            &fix.coordinates,
            lookahead,
            bearing,
            DistanceUnit::Meters,
        )?;

        Ok(CameraPose::new(
            target,
            bearing,
            tilt,
            self.config.orientation.zoom(),
        ))
    }

    /// The user took control of the map: stop where the camera is right now
    pub fn disable_tracking(&self, state: &mut CameraState, now: OffsetDateTime) {
        state.cancel_transition(now);
        state.mode = CameraMode::ManualOverride;
        info!("Camera tracking disabled");
    }

    /// Resume following and re-center on the last following target
    pub fn enable_tracking(
        &self,
        state: &mut CameraState,
        now: OffsetDateTime,
    ) -> Option<CameraUpdate> {
        if state.mode != CameraMode::ManualOverride {
            return None;
        }
        state.mode = CameraMode::Following;
        info!("Camera tracking enabled");

        let pose = state.last_following?;
        Some(state.begin(
            pose,
            TransitionSpec::uniform(RECENTER_DURATION_MS, Easing::EaseInOut),
            now,
        ))
    }
}

/// Tilt (degrees) for the distance left to the next maneuver
pub fn tilt_for_distance(distance_remaining_m: f64) -> f64 {
    TILT_TAPER_BANDS
        .iter()
        .find(|(threshold, _, _)| distance_remaining_m > *threshold)
        .map_or(0.0, |(_, tilt, _)| *tilt)
}

/// Look-ahead distance matching a tilt band; unknown tilts keep the base
pub fn lookahead_for_tilt(base_distance_m: f64, tilt: f64) -> f64 {
    if tilt == 0.0 {
        return 0.0;
    }
    TILT_TAPER_BANDS
        .iter()
        .find(|(_, band_tilt, _)| *band_tilt == tilt)
        .map_or(base_distance_m, |(_, _, factor)| base_distance_m * factor)
}

fn follow_transition() -> TransitionSpec {
    TransitionSpec {
        position: ChannelTiming::new(FOLLOW_POSITION_DURATION_MS, Easing::Linear),
        zoom: ChannelTiming::new(FOLLOW_ZOOM_DURATION_MS, Easing::Linear),
        bearing: ChannelTiming::new(FOLLOW_BEARING_DURATION_MS, Easing::Linear),
        tilt: ChannelTiming::new(FOLLOW_TILT_DURATION_MS, Easing::Decelerate),
    }
}

/// Zoom first, then pan; bearing and tilt turn over both phases
fn approach_transition() -> TransitionSpec {
    let both_phases = APPROACH_PHASE_DURATION_MS * 2;
    TransitionSpec {
        zoom: ChannelTiming::new(APPROACH_PHASE_DURATION_MS, Easing::Linear),
        position: ChannelTiming::new(APPROACH_PHASE_DURATION_MS, Easing::Linear)
            .delayed(APPROACH_PHASE_DURATION_MS),
        bearing: ChannelTiming::new(both_phases, Easing::Linear),
        tilt: ChannelTiming::new(both_phases, Easing::Linear),
    }
}
