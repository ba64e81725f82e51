use crate::config::{CameraConfig, NavigationOptions};
use crate::error::{ConfigurationError, GeometryError};
use crate::models::{CameraPose, DirectionsRoute, LocationFix, RouteProgress};
use crate::services::camera::{CameraEngine, CameraState, CameraUpdate};
use crate::services::off_route::{OffRouteDecision, OffRouteDetector, OffRouteState};
use serde::Serialize;
use time::OffsetDateTime;

/// Everything the core produces for one fix
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SessionUpdate {
    pub decision: OffRouteDecision,
    pub camera: Option<CameraUpdate>,
}

/// One navigation session: the off-route detector and the camera engine plus
/// the state they mutate. Calls must be serialized by the caller.
pub struct NavigationSession {
    detector: OffRouteDetector,
    camera: CameraEngine,
    off_route_state: OffRouteState,
    camera_state: CameraState,
}

impl NavigationSession {
    pub fn new(
        options: NavigationOptions,
        camera_config: CameraConfig,
    ) -> Result<Self, ConfigurationError> {
        Ok(Self {
            detector: OffRouteDetector::new(options)?,
            camera: CameraEngine::new(camera_config)?,
            off_route_state: OffRouteState::new(),
            camera_state: CameraState::new(),
        })
    }

    /// Seed the camera with the pose the map currently shows
    pub fn with_camera_pose(mut self, pose: CameraPose) -> Self {
        self.camera_state = CameraState::with_pose(pose);
        self
    }

    pub fn options(&self) -> &NavigationOptions {
        self.detector.options()
    }

    pub fn off_route_state(&self) -> &OffRouteState {
        &self.off_route_state
    }

    pub fn camera_state(&self) -> &CameraState {
        &self.camera_state
    }

    pub fn start_route(
        &mut self,
        route: &DirectionsRoute,
        now: OffsetDateTime,
    ) -> Result<CameraUpdate, GeometryError> {
        self.camera.start_route(&mut self.camera_state, route, now)
    }

    /// Process a fix at its own timestamp
    pub fn on_location(
        &mut self,
        fix: &LocationFix,
        progress: &RouteProgress,
    ) -> Result<SessionUpdate, GeometryError> {
        self.on_location_at(fix, progress, fix.timestamp)
    }

    /// Process a fix, sampling camera transitions at `now`. An invalid fix
    /// fails the call and leaves every piece of state as it was.
    pub fn on_location_at(
        &mut self,
        fix: &LocationFix,
        progress: &RouteProgress,
        now: OffsetDateTime,
    ) -> Result<SessionUpdate, GeometryError> {
        if fix.is_unset() {
            tracing::warn!("Dropping unset (0, 0) location fix");
            return Ok(SessionUpdate {
                decision: OffRouteDecision::OnRoute,
                camera: None,
            });
        }
        fix.validate()?;

        let decision = self
            .detector
            .evaluate(&mut self.off_route_state, fix, progress)?;
        let camera = self
            .camera
            .on_location(&mut self.camera_state, fix, progress, now)?;

        Ok(SessionUpdate { decision, camera })
    }

    pub fn transition_completed(&mut self) {
        self.camera.transition_completed(&mut self.camera_state);
    }

    pub fn disable_tracking(&mut self, now: OffsetDateTime) {
        self.camera.disable_tracking(&mut self.camera_state, now);
    }

    pub fn enable_tracking(&mut self, now: OffsetDateTime) -> Option<CameraUpdate> {
        self.camera.enable_tracking(&mut self.camera_state, now)
    }
}
