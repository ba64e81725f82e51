use crate::config::NavigationOptions;
use crate::constants::{MOVING_AWAY_MIN_BACKUP_M, MOVING_AWAY_SAMPLE_COUNT};
use crate::error::{ConfigurationError, GeometryError};
use crate::models::{Coordinates, DistanceUnit, LocationFix, RouteProgress, RouteStep};
use crate::services::{geometry, tolerance};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OffRouteDecision {
    OnRoute,
    OffRoute,
    /// The agent already sits on the upcoming step; the progress tracker
    /// should move to it instead of rerouting
    AdvanceStep,
}

/// Per-session detector state, owned by the caller and lent to each evaluation
#[derive(Debug, Clone, Default)]
pub struct OffRouteState {
    last_reroute_mark: Option<Coordinates>,
    distances_from_maneuver: VecDeque<f64>,
}

impl OffRouteState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Where the last off-route decision was accepted (or the first fix)
    pub fn last_reroute_mark(&self) -> Option<Coordinates> {
        self.last_reroute_mark
    }

    /// Keeps a run of strictly increasing distances to the upcoming maneuver.
    /// Returns true once the run spans enough samples and distance.
    fn record_distance_from_maneuver(&mut self, distance_m: f64) -> bool {
        let buffer = &mut self.distances_from_maneuver;
        match buffer.back() {
            Some(&last) if distance_m > last => {
                if buffer.len() == MOVING_AWAY_SAMPLE_COUNT {
                    buffer.pop_front();
                }
                buffer.push_back(distance_m);
            }
            _ => {
                buffer.clear();
                buffer.push_back(distance_m);
            }
        }

        match (buffer.front(), buffer.back()) {
            (Some(first), Some(last)) => {
                buffer.len() >= MOVING_AWAY_SAMPLE_COUNT && last - first >= MOVING_AWAY_MIN_BACKUP_M
            }
            _ => false,
        }
    }

    fn accept_off_route(&mut self, position: Coordinates) {
        self.last_reroute_mark = Some(position);
        self.distances_from_maneuver.clear();
    }
}

pub struct OffRouteDetector {
    options: NavigationOptions,
}

impl OffRouteDetector {
    pub fn new(options: NavigationOptions) -> Result<Self, ConfigurationError> {
        options.validate()?;
        Ok(Self { options })
    }

    pub fn options(&self) -> &NavigationOptions {
        &self.options
    }

    /// Decide whether `fix` has left the route. Exactly one decision per call;
    /// on error `state` is left untouched.
    pub fn evaluate(
        &self,
        state: &mut OffRouteState,
        fix: &LocationFix,
        progress: &RouteProgress,
    ) -> Result<OffRouteDecision, GeometryError> {
        if !self.options.enable_off_route_detection {
            return Ok(OffRouteDecision::OnRoute);
        }
        if fix.is_unset() {
            debug!("Ignoring unset location fix");
            return Ok(OffRouteDecision::OnRoute);
        }
        fix.validate()?;

        let position = fix.coordinates;

        // Debounce: the agent must have moved far enough from the last mark
        let distance_from_mark = match state.last_reroute_mark {
            Some(mark) => geometry::distance(&mark, &position, DistanceUnit::Meters)?,
            None => {
                state.last_reroute_mark = Some(position);
                0.0
            }
        };
        if distance_from_mark <= self.options.minimum_distance_before_rerouting_m {
            debug!(
                distance_from_mark_m = distance_from_mark,
                "Within {:.0}m of last reroute mark, skipping off-route check",
                self.options.minimum_distance_before_rerouting_m
            );
            return Ok(OffRouteDecision::OnRoute);
        }

        let step_distance_m = distance_from_step(&position, &progress.current_step)?;
        let radius = tolerance::off_route_radius(fix, progress, &self.options)?;
        debug!(
            distance_from_step_m = step_distance_m,
            radius_m = radius.radius_m,
            step_index = progress.step_index,
            "Distance from current step {:.1}m (radius {:.1}m)",
            step_distance_m,
            radius.radius_m
        );

        if step_distance_m <= radius.radius_m {
            if self.is_moving_away_from_maneuver(state, fix, progress)? {
                info!(
                    step_index = progress.step_index,
                    "Moving away from upcoming maneuver, off route"
                );
                state.accept_off_route(position);
                return Ok(OffRouteDecision::OffRoute);
            }
            return Ok(OffRouteDecision::OnRoute);
        }

        if let Some(upcoming) = &progress.upcoming_step {
            let distance_from_upcoming = distance_from_step(&position, upcoming)?;
            debug!(
                distance_from_upcoming_m = distance_from_upcoming,
                maneuver_zone_radius_m = self.options.maneuver_zone_radius_m,
                "Distance from upcoming step {:.1}m",
                distance_from_upcoming
            );
            if distance_from_upcoming < self.options.maneuver_zone_radius_m {
                info!(
                    step_index = progress.step_index,
                    "Close to upcoming step, advancing step index"
                );
                return Ok(OffRouteDecision::AdvanceStep);
            }
        }

        info!(
            lat = position.lat,
            lng = position.lng,
            distance_from_step_m = step_distance_m,
            radius_m = radius.radius_m,
            "Off route: {:.1}m from step {} (radius {:.1}m)",
            step_distance_m,
            progress.step_index,
            radius.radius_m
        );
        state.accept_off_route(position);
        Ok(OffRouteDecision::OffRoute)
    }

    /// Measured from the dead-reckoned position, so a fast fix heading away
    /// from the maneuver counts for more than a slow one
    fn is_moving_away_from_maneuver(
        &self,
        state: &mut OffRouteState,
        fix: &LocationFix,
        progress: &RouteProgress,
    ) -> Result<bool, GeometryError> {
        if !self.options.detect_moving_away_from_maneuver {
            return Ok(false);
        }
        let Some(upcoming) = &progress.upcoming_step else {
            return Ok(false);
        };

        let projected = tolerance::dead_reckoning_position(fix, &self.options)?;
        let distance_m =
            geometry::distance(&upcoming.maneuver_location, &projected, DistanceUnit::Meters)?;
        Ok(state.record_distance_from_maneuver(distance_m))
    }
}

/// Distance (m) from `position` to a step's path; a step with a single
/// point is measured against its maneuver location
pub fn distance_from_step(position: &Coordinates, step: &RouteStep) -> Result<f64, GeometryError> {
    if step.geometry.len() == 1 {
        return geometry::distance(position, &step.maneuver_location, DistanceUnit::Meters);
    }
    Ok(geometry::nearest_point_on_line(position, &step.geometry)?.distance_m)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RoutePolyline;
    use time::macros::datetime;

    fn c(lat: f64, lng: f64) -> Coordinates {
        Coordinates::new(lat, lng).unwrap()
    }

    #[test]
    fn test_moving_away_buffer_needs_three_increasing_samples() {
        let mut state = OffRouteState::new();
        assert!(!state.record_distance_from_maneuver(100.0));
        assert!(!state.record_distance_from_maneuver(130.0));
        assert!(state.record_distance_from_maneuver(160.0));
    }

    #[test]
    fn test_moving_away_buffer_resets_on_approach() {
        let mut state = OffRouteState::new();
        state.record_distance_from_maneuver(100.0);
        state.record_distance_from_maneuver(130.0);
        assert!(!state.record_distance_from_maneuver(120.0));
        assert!(!state.record_distance_from_maneuver(140.0));
        assert!(state.record_distance_from_maneuver(190.0));
    }

    #[test]
    fn test_moving_away_buffer_ignores_small_drift() {
        let mut state = OffRouteState::new();
        state.record_distance_from_maneuver(100.0);
        state.record_distance_from_maneuver(101.0);
        assert!(!state.record_distance_from_maneuver(102.0));
    }

    #[test]
    fn test_distance_from_single_point_step_uses_maneuver() {
        let step = RouteStep::new(RoutePolyline::new(vec![c(0.0, 0.0)]).unwrap());
        let d = distance_from_step(&c(0.001, 0.0), &step).unwrap();
        assert!((d - 111.2).abs() < 1.0);
    }

    #[test]
    fn test_fix_beside_upcoming_step_advances() {
        let detector = OffRouteDetector::new(NavigationOptions::default()).unwrap();
        let mut state = OffRouteState::new();
        let east = RouteStep::new(RoutePolyline::new(vec![c(0.0, 0.0), c(0.0, 0.01)]).unwrap());
        let north = RouteStep::new(RoutePolyline::new(vec![c(0.0, 0.01), c(0.01, 0.01)]).unwrap());
        let progress = RouteProgress::new(east, 10.0).with_upcoming_step(north);
        let at = |lat, lng| LocationFix::new(c(lat, lng), 0.0, 0.0, datetime!(2024-05-01 08:00:00 UTC));

        detector.evaluate(&mut state, &at(0.0, 0.003), &progress).unwrap();
        let decision = detector
            .evaluate(&mut state, &at(0.0005, 0.0103), &progress)
            .unwrap();

        assert_eq!(decision, OffRouteDecision::AdvanceStep);
    }

    #[test]
    fn test_moving_away_measures_from_projected_position() {
        let options = NavigationOptions {
            detect_moving_away_from_maneuver: true,
            ..NavigationOptions::default()
        };
        let detector = OffRouteDetector::new(options).unwrap();
        let mut state = OffRouteState::new();
        let east = RouteStep::new(RoutePolyline::new(vec![c(0.0, 0.0), c(0.0, 0.01)]).unwrap());
        let ahead = RouteStep::new(RoutePolyline::new(vec![c(0.0, 0.01), c(0.01, 0.01)]).unwrap());
        let progress = RouteProgress::new(east, 600.0).with_upcoming_step(ahead);
        let westbound = |lng, speed| {
            LocationFix::new(c(0.0, lng), 270.0, speed, datetime!(2024-05-01 08:00:00 UTC))
        };

        detector
            .evaluate(&mut state, &westbound(0.005, 0.0), &progress)
            .unwrap();

        // Raw positions only back off ~22 m; the projections spread that to ~82 m
        let decisions: Vec<_> = [(0.004, 0.0), (0.0039, 20.0), (0.0038, 60.0)]
            .into_iter()
            .map(|(lng, speed)| {
                detector
                    .evaluate(&mut state, &westbound(lng, speed), &progress)
                    .unwrap()
            })
            .collect();

        assert_eq!(
            decisions,
            vec![
                OffRouteDecision::OnRoute,
                OffRouteDecision::OnRoute,
                OffRouteDecision::OffRoute
            ]
        );
    }

    #[test]
    fn test_detector_rejects_invalid_options() {
        let mut options = NavigationOptions::default();
        options.off_route_threshold_m = -1.0;
        assert!(OffRouteDetector::new(options).is_err());
    }

    #[test]
    fn test_invalid_fix_leaves_state_untouched() {
        let detector = OffRouteDetector::new(NavigationOptions::default()).unwrap();
        let mut state = OffRouteState::new();
        let step = RouteStep::new(RoutePolyline::new(vec![c(0.0, 0.0), c(0.0, 0.01)]).unwrap());
        let progress = RouteProgress::new(step, 1000.0);
        let bad = LocationFix::new(
            Coordinates { lat: 120.0, lng: 0.0 },
            0.0,
            0.0,
            datetime!(2024-05-01 08:00:00 UTC),
        );

        assert!(detector.evaluate(&mut state, &bad, &progress).is_err());
        assert!(state.last_reroute_mark().is_none());
    }
}
