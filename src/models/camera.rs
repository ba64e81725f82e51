use crate::models::Coordinates;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    pub target: Coordinates,
    pub bearing: f64,
    pub tilt: f64,
    pub zoom: f64,
}

impl CameraPose {
    pub fn new(target: Coordinates, bearing: f64, tilt: f64, zoom: f64) -> Self {
        CameraPose {
            target,
            bearing,
            tilt,
            zoom,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    Linear,
    /// Fast start, slow finish: `1 - (1 - t)^2`
    Decelerate,
    /// Cubic ease-in-out
    EaseInOut,
}

impl Easing {
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::Decelerate => 1.0 - (1.0 - t).powi(2),
            Easing::EaseInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
        }
    }
}

/// Timing of one animated camera property
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelTiming {
    pub delay_ms: i64,
    pub duration_ms: i64,
    pub easing: Easing,
}

impl ChannelTiming {
    pub fn new(duration_ms: i64, easing: Easing) -> Self {
        ChannelTiming {
            delay_ms: 0,
            duration_ms,
            easing,
        }
    }

    pub fn delayed(mut self, delay_ms: i64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    pub fn end_ms(&self) -> i64 {
        self.delay_ms + self.duration_ms
    }

    fn progress(&self, elapsed_ms: i64) -> f64 {
        if self.duration_ms <= 0 {
            return if elapsed_ms >= self.delay_ms { 1.0 } else { 0.0 };
        }
        let raw = (elapsed_ms - self.delay_ms) as f64 / self.duration_ms as f64;
        self.easing.apply(raw)
    }
}

/// How the renderer should move from one pose to the next
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransitionSpec {
    pub position: ChannelTiming,
    pub zoom: ChannelTiming,
    pub bearing: ChannelTiming,
    pub tilt: ChannelTiming,
}

impl TransitionSpec {
    /// Same timing for every property
    pub fn uniform(duration_ms: i64, easing: Easing) -> Self {
        let timing = ChannelTiming::new(duration_ms, easing);
        TransitionSpec {
            position: timing,
            zoom: timing,
            bearing: timing,
            tilt: timing,
        }
    }

    pub fn total_duration_ms(&self) -> i64 {
        [self.position, self.zoom, self.bearing, self.tilt]
            .iter()
            .map(ChannelTiming::end_ms)
            .max()
            .unwrap_or(0)
    }
}

/// A transition in flight, sampled at explicit instants
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub from: CameraPose,
    pub to: CameraPose,
    pub spec: TransitionSpec,
    pub started_at: OffsetDateTime,
}

impl Transition {
    pub fn new(
        from: CameraPose,
        to: CameraPose,
        spec: TransitionSpec,
        started_at: OffsetDateTime,
    ) -> Self {
        Transition {
            from,
            to,
            spec,
            started_at,
        }
    }

    fn elapsed_ms(&self, at: OffsetDateTime) -> i64 {
        let elapsed = (at - self.started_at).whole_milliseconds();
        elapsed.clamp(0, i64::MAX as i128) as i64
    }

    pub fn is_finished(&self, at: OffsetDateTime) -> bool {
        self.elapsed_ms(at) >= self.spec.total_duration_ms()
    }

    /// Interpolated pose at `at`; clamps to `from` before the start and
    /// `to` after the end.
    pub fn sample(&self, at: OffsetDateTime) -> CameraPose {
        let elapsed = self.elapsed_ms(at);
        let position = self.spec.position.progress(elapsed);

        CameraPose {
            target: Coordinates {
                lat: lerp(self.from.target.lat, self.to.target.lat, position),
                lng: lerp(self.from.target.lng, self.to.target.lng, position),
            },
            bearing: lerp(
                self.from.bearing,
                self.to.bearing,
                self.spec.bearing.progress(elapsed),
            ),
            tilt: lerp(self.from.tilt, self.to.tilt, self.spec.tilt.progress(elapsed)),
            zoom: lerp(self.from.zoom, self.to.zoom, self.spec.zoom.progress(elapsed)),
        }
    }
}

fn lerp(start: f64, end: f64, fraction: f64) -> f64 {
    if fraction >= 1.0 {
        return end;
    }
    start + (end - start) * fraction
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;
    use time::Duration;

    fn pose(lat: f64, lng: f64, bearing: f64, tilt: f64, zoom: f64) -> CameraPose {
        CameraPose::new(Coordinates::new(lat, lng).unwrap(), bearing, tilt, zoom)
    }

    #[test]
    fn test_easing_endpoints() {
        for easing in [Easing::Linear, Easing::Decelerate, Easing::EaseInOut] {
            assert_eq!(easing.apply(0.0), 0.0);
            assert_eq!(easing.apply(1.0), 1.0);
            assert_eq!(easing.apply(2.0), 1.0);
        }
        assert!(Easing::Decelerate.apply(0.5) > 0.5);
        assert!((Easing::EaseInOut.apply(0.5) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_sample_halfway_linear() {
        let start = datetime!(2024-05-01 08:00:00 UTC);
        let transition = Transition::new(
            pose(0.0, 10.0, 0.0, 0.0, 14.0),
            pose(2.0, 12.0, 90.0, 40.0, 16.0),
            TransitionSpec::uniform(1000, Easing::Linear),
            start,
        );

        let mid = transition.sample(start + Duration::milliseconds(500));
        assert!((mid.target.lat - 1.0).abs() < 1e-9);
        assert!((mid.target.lng - 11.0).abs() < 1e-9);
        assert!((mid.bearing - 45.0).abs() < 1e-9);
        assert!((mid.tilt - 20.0).abs() < 1e-9);
        assert!((mid.zoom - 15.0).abs() < 1e-9);

        assert_eq!(transition.sample(start - Duration::seconds(1)), transition.from);
        assert_eq!(transition.sample(start + Duration::seconds(5)), transition.to);
        assert!(!transition.is_finished(start + Duration::milliseconds(999)));
        assert!(transition.is_finished(start + Duration::milliseconds(1000)));
    }

    #[test]
    fn test_delayed_channel_holds_until_delay() {
        let start = datetime!(2024-05-01 08:00:00 UTC);
        let spec = TransitionSpec {
            position: ChannelTiming::new(3000, Easing::Linear).delayed(3000),
            zoom: ChannelTiming::new(3000, Easing::Linear),
            bearing: ChannelTiming::new(6000, Easing::Linear),
            tilt: ChannelTiming::new(6000, Easing::Linear),
        };
        assert_eq!(spec.total_duration_ms(), 6000);

        let transition = Transition::new(
            pose(0.0, 0.0, 0.0, 0.0, 10.0),
            pose(1.0, 1.0, 60.0, 45.0, 16.0),
            spec,
            start,
        );

        let zoomed = transition.sample(start + Duration::seconds(3));
        assert_eq!(zoomed.zoom, 16.0);
        assert_eq!(zoomed.target, transition.from.target);

        let moving = transition.sample(start + Duration::milliseconds(4500));
        assert!((moving.target.lat - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_zero_duration_jumps() {
        let start = datetime!(2024-05-01 08:00:00 UTC);
        let transition = Transition::new(
            pose(0.0, 0.0, 0.0, 0.0, 10.0),
            pose(1.0, 1.0, 0.0, 0.0, 10.0),
            TransitionSpec::uniform(0, Easing::Linear),
            start,
        );
        assert!(transition.is_finished(start));
        assert_eq!(transition.sample(start), transition.to);
    }
}
