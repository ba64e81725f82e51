use crate::constants::*;
use crate::error::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScreenOrientation {
    #[default]
    Portrait,
    Landscape,
}

impl ScreenOrientation {
    /// Camera zoom preset for this orientation
    pub fn zoom(self) -> f64 {
        match self {
            ScreenOrientation::Portrait => CAMERA_ZOOM_PORTRAIT,
            ScreenOrientation::Landscape => CAMERA_ZOOM_LANDSCAPE,
        }
    }
}

impl FromStr for ScreenOrientation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "portrait" => Ok(ScreenOrientation::Portrait),
            "landscape" => Ok(ScreenOrientation::Landscape),
            _ => Err(format!(
                "Invalid orientation: {}. Use 'portrait' or 'landscape'",
                s
            )),
        }
    }
}

/// Static options for one navigation session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationOptions {
    /// Distance (m) the agent must move away from the last reroute mark
    /// before a new off-route decision is allowed
    pub minimum_distance_before_rerouting_m: f64,

    /// Seconds used to project how far the agent may have moved since the fix
    pub dead_reckoning_time_interval_s: f64,

    /// Radius (m) around the upcoming step that counts as "maneuver completed"
    pub maneuver_zone_radius_m: f64,

    /// Base dynamic tolerance (m); halved near intersections
    pub off_route_threshold_m: f64,

    /// The off-route radius never drops below this (m)
    pub accuracy_floor_m: f64,

    /// When false every evaluation reports on-route
    pub enable_off_route_detection: bool,

    /// Track whether the agent keeps moving away from the upcoming maneuver
    pub detect_moving_away_from_maneuver: bool,
}

impl Default for NavigationOptions {
    fn default() -> Self {
        Self {
            minimum_distance_before_rerouting_m: DEFAULT_MINIMUM_DISTANCE_BEFORE_REROUTING_M,
            dead_reckoning_time_interval_s: DEFAULT_DEAD_RECKONING_TIME_INTERVAL_S,
            maneuver_zone_radius_m: DEFAULT_MANEUVER_ZONE_RADIUS_M,
            off_route_threshold_m: DEFAULT_OFF_ROUTE_THRESHOLD_M,
            accuracy_floor_m: DEFAULT_ACCURACY_FLOOR_M,
            enable_off_route_detection: true,
            detect_moving_away_from_maneuver: false,
        }
    }
}

impl NavigationOptions {
    pub fn from_env() -> Result<Self, ConfigurationError> {
        dotenv::dotenv().ok();
        let defaults = Self::default();

        let options = Self {
            minimum_distance_before_rerouting_m: env_or(
                "NAV_MINIMUM_DISTANCE_BEFORE_REROUTING_M",
                defaults.minimum_distance_before_rerouting_m,
            )?,
            dead_reckoning_time_interval_s: env_or(
                "NAV_DEAD_RECKONING_TIME_INTERVAL_S",
                defaults.dead_reckoning_time_interval_s,
            )?,
            maneuver_zone_radius_m: env_or(
                "NAV_MANEUVER_ZONE_RADIUS_M",
                defaults.maneuver_zone_radius_m,
            )?,
            off_route_threshold_m: env_or(
                "NAV_OFF_ROUTE_THRESHOLD_M",
                defaults.off_route_threshold_m,
            )?,
            accuracy_floor_m: env_or("NAV_ACCURACY_FLOOR_M", defaults.accuracy_floor_m)?,
            enable_off_route_detection: env_or(
                "NAV_ENABLE_OFF_ROUTE_DETECTION",
                defaults.enable_off_route_detection,
            )?,
            detect_moving_away_from_maneuver: env_or(
                "NAV_DETECT_MOVING_AWAY_FROM_MANEUVER",
                defaults.detect_moving_away_from_maneuver,
            )?,
        };

        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        non_negative(
            "minimum_distance_before_rerouting_m",
            self.minimum_distance_before_rerouting_m,
        )?;
        non_negative(
            "dead_reckoning_time_interval_s",
            self.dead_reckoning_time_interval_s,
        )?;
        positive("maneuver_zone_radius_m", self.maneuver_zone_radius_m)?;
        positive("off_route_threshold_m", self.off_route_threshold_m)?;
        non_negative("accuracy_floor_m", self.accuracy_floor_m)?;
        Ok(())
    }
}

/// Camera settings that stay fixed for a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Look-ahead distance (m) at full tilt
    pub target_distance_m: f64,
    pub orientation: ScreenOrientation,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            target_distance_m: DEFAULT_CAMERA_TARGET_DISTANCE_M,
            orientation: ScreenOrientation::default(),
        }
    }
}

impl CameraConfig {
    /// Scale the look-ahead to the share of the screen the map view occupies.
    /// A map filling the whole screen looks 100 m ahead.
    pub fn from_view_fraction(
        view_height_px: f64,
        screen_height_px: f64,
        orientation: ScreenOrientation,
    ) -> Result<Self, ConfigurationError> {
        positive("screen_height_px", screen_height_px)?;
        non_negative("view_height_px", view_height_px)?;

        let config = Self {
            target_distance_m: (view_height_px / screen_height_px) * DEFAULT_CAMERA_TARGET_DISTANCE_M,
            orientation,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_env() -> Result<Self, ConfigurationError> {
        dotenv::dotenv().ok();
        let defaults = Self::default();

        let config = Self {
            target_distance_m: env_or("CAMERA_TARGET_DISTANCE_M", defaults.target_distance_m)?,
            orientation: env_or("CAMERA_ORIENTATION", defaults.orientation)?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        non_negative("target_distance_m", self.target_distance_m)
    }
}

fn env_or<T>(key: &'static str, default: T) -> Result<T, ConfigurationError>
where
    T: FromStr + Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigurationError::InvalidValue { key, value: raw }),
        Err(_) => Ok(default),
    }
}

fn non_negative(key: &'static str, value: f64) -> Result<(), ConfigurationError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigurationError::OutOfRange {
            key,
            reason: format!("{} must be finite and non-negative", value),
        });
    }
    Ok(())
}

fn positive(key: &'static str, value: f64) -> Result<(), ConfigurationError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ConfigurationError::OutOfRange {
            key,
            reason: format!("{} must be finite and greater than zero", value),
        });
    }
    Ok(())
}

impl Display for ScreenOrientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScreenOrientation::Portrait => write!(f, "portrait"),
            ScreenOrientation::Landscape => write!(f, "landscape"),
        }
    }
}
