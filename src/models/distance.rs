use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const METERS_PER_KILOMETER: f64 = 1_000.0;
const METERS_PER_MILE: f64 = 1_609.344;

/// Unit for distances passed to or returned from the geometry functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceUnit {
    #[default]
    Meters,
    Kilometers,
    Miles,
}

impl DistanceUnit {
    pub fn to_meters(self, value: f64) -> f64 {
        match self {
            DistanceUnit::Meters => value,
            DistanceUnit::Kilometers => value * METERS_PER_KILOMETER,
            DistanceUnit::Miles => value * METERS_PER_MILE,
        }
    }

    pub fn from_meters(self, meters: f64) -> f64 {
        match self {
            DistanceUnit::Meters => meters,
            DistanceUnit::Kilometers => meters / METERS_PER_KILOMETER,
            DistanceUnit::Miles => meters / METERS_PER_MILE,
        }
    }
}

impl fmt::Display for DistanceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistanceUnit::Meters => write!(f, "m"),
            DistanceUnit::Kilometers => write!(f, "km"),
            DistanceUnit::Miles => write!(f, "mi"),
        }
    }
}

impl FromStr for DistanceUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "m" | "meters" | "metres" => Ok(DistanceUnit::Meters),
            "km" | "kilometers" | "kilometres" => Ok(DistanceUnit::Kilometers),
            "mi" | "miles" => Ok(DistanceUnit::Miles),
            _ => Err(format!("Invalid distance unit: '{}'", s)),
        }
    }
}
