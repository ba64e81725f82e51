use thiserror::Error;

/// Invalid geometric input. Fatal to a single call only: the caller drops the
/// offending fix and keeps its previous state.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("Invalid latitude: {0} (must be between -90 and 90)")]
    InvalidLatitude(f64),

    #[error("Invalid longitude: {0} (must be between -180 and 180)")]
    InvalidLongitude(f64),

    #[error("Invalid distance: {0} (must be finite and non-negative)")]
    InvalidDistance(f64),

    #[error("Invalid bearing: {0} (must be finite)")]
    InvalidBearing(f64),

    #[error("Polyline is empty")]
    EmptyPolyline,

    #[error("Malformed polyline: {0}")]
    MalformedPolyline(String),

    #[error("Invalid GeoJSON geometry: {0}")]
    InvalidGeoJson(String),
}

/// Missing or invalid navigation options. Surfaced before any evaluation runs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("Invalid {key}: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("{key} is out of range: {reason}")]
    OutOfRange { key: &'static str, reason: String },
}

#[derive(Error, Debug)]
pub enum NavError {
    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Trace file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Trace decoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Dispatch queue closed: {0}")]
    Dispatch(String),
}

pub type Result<T> = std::result::Result<T, NavError>;
