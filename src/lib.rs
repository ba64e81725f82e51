// Library exports for the replay binary and integration tests

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod replay;
pub mod services;
pub mod session;

// Re-export commonly used types
pub use error::{NavError, Result};
pub use services::camera::{CameraEngine, CameraMode, CameraState, CameraUpdate};
pub use services::off_route::{OffRouteDecision, OffRouteDetector, OffRouteState};
pub use session::{NavigationSession, SessionUpdate};
