pub mod camera;
pub mod coordinates;
pub mod distance;
pub mod location;
pub mod polyline;
pub mod route;

pub use camera::{CameraPose, ChannelTiming, Easing, Transition, TransitionSpec};
pub use coordinates::Coordinates;
pub use distance::DistanceUnit;
pub use location::LocationFix;
pub use polyline::RoutePolyline;
pub use route::{DirectionsRoute, RouteProgress, RouteStep};
