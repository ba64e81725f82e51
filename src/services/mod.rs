pub mod camera;
pub mod geometry;
pub mod off_route;
pub mod tolerance;
