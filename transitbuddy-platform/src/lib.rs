//! Position sources for hosts without a browser geolocation API.

pub mod deadline;
pub mod fixed;
pub mod test;

pub use deadline::DeadlineGeolocation;
pub use fixed::{FixedPositionGeolocation, UnsupportedGeolocation};
