//! External service clients

pub mod distance;

pub use distance::{DistanceElement, DistanceError, DistanceProvider, DistanceService};
