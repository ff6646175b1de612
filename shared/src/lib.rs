//! Shared types for the intake service
//!
//! Domain payloads, enums and utility types used by the server crate.
//! This crate is I/O free: storage entities live in `intake-server`.

pub mod models;
pub mod types;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};
pub use types::{Coordinates, Timestamp};
