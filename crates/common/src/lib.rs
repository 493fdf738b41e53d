//! Montage Common Utilities
//!
//! Shared infrastructure for all Montage crates:
//! - Error types and result aliases
//! - Identifier generation (random and deterministic)
//! - Timeline unit conversion between pixels and seconds
//! - Frame pacing for the playback driver
//! - Tracing/logging initialization
//! - Configuration loading

pub mod clock;
pub mod config;
pub mod error;
pub mod ids;
pub mod logging;
pub mod units;

pub use clock::*;
pub use config::*;
pub use error::*;
pub use ids::*;
pub use units::*;
