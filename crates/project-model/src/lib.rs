//! Montage Project Model
//!
//! Defines the core data contracts for Montage projects:
//! - **Tracks:** Ordered lanes that own clips or zoom effects
//! - **Clips:** Media (video/audio/image) or text placed on the timeline
//! - **Zoom effects:** Timed pan/zoom rectangles applied to the composite
//! - **Captions:** Transcribed text segments in timeline time
//! - **Project:** Top-level metadata, canvas, and export configuration
//!
//! Times are seconds on the project timeline. Spatial coordinates are
//! normalized to `[0.0, 1.0]` relative to the output frame.

pub mod caption;
pub mod clip;
pub mod project;
pub mod rect;
pub mod track;
pub mod zoom;

pub use caption::*;
pub use clip::*;
pub use project::*;
pub use rect::*;
pub use track::*;
pub use zoom::*;

/// Shortest duration any clip or zoom effect may have (seconds).
pub const MIN_DURATION_SECS: f64 = 0.1;
