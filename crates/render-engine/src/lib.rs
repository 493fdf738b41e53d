//! Montage Render Engine
//!
//! Turns a timeline snapshot into pixels, either one frame at a time for
//! live preview or as a single static ffmpeg filter graph for export.
//!
//! # Pipeline Architecture
//!
//! ```text
//! clips ──────┐
//!             ├── Scale + pad each layer, gated to its interval
//! canvas ─────┘         │
//!                       ├── Text overlays (drawtext)
//! captions ─────────────┘         │
//!                                 ├── Split at zoom boundaries
//! zoom effects ───────────────────┘         │
//!                                           ├── Static crop + scale per segment
//!                                           ├── Concat
//! audio clips ── atrim/adelay/amix ─────────┘         │
//!                                                     ▼
//!                                               Encode (H.264)
//!                                                     │
//!                                                     ▼
//!                                                 output.mp4
//! ```

pub mod compositor;
pub mod export;
pub mod probe;

pub use compositor::{
    active_zoom_rect, compute_compositions, render_instructions_at, zoom_progress,
    zoom_transform_at, CaptionOverlay, FrameComposition, LayerInstruction,
};
pub use export::*;
pub use probe::{probe_media, MediaProbe};
