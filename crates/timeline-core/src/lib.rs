//! Montage Timeline Core
//!
//! The editable state of a project and every legal way to change it:
//! - **Store:** Tracks, clips, zoom effects, playhead, selection, view
//! - **Ripple:** Gapless repacking of magnetic tracks after each edit
//! - **Captions:** Caption segments and their invalidation lifecycle
//! - **Gestures:** Local drag state committed as a single edit on release
//! - **Playback:** Copies the compositor's clock into the playhead
//!
//! This crate is pure computation. No I/O, no platform dependencies.
//! Every edit replaces the affected collections wholesale, so snapshots
//! taken before an edit never observe it.

pub mod captions;
pub mod gesture;
pub mod playback;
pub mod ripple;
pub mod state;
pub mod store;

pub use captions::CaptionStore;
pub use state::{Selection, TimelineState, ViewSettings};
pub use store::{EditOutcome, NewClip, RejectReason, TimelineStore, TrimSide};
