//! Clip edits: cut, trim, reorder, delete, and field updates.

use std::path::PathBuf;

use clap::{Subcommand, ValueEnum};
use montage_common::config::AppConfig;
use montage_project_model::ClipPatch;
use montage_timeline_core::TrimSide;

use super::Session;

#[derive(Subcommand)]
pub enum ClipAction {
    /// Split a clip in two at a timeline time
    Cut {
        /// Clip id
        id: String,

        /// Split point (seconds, strictly inside the clip)
        at: f64,
    },

    /// Move one edge of a clip
    Trim {
        /// Clip id
        id: String,

        /// Which edge to move
        #[arg(value_enum)]
        side: Side,

        /// Seconds to move the edge (positive shortens from the start,
        /// lengthens from the end)
        #[arg(allow_hyphen_values = true)]
        delta: f64,
    },

    /// Move a clip to another position on its magnetic track
    Reorder {
        /// Track id
        track: String,

        /// Current index on the track
        from: usize,

        /// New index on the track
        to: usize,
    },

    /// Delete a clip and close the gap it leaves
    Delete {
        /// Clip id
        id: String,
    },

    /// Remove a clip without closing the gap
    Remove {
        /// Clip id
        id: String,
    },

    /// Update clip fields
    Set {
        /// Clip id
        id: String,

        /// Display name (media clips)
        #[arg(long)]
        name: Option<String>,

        /// Text (text clips)
        #[arg(long)]
        text: Option<String>,

        /// Start time (free tracks only)
        #[arg(long)]
        start: Option<f64>,

        /// Duration (free tracks only)
        #[arg(long)]
        duration: Option<f64>,

        /// Offset into the source file
        #[arg(long)]
        source_offset: Option<f64>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum Side {
    Start,
    End,
}

pub fn run(config: &AppConfig, path: PathBuf, action: ClipAction) -> anyhow::Result<()> {
    let mut session = Session::open(config, &path)?;

    let outcome = match &action {
        ClipAction::Cut { id, at } => session.store.cut_clip(id, *at),
        ClipAction::Trim { id, side, delta } => {
            let side = match side {
                Side::Start => TrimSide::Start,
                Side::End => TrimSide::End,
            };
            session.store.trim_clip(id, side, *delta)
        }
        ClipAction::Reorder { track, from, to } => session.store.reorder_clips(track, *from, *to),
        ClipAction::Delete { id } => session.store.delete_clip(id),
        ClipAction::Remove { id } => session.store.remove_clip(id),
        ClipAction::Set {
            id,
            name,
            text,
            start,
            duration,
            source_offset,
        } => {
            let patch = ClipPatch {
                start: *start,
                duration: *duration,
                source_offset: *source_offset,
                display_name: name.clone(),
                text: text.clone(),
                ..Default::default()
            };
            session.store.update_clip(id, &patch)
        }
    };

    session.expect_applied(
        outcome,
        &format!(
            "Done. Timeline is now {:.2}s",
            session.store.total_duration()
        ),
    )?;
    session.save()
}
