//! Zoom effect edits.

use std::path::PathBuf;

use clap::Subcommand;
use montage_common::config::AppConfig;
use montage_project_model::NormalizedRect;

use super::Session;

#[derive(Subcommand)]
pub enum ZoomAction {
    /// Add a zoom effect at a time (default length from config)
    Add {
        /// Start time (seconds)
        #[arg(long, default_value = "0")]
        at: f64,

        /// Zoom track id
        #[arg(long)]
        track: Option<String>,
    },

    /// Change when an effect starts and how long it lasts
    Time {
        /// Effect id
        id: String,

        /// Start (seconds)
        start: f64,

        /// Duration (seconds)
        duration: f64,
    },

    /// Set the zoom level, recentering the rectangle at that size
    Level {
        /// Effect id
        id: String,

        /// Magnification (1.0 - 5.0)
        level: f64,
    },

    /// Set the crop rectangle directly (normalized)
    Rect {
        /// Effect id
        id: String,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },

    /// Drag the bottom-right corner of the rectangle to a point
    Corner {
        /// Effect id
        id: String,
        x: f64,
        y: f64,
    },

    /// Move the rectangle so its center lands on a point
    Move {
        /// Effect id
        id: String,
        x: f64,
        y: f64,
    },

    /// Remove an effect
    Remove {
        /// Effect id
        id: String,
    },
}

pub fn run(config: &AppConfig, path: PathBuf, action: ZoomAction) -> anyhow::Result<()> {
    let mut session = Session::open(config, &path)?;
    let store = &mut session.store;

    let outcome = match &action {
        ZoomAction::Add { at, track } => {
            store.set_current_time(*at);
            let id = store
                .add_zoom_effect(track.as_deref())
                .ok_or_else(|| anyhow::anyhow!("No room for a zoom effect at {at:.2}s"))?;
            let effect = store
                .state()
                .zoom_effect(&id)
                .ok_or_else(|| anyhow::anyhow!("Zoom effect {id} vanished"))?;
            println!(
                "Added zoom effect {id} ({:.2}s - {:.2}s, {:.1}x)",
                effect.start,
                effect.end(),
                effect.level
            );
            return session.save();
        }
        ZoomAction::Time {
            id,
            start,
            duration,
        } => store.update_zoom_timing(id, *start, *duration),
        ZoomAction::Level { id, level } => store.set_zoom_level(id, *level),
        ZoomAction::Rect {
            id,
            x,
            y,
            width,
            height,
        } => store.set_zoom_rect(id, NormalizedRect::new(*x, *y, *width, *height)),
        ZoomAction::Corner { id, x, y } => store.resize_zoom_from_corner(id, *x, *y),
        ZoomAction::Move { id, x, y } => store.move_zoom_rect(id, *x, *y),
        ZoomAction::Remove { id } => store.remove_zoom_effect(id),
    };

    session.expect_applied(outcome, "Done.")?;
    session.save()
}
