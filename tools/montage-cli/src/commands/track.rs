//! Track edits.

use std::path::PathBuf;

use clap::{Subcommand, ValueEnum};
use montage_common::config::AppConfig;
use montage_project_model::{TrackKind, TrackPatch};

use super::Session;

#[derive(Subcommand)]
pub enum TrackAction {
    /// Add a track
    Add {
        /// Track name
        name: String,

        /// What the track holds
        #[arg(value_enum)]
        kind: Kind,
    },

    /// Rename a track
    Rename {
        /// Track id
        id: String,

        /// New name
        name: String,
    },

    /// Lock a track against edits
    Lock {
        /// Track id
        id: String,

        /// Unlock instead
        #[arg(long)]
        off: bool,
    },

    /// Hide a track from preview and export
    Hide {
        /// Track id
        id: String,

        /// Show instead
        #[arg(long)]
        off: bool,
    },

    /// Remove a track and everything on it
    Remove {
        /// Track id
        id: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum Kind {
    Video,
    Audio,
    Image,
    Text,
    Zoom,
}

impl From<Kind> for TrackKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Video => TrackKind::Video,
            Kind::Audio => TrackKind::Audio,
            Kind::Image => TrackKind::Image,
            Kind::Text => TrackKind::Text,
            Kind::Zoom => TrackKind::Zoom,
        }
    }
}

pub fn run(config: &AppConfig, path: PathBuf, action: TrackAction) -> anyhow::Result<()> {
    let mut session = Session::open(config, &path)?;

    let (id, patch) = match action {
        TrackAction::Add { name, kind } => {
            let id = session.store.add_track(name, kind.into());
            println!("Added track {id}");
            return session.save();
        }
        TrackAction::Remove { id } => {
            let outcome = session.store.remove_track(&id);
            session.expect_applied(outcome, &format!("Removed track {id}"))?;
            return session.save();
        }
        TrackAction::Rename { id, name } => (
            id,
            TrackPatch {
                name: Some(name),
                ..Default::default()
            },
        ),
        TrackAction::Lock { id, off } => (
            id,
            TrackPatch {
                locked: Some(!off),
                ..Default::default()
            },
        ),
        TrackAction::Hide { id, off } => (
            id,
            TrackPatch {
                visible: Some(off),
                ..Default::default()
            },
        ),
    };

    let outcome = session.store.update_track(&id, &patch);
    session.expect_applied(outcome, &format!("Updated track {id}"))?;
    session.save()
}
