//! Subcommand implementations.
//!
//! Editing commands share one cycle: load the project, rebuild the store,
//! apply a single operation, and save only if it was applied.

use std::path::Path;

use montage_common::config::AppConfig;
use montage_common::ids::RandomIds;
use montage_project_model::LoadedProject;
use montage_timeline_core::{EditOutcome, TimelineStore};

pub mod captions;
pub mod clip;
pub mod export;
pub mod frame;
pub mod import;
pub mod info;
pub mod init;
pub mod subtitles;
pub mod text;
pub mod track;
pub mod zoom;

/// A loaded project plus the store rebuilt from its timeline.
pub struct Session {
    pub project: LoadedProject,
    pub store: TimelineStore,
}

impl Session {
    pub fn open(config: &AppConfig, path: &Path) -> anyhow::Result<Self> {
        let project = LoadedProject::load(path)
            .map_err(|e| anyhow::anyhow!("Failed to load project: {e}"))?;
        let store = TimelineStore::from_document(
            &project.timeline,
            Box::new(RandomIds),
            config.editor.clone(),
        );
        Ok(Self { project, store })
    }

    /// Fail with the rejection reason, or print `done`.
    pub fn expect_applied(&self, outcome: EditOutcome, done: &str) -> anyhow::Result<()> {
        match outcome {
            EditOutcome::Applied => {
                println!("{done}");
                Ok(())
            }
            EditOutcome::Rejected(reason) => Err(anyhow::anyhow!("Edit rejected: {reason}")),
        }
    }

    pub fn save(mut self) -> anyhow::Result<()> {
        self.project.timeline = self.store.to_document();
        self.project.project.touch();
        self.project
            .save()
            .map_err(|e| anyhow::anyhow!("Failed to save project: {e}"))?;
        tracing::debug!(root = %self.project.root.display(), "Project saved");
        Ok(())
    }
}
