//! Initialize a new Montage project.

use std::path::PathBuf;

use montage_common::config::AppConfig;
use montage_common::ids::RandomIds;
use montage_project_model::{CanvasSettings, LoadedProject};
use montage_timeline_core::TimelineStore;

pub fn run(
    config: &AppConfig,
    name: String,
    output: Option<PathBuf>,
    width: Option<u32>,
    height: Option<u32>,
    fps: Option<u32>,
) -> anyhow::Result<()> {
    let defaults = &config.editor;
    let project_dir = output
        .unwrap_or_else(|| config.projects_dir.clone())
        .join(&name);
    println!("Creating project '{}' at {}", name, project_dir.display());

    let mut canvas = CanvasSettings::new(
        width.unwrap_or(defaults.canvas_width),
        height.unwrap_or(defaults.canvas_height),
        fps.unwrap_or(defaults.fps).max(1),
    );
    canvas.background = defaults.background.clone();
    // An explicit size is final; otherwise the first import decides.
    canvas.resolution_locked = width.is_some() && height.is_some();

    let store = TimelineStore::new(Box::new(RandomIds), defaults.clone());
    let project = LoadedProject::create(&project_dir, &name, canvas.clone(), store.to_document())
        .map_err(|e| anyhow::anyhow!("Failed to create project: {e}"))?;

    println!("Project created successfully:");
    println!("  Directory: {}", project.root.display());
    println!(
        "  Canvas: {}x{} @ {}fps{}",
        canvas.width,
        canvas.height,
        canvas.fps,
        if canvas.resolution_locked {
            ""
        } else {
            " (adopts first imported media)"
        }
    );
    println!();
    println!("Directory structure:");
    println!("  {}/", name);
    println!("  ├── sources/     (imported media files)");
    println!("  ├── meta/        (project.json, timeline.json)");
    println!("  ├── cache/       (scratch files)");
    println!("  └── exports/     (rendered output)");

    Ok(())
}
