//! Probe a media file and append it to the timeline.

use std::path::{Path, PathBuf};

use montage_common::config::AppConfig;
use montage_project_model::{ClipContent, MediaKind};
use montage_render_engine::probe_media;
use montage_timeline_core::NewClip;

use super::Session;

pub fn run(
    config: &AppConfig,
    path: PathBuf,
    file: PathBuf,
    track: Option<String>,
    link: bool,
) -> anyhow::Result<()> {
    let mut session = Session::open(config, &path)?;

    let probe = probe_media(&file)?;
    let display_name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.display().to_string());

    let duration = match probe.kind {
        MediaKind::Image => session.store.defaults().image_duration_secs,
        _ => probe
            .duration_secs
            .ok_or_else(|| anyhow::anyhow!("Could not determine duration of {}", file.display()))?,
    };

    let source = if link {
        std::fs::canonicalize(&file)?.display().to_string()
    } else {
        copy_into_sources(&session.project.root, &file, &display_name)?
    };

    let new = NewClip {
        track_id: track,
        start: 0.0,
        duration,
        source_offset: 0.0,
        content: ClipContent::Media(probe.to_media_source(source, display_name.clone())),
    };
    let id = session
        .store
        .add_clip(new)
        .ok_or_else(|| anyhow::anyhow!("No unlocked track accepts {display_name}"))?;

    if probe.kind != MediaKind::Audio {
        if let Some((width, height)) = probe.dimensions() {
            if session
                .project
                .project
                .canvas
                .adopt_media_resolution(width, height)
            {
                println!("Canvas resolution set to {width}x{height}");
            }
        }
    }

    let clip = session
        .store
        .state()
        .clip(&id)
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("Imported clip {id} vanished"))?;
    println!(
        "Imported {} as {} ({:?}, {:.2}s at {:.2}s on {})",
        display_name, id, probe.kind, clip.duration, clip.start, clip.track_id
    );
    if probe.kind != MediaKind::Image && session.store.captions().last_invalidated().is_some() {
        println!("Captions were cleared; run `montage captions generate` to rebuild them");
    }

    session.save()
}

/// Copy `file` into `<root>/sources/`, returning the project-relative handle.
fn copy_into_sources(root: &Path, file: &Path, name: &str) -> anyhow::Result<String> {
    let sources = root.join("sources");
    std::fs::create_dir_all(&sources)?;

    let mut target = sources.join(name);
    let mut counter = 1;
    while target.exists() {
        let stem = Path::new(name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| name.to_string());
        let ext = Path::new(name)
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        target = sources.join(format!("{stem}-{counter}{ext}"));
        counter += 1;
    }

    std::fs::copy(file, &target)?;
    let handle = Path::new("sources").join(
        target
            .file_name()
            .ok_or_else(|| anyhow::anyhow!("Invalid source name {name}"))?,
    );
    Ok(handle.display().to_string())
}
