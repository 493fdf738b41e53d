//! Show project information.

use std::path::PathBuf;

use montage_common::config::AppConfig;

use super::Session;

pub fn run(config: &AppConfig, path: PathBuf) -> anyhow::Result<()> {
    let session = Session::open(config, &path)?;
    let p = &session.project.project;
    let state = session.store.state();
    let captions = session.store.captions();

    println!("Project: {}", p.name);
    println!("  ID: {}", p.id);
    println!("  Created: {}", p.created_at);
    println!("  Modified: {}", p.modified_at);
    println!(
        "  Canvas: {}x{} @ {}fps",
        p.canvas.width, p.canvas.height, p.canvas.fps
    );
    println!("  Duration: {:.2}s", state.total_duration);
    println!();

    println!("Tracks:");
    for track in state.tracks.iter() {
        let mut flags = Vec::new();
        if track.locked {
            flags.push("locked");
        }
        if !track.visible {
            flags.push("hidden");
        }
        if track.is_magnetic() {
            flags.push("magnetic");
        }
        println!(
            "  {} '{}' [{}] {}",
            track.id,
            track.name,
            track.kind,
            flags.join(", ")
        );
        for clip in state.clips_on_track(&track.id) {
            println!(
                "    {} {:>8.2}s - {:>8.2}s  {} ({})",
                clip.id,
                clip.start,
                clip.end(),
                clip.label(),
                clip.kind()
            );
        }
        for effect in state.zoom_effects_on_track(&track.id) {
            println!(
                "    {} {:>8.2}s - {:>8.2}s  zoom {:.2}x at ({:.2}, {:.2}) {:.2}x{:.2}",
                effect.id,
                effect.start,
                effect.end(),
                effect.level,
                effect.rect.x,
                effect.rect.y,
                effect.rect.width,
                effect.rect.height
            );
        }
    }
    println!();

    println!("Captions:");
    println!("  Segments: {}", captions.captions().len());
    println!("  Enabled: {}", captions.is_enabled());
    println!("  Position: {:?}", captions.position());
    if let Some(invalidated) = captions.last_invalidated() {
        println!(
            "  Last invalidated: {} ({})",
            invalidated.reason,
            invalidated.at.to_rfc3339()
        );
    }
    println!();

    println!("Export config:");
    println!("  Format: {:?}", p.export.format);
    println!("  Video bitrate: {} kbps", p.export.video_bitrate_kbps);
    println!("  Audio bitrate: {} kbps", p.export.audio_bitrate_kbps);
    println!("  Burn captions: {}", p.export.burn_captions);

    let missing = session.project.validate_sources();
    if !missing.is_empty() {
        println!();
        println!("Problems:");
        for problem in missing {
            println!("  - {problem}");
        }
    }

    Ok(())
}
