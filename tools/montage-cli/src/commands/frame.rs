//! Print the composition of one instant.

use std::path::PathBuf;

use montage_common::config::AppConfig;
use montage_render_engine::{render_instructions_at, LayerInstruction};
use serde_json::json;

use super::Session;

pub fn run(config: &AppConfig, path: PathBuf, time: f64) -> anyhow::Result<()> {
    let session = Session::open(config, &path)?;
    let canvas = &session.project.project.canvas;
    let frame = render_instructions_at(
        session.store.state(),
        session.store.captions().state(),
        canvas,
        time,
    );

    let layers: Vec<serde_json::Value> = frame
        .layers
        .iter()
        .map(|layer| match layer {
            LayerInstruction::Media {
                clip_id,
                track_id,
                kind,
                source,
                source_time,
                placement,
            } => json!({
                "type": "media",
                "clip_id": clip_id,
                "track_id": track_id,
                "kind": kind,
                "source": source,
                "source_time": source_time,
                "placement": placement.map(|p| [p.x, p.y, p.width, p.height]),
            }),
            LayerInstruction::Text {
                clip_id,
                track_id,
                text,
                anchor,
                ..
            } => json!({
                "type": "text",
                "clip_id": clip_id,
                "track_id": track_id,
                "text": text,
                "anchor": [anchor.x, anchor.y],
            }),
        })
        .collect();

    let m = frame.transform.matrix2;
    let t = frame.transform.translation;
    let report = json!({
        "time": frame.time_secs,
        "frame": frame.frame_index,
        "layers": layers,
        "zoom_rect": frame.zoom_rect,
        "transform": [m.x_axis.x, m.x_axis.y, m.y_axis.x, m.y_axis.y, t.x, t.y],
        "caption": {
            "text": frame.caption.text,
            "opacity": frame.caption.opacity,
            "anchor_y": frame.caption.anchor_y,
        },
    });

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
