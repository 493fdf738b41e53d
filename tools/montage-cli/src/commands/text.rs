//! Add a text overlay clip.

use std::path::PathBuf;

use montage_common::config::AppConfig;
use montage_project_model::{ClipContent, Point2D, TextContent, TextStyle};
use montage_timeline_core::NewClip;

use super::Session;

pub struct TextArgs {
    pub text: String,
    pub start: f64,
    pub duration: f64,
    pub track: Option<String>,
    pub size: Option<f64>,
    pub color: Option<String>,
    pub x: Option<f64>,
    pub y: Option<f64>,
}

pub fn run(config: &AppConfig, path: PathBuf, args: TextArgs) -> anyhow::Result<()> {
    let mut session = Session::open(config, &path)?;

    let defaults = TextStyle::default();
    let style = TextStyle {
        font_size_px: args.size.unwrap_or(defaults.font_size_px),
        color: args.color.unwrap_or(defaults.color),
        font_family: defaults.font_family,
        position: Point2D::new(
            args.x.unwrap_or(defaults.position.x),
            args.y.unwrap_or(defaults.position.y),
        )
        .clamped(),
    };

    let new = NewClip {
        track_id: args.track,
        start: args.start,
        duration: args.duration,
        source_offset: 0.0,
        content: ClipContent::Text(TextContent {
            text: args.text,
            style,
        }),
    };
    let id = session
        .store
        .add_clip(new)
        .ok_or_else(|| anyhow::anyhow!("Text clip rejected"))?;
    println!("Added text clip {id}");

    session.save()
}
