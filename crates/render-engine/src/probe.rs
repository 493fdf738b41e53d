//! Media probing via `ffprobe`.

use std::path::Path;
use std::process::Command;

use montage_common::error::{MontageError, MontageResult};
use montage_project_model::{MediaKind, MediaSource};
use serde::Deserialize;

/// What an imported file contains.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaProbe {
    pub kind: MediaKind,
    /// Container duration. `None` for stills.
    pub duration_secs: Option<f64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub has_audio: bool,
}

impl MediaProbe {
    /// Build the media source for a clip that references `source`.
    pub fn to_media_source(
        &self,
        source: impl Into<String>,
        display_name: impl Into<String>,
    ) -> MediaSource {
        MediaSource {
            kind: self.kind,
            source: source.into(),
            display_name: display_name.into(),
            natural_width: self.width,
            natural_height: self.height,
            source_duration: match self.kind {
                MediaKind::Image => None,
                _ => self.duration_secs,
            },
            has_audio: self.has_audio,
        }
    }

    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.width.zip(self.height).filter(|(w, h)| *w > 0 && *h > 0)
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    #[serde(default)]
    disposition: Option<ProbeDisposition>,
}

#[derive(Debug, Deserialize)]
struct ProbeDisposition {
    #[serde(default)]
    attached_pic: u8,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    format_name: Option<String>,
    duration: Option<String>,
}

/// Run `ffprobe` on `path`.
pub fn probe_media(path: &Path) -> MontageResult<MediaProbe> {
    if !path.exists() {
        return Err(MontageError::file_not_found(path));
    }

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .output()
        .map_err(|e| MontageError::render(format!("Failed to run ffprobe: {e}")))?;

    if !output.status.success() {
        return Err(MontageError::render(format!(
            "ffprobe failed for {}: {}",
            path.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    let raw = String::from_utf8_lossy(&output.stdout);
    let probe = parse_probe_json(&raw)?;
    tracing::debug!(
        path = %path.display(),
        kind = ?probe.kind,
        duration = ?probe.duration_secs,
        width = ?probe.width,
        height = ?probe.height,
        "Probed media"
    );
    Ok(probe)
}

/// Interpret `ffprobe -print_format json -show_format -show_streams` output.
pub fn parse_probe_json(raw: &str) -> MontageResult<MediaProbe> {
    let parsed: ProbeOutput = serde_json::from_str(raw)?;

    let video = parsed.streams.iter().find(|s| {
        s.codec_type.as_deref() == Some("video")
            && s.disposition.as_ref().map_or(true, |d| d.attached_pic == 0)
    });
    let has_audio = parsed
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("audio"));

    let format_name = parsed
        .format
        .as_ref()
        .and_then(|f| f.format_name.clone())
        .unwrap_or_default();
    let duration_secs = parsed
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .and_then(|d| d.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0);

    let kind = match video {
        Some(_) if is_still_image_format(&format_name) => MediaKind::Image,
        Some(_) => MediaKind::Video,
        None if has_audio => MediaKind::Audio,
        None => {
            return Err(MontageError::unsupported(
                "File has neither video nor audio streams",
            ))
        }
    };

    Ok(MediaProbe {
        kind,
        duration_secs: if kind == MediaKind::Image {
            None
        } else {
            duration_secs
        },
        width: video.and_then(|s| s.width),
        height: video.and_then(|s| s.height),
        has_audio,
    })
}

fn is_still_image_format(format_name: &str) -> bool {
    format_name
        .split(',')
        .any(|name| name == "image2" || name.ends_with("_pipe"))
}
