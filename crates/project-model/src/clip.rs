//! Clips: media or text placed on a track.
//!
//! A clip is a closed sum over its content. Every consumer matches on
//! [`ClipContent`] rather than probing for optional fields.

use serde::{Deserialize, Serialize};

use crate::rect::Point2D;

/// Kind of a clip, derived from its content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClipKind {
    Video,
    Audio,
    Image,
    Text,
}

impl ClipKind {
    /// Clips whose timing feeds transcription. Edits to these
    /// invalidate generated captions.
    pub fn is_timing_sensitive(self) -> bool {
        matches!(self, ClipKind::Video | ClipKind::Audio)
    }

    /// Video, audio and image clips; everything except text.
    pub fn is_media(self) -> bool {
        !matches!(self, ClipKind::Text)
    }

    /// Whether this clip draws pixels.
    pub fn is_visual(self) -> bool {
        !matches!(self, ClipKind::Audio)
    }
}

impl std::fmt::Display for ClipKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ClipKind::Video => "video",
            ClipKind::Audio => "audio",
            ClipKind::Image => "image",
            ClipKind::Text => "text",
        };
        f.write_str(name)
    }
}

/// Media clip kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Video,
    Audio,
    Image,
}

/// A decodable asset referenced by a media clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaSource {
    pub kind: MediaKind,

    /// Opaque handle to the asset (a file path for the ffmpeg backend).
    pub source: String,

    pub display_name: String,

    #[serde(default)]
    pub natural_width: Option<u32>,
    #[serde(default)]
    pub natural_height: Option<u32>,

    /// Length of the underlying file, when probed. Stills have none.
    #[serde(default)]
    pub source_duration: Option<f64>,

    /// Whether the asset carries an audio stream.
    #[serde(default)]
    pub has_audio: bool,
}

/// Text overlay styling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    pub font_size_px: f64,
    pub color: String,
    pub font_family: String,
    /// Anchor of the text center, normalized to the frame.
    pub position: Point2D,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_size_px: 48.0,
            color: "#ffffff".to_string(),
            font_family: "Inter, sans-serif".to_string(),
            position: Point2D::new(0.5, 0.5),
        }
    }
}

/// A text overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextContent {
    pub text: String,
    #[serde(default)]
    pub style: TextStyle,
}

/// What a clip shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClipContent {
    Media(MediaSource),
    Text(TextContent),
}

impl ClipContent {
    pub fn kind(&self) -> ClipKind {
        match self {
            ClipContent::Media(media) => match media.kind {
                MediaKind::Video => ClipKind::Video,
                MediaKind::Audio => ClipKind::Audio,
                MediaKind::Image => ClipKind::Image,
            },
            ClipContent::Text(_) => ClipKind::Text,
        }
    }
}

/// A clip placed on a track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    pub id: String,
    pub track_id: String,
    /// Timeline position (seconds, >= 0).
    pub start: f64,
    /// Length on the timeline (seconds, > 0).
    pub duration: f64,
    /// Position inside the source file where this clip begins (seconds, >= 0).
    #[serde(default)]
    pub source_offset: f64,
    pub content: ClipContent,
}

impl Clip {
    pub fn kind(&self) -> ClipKind {
        self.content.kind()
    }

    /// Timeline time at which this clip ends (exclusive).
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }

    /// Whether `t` falls in `[start, end)`.
    pub fn contains(&self, t: f64) -> bool {
        t >= self.start && t < self.end()
    }

    /// Map timeline time to source time.
    pub fn source_time_at(&self, t: f64) -> f64 {
        self.source_offset + (t - self.start)
    }

    pub fn media(&self) -> Option<&MediaSource> {
        match &self.content {
            ClipContent::Media(media) => Some(media),
            ClipContent::Text(_) => None,
        }
    }

    pub fn text(&self) -> Option<&TextContent> {
        match &self.content {
            ClipContent::Text(text) => Some(text),
            ClipContent::Media(_) => None,
        }
    }

    /// Whether this clip contributes audio to the mix.
    pub fn has_audio(&self) -> bool {
        match &self.content {
            ClipContent::Media(media) => match media.kind {
                MediaKind::Audio => true,
                MediaKind::Video => media.has_audio,
                MediaKind::Image => false,
            },
            ClipContent::Text(_) => false,
        }
    }

    /// Longest duration this clip may have given its source offset.
    pub fn max_duration(&self) -> Option<f64> {
        self.media()
            .and_then(|m| m.source_duration)
            .map(|total| (total - self.source_offset).max(0.0))
    }

    /// Human-readable label.
    pub fn label(&self) -> &str {
        match &self.content {
            ClipContent::Media(media) => &media.display_name,
            ClipContent::Text(text) => &text.text,
        }
    }
}

/// Partial update for a clip. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipPatch {
    pub start: Option<f64>,
    pub duration: Option<f64>,
    pub source_offset: Option<f64>,
    pub display_name: Option<String>,
    pub text: Option<String>,
    pub style: Option<TextStyle>,
}

impl ClipPatch {
    /// Whether this patch moves or resizes the clip.
    pub fn touches_timing(&self) -> bool {
        self.start.is_some() || self.duration.is_some() || self.source_offset.is_some()
    }

    /// Apply the patch, returning the updated clip.
    ///
    /// Fields that do not apply to the clip's content (a display name on a
    /// text clip, text on a media clip) are ignored.
    pub fn apply(&self, clip: &Clip) -> Clip {
        let mut updated = clip.clone();
        if let Some(start) = self.start {
            updated.start = start.max(0.0);
        }
        if let Some(duration) = self.duration {
            updated.duration = duration.max(crate::MIN_DURATION_SECS);
        }
        if let Some(offset) = self.source_offset {
            updated.source_offset = offset.max(0.0);
        }
        match &mut updated.content {
            ClipContent::Media(media) => {
                if let Some(name) = &self.display_name {
                    media.display_name = name.clone();
                }
            }
            ClipContent::Text(text) => {
                if let Some(value) = &self.text {
                    text.text = value.clone();
                }
                if let Some(style) = &self.style {
                    text.style = TextStyle {
                        position: style.position.clamped(),
                        ..style.clone()
                    };
                }
            }
        }
        updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video_clip() -> Clip {
        Clip {
            id: "c1".to_string(),
            track_id: "t1".to_string(),
            start: 2.0,
            duration: 3.0,
            source_offset: 1.0,
            content: ClipContent::Media(MediaSource {
                kind: MediaKind::Video,
                source: "/media/a.mp4".to_string(),
                display_name: "a.mp4".to_string(),
                natural_width: Some(1920),
                natural_height: Some(1080),
                source_duration: Some(10.0),
                has_audio: true,
            }),
        }
    }

    #[test]
    fn test_clip_span() {
        let clip = video_clip();
        assert!((clip.end() - 5.0).abs() < 1e-9);
        assert!(clip.contains(2.0));
        assert!(clip.contains(4.999));
        assert!(!clip.contains(5.0));
        assert!(!clip.contains(1.999));
    }

    #[test]
    fn test_source_time_mapping() {
        let clip = video_clip();
        assert!((clip.source_time_at(3.5) - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_kind_and_audio() {
        let clip = video_clip();
        assert_eq!(clip.kind(), ClipKind::Video);
        assert!(clip.has_audio());
        assert!(clip.kind().is_timing_sensitive());
        assert!(!ClipKind::Image.is_timing_sensitive());
        assert!(!ClipKind::Text.is_timing_sensitive());
    }

    #[test]
    fn test_max_duration() {
        let clip = video_clip();
        assert!((clip.max_duration().unwrap() - 9.0).abs() < 1e-9);
    }

    #[test]
    fn test_patch_ignores_mismatched_fields() {
        let clip = video_clip();
        let patch = ClipPatch {
            text: Some("ignored".to_string()),
            display_name: Some("renamed.mp4".to_string()),
            ..Default::default()
        };
        assert!(!patch.touches_timing());
        let updated = patch.apply(&clip);
        assert_eq!(updated.label(), "renamed.mp4");
        assert!((updated.start - clip.start).abs() < 1e-9);
    }

    #[test]
    fn test_patch_floors_duration() {
        let clip = video_clip();
        let patch = ClipPatch {
            duration: Some(0.0),
            ..Default::default()
        };
        assert!(patch.touches_timing());
        assert!((patch.apply(&clip).duration - crate::MIN_DURATION_SECS).abs() < 1e-9);
    }

    #[test]
    fn test_content_is_tagged() {
        let clip = Clip {
            id: "t".to_string(),
            track_id: "text".to_string(),
            start: 0.0,
            duration: 2.0,
            source_offset: 0.0,
            content: ClipContent::Text(TextContent {
                text: "Hello".to_string(),
                style: TextStyle::default(),
            }),
        };
        let value = serde_json::to_value(&clip).unwrap();
        assert_eq!(value["content"]["type"], "text");
        assert_eq!(value["content"]["text"], "Hello");

        let parsed: Clip = serde_json::from_value(value).unwrap();
        assert_eq!(parsed.kind(), ClipKind::Text);
    }
}
