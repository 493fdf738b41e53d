//! Project metadata, persistence, and configuration types.
//!
//! A project is the top-level container that ties together the canvas,
//! the edited timeline, captions, and export configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::caption::{Caption, CaptionConfig, CaptionInvalidation, CaptionPosition};
use crate::clip::{Clip, ClipContent};
use crate::track::Track;
use crate::zoom::ZoomEffect;

/// Current on-disk schema version.
pub const SCHEMA_VERSION: &str = "1.0";

/// Top-level project file (`meta/project.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Schema version.
    pub version: String,

    /// Human-readable project name.
    pub name: String,

    /// Unique project identifier (UUID).
    pub id: String,

    /// Creation timestamp (ISO 8601).
    pub created_at: String,

    /// Last modified timestamp (ISO 8601).
    pub modified_at: String,

    /// Output frame geometry.
    pub canvas: CanvasSettings,

    /// Export configuration.
    pub export: ExportConfig,
}

/// Output frame geometry shared by preview and export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasSettings {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    /// Fill color behind all layers.
    pub background: String,
    /// Whether the resolution came from imported media. The first media
    /// import adopts its dimensions while this is false.
    #[serde(default)]
    pub resolution_locked: bool,
}

impl CanvasSettings {
    pub fn new(width: u32, height: u32, fps: u32) -> Self {
        Self {
            width,
            height,
            fps,
            background: "#000000".to_string(),
            resolution_locked: false,
        }
    }

    /// Adopt the dimensions of the first imported visual media.
    /// Returns true if the canvas changed.
    pub fn adopt_media_resolution(&mut self, width: u32, height: u32) -> bool {
        if self.resolution_locked || width == 0 || height == 0 {
            return false;
        }
        self.width = width;
        self.height = height;
        self.resolution_locked = true;
        true
    }
}

/// Export configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Output format.
    pub format: ExportFormat,

    /// Video bitrate in kbps (0 = auto).
    pub video_bitrate_kbps: u32,

    /// Audio bitrate in kbps.
    pub audio_bitrate_kbps: u32,

    /// Whether to burn enabled captions into the video.
    #[serde(default = "default_burn_captions")]
    pub burn_captions: bool,
}

fn default_burn_captions() -> bool {
    true
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            format: ExportFormat::Mp4H264,
            video_bitrate_kbps: 8000,
            audio_bitrate_kbps: 192,
            burn_captions: true,
        }
    }
}

/// Output video format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[serde(rename = "mp4-h264")]
    Mp4H264,
    #[serde(rename = "mp4-h265")]
    Mp4H265,
    Gif,
    Webm,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Mp4H264 | ExportFormat::Mp4H265 => "mp4",
            ExportFormat::Gif => "gif",
            ExportFormat::Webm => "webm",
        }
    }

    pub fn supports_audio(self) -> bool {
        !matches!(self, ExportFormat::Gif)
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mp4" | "mp4-h264" | "h264" => Ok(ExportFormat::Mp4H264),
            "mp4-h265" | "h265" | "hevc" => Ok(ExportFormat::Mp4H265),
            "gif" => Ok(ExportFormat::Gif),
            "webm" => Ok(ExportFormat::Webm),
            other => Err(format!("unknown export format: {other}")),
        }
    }
}

/// Caption state as persisted alongside the timeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionDocument {
    pub captions: Vec<Caption>,
    pub enabled: bool,
    pub position: CaptionPosition,
    pub config: CaptionConfig,
    pub last_invalidated: Option<CaptionInvalidation>,
}

/// Editable timeline contents (`meta/timeline.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineDocument {
    /// Schema version.
    pub version: String,
    #[serde(default)]
    pub tracks: Vec<Track>,
    #[serde(default)]
    pub clips: Vec<Clip>,
    #[serde(default)]
    pub zoom_effects: Vec<ZoomEffect>,
    #[serde(default)]
    pub captions: CaptionDocument,
}

impl TimelineDocument {
    /// An empty timeline with no tracks.
    pub fn new() -> Self {
        Self {
            version: SCHEMA_VERSION.to_string(),
            tracks: vec![],
            clips: vec![],
            zoom_effects: vec![],
            captions: CaptionDocument::default(),
        }
    }
}

impl Default for TimelineDocument {
    fn default() -> Self {
        Self::new()
    }
}

/// The complete in-memory representation of a loaded project.
#[derive(Debug, Clone)]
pub struct LoadedProject {
    /// Filesystem path to the project directory.
    pub root: PathBuf,

    /// Project metadata.
    pub project: Project,

    /// Editing timeline.
    pub timeline: TimelineDocument,
}

impl Project {
    /// Create a new project with defaults.
    pub fn new(name: impl Into<String>, canvas: CanvasSettings) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            version: SCHEMA_VERSION.to_string(),
            name: name.into(),
            id: uuid::Uuid::new_v4().to_string(),
            created_at: now.clone(),
            modified_at: now,
            canvas,
            export: ExportConfig::default(),
        }
    }

    /// Stamp the modification time.
    pub fn touch(&mut self) {
        self.modified_at = chrono::Utc::now().to_rfc3339();
    }
}

impl LoadedProject {
    /// Load a project from a directory.
    pub fn load(root: impl AsRef<Path>) -> Result<Self, ProjectError> {
        let root = root.as_ref().to_path_buf();

        let project_path = root.join("meta").join("project.json");
        let timeline_path = root.join("meta").join("timeline.json");

        let project: Project = read_json(&project_path)?;

        let timeline = if timeline_path.exists() {
            read_json(&timeline_path)?
        } else {
            TimelineDocument::new()
        };

        Ok(Self {
            root,
            project,
            timeline,
        })
    }

    /// Save project and timeline to disk.
    pub fn save(&self) -> Result<(), ProjectError> {
        let meta_dir = self.root.join("meta");
        std::fs::create_dir_all(&meta_dir).map_err(|e| ProjectError::IoError {
            path: meta_dir.clone(),
            source: e,
        })?;

        write_json(&meta_dir.join("project.json"), &self.project)?;
        write_json(&meta_dir.join("timeline.json"), &self.timeline)?;
        Ok(())
    }

    /// Create a new project on disk with the standard directory structure.
    pub fn create(
        root: impl AsRef<Path>,
        name: impl Into<String>,
        canvas: CanvasSettings,
        timeline: TimelineDocument,
    ) -> Result<Self, ProjectError> {
        let root = root.as_ref().to_path_buf();

        for subdir in &["sources", "meta", "cache", "exports"] {
            std::fs::create_dir_all(root.join(subdir)).map_err(|e| ProjectError::IoError {
                path: root.join(subdir),
                source: e,
            })?;
        }

        let loaded = Self {
            root,
            project: Project::new(name, canvas),
            timeline,
        };
        loaded.save()?;
        Ok(loaded)
    }

    /// Resolve a media source handle against the project root.
    pub fn resolve_source(&self, source: &str) -> PathBuf {
        let path = Path::new(source);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Validate that all referenced source files exist and every clip
    /// points at a known track.
    pub fn validate_sources(&self) -> Vec<String> {
        let mut errors = vec![];

        for clip in &self.timeline.clips {
            if !self.timeline.tracks.iter().any(|t| t.id == clip.track_id) {
                errors.push(format!(
                    "Clip {} references missing track {}",
                    clip.id, clip.track_id
                ));
            }
            if let ClipContent::Media(media) = &clip.content {
                if !self.resolve_source(&media.source).exists() {
                    errors.push(format!(
                        "{} source missing: {}",
                        media.display_name, media.source
                    ));
                }
            }
        }

        for effect in &self.timeline.zoom_effects {
            if !self.timeline.tracks.iter().any(|t| t.id == effect.track_id) {
                errors.push(format!(
                    "Zoom effect {} references missing track {}",
                    effect.id, effect.track_id
                ));
            }
        }

        errors
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ProjectError> {
    let json = std::fs::read_to_string(path).map_err(|e| ProjectError::IoError {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&json).map_err(|e| ProjectError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ProjectError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| ProjectError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;
    std::fs::write(path, json).map_err(|e| ProjectError::IoError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Errors that can occur when working with projects.
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid project: {message}")]
    ValidationError { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::{MediaKind, MediaSource};
    use crate::track::TrackKind;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("{name}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_project_creation() {
        let project = Project::new("Test Edit", CanvasSettings::new(1920, 1080, 30));
        assert_eq!(project.name, "Test Edit");
        assert_eq!(project.canvas.width, 1920);
        assert_eq!(project.export.format, ExportFormat::Mp4H264);
        assert!(uuid::Uuid::parse_str(&project.id).is_ok());
    }

    #[test]
    fn test_first_media_sets_resolution() {
        let mut canvas = CanvasSettings::new(1920, 1080, 30);
        assert!(canvas.adopt_media_resolution(1280, 720));
        assert!(!canvas.adopt_media_resolution(3840, 2160));
        assert_eq!((canvas.width, canvas.height), (1280, 720));
    }

    #[test]
    fn test_export_format_names() {
        assert_eq!(
            serde_json::to_string(&ExportFormat::Mp4H264).unwrap(),
            "\"mp4-h264\""
        );
        assert_eq!("webm".parse::<ExportFormat>().unwrap(), ExportFormat::Webm);
        assert!("avi".parse::<ExportFormat>().is_err());
        assert!(!ExportFormat::Gif.supports_audio());
    }

    #[test]
    fn test_loaded_project_create_and_load() {
        let dir = temp_dir("montage_test_project");

        let mut timeline = TimelineDocument::new();
        timeline
            .tracks
            .push(Track::new("track-1", "Media", TrackKind::Video));

        let created = LoadedProject::create(
            &dir,
            "Integration Test",
            CanvasSettings::new(1280, 720, 30),
            timeline,
        )
        .unwrap();
        assert_eq!(created.project.name, "Integration Test");
        assert!(dir.join("exports").is_dir());

        let loaded = LoadedProject::load(&dir).unwrap();
        assert_eq!(loaded.project.name, "Integration Test");
        assert_eq!(loaded.timeline.version, SCHEMA_VERSION);
        assert_eq!(loaded.timeline.tracks.len(), 1);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_missing_project_fails() {
        let dir = temp_dir("montage_test_missing");
        let err = LoadedProject::load(&dir).unwrap_err();
        assert!(matches!(err, ProjectError::IoError { .. }));
    }

    #[test]
    fn test_validate_sources_reports_missing() {
        let dir = temp_dir("montage_test_validate");

        let mut loaded = LoadedProject::create(
            &dir,
            "Validate Test",
            CanvasSettings::new(1920, 1080, 30),
            TimelineDocument::new(),
        )
        .unwrap();
        loaded.timeline.clips.push(Clip {
            id: "clip-1".to_string(),
            track_id: "gone".to_string(),
            start: 0.0,
            duration: 5.0,
            source_offset: 0.0,
            content: ClipContent::Media(MediaSource {
                kind: MediaKind::Video,
                source: "sources/screen.mp4".to_string(),
                display_name: "screen.mp4".to_string(),
                natural_width: None,
                natural_height: None,
                source_duration: None,
                has_audio: false,
            }),
        });

        let errors = loaded.validate_sources();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| e.contains("screen.mp4 source missing")));
        assert!(errors.iter().any(|e| e.contains("missing track gone")));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_timeline_document_defaults_for_sparse_files() {
        let parsed: TimelineDocument = serde_json::from_str(r#"{"version":"1.0"}"#).unwrap();
        assert!(parsed.clips.is_empty());
        assert!(!parsed.captions.enabled);
        assert_eq!(parsed.captions.position, CaptionPosition::Bottom);
    }
}
