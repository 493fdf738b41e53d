//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory where projects are stored.
    pub projects_dir: PathBuf,

    /// Editing defaults applied by the timeline store.
    pub editor: EditorDefaults,

    /// Speech-to-text settings.
    pub transcription: TranscriptionDefaults,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Defaults for new projects and interactive edits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorDefaults {
    /// Duration of a newly added zoom effect (seconds).
    pub zoom_duration_secs: f64,

    /// Zoom level of a newly added zoom effect.
    pub zoom_level: f64,

    /// Duration given to still images on import (seconds).
    pub image_duration_secs: f64,

    /// Initial timeline scale (pixels per second).
    pub timeline_scale: f64,

    /// Initial timeline panel height (pixels).
    pub timeline_height: f64,

    /// Canvas width used until the first media import sets it.
    pub canvas_width: u32,

    /// Canvas height used until the first media import sets it.
    pub canvas_height: u32,

    /// Project frame rate.
    pub fps: u32,

    /// Background fill behind all layers.
    pub background: String,
}

/// Transcription engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionDefaults {
    /// Directory holding downloaded model files.
    pub models_dir: PathBuf,

    /// Model name (e.g. "tiny.en").
    pub model: String,

    /// whisper.cpp executable to invoke.
    pub binary: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "montage=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            projects_dir: dirs_default_projects(),
            editor: EditorDefaults::default(),
            transcription: TranscriptionDefaults::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for EditorDefaults {
    fn default() -> Self {
        Self {
            zoom_duration_secs: 2.0,
            zoom_level: 1.5,
            image_duration_secs: 5.0,
            timeline_scale: 50.0,
            timeline_height: 300.0,
            canvas_width: 1920,
            canvas_height: 1080,
            fps: 30,
            background: "#000000".to_string(),
        }
    }
}

impl Default for TranscriptionDefaults {
    fn default() -> Self {
        Self {
            models_dir: data_home().join("montage").join("models"),
            model: "tiny.en".to_string(),
            binary: "whisper-cli".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&config_file_path())
    }

    /// Load config from an explicit path, falling back to defaults.
    pub fn load_from(config_path: &std::path::Path) -> Self {
        if config_path.exists() {
            match std::fs::read_to_string(config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Save config to an explicit path.
    pub fn save_to(&self, config_path: &std::path::Path) -> Result<(), std::io::Error> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("montage").join("config.json")
}

fn data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local").join("share")
        })
}

/// Default projects directory.
fn dirs_default_projects() -> PathBuf {
    data_home().join("montage").join("projects")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_editor_defaults() {
        let defaults = EditorDefaults::default();
        assert!((defaults.zoom_duration_secs - 2.0).abs() < 1e-9);
        assert!((defaults.zoom_level - 1.5).abs() < 1e-9);
        assert!((defaults.timeline_scale - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"editor": {"zoom_level": 2.0}}"#).unwrap();
        assert!((config.editor.zoom_level - 2.0).abs() < 1e-9);
        assert!((config.editor.zoom_duration_secs - 2.0).abs() < 1e-9);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = std::env::temp_dir().join(format!("montage-config-{}", std::process::id()));
        let path = dir.join("config.json");
        let mut config = AppConfig::default();
        config.editor.fps = 60;
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path);
        assert_eq!(loaded.editor.fps, 60);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_corrupt_config_falls_back() {
        let dir = std::env::temp_dir().join(format!("montage-bad-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let loaded = AppConfig::load_from(&path);
        assert_eq!(loaded.editor.fps, 30);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
