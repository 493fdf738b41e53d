//! Captions generated from transcription.

use serde::{Deserialize, Serialize};

/// One caption segment, in timeline seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Caption {
    pub id: String,
    pub start: f64,
    pub end: f64,
    pub text: String,
    /// Clip whose audio produced this caption.
    #[serde(default)]
    pub source_clip_id: Option<String>,
}

impl Caption {
    /// Whether `t` falls in `[start, end]`.
    pub fn contains(&self, t: f64) -> bool {
        t >= self.start && t <= self.end
    }

    pub fn duration(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }
}

/// Record of the last time captions were discarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionInvalidation {
    /// Human-readable cause, e.g. "Clip deleted".
    pub reason: String,
    pub at: chrono::DateTime<chrono::Utc>,
}

/// Vertical placement of the caption overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CaptionPosition {
    Top,
    #[default]
    Bottom,
}

impl CaptionPosition {
    /// Vertical anchor of the caption box as a fraction of frame height.
    pub fn anchor_y(self) -> f64 {
        match self {
            CaptionPosition::Top => 0.1,
            CaptionPosition::Bottom => 0.9,
        }
    }
}

/// Caption overlay styling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionConfig {
    pub font_size_px: f64,
    pub font_family: String,
    pub color: String,
    pub background_color: String,
    pub border_radius_px: f64,
    pub padding_px: f64,
    /// Maximum box width as a fraction of the frame width.
    pub max_width: f64,
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            font_size_px: 48.0,
            font_family: "Inter, sans-serif".to_string(),
            color: "#ffffff".to_string(),
            background_color: "rgba(0, 0, 0, 0.7)".to_string(),
            border_radius_px: 12.0,
            padding_px: 20.0,
            max_width: 0.9,
        }
    }
}

/// Partial update for the caption styling.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionConfigPatch {
    pub font_size_px: Option<f64>,
    pub font_family: Option<String>,
    pub color: Option<String>,
    pub background_color: Option<String>,
    pub border_radius_px: Option<f64>,
    pub padding_px: Option<f64>,
    pub max_width: Option<f64>,
}

impl CaptionConfigPatch {
    pub fn apply(&self, config: &CaptionConfig) -> CaptionConfig {
        CaptionConfig {
            font_size_px: self.font_size_px.unwrap_or(config.font_size_px),
            font_family: self
                .font_family
                .clone()
                .unwrap_or_else(|| config.font_family.clone()),
            color: self.color.clone().unwrap_or_else(|| config.color.clone()),
            background_color: self
                .background_color
                .clone()
                .unwrap_or_else(|| config.background_color.clone()),
            border_radius_px: self.border_radius_px.unwrap_or(config.border_radius_px),
            padding_px: self.padding_px.unwrap_or(config.padding_px),
            max_width: self
                .max_width
                .map(|w| w.clamp(0.1, 1.0))
                .unwrap_or(config.max_width),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caption_bounds_inclusive() {
        let caption = Caption {
            id: "c".to_string(),
            start: 1.0,
            end: 2.0,
            text: "hi".to_string(),
            source_clip_id: None,
        };
        assert!(caption.contains(1.0));
        assert!(caption.contains(2.0));
        assert!(!caption.contains(2.01));
    }

    #[test]
    fn test_config_defaults() {
        let config = CaptionConfig::default();
        assert!((config.font_size_px - 48.0).abs() < 1e-9);
        assert!((config.max_width - 0.9).abs() < 1e-9);
        assert_eq!(CaptionPosition::default(), CaptionPosition::Bottom);
    }

    #[test]
    fn test_config_patch() {
        let patch = CaptionConfigPatch {
            color: Some("#ffff00".to_string()),
            max_width: Some(3.0),
            ..Default::default()
        };
        let config = patch.apply(&CaptionConfig::default());
        assert_eq!(config.color, "#ffff00");
        assert!((config.max_width - 1.0).abs() < 1e-9);
        assert!((config.padding_px - 20.0).abs() < 1e-9);
    }
}
