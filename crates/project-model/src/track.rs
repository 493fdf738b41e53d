//! Timeline tracks.

use serde::{Deserialize, Serialize};

use crate::clip::ClipKind;

/// What a track holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackKind {
    Video,
    Audio,
    Image,
    Text,
    Zoom,
}

impl TrackKind {
    /// Magnetic tracks keep their clips gapless and start-ordered.
    pub fn is_magnetic(self) -> bool {
        matches!(self, TrackKind::Video | TrackKind::Audio | TrackKind::Image)
    }

    /// Whether this track owns clips (every kind except zoom).
    pub fn holds_clips(self) -> bool {
        self != TrackKind::Zoom
    }

    /// Track kind a clip of `kind` is routed to by default.
    pub fn for_clip(kind: ClipKind) -> Self {
        match kind {
            ClipKind::Video => TrackKind::Video,
            ClipKind::Audio => TrackKind::Audio,
            ClipKind::Image => TrackKind::Image,
            ClipKind::Text => TrackKind::Text,
        }
    }

    /// Default lane height in the timeline panel (pixels).
    pub fn default_height(self) -> f64 {
        match self {
            TrackKind::Video | TrackKind::Image => 60.0,
            TrackKind::Audio => 48.0,
            TrackKind::Text | TrackKind::Zoom => 40.0,
        }
    }
}

impl std::fmt::Display for TrackKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TrackKind::Video => "video",
            TrackKind::Audio => "audio",
            TrackKind::Image => "image",
            TrackKind::Text => "text",
            TrackKind::Zoom => "zoom",
        };
        f.write_str(name)
    }
}

/// A timeline lane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub name: String,
    pub kind: TrackKind,
    #[serde(default)]
    pub locked: bool,
    #[serde(default = "default_visible")]
    pub visible: bool,
    pub height: f64,
}

fn default_visible() -> bool {
    true
}

impl Track {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: TrackKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            locked: false,
            visible: true,
            height: kind.default_height(),
        }
    }

    pub fn is_magnetic(&self) -> bool {
        self.kind.is_magnetic()
    }
}

/// Partial update for a track. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackPatch {
    pub name: Option<String>,
    pub locked: Option<bool>,
    pub visible: Option<bool>,
    pub height: Option<f64>,
}

impl TrackPatch {
    /// Apply the patch, returning the updated track.
    pub fn apply(&self, track: &Track) -> Track {
        let mut updated = track.clone();
        if let Some(name) = &self.name {
            updated.name = name.clone();
        }
        if let Some(locked) = self.locked {
            updated.locked = locked;
        }
        if let Some(visible) = self.visible {
            updated.visible = visible;
        }
        if let Some(height) = self.height {
            updated.height = height.max(0.0);
        }
        updated
    }
}
