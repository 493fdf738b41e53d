//! Immutable timeline snapshots.

use std::sync::Arc;

use montage_project_model::{Clip, Track, ZoomEffect};

/// Timeline zoom bounds (pixels per second).
pub const MIN_TIMELINE_SCALE: f64 = 10.0;
pub const MAX_TIMELINE_SCALE: f64 = 200.0;

/// Timeline panel height bounds (pixels).
pub const MIN_TIMELINE_HEIGHT: f64 = 150.0;
pub const MAX_TIMELINE_HEIGHT: f64 = 600.0;

/// The currently selected item, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    None,
    Clip(String),
    ZoomEffect(String),
}

impl Selection {
    pub fn clip_id(&self) -> Option<&str> {
        match self {
            Selection::Clip(id) => Some(id),
            _ => None,
        }
    }

    pub fn zoom_effect_id(&self) -> Option<&str> {
        match self {
            Selection::ZoomEffect(id) => Some(id),
            _ => None,
        }
    }
}

/// Timeline panel view parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewSettings {
    /// Pixels per second.
    pub scale: f64,
    /// Panel height in pixels.
    pub height: f64,
}

impl ViewSettings {
    /// Seconds visible in a panel `viewport_px` wide scrolled to `scroll_px`.
    pub fn visible_window(&self, scroll_px: f64, viewport_px: f64) -> (f64, f64) {
        montage_common::units::visible_window(scroll_px, viewport_px, self.scale)
    }
}

/// A snapshot of the editable timeline.
///
/// Collections are shared behind `Arc` and never mutated in place; the
/// store swaps in a new collection on every edit. Cloning a snapshot is
/// cheap.
#[derive(Debug, Clone)]
pub struct TimelineState {
    pub tracks: Arc<Vec<Track>>,
    pub clips: Arc<Vec<Clip>>,
    pub zoom_effects: Arc<Vec<ZoomEffect>>,
    pub current_time: f64,
    /// Cache of `compute_total_duration(&clips)`, refreshed after every edit.
    pub total_duration: f64,
    pub is_playing: bool,
    pub selection: Selection,
    pub view: ViewSettings,
}

impl TimelineState {
    pub fn track(&self, id: &str) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == id)
    }

    pub fn clip(&self, id: &str) -> Option<&Clip> {
        self.clips.iter().find(|c| c.id == id)
    }

    pub fn zoom_effect(&self, id: &str) -> Option<&ZoomEffect> {
        self.zoom_effects.iter().find(|z| z.id == id)
    }

    /// Clips on a track in ascending start order.
    pub fn clips_on_track(&self, track_id: &str) -> Vec<&Clip> {
        let mut clips: Vec<&Clip> = self
            .clips
            .iter()
            .filter(|c| c.track_id == track_id)
            .collect();
        clips.sort_by(|a, b| a.start.total_cmp(&b.start));
        clips
    }

    /// Zoom effects on a track in ascending start order.
    pub fn zoom_effects_on_track(&self, track_id: &str) -> Vec<&ZoomEffect> {
        let mut effects: Vec<&ZoomEffect> = self
            .zoom_effects
            .iter()
            .filter(|z| z.track_id == track_id)
            .collect();
        effects.sort_by(|a, b| a.start.total_cmp(&b.start));
        effects
    }

    pub fn selected_clip(&self) -> Option<&Clip> {
        self.selection.clip_id().and_then(|id| self.clip(id))
    }

    pub fn selected_zoom_effect(&self) -> Option<&ZoomEffect> {
        self.selection
            .zoom_effect_id()
            .and_then(|id| self.zoom_effect(id))
    }
}

/// Timeline length: the latest clip end, or 0 with no clips.
pub fn compute_total_duration(clips: &[Clip]) -> f64 {
    clips.iter().map(Clip::end).fold(0.0, f64::max)
}
