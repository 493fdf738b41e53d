//! Pointer gestures on the timeline.
//!
//! While the pointer moves, a gesture only updates its own candidate
//! values, which the UI draws. Nothing reaches the store until `commit`,
//! which issues exactly one edit. A rejected commit reports the original
//! values so the item can snap back.

use montage_common::units::px_to_secs;
use montage_project_model::MIN_DURATION_SECS;

use crate::state::TimelineState;
use crate::store::{EditOutcome, TimelineStore, TrimSide};

/// What part of a zoom effect card is being dragged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomDragMode {
    /// Drag the whole card.
    Move,
    /// Drag the left edge.
    ResizeStart,
    /// Drag the right edge.
    ResizeEnd,
}

/// Final placement after a gesture.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureResult {
    pub outcome: EditOutcome,
    /// Start to display after release.
    pub start: f64,
    /// Duration to display after release.
    pub duration: f64,
}

/// Drag or resize of a zoom effect in time.
#[derive(Debug, Clone)]
pub struct ZoomDrag {
    effect_id: String,
    mode: ZoomDragMode,
    origin_start: f64,
    origin_duration: f64,
    total_duration: f64,
    start: f64,
    duration: f64,
}

impl ZoomDrag {
    /// Begin dragging an effect. Returns `None` for unknown ids.
    pub fn begin(state: &TimelineState, effect_id: &str, mode: ZoomDragMode) -> Option<Self> {
        let effect = state.zoom_effect(effect_id)?;
        Some(Self {
            effect_id: effect_id.to_string(),
            mode,
            origin_start: effect.start,
            origin_duration: effect.duration,
            total_duration: state.total_duration,
            start: effect.start,
            duration: effect.duration,
        })
    }

    /// Recompute the candidate from the total pointer travel since `begin`.
    pub fn update(&mut self, delta_px: f64, scale: f64) {
        let delta = px_to_secs(delta_px, scale);
        let total = self.total_duration;
        match self.mode {
            ZoomDragMode::Move => {
                let latest = (total - self.origin_duration).max(0.0);
                self.start = (self.origin_start + delta).clamp(0.0, latest);
                self.duration = self.origin_duration;
            }
            ZoomDragMode::ResizeStart => {
                let end = self.origin_start + self.origin_duration;
                let latest = (end - MIN_DURATION_SECS).max(0.0);
                self.start = (self.origin_start + delta).clamp(0.0, latest);
                self.duration = end - self.start;
            }
            ZoomDragMode::ResizeEnd => {
                let longest = (total - self.origin_start).max(MIN_DURATION_SECS);
                self.start = self.origin_start;
                self.duration = (self.origin_duration + delta).clamp(MIN_DURATION_SECS, longest);
            }
        }
    }

    /// Candidate `(start, duration)` to draw while dragging.
    pub fn candidate(&self) -> (f64, f64) {
        (self.start, self.duration)
    }

    pub fn effect_id(&self) -> &str {
        &self.effect_id
    }

    /// Write the candidate to the store.
    pub fn commit(self, store: &mut TimelineStore) -> GestureResult {
        let outcome = store.update_zoom_timing(&self.effect_id, self.start, self.duration);
        let (start, duration) = if outcome.is_applied() {
            (self.start, self.duration)
        } else {
            (self.origin_start, self.origin_duration)
        };
        GestureResult {
            outcome,
            start,
            duration,
        }
    }
}

/// Drag of one clip edge.
#[derive(Debug, Clone)]
pub struct ClipTrimDrag {
    clip_id: String,
    side: TrimSide,
    origin_start: f64,
    origin_duration: f64,
    delta: f64,
}

impl ClipTrimDrag {
    pub fn begin(state: &TimelineState, clip_id: &str, side: TrimSide) -> Option<Self> {
        let clip = state.clip(clip_id)?;
        Some(Self {
            clip_id: clip_id.to_string(),
            side,
            origin_start: clip.start,
            origin_duration: clip.duration,
            delta: 0.0,
        })
    }

    /// Recompute the candidate from the total pointer travel since `begin`.
    pub fn update(&mut self, delta_px: f64, scale: f64) {
        let delta = px_to_secs(delta_px, scale);
        let shortest = MIN_DURATION_SECS - self.origin_duration;
        self.delta = match self.side {
            TrimSide::End => delta.max(shortest),
            TrimSide::Start => delta.min(-shortest),
        };
    }

    /// Candidate `(start, duration)` to draw while dragging. The store
    /// may clamp further against the source length on commit.
    pub fn candidate(&self) -> (f64, f64) {
        match self.side {
            TrimSide::End => (self.origin_start, self.origin_duration + self.delta),
            TrimSide::Start => (
                self.origin_start + self.delta,
                self.origin_duration - self.delta,
            ),
        }
    }

    pub fn commit(self, store: &mut TimelineStore) -> GestureResult {
        let outcome = store.trim_clip(&self.clip_id, self.side, self.delta);
        let (start, duration) = match store.state().clip(&self.clip_id) {
            Some(clip) => (clip.start, clip.duration),
            None => (self.origin_start, self.origin_duration),
        };
        GestureResult {
            outcome,
            start,
            duration,
        }
    }
}

/// Horizontal drag of a whole clip.
///
/// On magnetic tracks the drop position picks a new slot and the commit is
/// a reorder. On free tracks the clip moves to the dropped start.
#[derive(Debug, Clone)]
pub struct ClipMoveDrag {
    clip_id: String,
    track_id: String,
    magnetic: bool,
    origin_start: f64,
    duration: f64,
    start: f64,
}

impl ClipMoveDrag {
    pub fn begin(state: &TimelineState, clip_id: &str) -> Option<Self> {
        let clip = state.clip(clip_id)?;
        let magnetic = state.track(&clip.track_id).is_some_and(|t| t.is_magnetic());
        Some(Self {
            clip_id: clip_id.to_string(),
            track_id: clip.track_id.clone(),
            magnetic,
            origin_start: clip.start,
            duration: clip.duration,
            start: clip.start,
        })
    }

    pub fn update(&mut self, delta_px: f64, scale: f64) {
        self.start = (self.origin_start + px_to_secs(delta_px, scale)).max(0.0);
    }

    pub fn candidate(&self) -> (f64, f64) {
        (self.start, self.duration)
    }

    /// Slot the clip would land in on a magnetic track: the number of
    /// other clips whose midpoint lies before the dragged clip's midpoint.
    fn target_index(&self, state: &TimelineState) -> usize {
        let center = self.start + self.duration / 2.0;
        state
            .clips_on_track(&self.track_id)
            .iter()
            .filter(|c| c.id != self.clip_id)
            .filter(|c| c.start + c.duration / 2.0 < center)
            .count()
    }

    pub fn commit(self, store: &mut TimelineStore) -> GestureResult {
        let outcome = if self.magnetic {
            let state = store.state();
            let from = state
                .clips_on_track(&self.track_id)
                .iter()
                .position(|c| c.id == self.clip_id);
            let to = self.target_index(state);
            match from {
                Some(from) => store.reorder_clips(&self.track_id, from, to),
                None => EditOutcome::Rejected(crate::store::RejectReason::NotFound),
            }
        } else {
            let patch = montage_project_model::ClipPatch {
                start: Some(self.start),
                ..Default::default()
            };
            store.update_clip(&self.clip_id, &patch)
        };

        let (start, duration) = match store.state().clip(&self.clip_id) {
            Some(clip) => (clip.start, clip.duration),
            None => (self.origin_start, self.duration),
        };
        GestureResult {
            outcome,
            start,
            duration,
        }
    }
}
