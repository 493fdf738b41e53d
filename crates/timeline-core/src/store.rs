//! The timeline store: the only legal way to edit a project.
//!
//! Every operation is an atomic transition. It either applies in full,
//! re-establishing gapless magnetic tracks and refreshing the derived
//! duration, or it is rejected and leaves the state exactly as it was.
//! Rejections are reported through [`EditOutcome`] so interactive callers
//! can snap back; they are never errors.

use std::sync::Arc;

use montage_common::config::EditorDefaults;
use montage_common::ids::IdGenerator;
use montage_common::units::TIME_EPSILON;
use montage_project_model::{
    intervals_overlap, Clip, ClipContent, ClipKind, ClipPatch, NormalizedRect, TimelineDocument,
    Track, TrackKind, TrackPatch, ZoomEffect, MAX_ZOOM_LEVEL, MIN_DURATION_SECS, MIN_ZOOM_LEVEL,
};
use tracing::{debug, warn};

use crate::captions::CaptionStore;
use crate::ripple;
use crate::state::{
    compute_total_duration, Selection, TimelineState, ViewSettings, MAX_TIMELINE_HEIGHT,
    MAX_TIMELINE_SCALE, MIN_TIMELINE_HEIGHT, MIN_TIMELINE_SCALE,
};

/// Result of a store operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    Applied,
    Rejected(RejectReason),
}

impl EditOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, EditOutcome::Applied)
    }
}

/// Why an edit was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// No clip, effect or track with that id.
    NotFound,
    /// The owning track is locked.
    TrackLocked,
    /// The target track cannot hold this item.
    WrongTrackKind,
    /// No track can receive the item.
    NoTargetTrack,
    /// The split point is not strictly inside the clip.
    InvalidSplitPoint,
    /// The interval would overlap another effect on the same track.
    Overlap,
    /// The interval falls outside `[0, total_duration]` or below the
    /// minimum duration.
    OutOfBounds,
    /// Moving or resizing a clip on a magnetic track by field patch.
    MagneticTiming,
    /// The edit would not change anything.
    NoChange,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            RejectReason::NotFound => "not found",
            RejectReason::TrackLocked => "track is locked",
            RejectReason::WrongTrackKind => "track cannot hold this item",
            RejectReason::NoTargetTrack => "no track can receive this item",
            RejectReason::InvalidSplitPoint => "split point is outside the clip",
            RejectReason::Overlap => "overlaps another effect",
            RejectReason::OutOfBounds => "out of bounds",
            RejectReason::MagneticTiming => "clips on magnetic tracks are positioned by ripple",
            RejectReason::NoChange => "nothing to change",
        };
        f.write_str(text)
    }
}

/// Which edge of a clip a trim moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrimSide {
    Start,
    End,
}

/// A clip to be added. The store assigns its id and final placement.
#[derive(Debug, Clone)]
pub struct NewClip {
    /// Preferred track. Falls back to the first track of the clip's kind,
    /// then to the first track that holds clips.
    pub track_id: Option<String>,
    /// Requested start. Ignored on magnetic tracks, which always append.
    pub start: f64,
    pub duration: f64,
    pub source_offset: f64,
    pub content: ClipContent,
}

fn reject(op: &'static str, id: &str, reason: RejectReason) -> EditOutcome {
    warn!(op, id, %reason, "Edit rejected");
    EditOutcome::Rejected(reason)
}

/// Single source of truth for a project's editable state.
pub struct TimelineStore {
    state: TimelineState,
    captions: CaptionStore,
    ids: Box<dyn IdGenerator>,
    defaults: EditorDefaults,
}

impl std::fmt::Debug for TimelineStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimelineStore")
            .field("state", &self.state)
            .field("captions", &self.captions)
            .finish_non_exhaustive()
    }
}

impl TimelineStore {
    /// A fresh project timeline with one media track and one zoom track.
    pub fn new(ids: Box<dyn IdGenerator>, defaults: EditorDefaults) -> Self {
        let mut store = Self::empty(ids, defaults);
        let media = Track::new(store.ids.next_id("track"), "Media", TrackKind::Video);
        let zoom = Track::new(store.ids.next_id("track"), "Zoom", TrackKind::Zoom);
        store.state.tracks = Arc::new(vec![media, zoom]);
        store
    }

    /// Restore a store from a persisted document.
    ///
    /// Magnetic tracks are repacked on load so a hand-edited document
    /// cannot smuggle in gaps or overlaps.
    pub fn from_document(
        doc: &TimelineDocument,
        ids: Box<dyn IdGenerator>,
        defaults: EditorDefaults,
    ) -> Self {
        let mut store = Self::empty(ids, defaults);
        let mut clips = doc.clips.clone();
        for track in doc.tracks.iter().filter(|t| t.is_magnetic()) {
            if !ripple::is_contiguous(&clips, &track.id) {
                warn!(track = %track.id, "Repacking non-contiguous magnetic track on load");
                clips = ripple::repack_track(&clips, &track.id);
            }
        }
        store.state.tracks = Arc::new(doc.tracks.clone());
        store.state.clips = Arc::new(clips);
        store.state.zoom_effects = Arc::new(doc.zoom_effects.clone());
        store.captions = CaptionStore::from_document(&doc.captions);
        store.refresh_duration();
        store
    }

    fn empty(ids: Box<dyn IdGenerator>, defaults: EditorDefaults) -> Self {
        let view = ViewSettings {
            scale: defaults
                .timeline_scale
                .clamp(MIN_TIMELINE_SCALE, MAX_TIMELINE_SCALE),
            height: defaults
                .timeline_height
                .clamp(MIN_TIMELINE_HEIGHT, MAX_TIMELINE_HEIGHT),
        };
        Self {
            state: TimelineState {
                tracks: Arc::new(Vec::new()),
                clips: Arc::new(Vec::new()),
                zoom_effects: Arc::new(Vec::new()),
                current_time: 0.0,
                total_duration: 0.0,
                is_playing: false,
                selection: Selection::None,
                view,
            },
            captions: CaptionStore::new(),
            ids,
            defaults,
        }
    }

    /// Serialize the current timeline and captions.
    pub fn to_document(&self) -> TimelineDocument {
        TimelineDocument {
            tracks: self.state.tracks.as_ref().clone(),
            clips: self.state.clips.as_ref().clone(),
            zoom_effects: self.state.zoom_effects.as_ref().clone(),
            captions: self.captions.to_document(),
            ..TimelineDocument::new()
        }
    }

    pub fn state(&self) -> &TimelineState {
        &self.state
    }

    /// Current snapshot (cheap clone).
    pub fn snapshot(&self) -> TimelineState {
        self.state.clone()
    }

    pub fn captions(&self) -> &CaptionStore {
        &self.captions
    }

    pub fn captions_mut(&mut self) -> &mut CaptionStore {
        &mut self.captions
    }

    pub fn defaults(&self) -> &EditorDefaults {
        &self.defaults
    }

    pub fn total_duration(&self) -> f64 {
        self.state.total_duration
    }

    /// Generate an id from the injected generator.
    pub fn next_id(&mut self, prefix: &str) -> String {
        self.ids.next_id(prefix)
    }

    fn refresh_duration(&mut self) {
        self.state.total_duration = compute_total_duration(&self.state.clips);
        self.state.current_time = self
            .state
            .current_time
            .clamp(0.0, self.state.total_duration);
    }

    fn commit_clips(&mut self, clips: Vec<Clip>) {
        self.state.clips = Arc::new(clips);
        self.refresh_duration();
    }

    fn invalidate_captions(&mut self, reason: &str) {
        self.captions.clear(reason);
    }

    fn is_locked(&self, track_id: &str) -> bool {
        self.state.track(track_id).is_some_and(|t| t.locked)
    }

    fn is_magnetic(&self, track_id: &str) -> bool {
        self.state.track(track_id).is_some_and(Track::is_magnetic)
    }

    // ------------------------------------------------------------------
    // Clips
    // ------------------------------------------------------------------

    fn target_track_for(&self, requested: Option<&str>, kind: ClipKind) -> Option<&Track> {
        let tracks = &self.state.tracks;
        requested
            .and_then(|id| tracks.iter().find(|t| t.id == id))
            .filter(|t| t.kind.holds_clips())
            .or_else(|| {
                let wanted = TrackKind::for_clip(kind);
                tracks.iter().find(|t| t.kind == wanted)
            })
            .or_else(|| tracks.iter().find(|t| t.kind.holds_clips()))
    }

    /// Add a clip and return its id.
    ///
    /// On magnetic tracks the clip is appended at the end of the track
    /// regardless of `new.start`. Adding audio or video invalidates captions.
    pub fn add_clip(&mut self, new: NewClip) -> Option<String> {
        if !new.duration.is_finite() || new.duration <= 0.0 {
            warn!(duration = new.duration, "Rejected clip with invalid duration");
            return None;
        }

        let kind = new.content.kind();

        let Some(track) = self.target_track_for(new.track_id.as_deref(), kind) else {
            reject("add_clip", "", RejectReason::NoTargetTrack);
            return None;
        };
        if track.locked {
            reject("add_clip", &track.id, RejectReason::TrackLocked);
            return None;
        }
        let track_id = track.id.clone();
        let magnetic = track.is_magnetic();

        let start = if magnetic {
            ripple::track_end(&self.state.clips, &track_id)
        } else {
            new.start.max(0.0)
        };

        let clip = Clip {
            id: self.ids.next_id("clip"),
            track_id,
            start,
            duration: new.duration.max(MIN_DURATION_SECS),
            source_offset: new.source_offset.max(0.0),
            content: new.content,
        };
        let id = clip.id.clone();

        debug!(
            clip = %id,
            track = %clip.track_id,
            kind = %kind,
            start = clip.start,
            duration = clip.duration,
            "Clip added"
        );

        let mut clips = self.state.clips.as_ref().clone();
        clips.push(clip);
        self.commit_clips(clips);

        if kind.is_timing_sensitive() {
            self.invalidate_captions("Clip added");
        }
        Some(id)
    }

    /// Remove a clip without rippling. Captions are kept.
    pub fn remove_clip(&mut self, id: &str) -> EditOutcome {
        let Some(clip) = self.state.clip(id) else {
            return reject("remove_clip", id, RejectReason::NotFound);
        };
        if self.is_locked(&clip.track_id) {
            return reject("remove_clip", id, RejectReason::TrackLocked);
        }

        let clips = self
            .state
            .clips
            .iter()
            .filter(|c| c.id != id)
            .cloned()
            .collect();
        self.commit_clips(clips);
        self.clear_selection_of(id);
        debug!(clip = id, "Clip removed");
        EditOutcome::Applied
    }

    /// Patch clip fields without rippling.
    ///
    /// Moving or resizing a clip on a magnetic track this way is refused;
    /// those clips are positioned only by ripple. A patch that ends up
    /// shortening a magnetic clip (a later source offset against a short
    /// source) repacks its track. Any change to an audio or video clip's
    /// timing invalidates captions; renames and style edits do not.
    pub fn update_clip(&mut self, id: &str, patch: &ClipPatch) -> EditOutcome {
        let Some(clip) = self.state.clip(id) else {
            return reject("update_clip", id, RejectReason::NotFound);
        };
        if self.is_locked(&clip.track_id) {
            return reject("update_clip", id, RejectReason::TrackLocked);
        }
        if self.is_magnetic(&clip.track_id) && (patch.start.is_some() || patch.duration.is_some())
        {
            return reject("update_clip", id, RejectReason::MagneticTiming);
        }

        let mut updated = patch.apply(clip);
        if let Some(max) = updated.max_duration() {
            updated.duration = updated.duration.min(max.max(MIN_DURATION_SECS));
        }
        if &updated == clip {
            return reject("update_clip", id, RejectReason::NoChange);
        }
        // The source clamp can shorten a clip even when the patch names no
        // timing field.
        let retimed = updated.start != clip.start
            || updated.duration != clip.duration
            || updated.source_offset != clip.source_offset;
        let invalidates = clip.kind().is_timing_sensitive() && retimed;
        let track_id = clip.track_id.clone();
        let repack = self.is_magnetic(&track_id) && updated.duration != clip.duration;

        let mut clips: Vec<Clip> = self
            .state
            .clips
            .iter()
            .map(|c| if c.id == id { updated.clone() } else { c.clone() })
            .collect();
        if repack {
            clips = ripple::repack_track(&clips, &track_id);
        }
        self.commit_clips(clips);
        debug!(clip = id, timing = retimed, rippled = repack, "Clip updated");

        if invalidates {
            self.invalidate_captions("Clip updated");
        }
        EditOutcome::Applied
    }

    /// Delete a clip. Magnetic tracks close the gap by rippling.
    pub fn delete_clip(&mut self, id: &str) -> EditOutcome {
        let Some(clip) = self.state.clip(id) else {
            return reject("delete_clip", id, RejectReason::NotFound);
        };
        if self.is_locked(&clip.track_id) {
            return reject("delete_clip", id, RejectReason::TrackLocked);
        }
        let track_id = clip.track_id.clone();
        let is_media = clip.kind().is_media();

        let remaining: Vec<Clip> = self
            .state
            .clips
            .iter()
            .filter(|c| c.id != id)
            .cloned()
            .collect();
        let clips = if self.is_magnetic(&track_id) {
            ripple::repack_track(&remaining, &track_id)
        } else {
            remaining
        };
        self.commit_clips(clips);
        self.clear_selection_of(id);
        debug!(clip = id, track = %track_id, "Clip deleted");

        if is_media {
            self.invalidate_captions("Clip deleted");
        }
        EditOutcome::Applied
    }

    /// Move the clip at `from_index` (in start order) to `to_index`, then
    /// pack the whole track contiguously from zero.
    pub fn reorder_clips(&mut self, track_id: &str, from_index: usize, to_index: usize) -> EditOutcome {
        let Some(track) = self.state.track(track_id) else {
            return reject("reorder_clips", track_id, RejectReason::NotFound);
        };
        if track.locked {
            return reject("reorder_clips", track_id, RejectReason::TrackLocked);
        }
        if !track.kind.holds_clips() {
            return reject("reorder_clips", track_id, RejectReason::WrongTrackKind);
        }

        let ordered = self.state.clips_on_track(track_id);
        if from_index >= ordered.len() || to_index >= ordered.len() {
            return reject("reorder_clips", track_id, RejectReason::OutOfBounds);
        }
        if from_index == to_index {
            return reject("reorder_clips", track_id, RejectReason::NoChange);
        }

        let mut ids: Vec<&str> = ordered.iter().map(|c| c.id.as_str()).collect();
        let moved = ids.remove(from_index);
        ids.insert(to_index, moved);
        let touches_media = ordered.iter().any(|c| c.kind().is_media());

        let clips = ripple::pack_in_order(&self.state.clips, &ids);
        self.commit_clips(clips);
        debug!(track = track_id, from_index, to_index, "Clips reordered");

        if touches_media {
            self.invalidate_captions("Clips reordered");
        }
        EditOutcome::Applied
    }

    /// Split a clip in two at timeline time `at`, which must lie strictly
    /// inside the clip. The second half is selected.
    pub fn cut_clip(&mut self, id: &str, at: f64) -> EditOutcome {
        let Some(clip) = self.state.clip(id) else {
            return reject("cut_clip", id, RejectReason::NotFound);
        };
        if self.is_locked(&clip.track_id) {
            return reject("cut_clip", id, RejectReason::TrackLocked);
        }
        if at <= clip.start + TIME_EPSILON || at >= clip.end() - TIME_EPSILON {
            return reject("cut_clip", id, RejectReason::InvalidSplitPoint);
        }

        let offset = at - clip.start;
        let first = Clip {
            duration: offset,
            ..clip.clone()
        };
        let second = Clip {
            id: self.ids.next_id("clip"),
            start: at,
            duration: clip.end() - at,
            source_offset: clip.source_offset + offset,
            ..clip.clone()
        };
        let second_id = second.id.clone();
        let track_id = clip.track_id.clone();
        let is_media = clip.kind().is_media();

        let mut clips = Vec::with_capacity(self.state.clips.len() + 1);
        for c in self.state.clips.iter() {
            if c.id == id {
                clips.push(first.clone());
                clips.push(second.clone());
            } else {
                clips.push(c.clone());
            }
        }
        if self.is_magnetic(&track_id) {
            clips = ripple::repack_track(&clips, &track_id);
        }
        self.commit_clips(clips);
        self.state.selection = Selection::Clip(second_id.clone());
        debug!(clip = id, at, second = %second_id, "Clip split");

        if is_media {
            self.invalidate_captions("Clip split");
        }
        EditOutcome::Applied
    }

    /// Move one edge of a clip by `delta` seconds.
    ///
    /// The end edge changes only the duration. The start edge moves the
    /// in-point: a positive delta shortens the clip from the front and
    /// advances `source_offset` by the same amount, a negative delta
    /// extends it back into the source. Durations never drop below
    /// `MIN_DURATION_SECS`, `source_offset` never goes negative, and a
    /// probed source length is never exceeded. Magnetic tracks are then
    /// repacked; on other tracks a start-edge trim also moves `start`.
    pub fn trim_clip(&mut self, id: &str, side: TrimSide, delta: f64) -> EditOutcome {
        let Some(clip) = self.state.clip(id) else {
            return reject("trim_clip", id, RejectReason::NotFound);
        };
        if self.is_locked(&clip.track_id) {
            return reject("trim_clip", id, RejectReason::TrackLocked);
        }
        let magnetic = self.is_magnetic(&clip.track_id);
        let Some(trimmed) = trimmed_clip(clip, side, delta, magnetic) else {
            return reject("trim_clip", id, RejectReason::NoChange);
        };
        let track_id = clip.track_id.clone();
        let is_media = clip.kind().is_media();

        let replaced: Vec<Clip> = self
            .state
            .clips
            .iter()
            .map(|c| if c.id == id { trimmed.clone() } else { c.clone() })
            .collect();
        let clips = if magnetic {
            ripple::repack_track(&replaced, &track_id)
        } else {
            replaced
        };
        self.commit_clips(clips);
        debug!(
            clip = id,
            side = ?side,
            delta,
            duration = trimmed.duration,
            source_offset = trimmed.source_offset,
            "Clip trimmed"
        );

        if is_media {
            self.invalidate_captions("Clip trimmed");
        }
        EditOutcome::Applied
    }

    fn clear_selection_of(&mut self, id: &str) {
        let selected = match &self.state.selection {
            Selection::Clip(s) | Selection::ZoomEffect(s) => s == id,
            Selection::None => false,
        };
        if selected {
            self.state.selection = Selection::None;
        }
    }

    // ------------------------------------------------------------------
    // Zoom effects
    // ------------------------------------------------------------------

    fn overlaps_sibling(&self, track_id: &str, except: &str, start: f64, end: f64) -> bool {
        self.state
            .zoom_effects
            .iter()
            .filter(|z| z.track_id == track_id && z.id != except)
            .any(|z| intervals_overlap(z.start, z.end(), start, end))
    }

    fn replace_effect(&mut self, updated: ZoomEffect) {
        let effects = self
            .state
            .zoom_effects
            .iter()
            .map(|z| {
                if z.id == updated.id {
                    updated.clone()
                } else {
                    z.clone()
                }
            })
            .collect();
        self.state.zoom_effects = Arc::new(effects);
    }

    /// Add a zoom effect at the playhead with the default duration and level.
    ///
    /// The duration is shortened to end at the timeline end. The add is
    /// refused if less than the minimum duration fits or the new interval
    /// overlaps an existing effect on the track.
    pub fn add_zoom_effect(&mut self, track_id: Option<&str>) -> Option<String> {
        let track = match track_id {
            Some(id) => self.state.track(id),
            None => self.state.tracks.iter().find(|t| t.kind == TrackKind::Zoom),
        };
        let Some(track) = track else {
            reject("add_zoom_effect", track_id.unwrap_or(""), RejectReason::NoTargetTrack);
            return None;
        };
        if track.kind != TrackKind::Zoom {
            reject("add_zoom_effect", &track.id, RejectReason::WrongTrackKind);
            return None;
        }
        if track.locked {
            reject("add_zoom_effect", &track.id, RejectReason::TrackLocked);
            return None;
        }
        let track_id = track.id.clone();

        let total = self.state.total_duration;
        let start = self.state.current_time.clamp(0.0, total);
        let duration = self.defaults.zoom_duration_secs.min(total - start);
        if duration < MIN_DURATION_SECS - TIME_EPSILON {
            reject("add_zoom_effect", &track_id, RejectReason::OutOfBounds);
            return None;
        }
        if self.overlaps_sibling(&track_id, "", start, start + duration) {
            reject("add_zoom_effect", &track_id, RejectReason::Overlap);
            return None;
        }

        let level = self
            .defaults
            .zoom_level
            .clamp(MIN_ZOOM_LEVEL, MAX_ZOOM_LEVEL);
        let effect = ZoomEffect {
            id: self.ids.next_id("zoom"),
            track_id,
            start,
            duration,
            level,
            rect: NormalizedRect::centered_for_level(level),
        };
        let id = effect.id.clone();
        debug!(effect = %id, start, duration, level, "Zoom effect added");

        let mut effects = self.state.zoom_effects.as_ref().clone();
        effects.push(effect);
        self.state.zoom_effects = Arc::new(effects);
        self.state.selection = Selection::ZoomEffect(id.clone());
        Some(id)
    }

    pub fn remove_zoom_effect(&mut self, id: &str) -> EditOutcome {
        let Some(effect) = self.state.zoom_effect(id) else {
            return reject("remove_zoom_effect", id, RejectReason::NotFound);
        };
        if self.is_locked(&effect.track_id) {
            return reject("remove_zoom_effect", id, RejectReason::TrackLocked);
        }
        let effects = self
            .state
            .zoom_effects
            .iter()
            .filter(|z| z.id != id)
            .cloned()
            .collect();
        self.state.zoom_effects = Arc::new(effects);
        self.clear_selection_of(id);
        debug!(effect = id, "Zoom effect removed");
        EditOutcome::Applied
    }

    /// Move or resize a zoom effect in time.
    ///
    /// Refused, leaving every effect unchanged, if the new interval
    /// overlaps another effect on the same track, starts before zero, is
    /// shorter than the minimum duration or runs past the timeline end.
    pub fn update_zoom_timing(&mut self, id: &str, start: f64, duration: f64) -> EditOutcome {
        let Some(effect) = self.state.zoom_effect(id) else {
            return reject("update_zoom_timing", id, RejectReason::NotFound);
        };
        if self.is_locked(&effect.track_id) {
            return reject("update_zoom_timing", id, RejectReason::TrackLocked);
        }
        if !start.is_finite()
            || !duration.is_finite()
            || start < -TIME_EPSILON
            || duration < MIN_DURATION_SECS - TIME_EPSILON
            || start + duration > self.state.total_duration + TIME_EPSILON
        {
            return reject("update_zoom_timing", id, RejectReason::OutOfBounds);
        }
        let start = start.max(0.0);
        if self.overlaps_sibling(&effect.track_id, id, start, start + duration) {
            return reject("update_zoom_timing", id, RejectReason::Overlap);
        }

        let updated = ZoomEffect {
            start,
            duration,
            ..effect.clone()
        };
        self.replace_effect(updated);
        debug!(effect = id, start, duration, "Zoom effect retimed");
        EditOutcome::Applied
    }

    /// Set the zoom level, resizing the rect to a square of side `1/level`
    /// around its current center.
    pub fn set_zoom_level(&mut self, id: &str, level: f64) -> EditOutcome {
        let Some(effect) = self.state.zoom_effect(id) else {
            return reject("set_zoom_level", id, RejectReason::NotFound);
        };
        if self.is_locked(&effect.track_id) {
            return reject("set_zoom_level", id, RejectReason::TrackLocked);
        }
        if !level.is_finite() {
            return reject("set_zoom_level", id, RejectReason::OutOfBounds);
        }
        let level = level.clamp(MIN_ZOOM_LEVEL, MAX_ZOOM_LEVEL);
        let updated = ZoomEffect {
            level,
            rect: effect.rect.resized_to_level(level),
            ..effect.clone()
        };
        self.replace_effect(updated);
        debug!(effect = id, level, "Zoom level set");
        EditOutcome::Applied
    }

    /// Replace the zoom rect freely, clamped into the frame. The level is
    /// left as is.
    pub fn set_zoom_rect(&mut self, id: &str, rect: NormalizedRect) -> EditOutcome {
        let Some(effect) = self.state.zoom_effect(id) else {
            return reject("set_zoom_rect", id, RejectReason::NotFound);
        };
        if self.is_locked(&effect.track_id) {
            return reject("set_zoom_rect", id, RejectReason::TrackLocked);
        }
        if ![rect.x, rect.y, rect.width, rect.height].iter().all(|v| v.is_finite()) {
            return reject("set_zoom_rect", id, RejectReason::OutOfBounds);
        }
        let updated = ZoomEffect {
            rect: rect.clamped(),
            ..effect.clone()
        };
        self.replace_effect(updated);
        debug!(effect = id, "Zoom rect set");
        EditOutcome::Applied
    }

    /// Drag the rect's bottom-right corner to `(mx, my)`. The rect stays
    /// square and the level follows its side, so it can go past the
    /// slider's `MAX_ZOOM_LEVEL` (up to `1 / MIN_RECT_SIDE`).
    pub fn resize_zoom_from_corner(&mut self, id: &str, mx: f64, my: f64) -> EditOutcome {
        let Some(effect) = self.state.zoom_effect(id) else {
            return reject("resize_zoom_from_corner", id, RejectReason::NotFound);
        };
        if self.is_locked(&effect.track_id) {
            return reject("resize_zoom_from_corner", id, RejectReason::TrackLocked);
        }
        if !mx.is_finite() || !my.is_finite() {
            return reject("resize_zoom_from_corner", id, RejectReason::OutOfBounds);
        }
        let rect = effect.rect.resized_from_corner(mx, my);
        let updated = ZoomEffect {
            level: 1.0 / rect.width,
            rect,
            ..effect.clone()
        };
        self.replace_effect(updated);
        debug!(effect = id, side = rect.width, "Zoom rect resized");
        EditOutcome::Applied
    }

    /// Center the rect on `(cx, cy)`, clamped into the frame.
    pub fn move_zoom_rect(&mut self, id: &str, cx: f64, cy: f64) -> EditOutcome {
        let Some(effect) = self.state.zoom_effect(id) else {
            return reject("move_zoom_rect", id, RejectReason::NotFound);
        };
        if self.is_locked(&effect.track_id) {
            return reject("move_zoom_rect", id, RejectReason::TrackLocked);
        }
        if !cx.is_finite() || !cy.is_finite() {
            return reject("move_zoom_rect", id, RejectReason::OutOfBounds);
        }
        let updated = ZoomEffect {
            rect: effect.rect.moved_to_center(cx, cy),
            ..effect.clone()
        };
        self.replace_effect(updated);
        debug!(effect = id, cx, cy, "Zoom rect moved");
        EditOutcome::Applied
    }

    // ------------------------------------------------------------------
    // Tracks
    // ------------------------------------------------------------------

    pub fn add_track(&mut self, name: impl Into<String>, kind: TrackKind) -> String {
        let track = Track::new(self.ids.next_id("track"), name, kind);
        let id = track.id.clone();
        debug!(track = %id, kind = %kind, "Track added");
        let mut tracks = self.state.tracks.as_ref().clone();
        tracks.push(track);
        self.state.tracks = Arc::new(tracks);
        id
    }

    /// Rename, lock, hide or resize a track.
    pub fn update_track(&mut self, id: &str, patch: &TrackPatch) -> EditOutcome {
        let Some(track) = self.state.track(id) else {
            return reject("update_track", id, RejectReason::NotFound);
        };
        let updated = patch.apply(track);
        if &updated == track {
            return reject("update_track", id, RejectReason::NoChange);
        }
        let tracks = self
            .state
            .tracks
            .iter()
            .map(|t| if t.id == id { updated.clone() } else { t.clone() })
            .collect();
        self.state.tracks = Arc::new(tracks);
        debug!(track = id, "Track updated");
        EditOutcome::Applied
    }

    /// Remove a track together with its clips and zoom effects.
    pub fn remove_track(&mut self, id: &str) -> EditOutcome {
        if self.state.track(id).is_none() {
            return reject("remove_track", id, RejectReason::NotFound);
        }

        let removed_media = self
            .state
            .clips
            .iter()
            .any(|c| c.track_id == id && c.kind().is_media());
        let selection_gone = match &self.state.selection {
            Selection::Clip(cid) => self.state.clip(cid).is_some_and(|c| c.track_id == id),
            Selection::ZoomEffect(zid) => self
                .state
                .zoom_effect(zid)
                .is_some_and(|z| z.track_id == id),
            Selection::None => false,
        };

        let tracks = self
            .state
            .tracks
            .iter()
            .filter(|t| t.id != id)
            .cloned()
            .collect();
        let clips = self
            .state
            .clips
            .iter()
            .filter(|c| c.track_id != id)
            .cloned()
            .collect();
        let effects = self
            .state
            .zoom_effects
            .iter()
            .filter(|z| z.track_id != id)
            .cloned()
            .collect();

        self.state.tracks = Arc::new(tracks);
        self.state.zoom_effects = Arc::new(effects);
        self.commit_clips(clips);
        if selection_gone {
            self.state.selection = Selection::None;
        }
        debug!(track = id, "Track removed");

        if removed_media {
            self.invalidate_captions("Track removed");
        }
        EditOutcome::Applied
    }

    // ------------------------------------------------------------------
    // Playhead, selection, view
    // ------------------------------------------------------------------

    /// Move the playhead, clamped into `[0, total_duration]`.
    pub fn set_current_time(&mut self, t: f64) {
        if t.is_finite() {
            self.state.current_time = t.clamp(0.0, self.state.total_duration);
        }
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.state.is_playing = playing;
    }

    /// Select a clip. Unknown ids leave the selection unchanged.
    pub fn select_clip(&mut self, id: &str) -> EditOutcome {
        if self.state.clip(id).is_none() {
            return reject("select_clip", id, RejectReason::NotFound);
        }
        self.state.selection = Selection::Clip(id.to_string());
        EditOutcome::Applied
    }

    /// Select a zoom effect. Unknown ids leave the selection unchanged.
    pub fn select_zoom_effect(&mut self, id: &str) -> EditOutcome {
        if self.state.zoom_effect(id).is_none() {
            return reject("select_zoom_effect", id, RejectReason::NotFound);
        }
        self.state.selection = Selection::ZoomEffect(id.to_string());
        EditOutcome::Applied
    }

    pub fn clear_selection(&mut self) {
        self.state.selection = Selection::None;
    }

    /// Set pixels per second, clamped into `[10, 200]`.
    pub fn set_timeline_scale(&mut self, scale: f64) {
        if scale.is_finite() {
            self.state.view.scale = scale.clamp(MIN_TIMELINE_SCALE, MAX_TIMELINE_SCALE);
        }
    }

    /// Set the panel height, clamped into `[150, 600]`.
    pub fn set_timeline_height(&mut self, height: f64) {
        if height.is_finite() {
            self.state.view.height = height.clamp(MIN_TIMELINE_HEIGHT, MAX_TIMELINE_HEIGHT);
        }
    }
}

/// Compute the result of trimming `clip`, or `None` if the clamped delta
/// leaves it unchanged.
fn trimmed_clip(clip: &Clip, side: TrimSide, delta: f64, magnetic: bool) -> Option<Clip> {
    if !delta.is_finite() {
        return None;
    }
    let has_source = matches!(clip.content, ClipContent::Media(_));

    let mut trimmed = clip.clone();
    match side {
        TrimSide::End => {
            let mut max_duration = f64::INFINITY;
            if let Some(max) = clip.max_duration() {
                max_duration = max.max(MIN_DURATION_SECS);
            }
            trimmed.duration = (clip.duration + delta).clamp(MIN_DURATION_SECS, max_duration);
        }
        TrimSide::Start => {
            // Positive shift moves the in-point later.
            let mut lower = f64::NEG_INFINITY;
            if has_source {
                lower = lower.max(-clip.source_offset);
            }
            if !magnetic {
                lower = lower.max(-clip.start);
            }
            let upper = (clip.duration - MIN_DURATION_SECS).max(0.0);
            let shift = delta.clamp(lower.min(0.0), upper);

            trimmed.duration = clip.duration - shift;
            if has_source {
                trimmed.source_offset = clip.source_offset + shift;
            }
            if !magnetic {
                trimmed.start = clip.start + shift;
            }
        }
    }

    if (trimmed.duration - clip.duration).abs() <= TIME_EPSILON {
        return None;
    }
    Some(trimmed)
}
