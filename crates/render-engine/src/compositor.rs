//! Frame compositor: layers, zoom transform, and caption overlay.
//!
//! Everything here is a pure function of the snapshot passed in. The
//! preview calls [`render_instructions_at`] on every drawn frame, including
//! while a zoom effect is being dragged, so nothing is cached between calls.

use glam::{DAffine2, DVec2};
use montage_common::clock::{frame_time, frames_for_duration};
use montage_project_model::{
    CanvasSettings, ClipContent, MediaKind, NormalizedRect, TextStyle, ZoomEffect,
};
use montage_timeline_core::captions::CaptionState;
use montage_timeline_core::TimelineState;

/// Length of the eased transition at each end of a zoom effect.
pub const ZOOM_RAMP_SECS: f64 = 0.1;

/// Floor for the crop extent when inverting it into a scale factor.
const MIN_CROP_EXTENT: f64 = 1e-4;

/// A single frame's composition instructions.
#[derive(Debug, Clone)]
pub struct FrameComposition {
    /// Frame number.
    pub frame_index: u64,

    /// Time in seconds.
    pub time_secs: f64,

    /// Layers in draw order, bottom first.
    pub layers: Vec<LayerInstruction>,

    /// Crop rectangle after easing. Full frame when no zoom is active.
    pub zoom_rect: NormalizedRect,

    /// Output-pixel transform applied to the whole composite.
    pub transform: DAffine2,

    pub caption: CaptionOverlay,
}

/// What to draw for one clip at one instant.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerInstruction {
    /// Sample a decoded source at `source_time`.
    Media {
        clip_id: String,
        track_id: String,
        kind: MediaKind,
        source: String,
        source_time: f64,
        /// Letterboxed placement in output pixels. `None` for audio.
        placement: Option<PixelRect>,
    },
    /// Draw a string centered on `anchor` (output pixels).
    Text {
        clip_id: String,
        track_id: String,
        text: String,
        style: TextStyle,
        anchor: DVec2,
    },
}

impl LayerInstruction {
    pub fn clip_id(&self) -> &str {
        match self {
            LayerInstruction::Media { clip_id, .. } | LayerInstruction::Text { clip_id, .. } => {
                clip_id
            }
        }
    }
}

/// An axis-aligned rectangle in output pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// The single long-lived caption overlay, evaluated at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionOverlay {
    /// Empty when no caption is visible.
    pub text: String,
    /// 1.0 while a caption is visible, 0.0 otherwise.
    pub opacity: f64,
    /// Vertical center as a fraction of frame height.
    pub anchor_y: f64,
}

/// Cubic ease-in/out on `[0, 1]`.
pub fn ease_in_out_cubic(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

/// Eased strength of `effect` at `t`.
///
/// Ramps up over the first [`ZOOM_RAMP_SECS`] and down over the last;
/// 1.0 in between. Effects shorter than two ramps never reach 1.0.
pub fn zoom_progress(effect: &ZoomEffect, t: f64) -> f64 {
    let entry = (t - effect.start) / ZOOM_RAMP_SECS;
    let exit = (effect.end() - t) / ZOOM_RAMP_SECS;
    ease_in_out_cubic(entry.min(exit).clamp(0.0, 1.0))
}

/// The effect that applies at `t`: the last one in the list whose
/// `[start, start + duration)` contains it.
pub fn active_zoom_effect(effects: &[ZoomEffect], t: f64) -> Option<&ZoomEffect> {
    effects.iter().rev().find(|e| e.contains(t))
}

/// Crop rectangle at `t`, blended from the full frame by the eased progress.
pub fn active_zoom_rect(effects: &[ZoomEffect], t: f64) -> NormalizedRect {
    match active_zoom_effect(effects, t) {
        Some(effect) => {
            NormalizedRect::lerp(&NormalizedRect::FULL, &effect.rect, zoom_progress(effect, t))
        }
        None => NormalizedRect::FULL,
    }
}

/// Affine transform that maps `rect` (normalized) onto the whole frame.
///
/// Translation by `(-x·W, -y·H)` is applied first, then scale by
/// `(1/width, 1/height)`.
pub fn crop_transform(rect: &NormalizedRect, frame_width: f64, frame_height: f64) -> DAffine2 {
    let scale = DVec2::new(
        1.0 / rect.width.max(MIN_CROP_EXTENT),
        1.0 / rect.height.max(MIN_CROP_EXTENT),
    );
    let translate = DVec2::new(-rect.x * frame_width, -rect.y * frame_height);
    DAffine2::from_scale(scale) * DAffine2::from_translation(translate)
}

/// Zoom transform at layer-local time `t`. Identity when no effect matches.
pub fn zoom_transform_at(
    effects: &[ZoomEffect],
    t: f64,
    frame_width: f64,
    frame_height: f64,
) -> DAffine2 {
    if active_zoom_effect(effects, t).is_none() {
        return DAffine2::IDENTITY;
    }
    crop_transform(&active_zoom_rect(effects, t), frame_width, frame_height)
}

/// Largest rectangle with the source's aspect ratio that fits the canvas,
/// centered. Sources of unknown size fill the canvas.
pub fn fit_within(
    natural: Option<(u32, u32)>,
    canvas_width: f64,
    canvas_height: f64,
) -> PixelRect {
    let (width, height) = match natural {
        Some((w, h)) if w > 0 && h > 0 => {
            let scale = (canvas_width / w as f64).min(canvas_height / h as f64);
            (w as f64 * scale, h as f64 * scale)
        }
        _ => (canvas_width, canvas_height),
    };
    PixelRect {
        x: (canvas_width - width) / 2.0,
        y: (canvas_height - height) / 2.0,
        width,
        height,
    }
}

/// Zoom effects on visible tracks, in list order.
fn live_zoom_effects(state: &TimelineState) -> Vec<ZoomEffect> {
    state
        .zoom_effects
        .iter()
        .filter(|e| state.track(&e.track_id).map_or(true, |t| t.visible))
        .cloned()
        .collect()
}

fn layers_at(state: &TimelineState, canvas: &CanvasSettings, t: f64) -> Vec<LayerInstruction> {
    let width = canvas.width as f64;
    let height = canvas.height as f64;
    let mut layers = Vec::new();

    for track in state.tracks.iter().filter(|t| t.visible) {
        for clip in state.clips_on_track(&track.id) {
            if !clip.contains(t) {
                continue;
            }
            let layer = match &clip.content {
                ClipContent::Media(media) => LayerInstruction::Media {
                    clip_id: clip.id.clone(),
                    track_id: track.id.clone(),
                    kind: media.kind,
                    source: media.source.clone(),
                    source_time: clip.source_time_at(t),
                    placement: match media.kind {
                        MediaKind::Audio => None,
                        MediaKind::Video | MediaKind::Image => Some(fit_within(
                            media.natural_width.zip(media.natural_height),
                            width,
                            height,
                        )),
                    },
                },
                ClipContent::Text(text) => LayerInstruction::Text {
                    clip_id: clip.id.clone(),
                    track_id: track.id.clone(),
                    text: text.text.clone(),
                    style: text.style.clone(),
                    anchor: DVec2::new(
                        text.style.position.x * width,
                        text.style.position.y * height,
                    ),
                },
            };
            layers.push(layer);
        }
    }

    layers
}

fn caption_overlay_at(captions: &CaptionState, t: f64) -> CaptionOverlay {
    let visible = if captions.enabled {
        captions.caption_at(t)
    } else {
        None
    };
    CaptionOverlay {
        text: visible.map(|c| c.text.clone()).unwrap_or_default(),
        opacity: if visible.is_some() { 1.0 } else { 0.0 },
        anchor_y: captions.position.anchor_y(),
    }
}

/// Render instructions for the composite at timeline time `t`.
///
/// Tracks draw in list order, so later tracks sit on top. Hidden tracks
/// contribute neither layers nor zoom effects.
pub fn render_instructions_at(
    state: &TimelineState,
    captions: &CaptionState,
    canvas: &CanvasSettings,
    t: f64,
) -> FrameComposition {
    let effects = live_zoom_effects(state);
    let width = canvas.width as f64;
    let height = canvas.height as f64;

    FrameComposition {
        frame_index: (t.max(0.0) * canvas.fps as f64).floor() as u64,
        time_secs: t,
        layers: layers_at(state, canvas, t),
        zoom_rect: active_zoom_rect(&effects, t),
        transform: zoom_transform_at(&effects, t, width, height),
        caption: caption_overlay_at(captions, t),
    }
}

/// Compute the composition for every frame of the timeline.
pub fn compute_compositions(
    state: &TimelineState,
    captions: &CaptionState,
    canvas: &CanvasSettings,
) -> Vec<FrameComposition> {
    let fps = canvas.fps.max(1);
    let total_frames = frames_for_duration(state.total_duration, fps);
    let mut compositions = Vec::with_capacity(total_frames as usize);

    for frame in 0..total_frames {
        let mut composition =
            render_instructions_at(state, captions, canvas, frame_time(frame, fps));
        composition.frame_index = frame;
        compositions.push(composition);
    }

    compositions
}
