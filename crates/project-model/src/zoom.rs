//! Zoom (pan/zoom) effects.

use serde::{Deserialize, Serialize};

use crate::rect::NormalizedRect;

/// Lowest zoom level (no magnification).
pub const MIN_ZOOM_LEVEL: f64 = 1.0;

/// Highest zoom level offered by the level control.
pub const MAX_ZOOM_LEVEL: f64 = 5.0;

/// A timed crop-and-zoom into a sub-rectangle of the frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoomEffect {
    pub id: String,
    pub track_id: String,
    pub start: f64,
    pub duration: f64,
    /// Magnification factor (>= 1).
    pub level: f64,
    /// Source region visible at full zoom.
    pub rect: NormalizedRect,
}

impl ZoomEffect {
    /// End of the effect (exclusive).
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }

    /// Whether `t` falls in `[start, end)`.
    pub fn contains(&self, t: f64) -> bool {
        t >= self.start && t < self.end()
    }

    /// Whether `[start, end)` intersects this effect's interval.
    pub fn overlaps(&self, start: f64, end: f64) -> bool {
        intervals_overlap(self.start, self.end(), start, end)
    }
}

/// Half-open interval intersection test.
pub fn intervals_overlap(a_start: f64, a_end: f64, b_start: f64, b_end: f64) -> bool {
    a_start < b_end && a_end > b_start
}

#[cfg(test)]
mod tests {
    use super::*;

    fn effect(start: f64, duration: f64) -> ZoomEffect {
        ZoomEffect {
            id: "z".to_string(),
            track_id: "zoom".to_string(),
            start,
            duration,
            level: 2.0,
            rect: NormalizedRect::centered_for_level(2.0),
        }
    }

    #[test]
    fn test_contains_is_half_open() {
        let z = effect(3.0, 2.0);
        assert!(z.contains(3.0));
        assert!(z.contains(4.99));
        assert!(!z.contains(5.0));
    }

    #[test]
    fn test_adjacent_effects_do_not_overlap() {
        let z = effect(3.0, 2.0);
        assert!(!z.overlaps(5.0, 6.0));
        assert!(!z.overlaps(1.0, 3.0));
        assert!(z.overlaps(4.0, 6.0));
        assert!(z.overlaps(2.0, 3.5));
        assert!(z.overlaps(3.5, 4.0));
    }
}
