//! Normalized rectangle and point types for zoom framing.
//!
//! All coordinates are normalized to `[0.0, 1.0]` range.

use serde::{Deserialize, Serialize};

/// Smallest side a zoom rectangle may shrink to.
pub const MIN_RECT_SIDE: f64 = 0.1;

/// A rectangular region of the output frame.
///
/// Coordinates are normalized: `(0.0, 0.0)` is top-left,
/// `(1.0, 1.0)` is bottom-right of the frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRect {
    /// Left edge (normalized).
    pub x: f64,
    /// Top edge (normalized).
    pub y: f64,
    /// Width (normalized).
    pub width: f64,
    /// Height (normalized).
    pub height: f64,
}

impl NormalizedRect {
    /// Full-frame rectangle (no zoom).
    pub const FULL: NormalizedRect = NormalizedRect {
        x: 0.0,
        y: 0.0,
        width: 1.0,
        height: 1.0,
    };

    /// Create a new rectangle, clamped so it stays inside the frame.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
        .clamped()
    }

    /// Clamp size to `[MIN_RECT_SIDE, 1]` and position so that
    /// `x + width <= 1` and `y + height <= 1`.
    pub fn clamped(&self) -> Self {
        let width = self.width.clamp(MIN_RECT_SIDE, 1.0);
        let height = self.height.clamp(MIN_RECT_SIDE, 1.0);
        Self {
            x: self.x.clamp(0.0, 1.0 - width),
            y: self.y.clamp(0.0, 1.0 - height),
            width,
            height,
        }
    }

    /// Square rectangle of side `1/level` centered in the frame.
    pub fn centered_for_level(level: f64) -> Self {
        let side = 1.0 / level.max(1.0);
        Self::new((1.0 - side) / 2.0, (1.0 - side) / 2.0, side, side)
    }

    /// Resize to a square of side `1/level`, keeping the current center.
    pub fn resized_to_level(&self, level: f64) -> Self {
        let side = 1.0 / level.max(1.0);
        Self::new(
            self.x + (self.width - side) / 2.0,
            self.y + (self.height - side) / 2.0,
            side,
            side,
        )
    }

    /// Drag the bottom-right corner to `(mx, my)`, keeping the rectangle
    /// square and anchored at its top-left corner.
    pub fn resized_from_corner(&self, mx: f64, my: f64) -> Self {
        let side = (1.0 - self.x)
            .min(1.0 - self.y)
            .min(mx - self.x)
            .min(my - self.y)
            .max(MIN_RECT_SIDE);
        Self::new(self.x, self.y, side, side)
    }

    /// Move so the rectangle is centered on `(cx, cy)`, clamped to the frame.
    pub fn moved_to_center(&self, cx: f64, cy: f64) -> Self {
        Self::new(
            cx - self.width / 2.0,
            cy - self.height / 2.0,
            self.width,
            self.height,
        )
    }

    /// The center point of this rectangle.
    pub fn center(&self) -> Point2D {
        Point2D::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Right edge.
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge.
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Effective zoom factor (1.0 = no zoom, 2.0 = 200% zoom).
    pub fn zoom_factor(&self) -> f64 {
        1.0 / self.width.min(self.height)
    }

    /// Whether this is (approximately) the full frame.
    pub fn is_full(&self) -> bool {
        (self.x).abs() < 1e-9
            && (self.y).abs() < 1e-9
            && (self.width - 1.0).abs() < 1e-9
            && (self.height - 1.0).abs() < 1e-9
    }

    /// Linearly interpolate between two rectangles, per component.
    pub fn lerp(a: &NormalizedRect, b: &NormalizedRect, t: f64) -> NormalizedRect {
        let t = t.clamp(0.0, 1.0);
        NormalizedRect {
            x: a.x + (b.x - a.x) * t,
            y: a.y + (b.y - a.y) * t,
            width: a.width + (b.width - a.width) * t,
            height: a.height + (b.height - a.height) * t,
        }
    }
}

impl Default for NormalizedRect {
    fn default() -> Self {
        Self::FULL
    }
}

/// A 2D normalized point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Clamp both coordinates into `[0, 1]`.
    pub fn clamped(&self) -> Self {
        Self {
            x: self.x.clamp(0.0, 1.0),
            y: self.y.clamp(0.0, 1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_full_rect() {
        let rect = NormalizedRect::FULL;
        assert_eq!(rect.zoom_factor(), 1.0);
        assert!(rect.is_full());
    }

    #[test]
    fn test_new_clamps_into_frame() {
        let rect = NormalizedRect::new(0.9, 0.8, 0.5, 0.5);
        assert!((rect.x - 0.5).abs() < 1e-9);
        assert!((rect.y - 0.5).abs() < 1e-9);
        assert!(rect.right() <= 1.0 + 1e-12);
    }

    #[test]
    fn test_centered_for_level() {
        let rect = NormalizedRect::centered_for_level(2.0);
        assert!((rect.x - 0.25).abs() < 1e-9);
        assert!((rect.width - 0.5).abs() < 1e-9);
        assert!((rect.zoom_factor() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_resized_to_level_keeps_center() {
        let rect = NormalizedRect::new(0.2, 0.2, 0.5, 0.5);
        let resized = rect.resized_to_level(4.0);
        assert!((resized.width - 0.25).abs() < 1e-9);
        let c = resized.center();
        assert!((c.x - 0.45).abs() < 1e-9);
        assert!((c.y - 0.45).abs() < 1e-9);
    }

    #[test]
    fn test_resized_to_level_clamps_at_edge() {
        let rect = NormalizedRect::new(0.5, 0.5, 0.5, 0.5);
        let resized = rect.resized_to_level(1.0);
        assert_eq!(resized, NormalizedRect::FULL);
    }

    #[test]
    fn test_corner_resize_stays_square() {
        let rect = NormalizedRect::new(0.2, 0.3, 0.4, 0.4);
        let resized = rect.resized_from_corner(0.9, 0.5);
        assert!((resized.width - 0.2).abs() < 1e-9);
        assert!((resized.height - 0.2).abs() < 1e-9);
        assert!((resized.x - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_corner_resize_floor() {
        let rect = NormalizedRect::new(0.2, 0.2, 0.4, 0.4);
        let resized = rect.resized_from_corner(0.0, 0.0);
        assert!((resized.width - MIN_RECT_SIDE).abs() < 1e-9);
    }

    #[test]
    fn test_move_to_center_clamps() {
        let rect = NormalizedRect::new(0.0, 0.0, 0.5, 0.5);
        let moved = rect.moved_to_center(0.95, 0.5);
        assert!((moved.x - 0.5).abs() < 1e-9);
        assert!((moved.y - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_lerp() {
        let a = NormalizedRect::FULL;
        let b = NormalizedRect::new(0.25, 0.25, 0.5, 0.5);
        let mid = NormalizedRect::lerp(&a, &b, 0.5);
        assert!((mid.x - 0.125).abs() < 1e-9);
        assert!((mid.width - 0.75).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn prop_clamped_stays_in_frame(
            x in -2.0f64..2.0,
            y in -2.0f64..2.0,
            w in -1.0f64..3.0,
            h in -1.0f64..3.0,
        ) {
            let rect = NormalizedRect::new(x, y, w, h);
            prop_assert!(rect.x >= 0.0 && rect.y >= 0.0);
            prop_assert!(rect.right() <= 1.0 + 1e-12);
            prop_assert!(rect.bottom() <= 1.0 + 1e-12);
            prop_assert!(rect.width >= MIN_RECT_SIDE && rect.height >= MIN_RECT_SIDE);
        }
    }
}
