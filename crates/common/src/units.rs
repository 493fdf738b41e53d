//! Conversions between timeline pixels and seconds.

/// Tolerance used when comparing timeline positions.
pub const TIME_EPSILON: f64 = 1e-6;

/// Convert a horizontal pixel offset to seconds at `scale` px/sec.
pub fn px_to_secs(px: f64, scale: f64) -> f64 {
    if scale <= 0.0 {
        return 0.0;
    }
    px / scale
}

/// Convert seconds to a horizontal pixel offset at `scale` px/sec.
pub fn secs_to_px(secs: f64, scale: f64) -> f64 {
    secs * scale
}

/// Time range `[start, end]` visible in a scrolled timeline viewport.
pub fn visible_window(scroll_px: f64, viewport_px: f64, scale: f64) -> (f64, f64) {
    let start = px_to_secs(scroll_px.max(0.0), scale);
    let end = start + px_to_secs(viewport_px.max(0.0), scale);
    (start, end)
}
