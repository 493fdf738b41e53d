//! Frame pacing and frame/second conversions.
//!
//! The playback driver is invoked from the host's animation loop, which may
//! fire far more often than the project frame rate. `FrameTicker` decides
//! which of those callbacks actually publish a new playhead position.

/// Frame rate controller for the playback loop.
#[derive(Debug, Clone)]
pub struct FrameTicker {
    target_interval_secs: f64,
    last_tick_secs: Option<f64>,
}

impl FrameTicker {
    /// Create a ticker targeting the given frame rate.
    pub fn new(fps: u32) -> Self {
        Self {
            target_interval_secs: 1.0 / fps.max(1) as f64,
            last_tick_secs: None,
        }
    }

    /// Check if enough time has passed for the next tick.
    /// Returns true and updates internal state if ready.
    /// The first call always returns true.
    pub fn should_tick(&mut self, now_secs: f64) -> bool {
        match self.last_tick_secs {
            None => {
                self.last_tick_secs = Some(now_secs);
                true
            }
            Some(last) if now_secs >= last + self.target_interval_secs => {
                self.last_tick_secs = Some(now_secs);
                true
            }
            // Host clock went backwards (seek or restart)
            Some(last) if now_secs < last => {
                self.last_tick_secs = Some(now_secs);
                true
            }
            _ => false,
        }
    }

    /// Forget the last tick so the next call fires immediately.
    pub fn reset(&mut self) {
        self.last_tick_secs = None;
    }

    /// Target interval in seconds.
    pub fn interval_secs(&self) -> f64 {
        self.target_interval_secs
    }
}

/// Number of whole frames needed to cover `secs` at `fps`.
pub fn frames_for_duration(secs: f64, fps: u32) -> u64 {
    if secs <= 0.0 || fps == 0 {
        return 0;
    }
    (secs * fps as f64).ceil() as u64
}

/// Timestamp of frame `index` at `fps`.
pub fn frame_time(index: u64, fps: u32) -> f64 {
    if fps == 0 {
        return 0.0;
    }
    index as f64 / fps as f64
}
