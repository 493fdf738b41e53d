//! Playback clock driver.
//!
//! During playback the compositor owns the clock. The host's animation loop
//! calls [`PlaybackDriver::tick`] on every frame; the driver copies the
//! compositor's time into the store's playhead, at most once per project
//! frame. This is the only high-frequency write to the store and it never
//! triggers a ripple.

use montage_common::clock::FrameTicker;

use crate::store::TimelineStore;

/// Read side of the external compositor's transport.
pub trait PlaybackSource {
    /// Current playback position in timeline seconds.
    fn current_time(&self) -> f64;

    /// Whether the compositor is currently playing.
    fn is_playing(&self) -> bool;
}

/// Copies compositor time into the timeline store.
#[derive(Debug, Clone)]
pub struct PlaybackDriver {
    ticker: FrameTicker,
}

impl PlaybackDriver {
    pub fn new(fps: u32) -> Self {
        Self {
            ticker: FrameTicker::new(fps),
        }
    }

    /// Called from the animation loop with the host's clock in seconds.
    /// Returns true if the playhead was written.
    pub fn tick(
        &mut self,
        now_secs: f64,
        source: &dyn PlaybackSource,
        store: &mut TimelineStore,
    ) -> bool {
        if !store.state().is_playing || !source.is_playing() {
            return false;
        }
        if !self.ticker.should_tick(now_secs) {
            return false;
        }
        store.set_current_time(source.current_time());
        true
    }

    /// Forget pacing state, e.g. after a seek.
    pub fn reset(&mut self) {
        self.ticker.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::NewClip;
    use montage_common::config::EditorDefaults;
    use montage_common::ids::SequentialIds;
    use montage_project_model::{ClipContent, MediaKind, MediaSource};

    struct FakeCompositor {
        time: f64,
        playing: bool,
    }

    impl PlaybackSource for FakeCompositor {
        fn current_time(&self) -> f64 {
            self.time
        }

        fn is_playing(&self) -> bool {
            self.playing
        }
    }

    fn store() -> TimelineStore {
        let mut store =
            TimelineStore::new(Box::new(SequentialIds::new()), EditorDefaults::default());
        store.add_clip(NewClip {
            track_id: None,
            start: 0.0,
            duration: 10.0,
            source_offset: 0.0,
            content: ClipContent::Media(MediaSource {
                kind: MediaKind::Video,
                source: "a.mp4".to_string(),
                display_name: "a.mp4".to_string(),
                natural_width: None,
                natural_height: None,
                source_duration: None,
                has_audio: false,
            }),
        });
        store
    }

    #[test]
    fn test_tick_writes_time_when_playing() {
        let mut store = store();
        let mut driver = PlaybackDriver::new(30);
        let compositor = FakeCompositor {
            time: 3.25,
            playing: true,
        };

        assert!(!driver.tick(0.0, &compositor, &mut store));

        store.set_playing(true);
        assert!(driver.tick(0.0, &compositor, &mut store));
        assert!((store.state().current_time - 3.25).abs() < 1e-9);
    }

    #[test]
    fn test_tick_is_throttled() {
        let mut store = store();
        store.set_playing(true);
        let mut driver = PlaybackDriver::new(10);
        let mut compositor = FakeCompositor {
            time: 1.0,
            playing: true,
        };

        assert!(driver.tick(0.0, &compositor, &mut store));
        compositor.time = 1.05;
        assert!(!driver.tick(0.05, &compositor, &mut store));
        assert!((store.state().current_time - 1.0).abs() < 1e-9);
        assert!(driver.tick(0.1, &compositor, &mut store));
        assert!((store.state().current_time - 1.05).abs() < 1e-9);
    }

    #[test]
    fn test_tick_clamps_to_timeline() {
        let mut store = store();
        store.set_playing(true);
        let mut driver = PlaybackDriver::new(30);
        let compositor = FakeCompositor {
            time: 42.0,
            playing: true,
        };
        driver.tick(0.0, &compositor, &mut store);
        assert!((store.state().current_time - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_paused_compositor_is_ignored() {
        let mut store = store();
        store.set_playing(true);
        let mut driver = PlaybackDriver::new(30);
        let compositor = FakeCompositor {
            time: 5.0,
            playing: false,
        };
        assert!(!driver.tick(0.0, &compositor, &mut store));
        assert_eq!(store.state().current_time, 0.0);
    }
}
