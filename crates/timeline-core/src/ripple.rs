//! Ripple repacking for magnetic tracks.
//!
//! A magnetic track holds its clips back to back from time zero. After any
//! structural edit the track is repacked: clips are taken in order and each
//! start is set to the running total of the durations before it.

use std::collections::HashMap;

use montage_common::units::TIME_EPSILON;
use montage_project_model::Clip;

/// Repack the clips of `track_id` in ascending start order.
///
/// The sort is stable, so clips that share a start keep their relative
/// order. Clips on other tracks are returned untouched, and the overall
/// order of the list is preserved. Repacking a packed track is a no-op.
pub fn repack_track(clips: &[Clip], track_id: &str) -> Vec<Clip> {
    let mut order: Vec<&Clip> = clips.iter().filter(|c| c.track_id == track_id).collect();
    order.sort_by(|a, b| a.start.total_cmp(&b.start));
    let ids: Vec<&str> = order.iter().map(|c| c.id.as_str()).collect();
    pack_in_order(clips, &ids)
}

/// Assign contiguous starts from zero to the clips named in `ordered_ids`,
/// in that order. Clips not named are left as they are.
pub fn pack_in_order(clips: &[Clip], ordered_ids: &[&str]) -> Vec<Clip> {
    let durations: HashMap<&str, f64> = clips
        .iter()
        .map(|c| (c.id.as_str(), c.duration))
        .collect();

    let mut starts: HashMap<&str, f64> = HashMap::with_capacity(ordered_ids.len());
    let mut running = 0.0;
    for id in ordered_ids {
        if let Some(duration) = durations.get(id) {
            starts.insert(*id, running);
            running += duration;
        }
    }

    clips
        .iter()
        .map(|clip| match starts.get(clip.id.as_str()) {
            Some(&start) => Clip {
                start,
                ..clip.clone()
            },
            None => clip.clone(),
        })
        .collect()
}

/// End of the last clip on a track, or 0 when the track is empty.
pub fn track_end(clips: &[Clip], track_id: &str) -> f64 {
    clips
        .iter()
        .filter(|c| c.track_id == track_id)
        .map(Clip::end)
        .fold(0.0, f64::max)
}

/// Whether the clips of `track_id` start at zero and touch end to start.
pub fn is_contiguous(clips: &[Clip], track_id: &str) -> bool {
    let mut track: Vec<&Clip> = clips.iter().filter(|c| c.track_id == track_id).collect();
    track.sort_by(|a, b| a.start.total_cmp(&b.start));

    let mut expected = 0.0;
    for clip in track {
        if (clip.start - expected).abs() > TIME_EPSILON {
            return false;
        }
        expected = clip.end();
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use montage_project_model::{ClipContent, MediaKind, MediaSource};
    use proptest::prelude::*;

    fn clip(id: &str, track: &str, start: f64, duration: f64) -> Clip {
        Clip {
            id: id.to_string(),
            track_id: track.to_string(),
            start,
            duration,
            source_offset: 0.0,
            content: ClipContent::Media(MediaSource {
                kind: MediaKind::Video,
                source: format!("{id}.mp4"),
                display_name: id.to_string(),
                natural_width: None,
                natural_height: None,
                source_duration: None,
                has_audio: false,
            }),
        }
    }

    #[test]
    fn test_repack_closes_gaps() {
        let clips = vec![
            clip("a", "v", 0.0, 2.0),
            clip("b", "v", 5.0, 3.0),
            clip("c", "v", 10.0, 1.0),
        ];
        let packed = repack_track(&clips, "v");
        let starts: Vec<f64> = packed.iter().map(|c| c.start).collect();
        assert_eq!(starts, vec![0.0, 2.0, 5.0]);
        assert!(is_contiguous(&packed, "v"));
    }

    #[test]
    fn test_repack_sorts_by_start() {
        let clips = vec![clip("late", "v", 9.0, 1.0), clip("early", "v", 1.0, 4.0)];
        let packed = repack_track(&clips, "v");
        assert_eq!(packed[0].id, "late");
        assert!((packed[0].start - 4.0).abs() < 1e-9);
        assert!((packed[1].start - 0.0).abs() < 1e-9);
    }

    #[test]
    fn test_repack_leaves_other_tracks() {
        let clips = vec![clip("a", "v", 3.0, 2.0), clip("t", "text", 7.0, 1.0)];
        let packed = repack_track(&clips, "v");
        assert!((packed[0].start - 0.0).abs() < 1e-9);
        assert!((packed[1].start - 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_repack_is_stable_for_equal_starts() {
        let clips = vec![clip("first", "v", 0.0, 1.0), clip("second", "v", 0.0, 2.0)];
        let packed = repack_track(&clips, "v");
        assert!((packed[0].start - 0.0).abs() < 1e-9);
        assert!((packed[1].start - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_pack_in_explicit_order() {
        let clips = vec![
            clip("a", "v", 0.0, 2.0),
            clip("b", "v", 2.0, 3.0),
            clip("c", "v", 5.0, 4.0),
        ];
        let packed = pack_in_order(&clips, &["c", "a", "b"]);
        assert!((packed[2].start - 0.0).abs() < 1e-9);
        assert!((packed[0].start - 4.0).abs() < 1e-9);
        assert!((packed[1].start - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_track_end() {
        let clips = vec![clip("a", "v", 0.0, 2.0), clip("b", "v", 2.0, 3.0)];
        assert!((track_end(&clips, "v") - 5.0).abs() < 1e-9);
        assert_eq!(track_end(&clips, "other"), 0.0);
    }

    #[test]
    fn test_empty_track_is_contiguous() {
        assert!(is_contiguous(&[], "v"));
    }

    proptest! {
        #[test]
        fn prop_repack_is_idempotent_and_contiguous(
            spans in prop::collection::vec((0.0f64..100.0, 0.1f64..20.0), 0..20)
        ) {
            let clips: Vec<Clip> = spans
                .iter()
                .enumerate()
                .map(|(i, (start, duration))| clip(&format!("c{i}"), "v", *start, *duration))
                .collect();

            let once = repack_track(&clips, "v");
            let twice = repack_track(&once, "v");

            prop_assert!(is_contiguous(&once, "v"));
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_repack_preserves_durations(
            spans in prop::collection::vec((0.0f64..100.0, 0.1f64..20.0), 1..20)
        ) {
            let clips: Vec<Clip> = spans
                .iter()
                .enumerate()
                .map(|(i, (start, duration))| clip(&format!("c{i}"), "v", *start, *duration))
                .collect();
            let packed = repack_track(&clips, "v");
            let total: f64 = clips.iter().map(|c| c.duration).sum();
            prop_assert!((track_end(&packed, "v") - total).abs() < 1e-6);
            for (before, after) in clips.iter().zip(packed.iter()) {
                prop_assert_eq!(&before.id, &after.id);
                prop_assert_eq!(before.duration, after.duration);
            }
        }
    }
}
