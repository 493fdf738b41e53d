use montage_common::config::EditorDefaults;
use montage_common::ids::SequentialIds;
use montage_project_model::{
    Caption, ClipContent, ClipPatch, MediaKind, MediaSource, TextStyle, TrackKind,
};
use montage_timeline_core::ripple::is_contiguous;
use montage_timeline_core::{NewClip, TimelineStore, TrimSide};

fn new_store() -> TimelineStore {
    TimelineStore::new(Box::new(SequentialIds::new()), EditorDefaults::default())
}

fn video(duration: f64) -> NewClip {
    NewClip {
        track_id: None,
        start: 0.0,
        duration,
        source_offset: 0.0,
        content: ClipContent::Media(MediaSource {
            kind: MediaKind::Video,
            source: "/media/take.mp4".to_string(),
            display_name: "take.mp4".to_string(),
            natural_width: Some(1920),
            natural_height: Some(1080),
            source_duration: None,
            has_audio: true,
        }),
    }
}

fn media_track(store: &TimelineStore) -> String {
    store
        .state()
        .tracks
        .iter()
        .find(|t| t.kind == TrackKind::Video)
        .map(|t| t.id.clone())
        .unwrap()
}

fn seed_captions(store: &mut TimelineStore) {
    store.captions_mut().set_captions(vec![Caption {
        id: "cap-1".to_string(),
        start: 0.5,
        end: 1.5,
        text: "hello there".to_string(),
        source_clip_id: None,
    }]);
}

#[test]
fn scenario_a_add_then_delete_restores_single_clip() {
    let mut store = new_store();
    let first = store.add_clip(video(5.0)).unwrap();
    let second = store.add_clip(video(3.0)).unwrap();
    assert!((store.state().clip(&second).unwrap().start - 5.0).abs() < 1e-9);

    assert!(store.delete_clip(&second).is_applied());

    let clip = store.state().clip(&first).unwrap();
    assert_eq!(clip.start, 0.0);
    assert!((store.total_duration() - 5.0).abs() < 1e-9);
}

#[test]
fn scenario_b_three_appends_pack_contiguously() {
    let mut store = new_store();
    for duration in [2.0, 3.0, 4.0] {
        store.add_clip(video(duration)).unwrap();
    }
    let track = media_track(&store);
    let starts: Vec<f64> = store
        .state()
        .clips_on_track(&track)
        .iter()
        .map(|c| c.start)
        .collect();
    assert_eq!(starts, vec![0.0, 2.0, 5.0]);
    assert!((store.total_duration() - 9.0).abs() < 1e-9);
}

#[test]
fn scenario_c_cut_splits_source_offsets() {
    let mut store = new_store();
    let id = store.add_clip(video(5.0)).unwrap();
    assert!(store.cut_clip(&id, 2.0).is_applied());

    let track = media_track(&store);
    let clips = store.state().clips_on_track(&track);
    assert_eq!(clips.len(), 2);

    assert_eq!(clips[0].id, id);
    assert_eq!(
        (clips[0].start, clips[0].duration, clips[0].source_offset),
        (0.0, 2.0, 0.0)
    );
    assert_eq!(
        (clips[1].start, clips[1].duration, clips[1].source_offset),
        (2.0, 3.0, 2.0)
    );
}

#[test]
fn split_round_trip_preserves_span() {
    let mut store = new_store();
    store.add_clip(video(1.5)).unwrap();
    let mut long = video(7.25);
    long.source_offset = 3.0;
    let id = store.add_clip(long).unwrap();

    assert!(store.cut_clip(&id, 1.5 + 4.0).is_applied());
    let track = media_track(&store);
    let clips = store.state().clips_on_track(&track);
    let (left, right) = (clips[1], clips[2]);

    assert!((left.duration + right.duration - 7.25).abs() < 1e-9);
    assert!((left.source_offset - 3.0).abs() < 1e-9);
    assert!((right.source_offset - 7.0).abs() < 1e-9);
    assert!((left.start - 1.5).abs() < 1e-9);
    assert!((right.end() - 8.75).abs() < 1e-9);
}

#[test]
fn timing_edits_invalidate_captions() {
    let mut store = new_store();
    let a = store.add_clip(video(4.0)).unwrap();
    store.add_clip(video(4.0)).unwrap();
    let track = media_track(&store);

    seed_captions(&mut store);
    store.reorder_clips(&track, 0, 1);
    assert!(store.captions().captions().is_empty());
    assert_eq!(
        store.captions().last_invalidated().unwrap().reason,
        "Clips reordered"
    );

    seed_captions(&mut store);
    store.trim_clip(&a, TrimSide::End, -1.0);
    assert!(store.captions().captions().is_empty());

    seed_captions(&mut store);
    store.cut_clip(&a, store.state().clip(&a).unwrap().start + 1.0);
    assert!(store.captions().captions().is_empty());

    seed_captions(&mut store);
    store.delete_clip(&a);
    assert!(store.captions().captions().is_empty());

    seed_captions(&mut store);
    store.add_clip(video(1.0));
    assert!(store.captions().captions().is_empty());
}

#[test]
fn non_timing_edits_keep_captions() {
    let mut store = new_store();
    let id = store.add_clip(video(4.0)).unwrap();
    store.add_track("Titles", TrackKind::Text);
    let title = store
        .add_clip(NewClip {
            track_id: None,
            start: 1.0,
            duration: 2.0,
            source_offset: 0.0,
            content: ClipContent::Text(montage_project_model::TextContent {
                text: "Intro".to_string(),
                style: TextStyle::default(),
            }),
        })
        .unwrap();
    seed_captions(&mut store);

    store.update_clip(
        &id,
        &ClipPatch {
            display_name: Some("renamed.mp4".to_string()),
            ..Default::default()
        },
    );
    store.update_clip(
        &title,
        &ClipPatch {
            style: Some(TextStyle {
                color: "#ff0000".to_string(),
                ..TextStyle::default()
            }),
            ..Default::default()
        },
    );
    store.captions_mut().set_enabled(true);
    store.set_current_time(2.0);

    assert_eq!(store.captions().captions().len(), 1);
    assert!(store.captions().last_invalidated().is_none());
}

#[test]
fn failed_edits_leave_captions_alone() {
    let mut store = new_store();
    let id = store.add_clip(video(4.0)).unwrap();
    seed_captions(&mut store);

    store.cut_clip(&id, 9.0);
    store.trim_clip(&id, TrimSide::Start, -2.0);
    store.delete_clip("missing");

    assert_eq!(store.captions().captions().len(), 1);
}

#[test]
fn mixed_session_keeps_every_magnetic_track_packed() {
    let mut store = new_store();
    let audio_track = store.add_track("Voice", TrackKind::Audio);

    let a = store.add_clip(video(3.0)).unwrap();
    let b = store.add_clip(video(2.0)).unwrap();
    let mut voice = video(6.0);
    voice.content = ClipContent::Media(MediaSource {
        kind: MediaKind::Audio,
        source: "/media/voice.wav".to_string(),
        display_name: "voice.wav".to_string(),
        natural_width: None,
        natural_height: None,
        source_duration: Some(6.0),
        has_audio: true,
    });
    let v = store.add_clip(voice).unwrap();
    assert_eq!(store.state().clip(&v).unwrap().track_id, audio_track);

    store.cut_clip(&a, 1.0);
    store.trim_clip(&b, TrimSide::Start, 0.5);
    store.cut_clip(&v, 2.0);
    store.reorder_clips(&audio_track, 1, 0);

    let video_track = media_track(&store);
    assert!(is_contiguous(&store.state().clips, &video_track));
    assert!(is_contiguous(&store.state().clips, &audio_track));
    assert!((store.total_duration() - 6.0).abs() < 1e-9);
}
