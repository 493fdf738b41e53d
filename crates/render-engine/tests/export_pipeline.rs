use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use montage_common::config::EditorDefaults;
use montage_common::error::{MontageError, MontageResult};
use montage_common::ids::SequentialIds;
use montage_project_model::{
    CanvasSettings, ClipContent, ExportConfig, MediaKind, MediaSource, NormalizedRect,
};
use montage_render_engine::{
    build_filter_graph, export_with_backend, zoom_boundaries, ExportJob, ExportPlan,
    ExportProgress, ExportStage, ProgressCallback, RenderBackend,
};
use montage_timeline_core::{NewClip, TimelineStore};

fn video(source: &str, duration: f64) -> NewClip {
    NewClip {
        track_id: None,
        start: 0.0,
        duration,
        source_offset: 0.0,
        content: ClipContent::Media(MediaSource {
            kind: MediaKind::Video,
            source: source.to_string(),
            display_name: source.to_string(),
            natural_width: Some(1920),
            natural_height: Some(1080),
            source_duration: None,
            has_audio: true,
        }),
    }
}

fn new_store() -> TimelineStore {
    TimelineStore::new(Box::new(SequentialIds::new()), EditorDefaults::default())
}

fn job(store: &TimelineStore, output: PathBuf) -> ExportJob {
    ExportJob {
        output_path: output,
        source_root: PathBuf::from("/project"),
        canvas: CanvasSettings::new(1280, 720, 30),
        config: ExportConfig::default(),
        timeline: store.snapshot(),
        captions: store.captions().snapshot(),
    }
}

fn temp_output(name: &str) -> PathBuf {
    std::env::temp_dir()
        .join(format!("montage-export-{}", uuid::Uuid::new_v4()))
        .join(name)
}

/// Ten seconds of video with one zoom effect at [3, 5).
fn zoomed_store() -> TimelineStore {
    let mut store = new_store();
    store.add_clip(video("a.mp4", 6.0)).unwrap();
    store.add_clip(video("b.mp4", 4.0)).unwrap();
    store.set_current_time(3.0);
    let zoom = store.add_zoom_effect(None).unwrap();
    assert!(store.update_zoom_timing(&zoom, 3.0, 2.0).is_applied());
    assert!(store
        .set_zoom_rect(&zoom, NormalizedRect::new(0.2, 0.3, 0.5, 0.5))
        .is_applied());
    store
}

struct FakeBackend {
    calls: Arc<AtomicUsize>,
    fail: bool,
    seen_graph: Arc<Mutex<Option<String>>>,
}

impl FakeBackend {
    fn new(fail: bool) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                calls: calls.clone(),
                fail,
                seen_graph: Arc::new(Mutex::new(None)),
            },
            calls,
        )
    }
}

impl RenderBackend for FakeBackend {
    fn render(
        &mut self,
        plan: &ExportPlan,
        progress: Option<&ProgressCallback>,
    ) -> MontageResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.seen_graph.lock().unwrap() = Some(plan.graph.to_filter_complex());
        std::fs::write(&plan.output_path, b"partial")?;
        if self.fail {
            return Err(MontageError::export("encoder crashed"));
        }
        if let Some(cb) = progress {
            cb(ExportProgress {
                progress: 1.0,
                frames_rendered: plan.total_frames,
                total_frames: plan.total_frames,
                eta_secs: 0.0,
                stage: ExportStage::Complete,
            });
        }
        Ok(())
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "fake"
    }
}

#[test]
fn scenario_d_one_effect_gives_three_segments() {
    let store = zoomed_store();
    assert!((store.total_duration() - 10.0).abs() < 1e-9);

    let effects = store.state().zoom_effects.as_ref().clone();
    assert_eq!(zoom_boundaries(&effects, 10.0), vec![0.0, 3.0, 5.0, 10.0]);

    let graph = build_filter_graph(&job(&store, PathBuf::from("out.mp4"))).unwrap();
    assert_eq!(graph.segments.len(), 3);

    let filter = graph.to_filter_complex();
    assert!(filter.contains("split=3[seg0][seg1][seg2]"));
    assert!(filter.contains("[seg0]trim=start=0.000000:end=3.000000,setpts=PTS-STARTPTS[z0]"));
    assert!(filter.contains(
        "[seg1]trim=start=3.000000:end=5.000000,setpts=PTS-STARTPTS,\
         crop=w=iw*0.500000:h=ih*0.500000:x=iw*0.200000:y=ih*0.300000"
    ));
    assert!(filter.contains("[seg2]trim=start=5.000000:end=10.000000,setpts=PTS-STARTPTS[z2]"));
    assert!(filter.contains("[z0][z1][z2]concat=n=3:v=1:a=0,format=yuv420p[vout]"));
}

#[test]
fn magnetic_clips_overlay_at_their_packed_starts() {
    let store = zoomed_store();
    let graph = build_filter_graph(&job(&store, PathBuf::from("out.mp4"))).unwrap();
    let filter = graph.to_filter_complex();

    assert_eq!(graph.inputs.len(), 2);
    assert!(filter.contains("setpts=PTS-STARTPTS+6.000000/TB"));
    assert!(filter.contains("enable='gte(t,6.000000)*lt(t,10.000000)'"));
    assert!(filter.contains("adelay=6000:all=1[a1]"));
    assert!(filter.contains("[a0][a1]amix=inputs=2:duration=longest:normalize=0"));
}

#[test]
fn hidden_zoom_track_exports_without_crop() {
    let mut store = zoomed_store();
    let zoom_track = store.state().zoom_effects[0].track_id.clone();
    let patch = montage_project_model::TrackPatch {
        visible: Some(false),
        ..Default::default()
    };
    assert!(store.update_track(&zoom_track, &patch).is_applied());

    let graph = build_filter_graph(&job(&store, PathBuf::from("out.mp4"))).unwrap();
    assert_eq!(graph.segments.len(), 1);
    assert!(!graph.to_filter_complex().contains("crop="));
}

#[tokio::test]
async fn empty_timeline_fails_before_backend() {
    let store = new_store();
    let (backend, calls) = FakeBackend::new(false);

    let result = export_with_backend(job(&store, temp_output("out.mp4")), Box::new(backend), None)
        .await;

    assert!(matches!(result, Err(MontageError::EmptyTimeline)));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn successful_export_reports_progress() {
    let store = zoomed_store();
    let output = temp_output("ok.mp4");
    let (backend, calls) = FakeBackend::new(false);
    let stages = Arc::new(Mutex::new(Vec::new()));
    let sink = stages.clone();
    let progress: ProgressCallback = Box::new(move |p: ExportProgress| {
        sink.lock().unwrap().push(p.stage);
    });

    let path = export_with_backend(job(&store, output.clone()), Box::new(backend), Some(progress))
        .await
        .unwrap();

    assert_eq!(path, output);
    assert!(output.exists());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let stages = stages.lock().unwrap();
    assert_eq!(stages.first(), Some(&ExportStage::Preparing));
    assert_eq!(stages.last(), Some(&ExportStage::Complete));

    let _ = std::fs::remove_dir_all(output.parent().unwrap());
}

#[tokio::test]
async fn failed_export_removes_partial_output() {
    let store = zoomed_store();
    let before = store.snapshot();
    let output = temp_output("broken.mp4");
    let (backend, calls) = FakeBackend::new(true);
    let stages = Arc::new(Mutex::new(Vec::new()));
    let sink = stages.clone();
    let progress: ProgressCallback = Box::new(move |p: ExportProgress| {
        sink.lock().unwrap().push(p.stage);
    });

    let result =
        export_with_backend(job(&store, output.clone()), Box::new(backend), Some(progress)).await;

    assert!(result.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(!output.exists());
    assert_eq!(stages.lock().unwrap().last(), Some(&ExportStage::Failed));
    assert_eq!(store.state().clips, before.clips);

    let _ = std::fs::remove_dir_all(output.parent().unwrap());
}
