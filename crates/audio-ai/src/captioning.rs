//! Caption generation from a clip's audio.
//!
//! Extraction and inference run on the blocking pool. The store is only
//! touched once a transcript is in hand, so a failed run leaves the existing
//! captions exactly as they were.

use std::path::{Path, PathBuf};

use montage_common::error::{MontageError, MontageResult};
use montage_project_model::{Caption, Clip, MediaKind};
use montage_timeline_core::{TimelineState, TimelineStore};

use crate::transcription::{
    extract_audio, refine_chunks, TranscriptChunk, TranscriptionCallback, TranscriptionEngine,
};

/// Clip to transcribe when none is named: the earliest video with an audio
/// stream, otherwise the earliest audio clip.
pub fn pick_transcription_clip(state: &TimelineState) -> Option<&Clip> {
    let earliest = |kind: MediaKind| {
        state
            .clips
            .iter()
            .filter(|c| c.has_audio() && c.media().is_some_and(|m| m.kind == kind))
            .min_by(|a, b| a.start.total_cmp(&b.start))
    };
    earliest(MediaKind::Video).or_else(|| earliest(MediaKind::Audio))
}

/// Map chunks timed against the clip's audio onto the timeline.
///
/// Chunks are shifted by the clip start and clipped to the clip's extent.
/// Chunks with no text or no remaining duration are dropped.
pub fn captions_from_chunks(
    chunks: &[TranscriptChunk],
    clip: &Clip,
    mut next_id: impl FnMut() -> String,
) -> Vec<Caption> {
    let mut captions = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        let text = chunk.text.trim();
        if text.is_empty() {
            continue;
        }
        let start = clip.start + chunk.start_secs.clamp(0.0, clip.duration);
        let end = clip.start + chunk.end_secs.clamp(0.0, clip.duration);
        if end <= start {
            continue;
        }
        captions.push(Caption {
            id: next_id(),
            start,
            end,
            text: text.to_string(),
            source_clip_id: Some(clip.id.clone()),
        });
    }
    captions
}

/// Run the engine over already-decoded samples off the async runtime.
pub async fn transcribe_samples(
    samples: Vec<f32>,
    mut engine: Box<dyn TranscriptionEngine>,
    progress: Option<TranscriptionCallback>,
) -> MontageResult<Vec<TranscriptChunk>> {
    tokio::task::spawn_blocking(move || {
        tracing::debug!(engine = engine.name(), samples = samples.len(), "Transcribing");
        let chunks = engine.transcribe(&samples, progress.as_ref())?;
        Ok(refine_chunks(&chunks))
    })
    .await
    .map_err(|e| MontageError::transcription(format!("Transcription task failed: {e}")))?
}

/// Extract and transcribe the audio under `clip`'s source window.
pub async fn transcribe_clip(
    clip: &Clip,
    source_path: PathBuf,
    engine: Box<dyn TranscriptionEngine>,
    progress: Option<TranscriptionCallback>,
) -> MontageResult<Vec<TranscriptChunk>> {
    if !clip.has_audio() {
        return Err(MontageError::transcription(format!(
            "Clip {} has no audio",
            clip.id
        )));
    }

    let (offset, duration) = (clip.source_offset, clip.duration);
    let samples = tokio::task::spawn_blocking(move || extract_audio(&source_path, offset, duration))
        .await
        .map_err(|e| MontageError::transcription(format!("Audio extraction task failed: {e}")))??;
    if samples.is_empty() {
        return Err(MontageError::transcription("Extracted audio is empty"));
    }

    transcribe_samples(samples, engine, progress).await
}

/// Replace the store's captions with a transcript of `clip_id` and turn
/// captions on. Returns the number of captions written.
pub fn apply_transcript(
    store: &mut TimelineStore,
    clip_id: &str,
    chunks: &[TranscriptChunk],
) -> MontageResult<usize> {
    let clip = store
        .state()
        .clip(clip_id)
        .cloned()
        .ok_or_else(|| MontageError::transcription(format!("Clip {clip_id} no longer exists")))?;

    let captions = captions_from_chunks(chunks, &clip, || store.next_id("caption"));
    let count = captions.len();
    let captions_store = store.captions_mut();
    captions_store.set_captions(captions);
    captions_store.set_enabled(true);
    Ok(count)
}

/// Transcribe a clip (or the default pick) and install the result.
pub async fn generate_captions(
    store: &mut TimelineStore,
    clip_id: Option<&str>,
    source_root: &Path,
    engine: Box<dyn TranscriptionEngine>,
    progress: Option<TranscriptionCallback>,
) -> MontageResult<usize> {
    let clip = match clip_id {
        Some(id) => store.state().clip(id),
        None => pick_transcription_clip(store.state()),
    }
    .cloned()
    .ok_or_else(|| MontageError::transcription("No clip with audio to transcribe"))?;

    let source = clip
        .media()
        .map(|m| m.source.clone())
        .ok_or_else(|| MontageError::transcription(format!("Clip {} is not media", clip.id)))?;
    let source_path = {
        let path = Path::new(&source);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            source_root.join(path)
        }
    };

    tracing::info!(clip = %clip.id, source = %source_path.display(), "Generating captions");
    let chunks = transcribe_clip(&clip, source_path, engine, progress).await?;
    let count = apply_transcript(store, &clip.id, &chunks)?;
    tracing::info!(clip = %clip.id, captions = count, "Captions generated");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use montage_common::config::EditorDefaults;
    use montage_common::ids::SequentialIds;
    use montage_project_model::{ClipContent, MediaSource};
    use montage_timeline_core::NewClip;

    use super::*;
    use crate::transcription::TranscriptionProgress;

    fn media(kind: MediaKind, source: &str, duration: f64, has_audio: bool) -> NewClip {
        NewClip {
            track_id: None,
            start: 0.0,
            duration,
            source_offset: 0.0,
            content: ClipContent::Media(MediaSource {
                kind,
                source: source.to_string(),
                display_name: source.to_string(),
                natural_width: None,
                natural_height: None,
                source_duration: None,
                has_audio,
            }),
        }
    }

    fn chunk(start: f64, end: f64, text: &str) -> TranscriptChunk {
        TranscriptChunk {
            start_secs: start,
            end_secs: end,
            text: text.to_string(),
        }
    }

    fn new_store() -> TimelineStore {
        TimelineStore::new(Box::new(SequentialIds::new()), EditorDefaults::default())
    }

    struct FakeEngine {
        result: MontageResult<Vec<TranscriptChunk>>,
    }

    impl TranscriptionEngine for FakeEngine {
        fn transcribe(
            &mut self,
            _samples: &[f32],
            progress: Option<&TranscriptionCallback>,
        ) -> MontageResult<Vec<TranscriptChunk>> {
            if let Some(cb) = progress {
                cb(TranscriptionProgress::Downloading { fraction: 1.0 });
                cb(TranscriptionProgress::Loading);
                cb(TranscriptionProgress::Transcribing);
            }
            match &self.result {
                Ok(chunks) => Ok(chunks.clone()),
                Err(err) => Err(MontageError::transcription(err.to_string())),
            }
        }

        fn name(&self) -> &str {
            "fake"
        }
    }

    #[test]
    fn test_chunks_offset_and_clamped_to_clip() {
        let mut store = new_store();
        store.add_clip(media(MediaKind::Video, "a.mp4", 3.0, true)).unwrap();
        let id = store.add_clip(media(MediaKind::Video, "b.mp4", 4.0, true)).unwrap();
        let clip = store.state().clip(&id).unwrap().clone();

        let mut n = 0;
        let captions = captions_from_chunks(
            &[
                chunk(0.5, 1.5, " hello "),
                chunk(2.0, 2.5, "   "),
                chunk(3.5, 9.0, "tail"),
                chunk(5.0, 6.0, "past the end"),
            ],
            &clip,
            || {
                n += 1;
                format!("c{n}")
            },
        );

        assert_eq!(captions.len(), 2);
        assert_eq!(captions[0].text, "hello");
        assert!((captions[0].start - 3.5).abs() < 1e-9);
        assert!((captions[0].end - 4.5).abs() < 1e-9);
        assert!((captions[1].start - 6.5).abs() < 1e-9);
        assert!((captions[1].end - 7.0).abs() < 1e-9);
        assert_eq!(captions[1].source_clip_id.as_deref(), Some(id.as_str()));
    }

    #[test]
    fn test_pick_prefers_video_with_audio() {
        let mut store = new_store();
        store.add_clip(media(MediaKind::Video, "silent.mp4", 2.0, false)).unwrap();
        let voice = store.add_clip(media(MediaKind::Audio, "voice.wav", 2.0, true)).unwrap();
        assert_eq!(pick_transcription_clip(store.state()).unwrap().id, voice);

        let talk = store.add_clip(media(MediaKind::Video, "talk.mp4", 2.0, true)).unwrap();
        assert_eq!(pick_transcription_clip(store.state()).unwrap().id, talk);
    }

    #[test]
    fn test_apply_transcript_enables_captions() {
        let mut store = new_store();
        let id = store.add_clip(media(MediaKind::Video, "a.mp4", 5.0, true)).unwrap();
        store.captions_mut().clear("Clip deleted");

        let count = apply_transcript(&mut store, &id, &[chunk(0.0, 1.0, "hi")]).unwrap();

        assert_eq!(count, 1);
        assert!(store.captions().is_enabled());
        assert!(store.captions().last_invalidated().is_none());
        assert_eq!(store.captions().captions()[0].text, "hi");
    }

    #[test]
    fn test_apply_transcript_for_missing_clip_fails() {
        let mut store = new_store();
        assert!(apply_transcript(&mut store, "clip-404", &[chunk(0.0, 1.0, "hi")]).is_err());
        assert!(store.captions().captions().is_empty());
    }

    #[tokio::test]
    async fn test_transcribe_samples_refines_and_reports() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let progress: TranscriptionCallback =
            Box::new(move |p: TranscriptionProgress| sink.lock().unwrap().push(p));
        let engine = FakeEngine {
            result: Ok(vec![chunk(0.0, 4.0, "one two three four")]),
        };

        let chunks = transcribe_samples(vec![0.0; 160], Box::new(engine), Some(progress))
            .await
            .unwrap();

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].text, "three four");
        assert_eq!(
            seen.lock().unwrap().last(),
            Some(&TranscriptionProgress::Transcribing)
        );
    }

    #[tokio::test]
    async fn test_engine_failure_propagates() {
        let engine = FakeEngine {
            result: Err(MontageError::transcription("model crashed")),
        };
        let err = transcribe_samples(vec![0.0; 16], Box::new(engine), None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("model crashed"));
    }

    #[tokio::test]
    async fn test_failed_generation_leaves_captions_untouched() {
        let mut store = new_store();
        let id = store.add_clip(media(MediaKind::Video, "missing.mp4", 5.0, true)).unwrap();
        apply_transcript(&mut store, &id, &[chunk(0.0, 1.0, "keep me")]).unwrap();
        let before = store.captions().snapshot();

        let engine = FakeEngine { result: Ok(vec![]) };
        let result = generate_captions(
            &mut store,
            None,
            Path::new("/definitely/not/here"),
            Box::new(engine),
            None,
        )
        .await;

        assert!(matches!(result, Err(MontageError::FileNotFound { .. })));
        assert_eq!(store.captions().captions(), before.captions.as_slice());
        assert!(store.captions().is_enabled());
    }

    #[tokio::test]
    async fn test_generation_without_audio_clip_fails() {
        let mut store = new_store();
        store.add_clip(media(MediaKind::Image, "logo.png", 5.0, false)).unwrap();
        let engine = FakeEngine { result: Ok(vec![]) };
        let result =
            generate_captions(&mut store, None, Path::new("/tmp"), Box::new(engine), None).await;
        assert!(result.is_err());
    }
}
