//! Local transcription using Whisper.
//!
//! Runs speech-to-text inference locally (no cloud APIs) by shelling out to
//! the whisper.cpp command-line tool. Input is 16 kHz mono PCM, the format
//! Whisper models are trained on.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use montage_common::config::TranscriptionDefaults;
use montage_common::error::{MontageError, MontageResult};
use serde::{Deserialize, Serialize};

/// Sample rate expected by Whisper models.
pub const SAMPLE_RATE: u32 = 16_000;

/// Chunks with more words than this are split for display.
const MAX_WORDS_PER_CHUNK: usize = 3;

/// Words per refined chunk.
const WORDS_PER_REFINED_CHUNK: usize = 2;

/// Whisper model size selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WhisperModel {
    /// Fastest, least accurate (~39 MB).
    Tiny,
    /// Good balance of speed and accuracy (~142 MB).
    Base,
    /// Better accuracy, slower (~466 MB).
    Small,
    /// High accuracy (~1.5 GB).
    Medium,
    /// Best accuracy, slowest (~2.9 GB).
    Large,
}

impl WhisperModel {
    /// Approximate model file size in bytes.
    pub fn size_bytes(&self) -> u64 {
        match self {
            WhisperModel::Tiny => 39_000_000,
            WhisperModel::Base => 142_000_000,
            WhisperModel::Small => 466_000_000,
            WhisperModel::Medium => 1_500_000_000,
            WhisperModel::Large => 2_900_000_000,
        }
    }

    fn stem(&self) -> &'static str {
        match self {
            WhisperModel::Tiny => "tiny",
            WhisperModel::Base => "base",
            WhisperModel::Small => "small",
            WhisperModel::Medium => "medium",
            WhisperModel::Large => "large",
        }
    }

    /// ggml model filename. Large has no English-only variant.
    pub fn filename(&self, english_only: bool) -> String {
        if english_only && *self != WhisperModel::Large {
            format!("ggml-{}.en.bin", self.stem())
        } else {
            format!("ggml-{}.bin", self.stem())
        }
    }
}

impl std::str::FromStr for WhisperModel {
    type Err = MontageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tiny" => Ok(WhisperModel::Tiny),
            "base" => Ok(WhisperModel::Base),
            "small" => Ok(WhisperModel::Small),
            "medium" => Ok(WhisperModel::Medium),
            "large" => Ok(WhisperModel::Large),
            other => Err(MontageError::config(format!("Unknown whisper model: {other}"))),
        }
    }
}

/// Configuration for transcription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionConfig {
    /// Model to use.
    pub model: WhisperModel,

    /// Use the English-only model variant.
    pub english_only: bool,

    /// Language hint (ISO 639-1 code, e.g., "en").
    pub language: Option<String>,

    /// Number of CPU threads for inference.
    pub threads: u32,

    /// Directory holding ggml model files.
    pub models_dir: PathBuf,

    /// whisper.cpp executable.
    pub binary: String,
}

impl TranscriptionConfig {
    /// Build from app config. Model names look like `tiny.en` or `base`.
    pub fn from_defaults(defaults: &TranscriptionDefaults) -> MontageResult<Self> {
        let (name, english_only) = match defaults.model.split_once('.') {
            Some((name, "en")) => (name, true),
            Some((_, suffix)) => {
                return Err(MontageError::config(format!(
                    "Unknown whisper model variant: {suffix}"
                )))
            }
            None => (defaults.model.as_str(), false),
        };
        Ok(Self {
            model: name.parse()?,
            english_only,
            language: english_only.then(|| "en".to_string()),
            threads: 4,
            models_dir: defaults.models_dir.clone(),
            binary: defaults.binary.clone(),
        })
    }

    pub fn model_path(&self) -> PathBuf {
        self.models_dir.join(self.model.filename(self.english_only))
    }
}

/// A timed span of recognized speech, relative to the start of the audio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptChunk {
    pub start_secs: f64,
    pub end_secs: f64,
    pub text: String,
}

/// Coarse progress reported while a transcription runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TranscriptionProgress {
    /// Fetching model weights; fraction in [0, 1].
    Downloading { fraction: f64 },
    Loading,
    Transcribing,
}

/// Progress callback for transcription.
pub type TranscriptionCallback = Box<dyn Fn(TranscriptionProgress) + Send>;

/// Speech-to-text collaborator.
pub trait TranscriptionEngine: Send {
    /// Transcribe 16 kHz mono samples in `[-1, 1]`.
    fn transcribe(
        &mut self,
        samples: &[f32],
        progress: Option<&TranscriptionCallback>,
    ) -> MontageResult<Vec<TranscriptChunk>>;

    /// Engine name.
    fn name(&self) -> &str;
}

/// Convert signed 16-bit little-endian PCM to floats in `[-1, 1)`.
/// A trailing odd byte is ignored.
pub fn pcm16le_to_f32(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32768.0)
        .collect()
}

/// Split long chunks into two-word pieces with proportional timestamps.
///
/// Chunks of up to three words are kept as they are.
pub fn refine_chunks(chunks: &[TranscriptChunk]) -> Vec<TranscriptChunk> {
    let mut refined = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        let words: Vec<&str> = chunk.text.split_whitespace().collect();
        if words.len() <= MAX_WORDS_PER_CHUNK {
            refined.push(chunk.clone());
            continue;
        }

        let duration = chunk.end_secs - chunk.start_secs;
        let count = words.len() as f64;
        for (index, group) in words.chunks(WORDS_PER_REFINED_CHUNK).enumerate() {
            let first = index * WORDS_PER_REFINED_CHUNK;
            let last = first + group.len();
            refined.push(TranscriptChunk {
                start_secs: chunk.start_secs + (first as f64 / count) * duration,
                end_secs: chunk.start_secs + (last as f64 / count) * duration,
                text: group.join(" "),
            });
        }
    }
    refined
}

/// Decode `duration_secs` of audio starting at `offset_secs` of `path` to
/// 16 kHz mono samples with ffmpeg.
pub fn extract_audio(path: &Path, offset_secs: f64, duration_secs: f64) -> MontageResult<Vec<f32>> {
    if !path.exists() {
        return Err(MontageError::file_not_found(path));
    }

    let output = Command::new("ffmpeg")
        .args(["-v", "error", "-ss"])
        .arg(format!("{:.6}", offset_secs.max(0.0)))
        .arg("-t")
        .arg(format!("{duration_secs:.6}"))
        .arg("-i")
        .arg(path)
        .args(["-vn", "-ar"])
        .arg(SAMPLE_RATE.to_string())
        .args(["-ac", "1", "-c:a", "pcm_s16le", "-f", "s16le", "pipe:1"])
        .stdin(Stdio::null())
        .output()
        .map_err(|e| MontageError::transcription(format!("Failed to start ffmpeg: {e}")))?;

    if !output.status.success() {
        return Err(MontageError::transcription(format!(
            "Audio extraction failed for {}: {}",
            path.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    let samples = pcm16le_to_f32(&output.stdout);
    tracing::debug!(
        path = %path.display(),
        samples = samples.len(),
        "Extracted audio"
    );
    Ok(samples)
}

/// Encode samples as a 16-bit mono WAV file.
pub fn write_wav(path: &Path, samples: &[f32]) -> MontageResult<()> {
    let data_len = (samples.len() * 2) as u32;
    let byte_rate = SAMPLE_RATE * 2;

    let mut bytes = Vec::with_capacity(44 + data_len as usize);
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
    bytes.extend_from_slice(b"WAVE");
    bytes.extend_from_slice(b"fmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes()); // PCM
    bytes.extend_from_slice(&1u16.to_le_bytes()); // mono
    bytes.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
    bytes.extend_from_slice(&byte_rate.to_le_bytes());
    bytes.extend_from_slice(&2u16.to_le_bytes());
    bytes.extend_from_slice(&16u16.to_le_bytes());
    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&data_len.to_le_bytes());
    for sample in samples {
        let value = (sample.clamp(-1.0, 1.0) * 32767.0).round() as i16;
        bytes.extend_from_slice(&value.to_le_bytes());
    }

    let mut file = std::fs::File::create(path)?;
    file.write_all(&bytes)?;
    Ok(())
}

#[derive(Debug, Deserialize)]
struct WhisperOutput {
    #[serde(default)]
    transcription: Vec<WhisperSegment>,
}

#[derive(Debug, Deserialize)]
struct WhisperSegment {
    offsets: WhisperOffsets,
    text: String,
}

#[derive(Debug, Deserialize)]
struct WhisperOffsets {
    from: u64,
    to: u64,
}

/// Parse the JSON written by `whisper-cli -oj`.
pub fn parse_whisper_json(raw: &str) -> MontageResult<Vec<TranscriptChunk>> {
    let output: WhisperOutput = serde_json::from_str(raw)?;
    Ok(output
        .transcription
        .into_iter()
        .map(|segment| TranscriptChunk {
            start_secs: segment.offsets.from as f64 / 1000.0,
            end_secs: segment.offsets.to as f64 / 1000.0,
            text: segment.text,
        })
        .collect())
}

/// Removes its files when dropped.
struct ScratchFiles(Vec<PathBuf>);

impl Drop for ScratchFiles {
    fn drop(&mut self) {
        for path in &self.0 {
            if path.exists() {
                if let Err(err) = std::fs::remove_file(path) {
                    tracing::warn!(error = %err, path = %path.display(), "Failed to remove scratch file");
                }
            }
        }
    }
}

/// Transcription engine backed by the whisper.cpp CLI.
#[derive(Debug, Clone)]
pub struct WhisperCppEngine {
    config: TranscriptionConfig,
}

impl WhisperCppEngine {
    pub fn new(config: TranscriptionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TranscriptionConfig {
        &self.config
    }
}

impl TranscriptionEngine for WhisperCppEngine {
    fn transcribe(
        &mut self,
        samples: &[f32],
        progress: Option<&TranscriptionCallback>,
    ) -> MontageResult<Vec<TranscriptChunk>> {
        let report = |p: TranscriptionProgress| {
            if let Some(cb) = progress {
                cb(p);
            }
        };

        report(TranscriptionProgress::Loading);
        let model_path = self.config.model_path();
        if !model_path.exists() {
            return Err(MontageError::file_not_found(model_path));
        }

        let base = std::env::temp_dir().join(format!("montage-whisper-{}", uuid::Uuid::new_v4()));
        let wav_path = base.with_extension("wav");
        let json_path = base.with_extension("json");
        let _scratch = ScratchFiles(vec![wav_path.clone(), json_path.clone()]);
        write_wav(&wav_path, samples)?;

        tracing::info!(
            model = %model_path.display(),
            samples = samples.len(),
            "Starting transcription"
        );
        report(TranscriptionProgress::Transcribing);

        let mut cmd = Command::new(&self.config.binary);
        cmd.arg("-m")
            .arg(&model_path)
            .arg("-f")
            .arg(&wav_path)
            .arg("-t")
            .arg(self.config.threads.max(1).to_string())
            .args(["-oj", "-np", "-of"])
            .arg(&base);
        if let Some(language) = &self.config.language {
            cmd.arg("-l").arg(language);
        }

        let output = cmd
            .stdin(Stdio::null())
            .output()
            .map_err(|e| MontageError::transcription(format!("Failed to start whisper: {e}")))?;
        if !output.status.success() {
            return Err(MontageError::transcription(format!(
                "whisper exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let raw = std::fs::read_to_string(&json_path)?;
        let chunks = parse_whisper_json(&raw)?;
        tracing::info!(chunks = chunks.len(), "Transcription finished");
        Ok(chunks)
    }

    fn name(&self) -> &str {
        "whisper.cpp"
    }
}
