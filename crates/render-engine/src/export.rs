//! Export: static ffmpeg filter graph and encoder backend.
//!
//! The encoder evaluates a fixed graph rather than a per-frame callback, so
//! zoom effects are flattened into segments split at every effect boundary.
//! Each segment gets a static crop of whichever effect is active at its
//! midpoint. There is no easing in exported zooms.

use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Instant;

use montage_common::clock::frames_for_duration;
use montage_common::error::{MontageError, MontageResult};
use montage_common::units::TIME_EPSILON;
use montage_project_model::{
    CanvasSettings, CaptionConfig, ClipContent, ExportConfig, ExportFormat, LoadedProject,
    MediaKind, NormalizedRect, TextContent, ZoomEffect,
};
use montage_timeline_core::captions::CaptionState;
use montage_timeline_core::{TimelineState, TimelineStore};

use crate::compositor::active_zoom_effect;

/// Label of the final video stream in the filter graph.
pub const VIDEO_OUT: &str = "vout";

/// Label of the mixed audio stream in the filter graph.
pub const AUDIO_OUT: &str = "aout";

/// Frame rate used for GIF output.
const GIF_FPS: u32 = 15;

/// An export job ready to be rendered.
#[derive(Debug, Clone)]
pub struct ExportJob {
    /// Output file path.
    pub output_path: PathBuf,

    /// Directory that relative media sources resolve against.
    pub source_root: PathBuf,

    /// Output frame geometry.
    pub canvas: CanvasSettings,

    /// Export configuration.
    pub config: ExportConfig,

    /// Timeline snapshot taken when the export was requested.
    pub timeline: TimelineState,

    /// Caption snapshot taken when the export was requested.
    pub captions: CaptionState,
}

impl ExportJob {
    /// Snapshot a project and its store into a job.
    pub fn from_project(
        project: &LoadedProject,
        store: &TimelineStore,
        output_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            output_path: output_path.into(),
            source_root: project.root.clone(),
            canvas: project.project.canvas.clone(),
            config: project.project.export.clone(),
            timeline: store.snapshot(),
            captions: store.captions().snapshot(),
        }
    }

    fn resolve_source(&self, source: &str) -> PathBuf {
        let path = Path::new(source);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.source_root.join(path)
        }
    }
}

/// Progress callback for export rendering.
pub type ProgressCallback = Box<dyn Fn(ExportProgress) + Send>;

/// Export progress report.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportProgress {
    /// Current progress [0.0, 1.0].
    pub progress: f64,

    /// Frames rendered so far.
    pub frames_rendered: u64,

    /// Total frames to render.
    pub total_frames: u64,

    /// Estimated time remaining in seconds.
    pub eta_secs: f64,

    /// Current stage.
    pub stage: ExportStage,
}

impl ExportProgress {
    fn at_stage(stage: ExportStage, total_frames: u64) -> Self {
        let done = stage == ExportStage::Complete;
        Self {
            progress: if done { 1.0 } else { 0.0 },
            frames_rendered: if done { total_frames } else { 0 },
            total_frames,
            eta_secs: 0.0,
            stage,
        }
    }
}

/// Stages of the export process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStage {
    Preparing,
    Rendering,
    Finalizing,
    Complete,
    Failed,
}

/// Trait for encoder backends.
pub trait RenderBackend: Send {
    /// Encode the planned graph into `plan.output_path`.
    fn render(&mut self, plan: &ExportPlan, progress: Option<&ProgressCallback>)
        -> MontageResult<()>;

    /// Check if this backend is available on the system.
    fn is_available(&self) -> bool;

    /// Backend name.
    fn name(&self) -> &str;
}

/// One ffmpeg input.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphInput {
    pub clip_id: String,
    pub path: PathBuf,
    pub kind: MediaKind,
    /// Stills are looped for this long.
    pub loop_secs: Option<f64>,
}

impl GraphInput {
    fn ffmpeg_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(secs) = self.loop_secs {
            args.extend(["-loop".to_string(), "1".to_string()]);
            args.extend(["-t".to_string(), format!("{secs:.6}")]);
        }
        args.push("-i".to_string());
        args.push(self.path.to_string_lossy().into_owned());
        args
    }
}

/// A slice of the composed timeline with a single static crop.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoomSegment {
    pub start: f64,
    pub end: f64,
    /// `None` when no zoom is active at the segment midpoint.
    pub rect: Option<NormalizedRect>,
}

impl ZoomSegment {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// A complete `-filter_complex` description plus the inputs it reads.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterGraph {
    /// Filter chains, joined with `;` for ffmpeg.
    pub chains: Vec<String>,
    /// Inputs in ffmpeg index order.
    pub inputs: Vec<GraphInput>,
    pub segments: Vec<ZoomSegment>,
    /// Whether the graph produces an `[aout]` stream.
    pub has_audio: bool,
}

impl FilterGraph {
    pub fn to_filter_complex(&self) -> String {
        self.chains.join(";")
    }
}

/// Everything needed to run the encoder.
#[derive(Debug, Clone)]
pub struct ExportPlan {
    pub output_path: PathBuf,
    pub graph: FilterGraph,
    pub ffmpeg_args: Vec<String>,
    pub total_frames: u64,
    pub expected_duration_secs: f64,
}

impl ExportPlan {
    /// Human-readable dump of the plan for debugging.
    pub fn describe(&self) -> String {
        let mut report = String::new();
        report.push_str(&format!("output: {}\n", self.output_path.display()));
        report.push_str(&format!(
            "duration: {:.3}s ({} frames)\n",
            self.expected_duration_secs, self.total_frames
        ));
        report.push_str("inputs:\n");
        for (index, input) in self.graph.inputs.iter().enumerate() {
            report.push_str(&format!(
                "  [{index}] {:?} {} ({})\n",
                input.kind,
                input.path.display(),
                input.clip_id
            ));
        }
        report.push_str("segments:\n");
        for segment in &self.graph.segments {
            match segment.rect {
                Some(rect) => report.push_str(&format!(
                    "  {:.3}-{:.3} crop x={:.3} y={:.3} w={:.3} h={:.3}\n",
                    segment.start, segment.end, rect.x, rect.y, rect.width, rect.height
                )),
                None => report.push_str(&format!(
                    "  {:.3}-{:.3} full frame\n",
                    segment.start, segment.end
                )),
            }
        }
        report.push_str("filter_complex:\n");
        for chain in &self.graph.chains {
            report.push_str(&format!("  {chain}\n"));
        }
        report
    }
}

/// Export the project to a video file with ffmpeg.
///
/// This is the main entry point for rendering.
pub async fn export_project(
    job: ExportJob,
    progress: Option<ProgressCallback>,
) -> MontageResult<PathBuf> {
    export_with_backend(job, Box::new(FfmpegBackend::new()), progress).await
}

/// Export with an explicit backend.
///
/// An empty timeline fails before the backend is touched. On failure any
/// partial output file is removed.
pub async fn export_with_backend(
    job: ExportJob,
    mut backend: Box<dyn RenderBackend>,
    progress: Option<ProgressCallback>,
) -> MontageResult<PathBuf> {
    tracing::info!(
        output = %job.output_path.display(),
        format = ?job.config.format,
        clips = job.timeline.clips.len(),
        "Starting export"
    );

    let plan = build_plan(&job)?;

    if !backend.is_available() {
        return Err(MontageError::unsupported(format!(
            "Render backend '{}' is not available",
            backend.name()
        )));
    }

    if let Some(parent) = plan.output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    if let Some(cb) = &progress {
        cb(ExportProgress::at_stage(
            ExportStage::Preparing,
            plan.total_frames,
        ));
    }

    tracing::info!(backend = backend.name(), "Using render backend");
    let output_path = plan.output_path.clone();
    let result = tokio::task::spawn_blocking(move || {
        let started = Instant::now();
        let result = backend.render(&plan, progress.as_ref());
        if result.is_err() {
            if let Some(cb) = &progress {
                cb(ExportProgress::at_stage(ExportStage::Failed, plan.total_frames));
            }
        } else {
            tracing::info!(
                elapsed_secs = started.elapsed().as_secs_f64(),
                "Export finished"
            );
        }
        result
    })
    .await
    .map_err(|e| MontageError::export(format!("Export task failed to complete: {e}")))?;

    if let Err(err) = result {
        discard_partial_output(&output_path);
        tracing::error!(error = %err, "Export failed");
        return Err(err);
    }

    Ok(output_path)
}

fn discard_partial_output(path: &Path) {
    if !path.exists() {
        return;
    }
    match std::fs::remove_file(path) {
        Ok(()) => tracing::info!(path = %path.display(), "Removed partial export output"),
        Err(err) => {
            tracing::warn!(error = %err, path = %path.display(), "Failed to remove partial output")
        }
    }
}

/// Build the filter graph and ffmpeg command line for a job.
pub fn build_plan(job: &ExportJob) -> MontageResult<ExportPlan> {
    let graph = build_filter_graph(job)?;
    let total = job.timeline.total_duration;
    let fps = output_fps(job);

    let mut args: Vec<String> = [
        "-y",
        "-hide_banner",
        "-loglevel",
        "error",
        "-nostats",
        "-progress",
        "pipe:1",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    for input in &graph.inputs {
        args.extend(input.ffmpeg_args());
    }

    args.push("-filter_complex".to_string());
    args.push(graph.to_filter_complex());
    args.push("-map".to_string());
    args.push(format!("[{VIDEO_OUT}]"));
    if graph.has_audio {
        args.push("-map".to_string());
        args.push(format!("[{AUDIO_OUT}]"));
    } else {
        args.push("-an".to_string());
    }
    args.push("-r".to_string());
    args.push(fps.to_string());
    args.push("-t".to_string());
    args.push(format!("{total:.6}"));
    args.extend(codec_args_for_config(&job.config));
    args.push(job.output_path.to_string_lossy().into_owned());

    Ok(ExportPlan {
        output_path: job.output_path.clone(),
        graph,
        ffmpeg_args: args,
        total_frames: frames_for_duration(total, fps),
        expected_duration_secs: total,
    })
}

fn output_fps(job: &ExportJob) -> u32 {
    match job.config.format {
        ExportFormat::Gif => GIF_FPS,
        _ => job.canvas.fps.max(1),
    }
}

/// Sorted, deduplicated cut points: timeline start and end plus every
/// zoom effect edge, clamped to the timeline.
pub fn zoom_boundaries(effects: &[ZoomEffect], total_duration: f64) -> Vec<f64> {
    let total = total_duration.max(0.0);
    let mut points = vec![0.0, total];
    for effect in effects {
        points.push(effect.start.clamp(0.0, total));
        points.push(effect.end().clamp(0.0, total));
    }
    points.sort_by(f64::total_cmp);
    points.dedup_by(|later, earlier| (*later - *earlier).abs() <= TIME_EPSILON);
    points
}

/// Segments between consecutive boundaries. Zero-length spans are skipped.
pub fn zoom_segments(effects: &[ZoomEffect], total_duration: f64) -> Vec<ZoomSegment> {
    zoom_boundaries(effects, total_duration)
        .windows(2)
        .filter(|pair| pair[1] - pair[0] > TIME_EPSILON)
        .map(|pair| {
            let mid = (pair[0] + pair[1]) / 2.0;
            let rect = active_zoom_effect(effects, mid)
                .map(|e| e.rect)
                .filter(|r| !r.is_full());
            ZoomSegment {
                start: pair[0],
                end: pair[1],
                rect,
            }
        })
        .collect()
}

/// Build the full `-filter_complex` graph for a job.
pub fn build_filter_graph(job: &ExportJob) -> MontageResult<FilterGraph> {
    let state = &job.timeline;
    let total = state.total_duration;
    if state.clips.is_empty() || total <= TIME_EPSILON {
        return Err(MontageError::EmptyTimeline);
    }

    let width = job.canvas.width;
    let height = job.canvas.height;
    let fps = job.canvas.fps.max(1);
    let with_audio = job.config.format.supports_audio();

    let mut chains = vec![format!(
        "color=c={bg}:s={width}x{height}:r={fps}:d={total:.6},format=yuv420p[base]",
        bg = css_color_to_ffmpeg(&job.canvas.background),
    )];
    let mut inputs = Vec::new();
    let mut audio_labels = Vec::new();
    let mut current = "base".to_string();
    let mut layer = 0usize;

    for track in state.tracks.iter().filter(|t| t.visible) {
        for clip in state.clips_on_track(&track.id) {
            let start = clip.start;
            let end = clip.end();
            match &clip.content {
                ClipContent::Media(media) => {
                    let index = inputs.len();
                    inputs.push(GraphInput {
                        clip_id: clip.id.clone(),
                        path: job.resolve_source(&media.source),
                        kind: media.kind,
                        loop_secs: (media.kind == MediaKind::Image).then_some(clip.duration),
                    });

                    if media.kind != MediaKind::Audio {
                        let trim = match media.kind {
                            MediaKind::Image => format!("trim=duration={:.6}", clip.duration),
                            _ => format!(
                                "trim=start={:.6}:duration={:.6}",
                                clip.source_offset, clip.duration
                            ),
                        };
                        chains.push(format!(
                            "[{index}:v]{trim},setpts=PTS-STARTPTS+{start:.6}/TB,format=rgba,\
                             scale={width}:{height}:force_original_aspect_ratio=decrease,\
                             pad={width}:{height}:(ow-iw)/2:(oh-ih)/2:color=0x00000000[clip{layer}]"
                        ));
                        chains.push(format!(
                            "[{current}][clip{layer}]overlay=eof_action=pass:enable='{gate}'[v{layer}]",
                            gate = half_open_gate(start, end),
                        ));
                        current = format!("v{layer}");
                        layer += 1;
                    }

                    if with_audio && clip.has_audio() {
                        let label = format!("a{}", audio_labels.len());
                        chains.push(format!(
                            "[{index}:a]atrim=start={:.6}:duration={:.6},asetpts=PTS-STARTPTS,\
                             adelay={}:all=1[{label}]",
                            clip.source_offset,
                            clip.duration,
                            (start * 1000.0).round() as u64,
                        ));
                        audio_labels.push(label);
                    }
                }
                ClipContent::Text(text) => {
                    chains.push(format!(
                        "[{current}]{draw}[v{layer}]",
                        draw = text_drawtext(text, width, height, &half_open_gate(start, end)),
                    ));
                    current = format!("v{layer}");
                    layer += 1;
                }
            }
        }
    }

    let captions = &job.captions;
    if captions.enabled && job.config.burn_captions && !captions.captions.is_empty() {
        let anchor = captions.position.anchor_y();
        let draws: Vec<String> = captions
            .captions
            .iter()
            .map(|c| caption_drawtext(&c.text, &captions.config, anchor, c.start, c.end))
            .collect();
        chains.push(format!("[{current}]{}[captioned]", draws.join(",")));
        current = "captioned".to_string();
    }

    let effects: Vec<ZoomEffect> = state
        .zoom_effects
        .iter()
        .filter(|e| state.track(&e.track_id).map_or(true, |t| t.visible))
        .cloned()
        .collect();
    let segments = zoom_segments(&effects, total);
    let count = segments.len();

    let sources: Vec<String> = if count > 1 {
        let labels: Vec<String> = (0..count).map(|k| format!("seg{k}")).collect();
        chains.push(format!(
            "[{current}]split={count}{}",
            labels.iter().map(|l| format!("[{l}]")).collect::<String>()
        ));
        labels
    } else {
        vec![current]
    };

    for (k, (segment, source)) in segments.iter().zip(&sources).enumerate() {
        let crop = match segment.rect {
            Some(rect) => format!(
                ",crop=w=iw*{:.6}:h=ih*{:.6}:x=iw*{:.6}:y=ih*{:.6},scale={width}:{height}:flags=lanczos",
                rect.width, rect.height, rect.x, rect.y
            ),
            None => String::new(),
        };
        chains.push(format!(
            "[{source}]trim=start={:.6}:end={:.6},setpts=PTS-STARTPTS{crop}[z{k}]",
            segment.start, segment.end
        ));
    }

    let concat_inputs: String = (0..count).map(|k| format!("[z{k}]")).collect();
    match job.config.format {
        ExportFormat::Gif => {
            chains.push(format!(
                "{concat_inputs}concat=n={count}:v=1:a=0,fps={GIF_FPS},split[gif0][gif1]"
            ));
            chains.push("[gif0]palettegen[palette]".to_string());
            chains.push(format!("[gif1][palette]paletteuse[{VIDEO_OUT}]"));
        }
        _ => chains.push(format!(
            "{concat_inputs}concat=n={count}:v=1:a=0,format=yuv420p[{VIDEO_OUT}]"
        )),
    }

    let has_audio = !audio_labels.is_empty();
    if has_audio {
        let mix_inputs: String = audio_labels.iter().map(|l| format!("[{l}]")).collect();
        chains.push(format!(
            "{mix_inputs}amix=inputs={}:duration=longest:normalize=0,atrim=end={total:.6}[{AUDIO_OUT}]",
            audio_labels.len()
        ));
    }

    tracing::debug!(
        inputs = inputs.len(),
        segments = count,
        chains = chains.len(),
        "Built export filter graph"
    );

    Ok(FilterGraph {
        chains,
        inputs,
        segments,
        has_audio,
    })
}

/// Enable expression for `[start, end)`.
fn half_open_gate(start: f64, end: f64) -> String {
    format!("gte(t,{start:.6})*lt(t,{end:.6})")
}

fn text_drawtext(text: &TextContent, width: u32, height: u32, gate: &str) -> String {
    let style = &text.style;
    format!(
        "drawtext=text='{}':font='{}':fontsize={}:fontcolor={}:x={:.2}-text_w/2:y={:.2}-text_h/2:enable='{gate}'",
        escape_drawtext(&text.text),
        primary_font(&style.font_family),
        style.font_size_px.round() as u32,
        css_color_to_ffmpeg(&style.color),
        style.position.x * width as f64,
        style.position.y * height as f64,
    )
}

fn caption_drawtext(
    text: &str,
    config: &CaptionConfig,
    anchor_y: f64,
    start: f64,
    end: f64,
) -> String {
    format!(
        "drawtext=text='{}':font='{}':fontsize={}:fontcolor={}:box=1:boxcolor={}:boxborderw={}:\
         x=(w-text_w)/2:y=h*{anchor_y:.3}-text_h/2:enable='between(t,{start:.6},{end:.6})'",
        escape_drawtext(text.trim()),
        primary_font(&config.font_family),
        config.font_size_px.round() as u32,
        css_color_to_ffmpeg(&config.color),
        css_color_to_ffmpeg(&config.background_color),
        config.padding_px.round() as u32,
    )
}

/// First family of a CSS font stack, unquoted.
fn primary_font(stack: &str) -> String {
    stack
        .split(',')
        .next()
        .unwrap_or_default()
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .to_string()
}

/// Escape text for a single-quoted drawtext value.
pub fn escape_drawtext(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            ':' => out.push_str("\\:"),
            '%' => out.push_str("\\%"),
            '\'' => out.push('\u{2019}'),
            '\n' => out.push(' '),
            _ => out.push(ch),
        }
    }
    out
}

/// Convert a CSS color (`#rgb`, `#rrggbb`, `rgb()`, `rgba()`) to ffmpeg
/// syntax. Anything else is passed through as a color name.
pub fn css_color_to_ffmpeg(color: &str) -> String {
    let color = color.trim();
    if let Some(hex) = color.strip_prefix('#') {
        let expanded = match hex.len() {
            3 => hex.chars().flat_map(|c| [c, c]).collect::<String>(),
            _ => hex.to_string(),
        };
        return format!("0x{}", expanded.to_lowercase());
    }

    let lower = color.to_lowercase();
    let body = lower
        .strip_prefix("rgba(")
        .or_else(|| lower.strip_prefix("rgb("))
        .and_then(|rest| rest.strip_suffix(')'));
    if let Some(body) = body {
        let parts: Vec<&str> = body.split(',').map(str::trim).collect();
        let channels: Option<Vec<u8>> = parts
            .iter()
            .take(3)
            .map(|p| {
                p.parse::<f64>()
                    .ok()
                    .map(|v| v.round().clamp(0.0, 255.0) as u8)
            })
            .collect();
        if let Some(channels) = channels.filter(|c| c.len() == 3) {
            let rgb = format!(
                "0x{:02x}{:02x}{:02x}",
                channels[0], channels[1], channels[2]
            );
            return match parts.get(3).and_then(|a| a.parse::<f64>().ok()) {
                Some(alpha) => format!("{rgb}@{:.2}", alpha.clamp(0.0, 1.0)),
                None => rgb,
            };
        }
    }

    color.to_string()
}

/// Encoder arguments for the configured format.
pub fn codec_args_for_config(config: &ExportConfig) -> Vec<String> {
    let video_bitrate = format!("{}k", config.video_bitrate_kbps.max(1000));
    let audio_bitrate = format!("{}k", config.audio_bitrate_kbps.max(64));

    let video: &[&str] = match config.format {
        ExportFormat::Mp4H264 => &[
            "-c:v",
            "libx264",
            "-preset",
            "medium",
            "-profile:v",
            "high",
            "-pix_fmt",
            "yuv420p",
        ],
        ExportFormat::Mp4H265 => &["-c:v", "libx265", "-preset", "medium", "-pix_fmt", "yuv420p"],
        ExportFormat::Webm => &["-c:v", "libvpx-vp9"],
        ExportFormat::Gif => &["-loop", "0"],
    };
    let mut args: Vec<String> = video.iter().map(|s| s.to_string()).collect();

    let audio_codec = match config.format {
        ExportFormat::Mp4H264 | ExportFormat::Mp4H265 => "aac",
        ExportFormat::Webm => "libopus",
        ExportFormat::Gif => return args,
    };
    args.extend(["-b:v".to_string(), video_bitrate]);
    args.extend(["-c:a".to_string(), audio_codec.to_string()]);
    args.extend(["-b:a".to_string(), audio_bitrate]);
    if matches!(config.format, ExportFormat::Mp4H264 | ExportFormat::Mp4H265) {
        args.extend(["-movflags".to_string(), "+faststart".to_string()]);
    }
    args
}

/// Whether `binary` resolves on `PATH`.
pub fn command_exists(binary: &str) -> bool {
    Command::new("sh")
        .arg("-c")
        .arg(format!("command -v {binary} >/dev/null 2>&1"))
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Encoder backend that shells out to `ffmpeg`.
#[derive(Debug, Clone)]
pub struct FfmpegBackend {
    binary: String,
}

impl Default for FfmpegBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegBackend {
    pub fn new() -> Self {
        Self::with_binary("ffmpeg")
    }

    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn check_inputs(plan: &ExportPlan) -> MontageResult<()> {
        for input in &plan.graph.inputs {
            if !input.path.exists() {
                return Err(MontageError::file_not_found(&input.path));
            }
        }
        Ok(())
    }
}

impl RenderBackend for FfmpegBackend {
    fn render(
        &mut self,
        plan: &ExportPlan,
        progress: Option<&ProgressCallback>,
    ) -> MontageResult<()> {
        Self::check_inputs(plan)?;

        let start = Instant::now();
        let mut child = Command::new(&self.binary)
            .args(&plan.ffmpeg_args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| MontageError::export(format!("Failed to start ffmpeg: {e}")))?;

        tracing::info!(
            pid = child.id(),
            inputs = plan.graph.inputs.len(),
            segments = plan.graph.segments.len(),
            total_frames = plan.total_frames,
            "ffmpeg process started"
        );

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| MontageError::export("Failed to capture ffmpeg stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| MontageError::export("Failed to capture ffmpeg stderr"))?;

        // ffmpeg blocks if its stderr pipe fills up.
        let stderr_task = std::thread::spawn(move || -> String {
            let mut output = String::new();
            match BufReader::new(stderr).read_to_string(&mut output) {
                Ok(_) => output,
                Err(err) => format!("<failed to read ffmpeg stderr: {err}>"),
            }
        });

        let mut reader = BufReader::new(stdout);
        let mut line = String::new();
        let mut state = ProgressState::default();
        loop {
            line.clear();
            let bytes = reader
                .read_line(&mut line)
                .map_err(|e| MontageError::export(format!("Failed reading ffmpeg progress: {e}")))?;
            if bytes == 0 {
                break;
            }

            if let Some((key, value)) = line.trim().split_once('=') {
                state.update(key, value);
                if key == "progress" {
                    if let Some(cb) = progress {
                        cb(progress_report(
                            &state,
                            plan.total_frames,
                            plan.expected_duration_secs,
                            start.elapsed().as_secs_f64(),
                        ));
                    }
                }
            }
        }

        let status = child
            .wait()
            .map_err(|e| MontageError::export(format!("Failed to wait on ffmpeg: {e}")))?;
        let stderr_output = stderr_task
            .join()
            .unwrap_or_else(|_| "<failed to join stderr reader>".to_string());

        if !status.success() {
            return Err(MontageError::export(format!(
                "ffmpeg exited with {status}: {}",
                stderr_output.trim()
            )));
        }

        if let Some(cb) = progress {
            cb(ExportProgress::at_stage(
                ExportStage::Complete,
                plan.total_frames,
            ));
        }

        Ok(())
    }

    fn is_available(&self) -> bool {
        command_exists(&self.binary)
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}

/// Accumulated `-progress` key/value state.
#[derive(Debug, Default)]
struct ProgressState {
    out_time_secs: f64,
    frame: Option<u64>,
    complete: bool,
}

impl ProgressState {
    fn update(&mut self, key: &str, value: &str) {
        match key {
            // ffmpeg reports microseconds under both names.
            "out_time_us" | "out_time_ms" => {
                if let Ok(us) = value.trim().parse::<f64>() {
                    self.out_time_secs = us / 1_000_000.0;
                }
            }
            "frame" => self.frame = value.trim().parse().ok(),
            "progress" => self.complete = value.trim() == "end",
            _ => {}
        }
    }
}

fn progress_report(
    state: &ProgressState,
    total_frames: u64,
    expected_duration_secs: f64,
    elapsed_secs: f64,
) -> ExportProgress {
    let by_time = if expected_duration_secs <= 0.0 {
        0.0
    } else {
        state.out_time_secs / expected_duration_secs
    };
    let progress = match state.frame {
        Some(frame) if total_frames > 0 => frame as f64 / total_frames as f64,
        _ => by_time,
    }
    .clamp(0.0, 1.0);

    let eta_secs = if progress > 0.0 {
        (elapsed_secs / progress - elapsed_secs).max(0.0)
    } else {
        0.0
    };

    ExportProgress {
        progress: if state.complete { 1.0 } else { progress },
        frames_rendered: state
            .frame
            .unwrap_or_else(|| (progress * total_frames as f64).round() as u64)
            .min(total_frames),
        total_frames,
        eta_secs,
        stage: if state.complete {
            ExportStage::Finalizing
        } else {
            ExportStage::Rendering
        },
    }
}
