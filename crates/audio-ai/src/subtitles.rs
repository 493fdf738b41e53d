//! Subtitle files (SRT and WebVTT) from the caption list.

use std::path::Path;

use montage_common::error::MontageResult;
use montage_project_model::Caption;

/// Subtitle file flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtitleFormat {
    Srt,
    Vtt,
}

impl SubtitleFormat {
    /// Pick by extension. Anything other than `.vtt` is SRT.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("vtt") => SubtitleFormat::Vtt,
            _ => SubtitleFormat::Srt,
        }
    }

    pub fn render(self, captions: &[Caption]) -> String {
        match self {
            SubtitleFormat::Srt => generate_srt(captions),
            SubtitleFormat::Vtt => generate_vtt(captions),
        }
    }
}

/// Captions worth writing, in timeline order.
fn cues(captions: &[Caption]) -> Vec<&Caption> {
    let mut cues: Vec<&Caption> = captions
        .iter()
        .filter(|c| !c.text.trim().is_empty() && c.end > c.start)
        .collect();
    cues.sort_by(|a, b| a.start.total_cmp(&b.start));
    cues
}

/// Generate SRT subtitle content.
pub fn generate_srt(captions: &[Caption]) -> String {
    let mut output = String::new();

    for (i, caption) in cues(captions).into_iter().enumerate() {
        output.push_str(&format!("{}\n", i + 1));
        output.push_str(&format!(
            "{} --> {}\n",
            format_srt_time(caption.start),
            format_srt_time(caption.end),
        ));
        output.push_str(caption.text.trim());
        output.push_str("\n\n");
    }

    output
}

/// Generate WebVTT subtitle content.
pub fn generate_vtt(captions: &[Caption]) -> String {
    let mut output = String::from("WEBVTT\n\n");

    for caption in cues(captions) {
        output.push_str(&format!(
            "{} --> {}\n",
            format_vtt_time(caption.start),
            format_vtt_time(caption.end),
        ));
        output.push_str(caption.text.trim());
        output.push_str("\n\n");
    }

    output
}

fn split_millis(secs: f64) -> (u64, u64, u64, u64) {
    let total_ms = (secs.max(0.0) * 1000.0).round() as u64;
    (
        total_ms / 3_600_000,
        (total_ms % 3_600_000) / 60_000,
        (total_ms % 60_000) / 1000,
        total_ms % 1000,
    )
}

/// Format seconds as SRT timestamp: HH:MM:SS,mmm
fn format_srt_time(secs: f64) -> String {
    let (hours, minutes, seconds, millis) = split_millis(secs);
    format!("{hours:02}:{minutes:02}:{seconds:02},{millis:03}")
}

/// Format seconds as VTT timestamp: HH:MM:SS.mmm
fn format_vtt_time(secs: f64) -> String {
    let (hours, minutes, seconds, millis) = split_millis(secs);
    format!("{hours:02}:{minutes:02}:{seconds:02}.{millis:03}")
}

/// Save subtitles to a file, choosing the format from its extension.
pub fn save_subtitles(captions: &[Caption], path: &Path) -> MontageResult<()> {
    let content = SubtitleFormat::from_path(path).render(captions);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    tracing::info!(path = %path.display(), cues = captions.len(), "Subtitles written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caption(start: f64, end: f64, text: &str) -> Caption {
        Caption {
            id: format!("caption-{start}"),
            start,
            end,
            text: text.to_string(),
            source_clip_id: None,
        }
    }

    #[test]
    fn test_srt_generation() {
        let captions = vec![
            caption(3.0, 5.0, "This is a test"),
            caption(0.0, 2.5, " Hello world"),
        ];

        let srt = generate_srt(&captions);
        assert!(srt.starts_with("1\n00:00:00,000 --> 00:00:02,500\nHello world"));
        assert!(srt.contains("2\n00:00:03,000 --> 00:00:05,000\nThis is a test"));
    }

    #[test]
    fn test_vtt_generation() {
        let captions = vec![caption(61.5, 63.0, "One minute in")];

        let vtt = generate_vtt(&captions);
        assert!(vtt.starts_with("WEBVTT\n"));
        assert!(vtt.contains("00:01:01.500 --> 00:01:03.000"));
    }

    #[test]
    fn test_blank_and_empty_cues_skipped() {
        let captions = vec![caption(0.0, 1.0, "   "), caption(2.0, 2.0, "zero")];
        assert_eq!(generate_srt(&captions), "");
        assert_eq!(generate_vtt(&captions), "WEBVTT\n\n");
    }

    #[test]
    fn test_time_formatting() {
        assert_eq!(format_srt_time(0.0), "00:00:00,000");
        assert_eq!(format_srt_time(3661.5), "01:01:01,500");
        assert_eq!(format_vtt_time(3661.5), "01:01:01.500");
        assert_eq!(format_srt_time(0.2999999), "00:00:00,300");
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(SubtitleFormat::from_path(Path::new("a.VTT")), SubtitleFormat::Vtt);
        assert_eq!(SubtitleFormat::from_path(Path::new("a.srt")), SubtitleFormat::Srt);
        assert_eq!(SubtitleFormat::from_path(Path::new("a")), SubtitleFormat::Srt);
    }
}
