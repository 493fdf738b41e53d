//! Caption generation and editing.

use std::path::PathBuf;

use clap::{Subcommand, ValueEnum};
use montage_audio_ai::{
    generate_captions, TranscriptionCallback, TranscriptionConfig, TranscriptionProgress,
    WhisperCppEngine,
};
use montage_common::config::AppConfig;
use montage_project_model::{CaptionConfigPatch, CaptionPosition};

use super::Session;

#[derive(Subcommand)]
pub enum CaptionsAction {
    /// Transcribe a clip's audio and replace all captions
    Generate {
        /// Clip to transcribe (defaults to the first clip with audio)
        #[arg(long)]
        clip: Option<String>,

        /// Whisper model, e.g. tiny.en or base
        #[arg(long)]
        model: Option<String>,
    },

    /// List caption segments
    List,

    /// Show captions in preview and export
    Enable,

    /// Hide captions
    Disable,

    /// Place captions at the top or bottom of the frame
    Position {
        #[arg(value_enum)]
        position: Placement,
    },

    /// Change caption styling
    Style {
        #[arg(long)]
        font_size: Option<f64>,

        #[arg(long)]
        font_family: Option<String>,

        /// Text color (CSS)
        #[arg(long)]
        color: Option<String>,

        /// Box color (CSS)
        #[arg(long)]
        background: Option<String>,

        /// Maximum width as a fraction of the frame
        #[arg(long)]
        max_width: Option<f64>,
    },

    /// Replace the text of one caption
    Edit {
        /// Caption id
        id: String,

        /// New text
        text: String,
    },

    /// Remove one caption
    Remove {
        /// Caption id
        id: String,
    },

    /// Discard all captions
    Clear,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum Placement {
    Top,
    Bottom,
}

pub async fn run(config: &AppConfig, path: PathBuf, action: CaptionsAction) -> anyhow::Result<()> {
    let mut session = Session::open(config, &path)?;

    match action {
        CaptionsAction::Generate { clip, model } => {
            let mut defaults = config.transcription.clone();
            if let Some(model) = model {
                defaults.model = model;
            }
            let whisper = TranscriptionConfig::from_defaults(&defaults)?;
            println!(
                "Using model {} (~{} MB)",
                whisper.model_path().display(),
                whisper.model.size_bytes() / 1_000_000
            );
            let engine = WhisperCppEngine::new(whisper);

            let progress: TranscriptionCallback = Box::new(|p: TranscriptionProgress| match p {
                TranscriptionProgress::Downloading { fraction } => {
                    println!("  Downloading model: {:.0}%", fraction * 100.0)
                }
                TranscriptionProgress::Loading => println!("  Loading model..."),
                TranscriptionProgress::Transcribing => println!("  Transcribing..."),
            });

            let root = session.project.root.clone();
            let count = generate_captions(
                &mut session.store,
                clip.as_deref(),
                &root,
                Box::new(engine),
                Some(progress),
            )
            .await?;
            println!("Generated {count} captions");
        }
        CaptionsAction::List => {
            let captions = session.store.captions();
            for caption in captions.captions() {
                println!(
                    "{} {:>8.2}s - {:>8.2}s  {}",
                    caption.id, caption.start, caption.end, caption.text
                );
            }
            if captions.captions().is_empty() {
                match captions.last_invalidated() {
                    Some(invalidated) => println!("No captions ({})", invalidated.reason),
                    None => println!("No captions"),
                }
            }
            return Ok(());
        }
        CaptionsAction::Enable => session.store.captions_mut().set_enabled(true),
        CaptionsAction::Disable => session.store.captions_mut().set_enabled(false),
        CaptionsAction::Position { position } => {
            session.store.captions_mut().set_position(match position {
                Placement::Top => CaptionPosition::Top,
                Placement::Bottom => CaptionPosition::Bottom,
            })
        }
        CaptionsAction::Style {
            font_size,
            font_family,
            color,
            background,
            max_width,
        } => session.store.captions_mut().update_config(&CaptionConfigPatch {
            font_size_px: font_size,
            font_family,
            color,
            background_color: background,
            max_width,
            ..Default::default()
        }),
        CaptionsAction::Edit { id, text } => {
            if !session.store.captions_mut().update_caption_text(&id, &text) {
                anyhow::bail!("No caption {id}");
            }
        }
        CaptionsAction::Remove { id } => {
            if !session.store.captions_mut().remove_caption(&id) {
                anyhow::bail!("No caption {id}");
            }
        }
        CaptionsAction::Clear => {
            session.store.captions_mut().clear("Cleared by user");
        }
    }

    session.save()
}
