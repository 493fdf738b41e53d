//! Montage CLI: command-line front end for the timeline editor.
//!
//! Usage:
//!   montage init <NAME>                 Create a new project
//!   montage info <PATH>                 Show project information
//!   montage import <PATH> <FILE>        Probe a media file and append it
//!   montage text <PATH> <TEXT>          Add a text overlay
//!   montage clip <PATH> <ACTION>        Cut, trim, reorder, delete clips
//!   montage zoom <PATH> <ACTION>        Add and shape zoom effects
//!   montage track <PATH> <ACTION>       Add, lock, hide, remove tracks
//!   montage captions <PATH> <ACTION>    Generate and edit captions
//!   montage subtitles <PATH> <OUT>      Write SRT/VTT from captions
//!   montage frame <PATH> <TIME>         Print the composition at a time
//!   montage export <PATH>               Render the timeline with ffmpeg
//!   montage config [--write]            Show or save the configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use montage_common::config::{config_file_path, AppConfig};

mod commands;

use commands::captions::CaptionsAction;
use commands::clip::ClipAction;
use commands::track::TrackAction;
use commands::zoom::ZoomAction;

#[derive(Parser)]
#[command(
    name = "montage",
    about = "Timeline video editing with magnetic tracks, zoom effects and captions",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to the standard location)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new empty project
    Init {
        /// Project name
        name: String,

        /// Output directory (defaults to the configured projects directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Canvas width (replaced by the first imported video or image)
        #[arg(long)]
        width: Option<u32>,

        /// Canvas height
        #[arg(long)]
        height: Option<u32>,

        /// Frames per second
        #[arg(long)]
        fps: Option<u32>,
    },

    /// Show project information
    Info {
        /// Path to the project directory
        path: PathBuf,
    },

    /// Probe a media file and append it to the timeline
    Import {
        /// Path to the project directory
        path: PathBuf,

        /// Media file to import
        file: PathBuf,

        /// Target track id
        #[arg(long)]
        track: Option<String>,

        /// Reference the file in place instead of copying it into sources/
        #[arg(long)]
        link: bool,
    },

    /// Add a text overlay
    Text {
        /// Path to the project directory
        path: PathBuf,

        /// Text to show
        text: String,

        /// Start time (seconds)
        #[arg(long, default_value = "0")]
        start: f64,

        /// Duration (seconds)
        #[arg(long, default_value = "3")]
        duration: f64,

        /// Target track id
        #[arg(long)]
        track: Option<String>,

        /// Font size in pixels
        #[arg(long)]
        size: Option<f64>,

        /// CSS color
        #[arg(long)]
        color: Option<String>,

        /// Horizontal center, normalized
        #[arg(long)]
        x: Option<f64>,

        /// Vertical center, normalized
        #[arg(long)]
        y: Option<f64>,
    },

    /// Edit clips
    Clip {
        /// Path to the project directory
        path: PathBuf,

        #[command(subcommand)]
        action: ClipAction,
    },

    /// Edit zoom effects
    Zoom {
        /// Path to the project directory
        path: PathBuf,

        #[command(subcommand)]
        action: ZoomAction,
    },

    /// Edit tracks
    Track {
        /// Path to the project directory
        path: PathBuf,

        #[command(subcommand)]
        action: TrackAction,
    },

    /// Generate and edit captions
    Captions {
        /// Path to the project directory
        path: PathBuf,

        #[command(subcommand)]
        action: CaptionsAction,
    },

    /// Write captions as an SRT or VTT file
    Subtitles {
        /// Path to the project directory
        path: PathBuf,

        /// Output file (.srt or .vtt)
        output: PathBuf,
    },

    /// Print the composition of a single instant as JSON
    Frame {
        /// Path to the project directory
        path: PathBuf,

        /// Timeline time (seconds)
        time: f64,
    },

    /// Export the timeline to a video file
    Export {
        /// Path to the project directory
        path: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format: mp4-h264, mp4-h265, webm, gif
        #[arg(long)]
        format: Option<String>,

        /// Burn captions into the video
        #[arg(long)]
        burn_captions: Option<bool>,

        /// Print the ffmpeg plan without running it
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the effective configuration
    Config {
        /// Write it to the config file
        #[arg(long)]
        write: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    };

    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    montage_common::logging::init_logging(&logging);

    match cli.command {
        Commands::Init {
            name,
            output,
            width,
            height,
            fps,
        } => commands::init::run(&config, name, output, width, height, fps),
        Commands::Info { path } => commands::info::run(&config, path),
        Commands::Import {
            path,
            file,
            track,
            link,
        } => commands::import::run(&config, path, file, track, link),
        Commands::Text {
            path,
            text,
            start,
            duration,
            track,
            size,
            color,
            x,
            y,
        } => commands::text::run(
            &config,
            path,
            commands::text::TextArgs {
                text,
                start,
                duration,
                track,
                size,
                color,
                x,
                y,
            },
        ),
        Commands::Clip { path, action } => commands::clip::run(&config, path, action),
        Commands::Zoom { path, action } => commands::zoom::run(&config, path, action),
        Commands::Track { path, action } => commands::track::run(&config, path, action),
        Commands::Captions { path, action } => {
            commands::captions::run(&config, path, action).await
        }
        Commands::Subtitles { path, output } => commands::subtitles::run(&config, path, output),
        Commands::Frame { path, time } => commands::frame::run(&config, path, time),
        Commands::Export {
            path,
            output,
            format,
            burn_captions,
            dry_run,
        } => commands::export::run(&config, path, output, format, burn_captions, dry_run).await,
        Commands::Config { write } => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            if write {
                let target = cli.config.unwrap_or_else(config_file_path);
                config.save_to(&target)?;
                println!("Saved to {}", target.display());
            }
            Ok(())
        }
    }
}
