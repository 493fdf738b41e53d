//! Export a project to video.

use std::path::PathBuf;

use montage_common::config::AppConfig;
use montage_project_model::ExportFormat;
use montage_render_engine::{build_plan, export_project, ExportJob, ExportProgress, ExportStage};

use super::Session;

pub async fn run(
    config: &AppConfig,
    path: PathBuf,
    output: Option<PathBuf>,
    format: Option<String>,
    burn_captions: Option<bool>,
    dry_run: bool,
) -> anyhow::Result<()> {
    println!("Exporting project at: {}", path.display());

    let mut session = Session::open(config, &path)?;
    let export = &mut session.project.project.export;
    if let Some(format) = format {
        export.format = format.parse::<ExportFormat>().map_err(|e| {
            anyhow::anyhow!("{e}. Use: mp4-h264, mp4-h265, webm, gif")
        })?;
    }
    if let Some(burn) = burn_captions {
        export.burn_captions = burn;
    }

    let extension = export.format.extension();
    let output_path = output.unwrap_or_else(|| {
        session
            .project
            .root
            .join("exports")
            .join(format!("output.{extension}"))
    });

    let job = ExportJob::from_project(&session.project, &session.store, output_path.clone());

    println!("  Output: {}", output_path.display());
    println!("  Format: {:?}", job.config.format);
    println!(
        "  Canvas: {}x{} @ {}fps",
        job.canvas.width, job.canvas.height, job.canvas.fps
    );
    println!("  Duration: {:.2}s", job.timeline.total_duration);

    if dry_run {
        let plan = build_plan(&job)?;
        println!();
        print!("{}", plan.describe());
        println!();
        println!("ffmpeg {}", plan.ffmpeg_args.join(" "));
        return Ok(());
    }

    let progress_cb: Box<dyn Fn(ExportProgress) + Send> = Box::new(|p: ExportProgress| {
        if p.stage == ExportStage::Rendering {
            print!(
                "\r  Progress: {:.1}% ({}/{} frames, ETA: {:.0}s)  ",
                p.progress * 100.0,
                p.frames_rendered,
                p.total_frames,
                p.eta_secs,
            );
        }
    });

    match export_project(job, Some(progress_cb)).await {
        Ok(path) => {
            println!("\nExport complete: {}", path.display());
            Ok(())
        }
        Err(e) => Err(anyhow::anyhow!("Export failed: {e}")),
    }
}
