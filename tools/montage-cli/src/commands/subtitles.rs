//! Write captions as a subtitle file.

use std::path::PathBuf;

use montage_audio_ai::save_subtitles;
use montage_common::config::AppConfig;

use super::Session;

pub fn run(config: &AppConfig, path: PathBuf, output: PathBuf) -> anyhow::Result<()> {
    let session = Session::open(config, &path)?;
    let captions = session.store.captions().captions();
    if captions.is_empty() {
        anyhow::bail!("Project has no captions; run `montage captions generate` first");
    }

    save_subtitles(captions, &output)?;
    println!("Wrote {} captions to {}", captions.len(), output.display());
    Ok(())
}
