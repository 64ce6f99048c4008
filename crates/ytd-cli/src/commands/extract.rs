use anyhow::Result;
use std::path::Path;
use tokio::sync::mpsc;
use tracing::warn;

use super::progress;
use crate::args::ExtractOptions;
use ytd_core::{
    config::Config,
    downloader::validate_youtube_url,
    pipeline::{Pipeline, PipelineConfig},
};

pub async fn run(url: &str, options: &ExtractOptions, config_path: Option<&Path>) -> Result<()> {
    let config = Config::load(config_path)?;

    if !validate_youtube_url(url) {
        warn!("{} does not look like a YouTube URL, trying anyway", url);
    }

    let pipeline_config = options.apply(PipelineConfig::from_config(&config));

    // Create progress channel
    let (tx, rx) = mpsc::channel(32);
    let progress_handle = tokio::spawn(progress::render(rx));

    let pipeline = Pipeline::new(pipeline_config, tx);
    let result = pipeline.run(url).await;

    // Dropping the pipeline closes the channel so the renderer can finish
    drop(pipeline);
    progress_handle.await??;

    match result {
        Ok(output) => {
            println!("\nOutput: {}", output.audio_path.display());
            progress::print_split(&output.split);
            Ok(())
        }
        Err(e) => {
            eprintln!("\nError: {}", e);
            Err(e.into())
        }
    }
}
