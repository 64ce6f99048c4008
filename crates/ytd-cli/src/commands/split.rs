use anyhow::{Context, Result};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::sync::mpsc;

use super::progress;
use crate::args::EncodeOptions;
use ytd_core::{
    config::Config,
    pipeline::{Pipeline, PipelineConfig},
};

pub struct SplitArgs {
    pub audio: PathBuf,
    pub description: PathBuf,
    pub title: Option<String>,
    pub output: Option<PathBuf>,
    pub encode: EncodeOptions,
}

pub async fn run(args: &SplitArgs, config_path: Option<&Path>) -> Result<()> {
    let config = Config::load(config_path)?;

    if !args.audio.exists() {
        anyhow::bail!("Audio file not found: {}", args.audio.display());
    }

    let description = read_text(Some(&args.description))?;

    let title = match args.title {
        Some(ref title) => title.clone(),
        None => args
            .audio
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default(),
    };

    let mut pipeline_config = args.encode.apply(PipelineConfig::from_config(&config));
    if let Some(ref output) = args.output {
        pipeline_config.output_dir = output.clone();
    }

    let (tx, rx) = mpsc::channel(32);
    let progress_handle = tokio::spawn(progress::render(rx));

    let start_time = Instant::now();
    let pipeline = Pipeline::new(pipeline_config, tx);
    let result = pipeline.split_file(&args.audio, &description, &title, None).await;
    if let Ok(ref outcome) = result {
        pipeline.complete(start_time, outcome).await;
    }

    drop(pipeline);
    progress_handle.await??;

    let outcome = result?;
    progress::print_split(&outcome);
    Ok(())
}

/// Read a whole text file, or stdin for `-` or no path
pub fn read_text(path: Option<&Path>) -> Result<String> {
    match path {
        Some(p) if p != Path::new("-") => std::fs::read_to_string(p)
            .with_context(|| format!("Failed to read {}", p.display())),
        _ => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read stdin")?;
            Ok(text)
        }
    }
}
