use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tokio::sync::mpsc;

use ytd_core::pipeline::{PipelineStage, SplitOutcome};

/// Render pipeline stages until the sender side is dropped
pub async fn render(mut rx: mpsc::Receiver<PipelineStage>) -> Result<()> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template("{spinner:.cyan} [{elapsed_precise}] {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));

    let bar_style = ProgressStyle::with_template(
        "{spinner:.cyan} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}",
    )?
    .progress_chars("=>-");

    while let Some(stage) = rx.recv().await {
        match stage {
            PipelineStage::Downloading { url } => {
                pb.set_message(format!("Downloading {}", truncate(&url, 50)));
            }
            PipelineStage::Downloaded { title, path } => {
                pb.println(format!("Downloaded: {} -> {}", title, path.display()));
            }
            PipelineStage::Extracting => {
                pb.set_message("Reading timestamps...");
            }
            PipelineStage::TimestampsFound { count } => {
                pb.set_message(format!("Found {} timestamps", count));
            }
            PipelineStage::Decoding => {
                pb.set_message("Decoding audio...");
            }
            PipelineStage::Splitting { tracks } => {
                pb.set_style(bar_style.clone());
                pb.set_length(tracks as u64);
                pb.set_position(0);
                pb.set_message("Exporting tracks...");
            }
            PipelineStage::TrackDone {
                index,
                total,
                title,
                ok,
            } => {
                pb.inc(1);
                if ok {
                    pb.set_message(truncate(&title, 40));
                } else {
                    pb.println(format!("Track {}/{} failed: {}", index, total, title));
                }
            }
            PipelineStage::Complete { summary, duration } => {
                pb.finish_with_message(format!(
                    "Done: {} ({:.1}s)",
                    summary,
                    duration.as_secs_f32()
                ));
            }
            PipelineStage::Failed { stage, error } => {
                pb.abandon_with_message(format!("Failed at {}: {}", stage, error));
            }
        }
    }

    if !pb.is_finished() {
        pb.finish_and_clear();
    }
    Ok(())
}

/// Print the per-track outcome of a split
pub fn print_split(outcome: &SplitOutcome) {
    match outcome {
        SplitOutcome::Exported { directory, report } => {
            println!("Tracks: {}", directory.display());
            for file in report.exported() {
                println!("  {}", file.path.display());
            }
            for failure in report.failures() {
                eprintln!("  {}", failure);
            }
            println!("{}", report);
        }
        other => println!("{}", other.summary()),
    }
}

pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
