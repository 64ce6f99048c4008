use anyhow::{Context, Result};
use std::path::Path;

use super::split::read_text;
use ytd_core::{
    config::Config,
    planner::{PreamblePolicy, TrackPlanner},
    timecode,
    timestamps::TimestampExtractor,
};

pub fn run(
    input: Option<&Path>,
    duration: Option<&str>,
    keep_preamble: bool,
    config_path: Option<&Path>,
) -> Result<()> {
    let config = Config::load(config_path)?;
    let description = read_text(input)?;

    let timestamps = TimestampExtractor::default().extract(&description);
    if timestamps.is_empty() {
        println!("No timestamps found; the video would be kept as a single file.");
        return Ok(());
    }

    println!("Found {} timestamps:", timestamps.len());
    for (i, candidate) in timestamps.iter().enumerate() {
        println!(
            "{:2}. {:>8}  {}",
            i + 1,
            timecode::format(candidate.offset),
            candidate.title
        );
    }

    let Some(duration) = duration else {
        return Ok(());
    };

    let total_ms = timecode::parse(duration)
        .with_context(|| format!("Invalid duration {:?}", duration))?;

    let mut options = config.planner_options();
    if keep_preamble {
        options.preamble = PreamblePolicy::Keep;
    }

    match TrackPlanner::new(options).plan(&timestamps, total_ms) {
        Ok(plan) => {
            println!("\nPlanned {} tracks:", plan.len());
            for boundary in &plan {
                println!("  {}", boundary);
            }
        }
        Err(e) => println!("\nNo split: {}", e),
    }

    Ok(())
}
