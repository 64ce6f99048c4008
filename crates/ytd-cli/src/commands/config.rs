use anyhow::Result;
use std::path::Path;
use ytd_core::config::Config;

pub async fn run(config_path: Option<&Path>) -> Result<()> {
    let config = Config::load(config_path)?;

    println!("ytd configuration\n");
    print!("{}", config.to_toml()?);

    if config.paths.yt_dlp.is_none() || config.paths.ffmpeg.is_none() {
        println!("\n# Unset tool paths are auto-detected from PATH");
    }

    // Show config file locations
    println!("\nConfig file locations (in priority order):");
    println!("  1. Environment variables (YTD_*, nested keys joined with __)");
    if let Some(p) = config_path {
        println!("  2. {} (specified)", p.display());
    }
    if let Some(default_path) = Config::default_config_path() {
        let state = if default_path.exists() { "" } else { " (not present)" };
        println!("  3. {}{}", default_path.display(), state);
    }

    Ok(())
}
