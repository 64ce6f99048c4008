use anyhow::Result;
use std::path::{Path, PathBuf};
use std::process::Command;

use ytd_core::config::Config;

pub async fn run(config_path: Option<&Path>) -> Result<()> {
    let config = Config::load(config_path)?;

    println!("ytd dependency check\n");

    let mut all_ok = true;

    // Check yt-dlp
    print!("yt-dlp:  ");
    all_ok &= report_tool(
        config.yt_dlp_path().ok(),
        &["--version"],
        |stdout| stdout.trim().to_string(),
        "pip install yt-dlp",
    );

    // Check FFmpeg
    print!("ffmpeg:  ");
    all_ok &= report_tool(
        config.ffmpeg_path().ok(),
        &["-version"],
        |stdout| {
            // "ffmpeg version 6.1.1 Copyright ..." -> "6.1.1"
            stdout
                .lines()
                .next()
                .and_then(|line| line.split_whitespace().nth(2))
                .unwrap_or("unknown")
                .to_string()
        },
        "brew install ffmpeg",
    );

    println!();
    if all_ok {
        println!("All dependencies OK!");
    } else {
        println!("Some dependencies are missing. See above for installation instructions.");
    }

    Ok(())
}

fn report_tool(
    path: Option<PathBuf>,
    version_args: &[&str],
    version_of: impl Fn(&str) -> String,
    install_hint: &str,
) -> bool {
    let Some(path) = path else {
        println!("NOT FOUND");
        println!("         Install with: {}", install_hint);
        return false;
    };

    match Command::new(&path).args(version_args).output() {
        Ok(out) if out.status.success() => {
            let stdout = String::from_utf8_lossy(&out.stdout);
            println!("OK ({}, {})", version_of(&stdout), path.display());
            true
        }
        _ => {
            println!("FOUND at {} but failed to get version", path.display());
            false
        }
    }
}
