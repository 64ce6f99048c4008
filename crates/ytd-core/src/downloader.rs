//! YouTube audio downloader using yt-dlp

use crate::encoder::{Bitrate, OutputFormat};
use crate::error::DownloadError;
use crate::exporter::sanitize_filename;
use serde::Deserialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

#[derive(Debug)]
pub struct Downloader {
    yt_dlp_path: PathBuf,
    output_dir: PathBuf,
}

#[derive(Debug)]
pub struct DownloadResult {
    pub audio_path: PathBuf,
    pub metadata: VideoMetadata,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoMetadata {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub uploader: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl VideoMetadata {
    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }
}

impl Downloader {
    pub fn new(yt_dlp_path: PathBuf, output_dir: PathBuf) -> Self {
        Self {
            yt_dlp_path,
            output_dir,
        }
    }

    /// Download and convert the best audio stream of a single video.
    ///
    /// The file lands in the output directory as `{sanitized title}.{ext}`.
    pub async fn download(
        &self,
        url: &str,
        format: OutputFormat,
        bitrate: Bitrate,
    ) -> Result<DownloadResult, DownloadError> {
        info!("Downloading audio from: {}", url);

        tokio::fs::create_dir_all(&self.output_dir).await?;
        let output_template = self.output_dir.join("%(id)s.%(ext)s");

        let output = Command::new(&self.yt_dlp_path)
            .args(["-f", "bestaudio/best", "--extract-audio"])
            .args(["--audio-format", format.extension()])
            .args(["--audio-quality", bitrate.as_str()])
            .arg("-o")
            .arg(&output_template)
            // Print JSON to stdout for metadata parsing
            .args(["--print-json", "--no-playlist", "--no-progress"])
            .arg(url)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == ErrorKind::NotFound {
                    DownloadError::YtDlpNotFound
                } else {
                    DownloadError::Io(e)
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!("yt-dlp stderr: {}", stderr);
            return Err(classify_failure(url, &stderr, output.status.code()));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let metadata = parse_metadata(&stdout)?;
        debug!("Downloaded: {} ({})", metadata.title, metadata.id);

        let downloaded = self.find_audio_file(&metadata.id, format)?;
        let audio_path = self.rename_to_title(&downloaded, &metadata, format).await?;

        Ok(DownloadResult {
            audio_path,
            metadata,
        })
    }

    fn find_audio_file(&self, video_id: &str, format: OutputFormat) -> Result<PathBuf, DownloadError> {
        let preferred = self
            .output_dir
            .join(format!("{}.{}", video_id, format.extension()));
        if preferred.exists() {
            return Ok(preferred);
        }

        // Fall back to whatever audio container yt-dlp left behind
        for ext in ["mp3", "m4a", "opus", "webm", "ogg", "aac"] {
            let path = self.output_dir.join(format!("{}.{}", video_id, ext));
            if path.exists() {
                debug!("Found audio file: {}", path.display());
                return Ok(path);
            }
        }

        Err(DownloadError::NoAudioStream)
    }

    async fn rename_to_title(
        &self,
        downloaded: &Path,
        metadata: &VideoMetadata,
        format: OutputFormat,
    ) -> Result<PathBuf, DownloadError> {
        let mut stem = sanitize_filename(&metadata.title);
        if stem.is_empty() {
            stem = metadata.id.clone();
        }
        let ext = downloaded
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or(format.extension());
        let target = self.output_dir.join(format!("{}.{}", stem, ext));

        if target != downloaded {
            tokio::fs::rename(downloaded, &target).await?;
        }
        Ok(target)
    }
}

/// yt-dlp may print several JSON lines; the last complete object describes the video
fn parse_metadata(stdout: &str) -> Result<VideoMetadata, DownloadError> {
    let line = stdout
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| l.starts_with('{'))
        .ok_or_else(|| DownloadError::MetadataParse("no JSON in yt-dlp output".to_string()))?;

    serde_json::from_str(line).map_err(|e| DownloadError::MetadataParse(e.to_string()))
}

fn classify_failure(url: &str, stderr: &str, code: Option<i32>) -> DownloadError {
    if stderr.contains("Video unavailable") || stderr.contains("Private video") {
        return DownloadError::VideoUnavailable(url.to_string());
    }
    if stderr.contains("is not a valid URL") || stderr.contains("Unsupported URL") {
        return DownloadError::InvalidUrl(url.to_string());
    }
    DownloadError::YtDlpFailed(code)
}

/// Validate that a string looks like a YouTube URL
pub fn validate_youtube_url(url: &str) -> bool {
    url.contains("youtube.com/watch")
        || url.contains("youtu.be/")
        || url.contains("youtube.com/shorts")
        || url.contains("youtube.com/live")
        || url.contains("music.youtube.com")
}
