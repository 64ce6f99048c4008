//! Segment encoding using FFmpeg

use crate::error::EncodeError;
use crate::timecode::{self, TimeOffset};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tokio::process::Command;
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Mp3,
    Aac,
    Opus,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Mp3 => "mp3",
            OutputFormat::Aac => "m4a",
            OutputFormat::Opus => "opus",
        }
    }

    fn codec(&self) -> &'static str {
        match self {
            OutputFormat::Mp3 => "libmp3lame",
            OutputFormat::Aac => "aac",
            OutputFormat::Opus => "libopus",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Mp3 => write!(f, "MP3"),
            OutputFormat::Aac => write!(f, "AAC"),
            OutputFormat::Opus => write!(f, "Opus"),
        }
    }
}

/// Target bitrate. Only these four values are accepted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Bitrate {
    #[serde(rename = "128k")]
    K128,
    #[serde(rename = "192k")]
    K192,
    #[serde(rename = "256k")]
    K256,
    #[default]
    #[serde(rename = "320k")]
    K320,
}

impl Bitrate {
    pub fn as_str(&self) -> &'static str {
        match self {
            Bitrate::K128 => "128k",
            Bitrate::K192 => "192k",
            Bitrate::K256 => "256k",
            Bitrate::K320 => "320k",
        }
    }
}

impl std::fmt::Display for Bitrate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Bitrate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "128k" => Ok(Bitrate::K128),
            "192k" => Ok(Bitrate::K192),
            "256k" => Ok(Bitrate::K256),
            "320k" => Ok(Bitrate::K320),
            other => Err(format!(
                "unsupported bitrate {:?} (expected 128k, 192k, 256k or 320k)",
                other
            )),
        }
    }
}

/// Tags written into an exported track
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackTags {
    pub title: String,
    pub track: usize,
    pub track_total: usize,
    pub album: Option<String>,
    pub artist: Option<String>,
}

/// Everything needed to produce one encoded track
#[derive(Debug, Clone)]
pub struct SegmentRequest<'a> {
    pub source: &'a Path,
    pub start: TimeOffset,
    pub end: TimeOffset,
    pub format: OutputFormat,
    pub bitrate: Bitrate,
    pub output: PathBuf,
    pub tags: TrackTags,
}

/// Produces an encoded file for `[start, end)` of a decoded source
pub trait SegmentEncoder: Send + Sync {
    fn encode_segment(
        &self,
        request: SegmentRequest<'_>,
    ) -> impl Future<Output = Result<PathBuf, EncodeError>> + Send;
}

#[derive(Debug)]
pub struct Encoder {
    ffmpeg_path: PathBuf,
}

impl Encoder {
    pub fn new(ffmpeg_path: PathBuf) -> Self {
        Self { ffmpeg_path }
    }

    fn segment_args(request: &SegmentRequest<'_>) -> Vec<String> {
        let mut args = vec![
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-i".to_string(),
            request.source.display().to_string(),
            // Output-side seeking decodes up to the cut, so cuts land on samples
            "-ss".to_string(),
            timecode::to_ffmpeg_seconds(request.start),
            "-to".to_string(),
            timecode::to_ffmpeg_seconds(request.end),
            "-vn".to_string(),
            "-c:a".to_string(),
            request.format.codec().to_string(),
            "-b:a".to_string(),
            request.bitrate.to_string(),
        ];

        let tags = &request.tags;
        args.push("-metadata".to_string());
        args.push(format!("title={}", tags.title));
        args.push("-metadata".to_string());
        args.push(format!("track={}/{}", tags.track, tags.track_total));
        if let Some(ref album) = tags.album {
            args.push("-metadata".to_string());
            args.push(format!("album={}", album));
        }
        if let Some(ref artist) = tags.artist {
            args.push("-metadata".to_string());
            args.push(format!("artist={}", artist));
        }

        args.push("-y".to_string());
        args.push(request.output.display().to_string());
        args
    }
}

impl SegmentEncoder for Encoder {
    async fn encode_segment(&self, request: SegmentRequest<'_>) -> Result<PathBuf, EncodeError> {
        debug!(
            "Encoding {} - {} ms to {}",
            request.start,
            request.end,
            request.output.display()
        );

        let status = Command::new(&self.ffmpeg_path)
            .args(Self::segment_args(&request))
            .status()
            .await?;

        if !status.success() {
            return Err(EncodeError::FfmpegFailed(status.code()));
        }

        Ok(request.output)
    }
}
