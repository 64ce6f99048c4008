//! Error types for ytd-core

use crate::timecode::TimeOffset;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, YtdError>;

#[derive(Error, Debug)]
pub enum YtdError {
    #[error("Download failed: {0}")]
    Download(#[from] DownloadError),

    #[error("Decode failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("Track planning failed: {0}")]
    Plan(#[from] PlanError),

    #[error("Export failed: {0}")]
    Export(#[from] ExportError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("yt-dlp not found. Install with: pip install yt-dlp")]
    YtDlpNotFound,

    #[error("yt-dlp failed with exit code: {0:?}")]
    YtDlpFailed(Option<i32>),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Video unavailable or private: {0}")]
    VideoUnavailable(String),

    #[error("No audio stream available")]
    NoAudioStream,

    #[error("Failed to parse metadata: {0}")]
    MetadataParse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("FFmpeg not found. Install with: brew install ffmpeg")]
    FfmpegNotFound,

    #[error("FFmpeg failed with exit code: {0:?}")]
    FfmpegFailed(Option<i32>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("FFmpeg encoding failed with exit code: {0:?}")]
    FfmpegFailed(Option<i32>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A time token that does not match `S`, `M:SS`, `MM:SS` or `H:MM:SS`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimeParseError {
    #[error("Malformed time token: {0:?}")]
    Malformed(String),

    #[error("Field out of range in time token: {0:?}")]
    OutOfRange(String),
}

/// The total duration is missing or inconsistent with the timestamps.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("Total duration is zero or unknown")]
    ZeroDuration,

    #[error("Timestamp at {offset} ms lies beyond the total duration of {total} ms")]
    OffsetBeyondDuration { offset: TimeOffset, total: TimeOffset },
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to create output directory {path}: {source}")]
    OutputDir {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[error("All {0} tracks failed to export")]
    AllFailed(usize),
}

/// Failure to export a single track. Recorded in the export report rather than
/// propagated.
#[derive(Error, Debug)]
#[error("Track {index} ({title}) failed: {source}")]
pub struct ExportFailure {
    pub index: usize,
    pub title: String,
    #[source]
    pub source: EncodeError,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    LoadError(String),

    #[error("Invalid config value: {0}")]
    InvalidValue(String),

    #[error("Failed to serialize config: {0}")]
    Serialize(String),
}
