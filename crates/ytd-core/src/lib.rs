//! ytd-core: timestamp extraction and track splitting for downloaded YouTube audio
//!
//! The splitting engine is four stages:
//! - [`timecode`]: `M:SS` / `H:MM:SS` tokens to millisecond offsets
//! - [`timestamps`]: description text to an ordered, deduplicated timestamp list
//! - [`planner`]: timestamps plus total duration to contiguous track boundaries
//! - [`exporter`]: boundaries to individually encoded, safely named files
//!
//! [`pipeline`] wires these to the yt-dlp downloader and the FFmpeg decoder and
//! encoder.

pub mod config;
pub mod decoder;
pub mod downloader;
pub mod encoder;
pub mod error;
pub mod exporter;
pub mod pipeline;
pub mod planner;
pub mod timecode;
pub mod timestamps;

pub use config::Config;
pub use error::{Result, YtdError};
