//! Configuration management for ytd

use crate::encoder::{Bitrate, OutputFormat};
use crate::error::ConfigError;
use crate::planner::{PlannerOptions, PreamblePolicy};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub paths: PathsConfig,
    pub output: OutputConfig,
    pub split: SplitConfig,
    pub export: ExportConfig,
    pub temp: TempConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Path to yt-dlp binary (auto-detected if not set)
    pub yt_dlp: Option<PathBuf>,
    /// Path to FFmpeg binary (auto-detected if not set)
    pub ffmpeg: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Default output directory
    pub default_directory: PathBuf,
    /// Audio format of the download and of split tracks
    pub format: OutputFormat,
    /// One of 128k, 192k, 256k, 320k
    pub bitrate: Bitrate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Split by description timestamps unless --no-split is given
    pub enabled: bool,
    /// "drop" or "keep" the audio before the first timestamp
    pub preamble: PreamblePolicy,
    /// A first timestamp at or below this many milliseconds counts as the start
    pub start_tolerance_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Concurrent track encodes (0 = number of CPU cores)
    pub max_parallel: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TempConfig {
    /// Clean up temp files after processing
    pub cleanup: bool,
    /// Custom temp directory (uses system temp if not set)
    pub directory: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            default_directory: PathBuf::from("."),
            format: OutputFormat::Mp3,
            bitrate: Bitrate::K320,
        }
    }
}

impl Default for SplitConfig {
    fn default() -> Self {
        let planner = PlannerOptions::default();
        Self {
            enabled: true,
            preamble: planner.preamble,
            start_tolerance_ms: planner.start_tolerance_ms,
        }
    }
}

impl Default for TempConfig {
    fn default() -> Self {
        Self {
            cleanup: true,
            directory: None,
        }
    }
}

impl Config {
    /// Load configuration from defaults, config files and environment
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        // Load from default config directory
        if let Some(default_config) = Self::default_config_path() {
            if default_config.exists() {
                figment = figment.merge(Toml::file(&default_config));
            }
        }

        // Load from specified config file
        if let Some(path) = config_file {
            figment = figment.merge(Toml::file(path));
        }

        Self::from_figment(figment)
    }

    fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        // YTD_SPLIT__PREAMBLE=keep, YTD_EXPORT__MAX_PARALLEL=2
        figment
            .merge(Env::prefixed("YTD_").split("__"))
            .extract()
            .map_err(|e| ConfigError::LoadError(e.to_string()))
    }

    /// `{config_dir}/ytd/config.toml`
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("ytd/config.toml"))
    }

    /// Get yt-dlp path, auto-detecting if not configured
    pub fn yt_dlp_path(&self) -> Result<PathBuf, ConfigError> {
        self.paths.yt_dlp_path()
    }

    /// Get FFmpeg path, auto-detecting if not configured
    pub fn ffmpeg_path(&self) -> Result<PathBuf, ConfigError> {
        self.paths.ffmpeg_path()
    }

    pub fn planner_options(&self) -> PlannerOptions {
        PlannerOptions {
            preamble: self.split.preamble,
            start_tolerance_ms: self.split.start_tolerance_ms,
        }
    }

    /// Get temp directory
    pub fn temp_dir(&self) -> PathBuf {
        self.temp.directory.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }
}

impl PathsConfig {
    pub fn yt_dlp_path(&self) -> Result<PathBuf, ConfigError> {
        resolve_tool(self.yt_dlp.as_ref(), "yt-dlp")
    }

    pub fn ffmpeg_path(&self) -> Result<PathBuf, ConfigError> {
        resolve_tool(self.ffmpeg.as_ref(), "ffmpeg")
    }
}

fn resolve_tool(configured: Option<&PathBuf>, name: &str) -> Result<PathBuf, ConfigError> {
    if let Some(path) = configured {
        Ok(path.clone())
    } else {
        which::which(name)
            .map_err(|_| ConfigError::InvalidValue(format!("{} not found in PATH", name)))
    }
}
