//! Pipeline orchestration: download, extract timestamps, plan, export

use crate::config::{Config, PathsConfig};
use crate::decoder::Decoder;
use crate::downloader::Downloader;
use crate::encoder::{Bitrate, Encoder, OutputFormat};
use crate::error::{ExportError, YtdError};
use crate::exporter::{sanitize_filename, ExportReport, ExportSettings, SegmentExporter};
use crate::planner::{PlannerOptions, TrackPlanner};
use crate::timestamps::TimestampExtractor;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub output_dir: PathBuf,
    pub format: OutputFormat,
    pub bitrate: Bitrate,
    /// Split by description timestamps after downloading
    pub split: bool,
    pub planner: PlannerOptions,
    /// Concurrent track encodes (0 = number of CPU cores)
    pub max_parallel: usize,
    pub keep_temp: bool,
    pub temp_dir: PathBuf,
    pub paths: PathsConfig,
}

impl PipelineConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            output_dir: config.output.default_directory.clone(),
            format: config.output.format,
            bitrate: config.output.bitrate,
            split: config.split.enabled,
            planner: config.planner_options(),
            max_parallel: config.export.max_parallel,
            keep_temp: !config.temp.cleanup,
            temp_dir: config.temp_dir(),
            paths: config.paths.clone(),
        }
    }
}

/// Pipeline progress stages
#[derive(Debug, Clone)]
pub enum PipelineStage {
    Downloading { url: String },
    Downloaded { title: String, path: PathBuf },
    Extracting,
    TimestampsFound { count: usize },
    Decoding,
    Splitting { tracks: usize },
    TrackDone { index: usize, total: usize, title: String, ok: bool },
    Complete { summary: String, duration: Duration },
    Failed { stage: String, error: String },
}

/// What happened to the split step
#[derive(Debug)]
pub enum SplitOutcome {
    /// Splitting was turned off
    Disabled,
    /// The description held no timestamps; the single file is kept
    NoTimestamps,
    /// Timestamps were found but did not fit the audio; the single file is kept
    Skipped { reason: String },
    Exported { directory: PathBuf, report: ExportReport },
}

impl SplitOutcome {
    pub fn summary(&self) -> String {
        match self {
            SplitOutcome::Disabled => "split disabled".to_string(),
            SplitOutcome::NoTimestamps => "no timestamps found, kept single file".to_string(),
            SplitOutcome::Skipped { reason } => format!("split skipped: {}", reason),
            SplitOutcome::Exported { directory, report } => {
                format!("{} in {}", report, directory.display())
            }
        }
    }
}

#[derive(Debug)]
pub struct PipelineOutput {
    pub audio_path: PathBuf,
    pub split: SplitOutcome,
}

/// Main processing pipeline
pub struct Pipeline {
    config: PipelineConfig,
    progress_tx: mpsc::Sender<PipelineStage>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, progress_tx: mpsc::Sender<PipelineStage>) -> Self {
        Self { config, progress_tx }
    }

    /// Download `url` and, unless disabled, split it by description timestamps
    pub async fn run(&self, url: &str) -> Result<PipelineOutput, YtdError> {
        let start_time = Instant::now();
        info!("Starting pipeline for: {}", url);

        let yt_dlp_path = self.config.paths.yt_dlp_path()?;

        let _ = self
            .progress_tx
            .send(PipelineStage::Downloading {
                url: url.to_string(),
            })
            .await;

        let downloader = Downloader::new(yt_dlp_path, self.config.output_dir.clone());
        let download = downloader
            .download(url, self.config.format, self.config.bitrate)
            .await
            .map_err(|e| self.report_failure("download", e))?;

        let _ = self
            .progress_tx
            .send(PipelineStage::Downloaded {
                title: download.metadata.title.clone(),
                path: download.audio_path.clone(),
            })
            .await;

        let split = if self.config.split {
            self.split_file(
                &download.audio_path,
                download.metadata.description(),
                &download.metadata.title,
                download.metadata.uploader.as_deref(),
            )
            .await?
        } else {
            SplitOutcome::Disabled
        };

        self.complete(start_time, &split).await;

        Ok(PipelineOutput {
            audio_path: download.audio_path,
            split,
        })
    }

    /// Split a local audio file by the timestamps in `description`.
    ///
    /// Tracks are written to `{output_dir}/{sanitized title}/`.
    pub async fn split_file(
        &self,
        audio_path: &Path,
        description: &str,
        title: &str,
        artist: Option<&str>,
    ) -> Result<SplitOutcome, YtdError> {
        let _ = self.progress_tx.send(PipelineStage::Extracting).await;

        let timestamps = TimestampExtractor::default().extract(description);
        if timestamps.is_empty() {
            info!("No timestamps found in the description");
            return Ok(SplitOutcome::NoTimestamps);
        }
        info!("Found {} timestamps in the description", timestamps.len());
        let _ = self
            .progress_tx
            .send(PipelineStage::TimestampsFound {
                count: timestamps.len(),
            })
            .await;

        let ffmpeg_path = self.config.paths.ffmpeg_path()?;

        tokio::fs::create_dir_all(&self.config.temp_dir).await?;
        let temp_dir = tempfile::Builder::new()
            .prefix("ytd-")
            .tempdir_in(&self.config.temp_dir)?;
        let work_dir = temp_dir.path().to_path_buf();
        debug!("Temp directory: {}", work_dir.display());

        // Kept or removed however the split ends
        let _cleanup = if self.config.keep_temp {
            info!("Temp files kept at: {}", work_dir.display());
            std::mem::forget(temp_dir);
            None
        } else {
            Some(temp_dir)
        };

        let _ = self.progress_tx.send(PipelineStage::Decoding).await;
        let source = Decoder::new(ffmpeg_path.clone())
            .open(audio_path, &work_dir)
            .await
            .map_err(|e| self.report_failure("decode", e))?;

        let planner = TrackPlanner::new(self.config.planner);
        let plan = match planner.plan(&timestamps, source.duration_ms) {
            Ok(plan) if plan.is_empty() => {
                warn!("Timestamps produced no playable tracks, keeping single file");
                return Ok(SplitOutcome::Skipped {
                    reason: "no non-empty tracks".to_string(),
                });
            }
            Ok(plan) => plan,
            Err(e) => {
                warn!("Not splitting: {}", e);
                return Ok(SplitOutcome::Skipped {
                    reason: e.to_string(),
                });
            }
        };

        let _ = self
            .progress_tx
            .send(PipelineStage::Splitting { tracks: plan.len() })
            .await;

        let mut dir_name = sanitize_filename(title);
        if dir_name.is_empty() {
            dir_name = "tracks".to_string();
        }
        let tracks_dir = self.config.output_dir.join(dir_name);

        let settings = ExportSettings {
            format: self.config.format,
            bitrate: self.config.bitrate,
            album: Some(title.to_string()).filter(|t| !t.is_empty()),
            artist: artist.map(str::to_string),
        };

        let total = plan.len();
        let exporter = SegmentExporter::new(Encoder::new(ffmpeg_path))
            .with_max_parallel(self.config.max_parallel);
        let report = exporter
            .export(&plan, &source, &tracks_dir, &settings, |result| {
                let (index, title, ok) = match result {
                    Ok(file) => (file.boundary.index, file.boundary.title.clone(), true),
                    Err(failure) => (failure.index, failure.title.clone(), false),
                };
                let _ = self.progress_tx.try_send(PipelineStage::TrackDone {
                    index,
                    total,
                    title,
                    ok,
                });
            })
            .await
            .map_err(|e| self.report_failure("export", e))?;

        if report.all_failed() {
            return Err(self.report_failure("export", ExportError::AllFailed(report.total())));
        }

        Ok(SplitOutcome::Exported {
            directory: tracks_dir,
            report,
        })
    }

    /// Signal the end of a standalone split started with [`Pipeline::split_file`]
    pub async fn complete(&self, start_time: Instant, split: &SplitOutcome) {
        let duration = start_time.elapsed();
        info!(
            "Pipeline complete: {} ({:.1}s)",
            split.summary(),
            duration.as_secs_f32()
        );
        let _ = self
            .progress_tx
            .send(PipelineStage::Complete {
                summary: split.summary(),
                duration,
            })
            .await;
    }

    fn report_failure<E>(&self, stage: &str, error: E) -> YtdError
    where
        E: Into<YtdError> + std::fmt::Display,
    {
        let _ = self.progress_tx.try_send(PipelineStage::Failed {
            stage: stage.to_string(),
            error: error.to_string(),
        });
        error.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(output_dir: &Path) -> PipelineConfig {
        PipelineConfig {
            output_dir: output_dir.to_path_buf(),
            format: OutputFormat::Mp3,
            bitrate: Bitrate::K320,
            split: true,
            planner: PlannerOptions::default(),
            max_parallel: 1,
            keep_temp: false,
            temp_dir: output_dir.join("tmp"),
            paths: PathsConfig {
                yt_dlp: Some(PathBuf::from("/nonexistent/yt-dlp")),
                ffmpeg: Some(PathBuf::from("/nonexistent/ffmpeg")),
            },
        }
    }

    #[tokio::test]
    async fn test_no_timestamps_keeps_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, mut rx) = mpsc::channel(8);
        let pipeline = Pipeline::new(test_config(dir.path()), tx);

        let outcome = pipeline
            .split_file(
                &dir.path().join("song.mp3"),
                "Thanks for watching!\nSubscribe for more.",
                "Song",
                None,
            )
            .await
            .unwrap();

        assert!(matches!(outcome, SplitOutcome::NoTimestamps));
        assert!(matches!(rx.recv().await, Some(PipelineStage::Extracting)));
        assert!(!dir.path().join("Song").exists());
    }

    #[tokio::test]
    async fn test_missing_ffmpeg_surfaces_decode_failure() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, mut rx) = mpsc::channel(8);
        let pipeline = Pipeline::new(test_config(dir.path()), tx);

        let result = pipeline
            .split_file(&dir.path().join("song.mp3"), "0:00 Intro\n1:00 Outro", "Song", None)
            .await;
        assert!(matches!(result, Err(YtdError::Decode(_))));

        let mut saw_failure = false;
        while let Ok(stage) = rx.try_recv() {
            if let PipelineStage::Failed { stage, .. } = stage {
                assert_eq!(stage, "decode");
                saw_failure = true;
            }
        }
        assert!(saw_failure);
    }

    #[tokio::test]
    async fn test_keep_temp_survives_failed_decode() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(dir.path());
        config.keep_temp = true;
        let (tx, _rx) = mpsc::channel(8);
        let pipeline = Pipeline::new(config, tx);

        let result = pipeline
            .split_file(&dir.path().join("song.mp3"), "0:00 Intro\n1:00 Outro", "Song", None)
            .await;
        assert!(matches!(result, Err(YtdError::Decode(_))));

        let kept: Vec<_> = std::fs::read_dir(dir.path().join("tmp"))
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().starts_with("ytd-"))
            .collect();
        assert_eq!(kept.len(), 1);
    }

    #[tokio::test]
    async fn test_temp_removed_after_failed_decode() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, _rx) = mpsc::channel(8);
        let pipeline = Pipeline::new(test_config(dir.path()), tx);

        let result = pipeline
            .split_file(&dir.path().join("song.mp3"), "0:00 Intro\n1:00 Outro", "Song", None)
            .await;
        assert!(result.is_err());
        assert_eq!(std::fs::read_dir(dir.path().join("tmp")).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_missing_yt_dlp_fails_download() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, _rx) = mpsc::channel(8);
        let pipeline = Pipeline::new(test_config(dir.path()), tx);

        let result = pipeline.run("https://youtu.be/dQw4w9WgXcQ").await;
        assert!(matches!(
            result,
            Err(YtdError::Download(crate::error::DownloadError::YtDlpNotFound))
        ));
    }

    #[test]
    fn test_split_outcome_summary() {
        let outcome = SplitOutcome::Skipped {
            reason: "Total duration is zero or unknown".to_string(),
        };
        assert_eq!(
            outcome.summary(),
            "split skipped: Total duration is zero or unknown"
        );
        assert_eq!(SplitOutcome::Disabled.summary(), "split disabled");
    }

    #[test]
    fn test_from_config() {
        let mut config = Config::default();
        config.temp.cleanup = false;
        config.export.max_parallel = 3;
        let pipeline_config = PipelineConfig::from_config(&config);
        assert!(pipeline_config.keep_temp);
        assert!(pipeline_config.split);
        assert_eq!(pipeline_config.max_parallel, 3);
        assert_eq!(pipeline_config.bitrate, Bitrate::K320);
    }
}
