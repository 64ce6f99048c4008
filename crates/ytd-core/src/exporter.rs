//! Writes planned tracks as independently encoded files

use crate::decoder::SourceAudio;
use crate::encoder::{Bitrate, OutputFormat, SegmentEncoder, SegmentRequest, TrackTags};
use crate::error::{ExportError, ExportFailure};
use crate::planner::TrackBoundary;
use futures::stream::{self, StreamExt};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// One successfully written track
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    pub path: PathBuf,
    pub boundary: TrackBoundary,
}

pub type TrackResult = Result<OutputFile, ExportFailure>;

/// Per-track outcomes, in boundary order
#[derive(Debug, Default)]
pub struct ExportReport {
    pub results: Vec<TrackResult>,
}

impl ExportReport {
    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn exported(&self) -> impl Iterator<Item = &OutputFile> {
        self.results.iter().filter_map(|r| r.as_ref().ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = &ExportFailure> {
        self.results.iter().filter_map(|r| r.as_ref().err())
    }

    pub fn exported_count(&self) -> usize {
        self.exported().count()
    }

    pub fn all_failed(&self) -> bool {
        !self.results.is_empty() && self.exported_count() == 0
    }
}

impl fmt::Display for ExportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of {} tracks exported", self.exported_count(), self.total())
    }
}

/// Encoding settings shared by every track of one export
#[derive(Debug, Clone, Default)]
pub struct ExportSettings {
    pub format: OutputFormat,
    pub bitrate: Bitrate,
    pub album: Option<String>,
    pub artist: Option<String>,
}

pub struct SegmentExporter<E> {
    encoder: E,
    max_parallel: usize,
}

impl<E: SegmentEncoder> SegmentExporter<E> {
    pub fn new(encoder: E) -> Self {
        Self {
            encoder,
            max_parallel: default_parallelism(),
        }
    }

    /// Limit concurrent encodes. 0 means one per available CPU core.
    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = if max_parallel == 0 {
            default_parallelism()
        } else {
            max_parallel
        };
        self
    }

    /// Encode every boundary into `output_dir`.
    ///
    /// A failing track is recorded in the report and does not stop the others.
    /// `on_track` sees each result in boundary order as soon as it is available.
    pub async fn export<F>(
        &self,
        boundaries: &[TrackBoundary],
        source: &SourceAudio,
        output_dir: &Path,
        settings: &ExportSettings,
        on_track: F,
    ) -> Result<ExportReport, ExportError>
    where
        F: FnMut(&TrackResult),
    {
        tokio::fs::create_dir_all(output_dir)
            .await
            .map_err(|source| ExportError::OutputDir {
                path: output_dir.to_path_buf(),
                source,
            })?;

        let track_total = boundaries.len();
        let width = index_width(boundaries.iter().map(|b| b.index).max().unwrap_or(0));

        info!(
            "Exporting {} tracks to {} ({} parallel)",
            track_total,
            output_dir.display(),
            self.max_parallel
        );

        let results: Vec<TrackResult> = stream::iter(boundaries)
            .map(|boundary| {
                let request = SegmentRequest {
                    source: &source.path,
                    start: boundary.start,
                    end: boundary.end,
                    format: settings.format,
                    bitrate: settings.bitrate,
                    output: output_dir.join(track_file_name(boundary, width, settings.format)),
                    tags: TrackTags {
                        title: boundary.title.clone(),
                        track: boundary.index,
                        track_total,
                        album: settings.album.clone(),
                        artist: settings.artist.clone(),
                    },
                };

                async move {
                    match self.encoder.encode_segment(request).await {
                        Ok(path) => Ok(OutputFile {
                            path,
                            boundary: boundary.clone(),
                        }),
                        Err(err) => {
                            let failure = ExportFailure {
                                index: boundary.index,
                                title: boundary.title.clone(),
                                source: err,
                            };
                            warn!("{}", failure);
                            Err(failure)
                        }
                    }
                }
            })
            .buffered(self.max_parallel)
            .inspect(on_track)
            .collect()
            .await;

        let report = ExportReport { results };
        info!("{}", report);
        Ok(report)
    }
}

/// `{index}_{title}.{ext}`, the index zero-padded to `width`
pub fn track_file_name(boundary: &TrackBoundary, width: usize, format: OutputFormat) -> String {
    let mut title = sanitize_filename(&boundary.title);
    if title.is_empty() {
        title = format!("Track {}", boundary.index);
    }
    format!(
        "{:0width$}_{}.{}",
        boundary.index,
        title,
        format.extension(),
        width = width
    )
}

/// Replace characters outside `[alphanumeric space - _ .]` with `_`, collapse
/// runs of spaces and trim spaces and dots from both ends
pub fn sanitize_filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, ' ' | '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();

    replaced
        .split(' ')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches('.')
        .trim()
        .to_string()
}

fn index_width(max_index: usize) -> usize {
    max_index.to_string().len().max(2)
}

fn default_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
