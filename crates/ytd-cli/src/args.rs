use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use ytd_core::encoder::{Bitrate, OutputFormat as CoreFormat};
use ytd_core::pipeline::PipelineConfig;
use ytd_core::planner::PreamblePolicy;

#[derive(Parser)]
#[command(name = "ytd")]
#[command(author, version, about = "Download YouTube audio and split it into tracks by description timestamps")]
#[command(propagate_version = true)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// YouTube URL to process (shorthand for `extract <URL>`)
    #[arg(value_name = "URL")]
    pub url: Option<String>,

    #[command(flatten)]
    pub options: ExtractOptions,

    /// Verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download a video's audio and split it into tracks
    Extract {
        /// YouTube URL
        url: String,

        #[command(flatten)]
        options: ExtractOptions,
    },

    /// Split a local audio file using a description's timestamps
    Split {
        /// Audio file to split
        audio: PathBuf,

        /// File holding the description text ("-" for stdin)
        #[arg(short, long, value_name = "FILE")]
        description: PathBuf,

        /// Name for the track folder and album tag (defaults to the file name)
        #[arg(short, long)]
        title: Option<String>,

        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        #[command(flatten)]
        encode: EncodeOptions,
    },

    /// Print the timestamps found in a description without downloading
    Timestamps {
        /// File holding the description text ("-" or omitted for stdin)
        input: Option<PathBuf>,

        /// Total duration (e.g. 1:05:00); also prints the planned tracks
        #[arg(long, value_name = "TIME")]
        duration: Option<String>,

        /// Keep audio before the first timestamp as its own track
        #[arg(long)]
        keep_preamble: bool,
    },

    /// Check that yt-dlp and FFmpeg are available
    Doctor,

    /// Show configuration
    Config,
}

#[derive(clap::Args, Clone, Debug, Default)]
pub struct ExtractOptions {
    /// Output directory (defaults to the configured directory)
    #[arg(value_name = "OUTPUT_DIR")]
    pub output: Option<PathBuf>,

    /// Keep the single downloaded file; don't split by timestamps
    #[arg(long)]
    pub no_split: bool,

    #[command(flatten)]
    pub encode: EncodeOptions,
}

#[derive(clap::Args, Clone, Debug, Default)]
pub struct EncodeOptions {
    /// Target bitrate [default: 320k]
    #[arg(short, long, value_enum)]
    pub bitrate: Option<BitrateArg>,

    /// Output format [default: mp3]
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Keep audio before the first timestamp as its own track
    #[arg(long)]
    pub keep_preamble: bool,

    /// Maximum concurrent track encodes (0 = one per CPU core)
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Keep intermediate files (for debugging)
    #[arg(long)]
    pub keep_temp: bool,
}

impl EncodeOptions {
    /// Override configured values with the ones given on the command line
    pub fn apply(&self, mut config: PipelineConfig) -> PipelineConfig {
        if let Some(bitrate) = self.bitrate {
            config.bitrate = bitrate.into();
        }
        if let Some(format) = self.format {
            config.format = format.into();
        }
        if self.keep_preamble {
            config.planner.preamble = PreamblePolicy::Keep;
        }
        if let Some(jobs) = self.jobs {
            config.max_parallel = jobs;
        }
        config.keep_temp |= self.keep_temp;
        config
    }
}

impl ExtractOptions {
    pub fn apply(&self, config: PipelineConfig) -> PipelineConfig {
        let mut config = self.encode.apply(config);
        if let Some(ref output) = self.output {
            config.output_dir = output.clone();
        }
        if self.no_split {
            config.split = false;
        }
        config
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum BitrateArg {
    #[value(name = "128k")]
    K128,
    #[value(name = "192k")]
    K192,
    #[value(name = "256k")]
    K256,
    #[value(name = "320k")]
    K320,
}

impl From<BitrateArg> for Bitrate {
    fn from(arg: BitrateArg) -> Self {
        match arg {
            BitrateArg::K128 => Bitrate::K128,
            BitrateArg::K192 => Bitrate::K192,
            BitrateArg::K256 => Bitrate::K256,
            BitrateArg::K320 => Bitrate::K320,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// MP3 - Widely compatible
    Mp3,
    /// AAC - Good quality/size ratio (.m4a)
    Aac,
    /// Opus - Best quality/size ratio
    Opus,
}

impl From<OutputFormat> for CoreFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Mp3 => CoreFormat::Mp3,
            OutputFormat::Aac => CoreFormat::Aac,
            OutputFormat::Opus => CoreFormat::Opus,
        }
    }
}
