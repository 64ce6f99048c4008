//! Audio decoder using FFmpeg

use crate::error::DecodeError;
use crate::timecode::TimeOffset;
use regex::Regex;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

/// A fully decoded PCM copy of the downloaded audio.
///
/// Read-only once created, so any number of segment encodes may read it at once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceAudio {
    pub path: PathBuf,
    /// 0 when FFmpeg did not report a duration
    pub duration_ms: TimeOffset,
}

#[derive(Debug)]
pub struct Decoder {
    ffmpeg_path: PathBuf,
}

impl Decoder {
    pub fn new(ffmpeg_path: PathBuf) -> Self {
        Self { ffmpeg_path }
    }

    /// Decode `input` into `work_dir`, taking the duration from the same FFmpeg run
    pub async fn open(&self, input: &Path, work_dir: &Path) -> Result<SourceAudio, DecodeError> {
        let wav = work_dir.join("decoded.wav");
        let duration_ms = self.decode_to_wav(input, &wav).await?;

        Ok(SourceAudio {
            path: wav,
            duration_ms,
        })
    }

    /// Decode audio to 48kHz 16-bit PCM WAV so segments can be cut on samples.
    ///
    /// Returns the input duration in milliseconds, 0 if FFmpeg did not report one.
    pub async fn decode_to_wav(
        &self,
        input: &Path,
        output: &Path,
    ) -> Result<TimeOffset, DecodeError> {
        info!("Decoding {} to WAV", input.display());

        // Info level keeps the input's "Duration:" header on stderr
        let result = Command::new(&self.ffmpeg_path)
            .args(["-hide_banner", "-nostats", "-loglevel", "info"])
            .arg("-i")
            .arg(input)
            .args(["-vn", "-c:a", "pcm_s16le", "-ar", "48000", "-y"])
            .arg(output)
            .output()
            .await
            .map_err(not_found_as_missing_ffmpeg)?;

        if !result.status.success() {
            return Err(DecodeError::FfmpegFailed(result.status.code()));
        }

        let stderr = String::from_utf8_lossy(&result.stderr);
        let duration = parse_duration(&stderr).unwrap_or(0);
        debug!("Decoded to: {} ({} ms)", output.display(), duration);
        Ok(duration)
    }
}

fn not_found_as_missing_ffmpeg(e: std::io::Error) -> DecodeError {
    if e.kind() == ErrorKind::NotFound {
        DecodeError::FfmpegNotFound
    } else {
        DecodeError::Io(e)
    }
}

/// Parse `Duration: HH:MM:SS.cc` from FFmpeg output into milliseconds
fn parse_duration(ffmpeg_output: &str) -> Option<TimeOffset> {
    let re = Regex::new(r"Duration: (\d+):(\d{2}):(\d{2})\.(\d+)").ok()?;
    let caps = re.captures(ffmpeg_output)?;

    let hours: u64 = caps.get(1)?.as_str().parse().ok()?;
    let minutes: u64 = caps.get(2)?.as_str().parse().ok()?;
    let seconds: u64 = caps.get(3)?.as_str().parse().ok()?;

    // Fraction digits, scaled to milliseconds whatever their count
    let fraction = caps.get(4)?.as_str();
    let millis: u64 = format!("{:0<3}", &fraction[..fraction.len().min(3)])
        .parse()
        .ok()?;

    Some(((hours * 60 + minutes) * 60 + seconds) * 1000 + millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        let stderr = "Input #0, wav, from 'decoded.wav':\n  Duration: 01:06:40.12, bitrate: 1536 kb/s\n";
        assert_eq!(parse_duration(stderr), Some(4_000_120));
        assert_eq!(parse_duration("  Duration: 00:03:20.5, start"), Some(200_500));
        assert_eq!(parse_duration("  Duration: 00:00:01.2345"), Some(1_234));
    }

    #[test]
    fn test_parse_duration_from_decode_log() {
        // Input header first, then the output section of the same run
        let stderr = "Input #0, mp3, from 'Live Set.mp3':\n  \
                      Duration: 00:04:05.32, start: 0.025057, bitrate: 320 kb/s\n\
                      Output #0, wav, to 'decoded.wav':\n\
                      size=   46032kB time=00:04:05.30 bitrate=1536.0kbits/s\n";
        assert_eq!(parse_duration(stderr), Some(245_320));
    }

    #[test]
    fn test_parse_duration_missing() {
        assert_eq!(parse_duration("  Duration: N/A, bitrate: N/A"), None);
        assert_eq!(parse_duration(""), None);
    }

    #[tokio::test]
    async fn test_missing_ffmpeg_reported() {
        let decoder = Decoder::new(PathBuf::from("/nonexistent/ffmpeg-binary"));
        let dir = tempfile::tempdir().unwrap();
        let result = decoder.open(Path::new("in.mp3"), dir.path()).await;
        assert!(matches!(result, Err(DecodeError::FfmpegNotFound)));
    }
}
