//! Time token parsing and formatting

use crate::error::TimeParseError;

/// Milliseconds from the start of an audio stream
pub type TimeOffset = u64;

/// Parse a time token (`S`, `M:SS`, `MM:SS` or `H:MM:SS`) into milliseconds.
///
/// The leading field is unbounded. Every following field must be exactly two
/// digits in `0..=59`.
pub fn parse(token: &str) -> Result<TimeOffset, TimeParseError> {
    let token = token.trim();
    let fields: Vec<&str> = token.split(':').collect();

    if fields.len() > 3 || fields.iter().any(|f| f.is_empty()) {
        return Err(TimeParseError::Malformed(token.to_string()));
    }
    if !fields.iter().all(|f| f.bytes().all(|b| b.is_ascii_digit())) {
        return Err(TimeParseError::Malformed(token.to_string()));
    }

    let leading: u64 = fields[0]
        .parse()
        .map_err(|_| TimeParseError::OutOfRange(token.to_string()))?;

    let mut total = leading;
    for field in &fields[1..] {
        if field.len() != 2 {
            return Err(TimeParseError::Malformed(token.to_string()));
        }
        let value: u64 = field
            .parse()
            .map_err(|_| TimeParseError::Malformed(token.to_string()))?;
        if value > 59 {
            return Err(TimeParseError::OutOfRange(token.to_string()));
        }
        total = total
            .checked_mul(60)
            .and_then(|t| t.checked_add(value))
            .ok_or_else(|| TimeParseError::OutOfRange(token.to_string()))?;
    }

    total
        .checked_mul(1000)
        .ok_or_else(|| TimeParseError::OutOfRange(token.to_string()))
}

/// Format an offset as `M:SS`, or `H:MM:SS` from one hour on.
/// Sub-second precision is dropped.
pub fn format(offset: TimeOffset) -> String {
    let seconds = offset / 1000;
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

/// Format an offset with millisecond precision for FFmpeg (`SSSS.mmm`)
pub fn to_ffmpeg_seconds(offset: TimeOffset) -> String {
    format!("{}.{:03}", offset / 1000, offset % 1000)
}
