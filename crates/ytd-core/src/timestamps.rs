//! Timestamp extraction from free-form video descriptions
//!
//! Descriptions are scanned line by line by a fixed, ordered list of
//! [`LineMatcher`]s. Two matchers ship by default:
//! - [`TimeFirstMatcher`]: `00:00 Intro`, `(1:23) - Part A`
//! - [`TitleFirstMatcher`]: `Prelude - 0:00`, `Outro: 1:01:00`
//!
//! Candidates from all matchers are merged, stable-sorted by offset and
//! deduplicated by offset. On equal offsets the earlier matcher wins, then the
//! earlier line.

use crate::timecode::{self, TimeOffset};
use regex::Regex;
use std::fmt;
use tracing::debug;

/// Characters stripped from both ends of a title along with whitespace
const TITLE_TRIM_CHARS: &[char] = &['-', '–', '—', ':', '|', '•', '*'];

/// One (offset, title) pair found in a description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampCandidate {
    pub offset: TimeOffset,
    /// May be empty; a placeholder is chosen when tracks are planned
    pub title: String,
}

impl TimestampCandidate {
    pub fn new(offset: TimeOffset, title: impl Into<String>) -> Self {
        Self {
            offset,
            title: clean_title(&title.into()),
        }
    }
}

impl fmt::Display for TimestampCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", timecode::format(self.offset), self.title)
    }
}

/// Candidates ordered by strictly increasing offset
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimestampList(Vec<TimestampCandidate>);

impl TimestampList {
    /// Stable-sort by offset and keep the first candidate for each offset
    pub fn from_candidates(mut candidates: Vec<TimestampCandidate>) -> Self {
        candidates.sort_by_key(|c| c.offset);
        candidates.dedup_by_key(|c| c.offset);
        Self(candidates)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TimestampCandidate> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[TimestampCandidate] {
        &self.0
    }

    pub fn first(&self) -> Option<&TimestampCandidate> {
        self.0.first()
    }
}

impl<'a> IntoIterator for &'a TimestampList {
    type Item = &'a TimestampCandidate;
    type IntoIter = std::slice::Iter<'a, TimestampCandidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Raw text captured by a matcher, before the time token is validated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawMatch<'a> {
    pub time: &'a str,
    pub title: &'a str,
}

/// Recognizes one timestamp layout within a single line
pub trait LineMatcher: Send + Sync {
    fn name(&self) -> &'static str;

    fn try_match<'a>(&self, line: &'a str) -> Option<RawMatch<'a>>;
}

/// `[(]TIME[)] [-|:] Title`
#[derive(Debug)]
pub struct TimeFirstMatcher {
    pattern: Regex,
}

impl TimeFirstMatcher {
    pub fn new() -> Self {
        let pattern = Regex::new(
            r"^[ \t]*\(?(\d+:(?:\d{1,2}:)?\d{1,2})\b\)?(?:[ \t]*[-:][ \t]*)?(.*)$",
        )
        .expect("time-first pattern is valid");
        Self { pattern }
    }
}

impl Default for TimeFirstMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl LineMatcher for TimeFirstMatcher {
    fn name(&self) -> &'static str {
        "time-first"
    }

    fn try_match<'a>(&self, line: &'a str) -> Option<RawMatch<'a>> {
        let caps = self.pattern.captures(line)?;
        Some(RawMatch {
            time: caps.get(1)?.as_str(),
            title: caps.get(2).map_or("", |m| m.as_str()),
        })
    }
}

/// `Title - TIME` or `Title: TIME` at the end of a line.
///
/// A `:` separator needs a blank on at least one side so that `Song 1:02:03`
/// is not cut inside the time token.
#[derive(Debug)]
pub struct TitleFirstMatcher {
    pattern: Regex,
}

impl TitleFirstMatcher {
    pub fn new() -> Self {
        let pattern = Regex::new(
            r"^(.+?)(?:[ \t]*-[ \t]*|[ \t]*:[ \t]+|[ \t]+:[ \t]*)\(?(\d+:(?:\d{1,2}:)?\d{1,2})\)?[ \t]*$",
        )
        .expect("title-first pattern is valid");
        Self { pattern }
    }
}

impl Default for TitleFirstMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl LineMatcher for TitleFirstMatcher {
    fn name(&self) -> &'static str {
        "title-first"
    }

    fn try_match<'a>(&self, line: &'a str) -> Option<RawMatch<'a>> {
        let caps = self.pattern.captures(line)?;
        Some(RawMatch {
            time: caps.get(2)?.as_str(),
            title: caps.get(1)?.as_str(),
        })
    }
}

/// Extracts an ordered, deduplicated [`TimestampList`] from description text
pub struct TimestampExtractor {
    matchers: Vec<Box<dyn LineMatcher>>,
}

impl Default for TimestampExtractor {
    fn default() -> Self {
        Self::empty()
            .with_matcher(TimeFirstMatcher::new())
            .with_matcher(TitleFirstMatcher::new())
    }
}

impl TimestampExtractor {
    /// An extractor with no matchers
    pub fn empty() -> Self {
        Self { matchers: Vec::new() }
    }

    /// Append a matcher. It ranks below every matcher already added.
    pub fn with_matcher(mut self, matcher: impl LineMatcher + 'static) -> Self {
        self.matchers.push(Box::new(matcher));
        self
    }

    /// Each line is claimed by the first matcher whose time token parses.
    ///
    /// On equal offsets, claims of a higher-ranked matcher come first, so they
    /// survive deduplication.
    pub fn extract(&self, description: &str) -> TimestampList {
        let mut claims: Vec<Vec<TimestampCandidate>> = vec![Vec::new(); self.matchers.len()];

        for (line_no, line) in description.lines().enumerate() {
            if let Some((rank, candidate)) = self.claim_line(line_no, line) {
                claims[rank].push(candidate);
            }
        }

        let candidates: Vec<TimestampCandidate> = claims.into_iter().flatten().collect();
        let found = candidates.len();
        let list = TimestampList::from_candidates(candidates);
        debug!(
            "Extracted {} timestamps ({} candidates before dedup)",
            list.len(),
            found
        );
        list
    }

    fn claim_line(&self, line_no: usize, line: &str) -> Option<(usize, TimestampCandidate)> {
        for (rank, matcher) in self.matchers.iter().enumerate() {
            let Some(raw) = matcher.try_match(line) else {
                continue;
            };

            match timecode::parse(raw.time) {
                Ok(offset) => return Some((rank, TimestampCandidate::new(offset, raw.title))),
                Err(e) => {
                    debug!(
                        "Discarding {} match on line {}: {}",
                        matcher.name(),
                        line_no + 1,
                        e
                    );
                }
            }
        }
        None
    }
}

/// Extract timestamps with the default matchers
pub fn extract_timestamps(description: &str) -> TimestampList {
    TimestampExtractor::default().extract(description)
}

fn clean_title(title: &str) -> String {
    title
        .trim_matches(|c: char| c.is_whitespace() || TITLE_TRIM_CHARS.contains(&c))
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offsets(list: &TimestampList) -> Vec<TimeOffset> {
        list.iter().map(|c| c.offset).collect()
    }

    fn titles(list: &TimestampList) -> Vec<&str> {
        list.iter().map(|c| c.title.as_str()).collect()
    }

    #[test]
    fn test_time_first_lines() {
        let list = extract_timestamps("00:00 Intro\n01:23 Part A\n12:34 Part B\n1:01:00 Outro");
        assert_eq!(offsets(&list), vec![0, 83_000, 754_000, 3_660_000]);
        assert_eq!(titles(&list), vec!["Intro", "Part A", "Part B", "Outro"]);
    }

    #[test]
    fn test_title_first_lines() {
        let list = extract_timestamps("Prelude - 0:00\nIchthus - 1:37");
        assert_eq!(offsets(&list), vec![0, 97_000]);
        assert_eq!(titles(&list), vec!["Prelude", "Ichthus"]);
    }

    #[test]
    fn test_long_title_first_tracklist() {
        let description = "Predlude - 0:00\n\
                           Ichthus - 1:37\n\
                           The Serpent's Kiss - 6:16\n\
                           Mountain - 18:13\n\
                           Theocracy - 23:01\n\
                           The Healing Hand - 29:02\n\
                           Sinner - 40:38\n\
                           New Jerusalem - 46:47\n\
                           The Victory Dance - 51:57\n\
                           Twist of Fate - 56:59";
        let list = extract_timestamps(description);
        assert_eq!(list.len(), 10);
        assert_eq!(list.as_slice()[2].title, "The Serpent's Kiss");
        assert_eq!(list.as_slice()[9].offset, (56 * 60 + 59) * 1000);
    }

    #[test]
    fn test_separators_and_parentheses() {
        let list = extract_timestamps("(0:00) Opening\n2:00 - Second\n3:00: Third\n(4:00)-Fourth");
        assert_eq!(titles(&list), vec!["Opening", "Second", "Third", "Fourth"]);
    }

    #[test]
    fn test_title_first_colon_separator() {
        let list = extract_timestamps("Outro: 1:01:00\nCoda :1:02:00");
        assert_eq!(offsets(&list), vec![3_660_000, 3_720_000]);
        assert_eq!(titles(&list), vec!["Outro", "Coda"]);
    }

    #[test]
    fn test_title_first_does_not_split_time_token() {
        let list = extract_timestamps("Live at Wembley 1:02:03");
        assert!(list.is_empty());
    }

    #[test]
    fn test_title_with_hyphens() {
        let list = extract_timestamps("Jay-Z - Intro - 0:00");
        assert_eq!(titles(&list), vec!["Jay-Z - Intro"]);
    }

    #[test]
    fn test_no_timestamps() {
        let description = "Thanks for watching!\nFollow me on socials.\nRecorded in 2019";
        let extractor = TimestampExtractor::default();
        let first = extractor.extract(description);
        assert!(first.is_empty());
        assert_eq!(first, extractor.extract(description));
    }

    #[test]
    fn test_duplicate_offsets_keep_first() {
        let list = extract_timestamps("00:00 A\n00:00 B\n1:00 C");
        assert_eq!(offsets(&list), vec![0, 60_000]);
        assert_eq!(list.as_slice()[0].title, "A");
    }

    #[test]
    fn test_time_first_wins_over_title_first_on_tie() {
        // Line 1 is only title-first, line 2 only time-first; both land on 1:00
        let list = extract_timestamps("Later - 1:00\n1:00 Earlier");
        assert_eq!(list.len(), 1);
        assert_eq!(list.as_slice()[0].title, "Earlier");
    }

    #[test]
    fn test_line_matched_by_both_patterns_counts_once() {
        let list = extract_timestamps("0:00 Intro - 3:45");
        assert_eq!(list.len(), 1);
        assert_eq!(list.as_slice()[0], TimestampCandidate::new(0, "Intro - 3:45"));
    }

    #[test]
    fn test_track_lengths_are_not_offsets() {
        let list = extract_timestamps("0:00 Intro - 3:45\n3:45 Verse - 2:10");
        assert_eq!(offsets(&list), vec![0, 225_000]);
        assert_eq!(titles(&list), vec!["Intro - 3:45", "Verse - 2:10"]);

        let plan = crate::planner::TrackPlanner::default()
            .plan(&list, 600_000)
            .unwrap();
        assert_eq!(plan.len(), 2);
    }

    #[test]
    fn test_malformed_time_discarded() {
        let list = extract_timestamps("99:99 Bad\n0:00 Good");
        assert_eq!(offsets(&list), vec![0]);
        assert_eq!(titles(&list), vec!["Good"]);
    }

    #[test]
    fn test_time_token_needs_word_boundary() {
        assert!(extract_timestamps("1:234 not a time\n2:30pm show").is_empty());
    }

    #[test]
    fn test_sorted_and_strictly_increasing() {
        let list = extract_timestamps("5:00 E\n1:00 B\nA - 0:00\n3:00 D\n1:00 dup\n2:00 C");
        assert_eq!(offsets(&list), vec![0, 60_000, 120_000, 180_000, 300_000]);
        assert!(list.as_slice().windows(2).all(|w| w[0].offset < w[1].offset));
    }

    #[test]
    fn test_bare_time_keeps_empty_title() {
        let list = extract_timestamps("0:00\n1:30 -");
        assert_eq!(offsets(&list), vec![0, 90_000]);
        assert_eq!(titles(&list), vec!["", ""]);
    }

    #[test]
    fn test_crlf_and_indentation() {
        let list = extract_timestamps("  0:00 Intro\r\n\t1:00 Verse\r\n");
        assert_eq!(titles(&list), vec!["Intro", "Verse"]);
    }

    #[test]
    fn test_custom_matcher_appended() {
        struct AtMatcher;

        impl LineMatcher for AtMatcher {
            fn name(&self) -> &'static str {
                "at"
            }

            fn try_match<'a>(&self, line: &'a str) -> Option<RawMatch<'a>> {
                let (title, time) = line.split_once(" @ ")?;
                Some(RawMatch { time, title })
            }
        }

        let extractor = TimestampExtractor::default().with_matcher(AtMatcher);
        let list = extractor.extract("0:00 Intro\nSolo @ 2:00");
        assert_eq!(titles(&list), vec!["Intro", "Solo"]);
    }
}
