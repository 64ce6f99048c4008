//! Track boundary planning from a timestamp list and the total duration

use crate::error::PlanError;
use crate::timecode::{self, TimeOffset};
use crate::timestamps::TimestampList;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Title given to the leading track when the preamble is kept
pub const PREAMBLE_TITLE: &str = "Preamble";

/// What to do with audio before the first timestamp
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreamblePolicy {
    /// Leave it out of the split
    #[default]
    Drop,
    /// Export it as its own leading track
    Keep,
}

impl fmt::Display for PreamblePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreamblePolicy::Drop => write!(f, "drop"),
            PreamblePolicy::Keep => write!(f, "keep"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannerOptions {
    pub preamble: PreamblePolicy,
    /// A first timestamp at or below this offset is treated as starting at 0
    pub start_tolerance_ms: TimeOffset,
}

impl Default for PlannerOptions {
    fn default() -> Self {
        Self {
            preamble: PreamblePolicy::Drop,
            start_tolerance_ms: 1000,
        }
    }
}

/// One output track: `[start, end)` in milliseconds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackBoundary {
    /// 1-based position in the plan
    pub index: usize,
    pub start: TimeOffset,
    pub end: TimeOffset,
    pub title: String,
}

impl TrackBoundary {
    pub fn duration_ms(&self) -> TimeOffset {
        self.end - self.start
    }
}

impl fmt::Display for TrackBoundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}. [{} - {}] {}",
            self.index,
            timecode::format(self.start),
            timecode::format(self.end),
            self.title
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct TrackPlanner {
    options: PlannerOptions,
}

impl TrackPlanner {
    pub fn new(options: PlannerOptions) -> Self {
        Self { options }
    }

    /// Turn sorted, unique timestamps into contiguous track boundaries ending at
    /// `total_ms`. Zero-length spans are dropped and indices are assigned to the
    /// surviving boundaries in order.
    pub fn plan(
        &self,
        timestamps: &TimestampList,
        total_ms: TimeOffset,
    ) -> Result<Vec<TrackBoundary>, PlanError> {
        if total_ms == 0 {
            return Err(PlanError::ZeroDuration);
        }
        if let Some(late) = timestamps.iter().find(|t| t.offset > total_ms) {
            return Err(PlanError::OffsetBeyondDuration {
                offset: late.offset,
                total: total_ms,
            });
        }

        let Some(first) = timestamps.first() else {
            return Ok(Vec::new());
        };

        let mut spans: Vec<(TimeOffset, TimeOffset, &str)> = Vec::with_capacity(timestamps.len() + 1);

        let first_start = if first.offset <= self.options.start_tolerance_ms {
            0
        } else {
            if self.options.preamble == PreamblePolicy::Keep {
                spans.push((0, first.offset, PREAMBLE_TITLE));
            } else {
                debug!(
                    "Dropping {} of preamble before the first timestamp",
                    timecode::format(first.offset)
                );
            }
            first.offset
        };

        let entries = timestamps.as_slice();
        for (i, entry) in entries.iter().enumerate() {
            let start = if i == 0 { first_start } else { entry.offset };
            let end = entries.get(i + 1).map_or(total_ms, |next| next.offset);
            spans.push((start, end, entry.title.as_str()));
        }

        let boundaries: Vec<TrackBoundary> = spans
            .into_iter()
            .filter(|(start, end, title)| {
                if end <= start {
                    debug!("Skipping zero-length track {:?} at {} ms", title, start);
                    return false;
                }
                true
            })
            .enumerate()
            .map(|(i, (start, end, title))| {
                let index = i + 1;
                let title = if title.is_empty() {
                    format!("Track {}", index)
                } else {
                    title.to_string()
                };
                TrackBoundary {
                    index,
                    start,
                    end,
                    title,
                }
            })
            .collect();

        debug!("Planned {} tracks over {} ms", boundaries.len(), total_ms);
        Ok(boundaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timestamps::{extract_timestamps, TimestampCandidate};

    fn list(entries: &[(TimeOffset, &str)]) -> TimestampList {
        TimestampList::from_candidates(
            entries
                .iter()
                .map(|(offset, title)| TimestampCandidate::new(*offset, *title))
                .collect(),
        )
    }

    fn assert_partition(plan: &[TrackBoundary], total: TimeOffset) {
        assert!(plan.iter().all(|b| b.start < b.end));
        assert!(plan.windows(2).all(|w| w[0].end == w[1].start));
        assert_eq!(plan.last().map(|b| b.end), Some(total));
        for (i, b) in plan.iter().enumerate() {
            assert_eq!(b.index, i + 1);
        }
    }

    #[test]
    fn test_plan_time_first_description() {
        let timestamps =
            extract_timestamps("00:00 Intro\n01:23 Part A\n12:34 Part B\n1:01:00 Outro");
        let plan = TrackPlanner::default().plan(&timestamps, 4_000_000).unwrap();

        let starts: Vec<_> = plan.iter().map(|b| b.start).collect();
        let titles: Vec<_> = plan.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(starts, vec![0, 83_000, 754_000, 3_660_000]);
        assert_eq!(titles, vec!["Intro", "Part A", "Part B", "Outro"]);
        assert_partition(&plan, 4_000_000);
    }

    #[test]
    fn test_plan_title_first_description() {
        let timestamps = extract_timestamps("Prelude - 0:00\nIchthus - 1:37");
        let plan = TrackPlanner::default().plan(&timestamps, 200_000).unwrap();

        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].start, 0);
        assert_eq!(plan[1].start, 97_000);
        assert_partition(&plan, 200_000);
    }

    #[test]
    fn test_duplicate_start_yields_one_boundary() {
        let timestamps = extract_timestamps("00:00 A\n00:00 B\n2:00 C");
        let plan = TrackPlanner::default().plan(&timestamps, 300_000).unwrap();

        assert_eq!(plan.iter().filter(|b| b.start == 0).count(), 1);
        assert_eq!(plan[0].title, "A");
    }

    #[test]
    fn test_start_within_tolerance_snaps_to_zero() {
        let plan = TrackPlanner::default()
            .plan(&list(&[(800, "Intro"), (60_000, "Next")]), 120_000)
            .unwrap();
        assert_eq!(plan[0].start, 0);
        assert_partition(&plan, 120_000);
    }

    #[test]
    fn test_preamble_dropped_by_default() {
        let plan = TrackPlanner::default()
            .plan(&list(&[(30_000, "First"), (60_000, "Second")]), 120_000)
            .unwrap();

        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].start, 30_000);
        assert_eq!(plan[0].title, "First");
        assert_partition(&plan, 120_000);
    }

    #[test]
    fn test_preamble_kept_as_leading_track() {
        let planner = TrackPlanner::new(PlannerOptions {
            preamble: PreamblePolicy::Keep,
            ..PlannerOptions::default()
        });
        let plan = planner
            .plan(&list(&[(30_000, "First"), (60_000, "Second")]), 120_000)
            .unwrap();

        assert_eq!(plan.len(), 3);
        assert_eq!(plan[0].title, PREAMBLE_TITLE);
        assert_eq!((plan[0].start, plan[0].end), (0, 30_000));
        assert_eq!(plan[1].index, 2);
        assert_partition(&plan, 120_000);
    }

    #[test]
    fn test_last_timestamp_at_total_is_dropped() {
        let plan = TrackPlanner::default()
            .plan(&list(&[(0, "A"), (60_000, "B"), (120_000, "End")]), 120_000)
            .unwrap();

        assert_eq!(plan.len(), 2);
        assert_eq!(plan[1].title, "B");
        assert_partition(&plan, 120_000);
    }

    #[test]
    fn test_empty_titles_get_placeholders() {
        let plan = TrackPlanner::default()
            .plan(&list(&[(0, ""), (10_000, "Named"), (20_000, "  ")]), 30_000)
            .unwrap();

        let titles: Vec<_> = plan.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["Track 1", "Named", "Track 3"]);
    }

    #[test]
    fn test_single_timestamp() {
        let plan = TrackPlanner::default()
            .plan(&list(&[(0, "Only")]), 90_000)
            .unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!((plan[0].start, plan[0].end), (0, 90_000));
    }

    #[test]
    fn test_empty_list_plans_nothing() {
        let plan = TrackPlanner::default()
            .plan(&TimestampList::default(), 90_000)
            .unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_invalid_duration() {
        let planner = TrackPlanner::default();
        assert_eq!(
            planner.plan(&list(&[(0, "A")]), 0),
            Err(PlanError::ZeroDuration)
        );
        assert_eq!(
            planner.plan(&list(&[(0, "A"), (100_000, "B")]), 90_000),
            Err(PlanError::OffsetBeyondDuration {
                offset: 100_000,
                total: 90_000
            })
        );
    }

    #[test]
    fn test_boundary_display() {
        let boundary = TrackBoundary {
            index: 3,
            start: 83_000,
            end: 3_660_000,
            title: "Part A".to_string(),
        };
        assert_eq!(boundary.to_string(), "03. [1:23 - 1:01:00] Part A");
        assert_eq!(boundary.duration_ms(), 3_577_000);
    }
}
