use super::individual::IndividualStats;
use crate::error::{InspectError, Result};
use crate::util::{parse_increment_size, timeline_start};
use std::collections::VecDeque;
use tracing::debug;

/// Fraction of an increment by which two timelines may miss each other and
/// still be treated as overlapping. Absorbs rounding between start times
/// computed independently per document; tune per data set.
pub const DEFAULT_TOLERANCE_FRACTION: f64 = 1.0 / 3.0;

/// A revision reduced to what bucketing needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionPoint {
    pub modified_millis: i64,
    pub editor: Option<String>,
}

/// Contiguous fixed-size time buckets, each holding the editors active in it.
///
/// Increment `i` starts at `timeline_start + i * increment_size`.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineStats {
    increment_size: i64,
    overlap_tolerance: i64,
    pub timeline_start: i64,
    increments: Vec<IndividualStats>,
}

impl TimelineStats {
    /// Builds an empty timeline from a `days:hours:minutes` (or humantime) size.
    pub fn new(size: &str) -> Result<Self> {
        Self::with_increment_size(parse_increment_size(size)?)
    }

    pub fn with_increment_size(increment_size: i64) -> Result<Self> {
        if increment_size <= 0 {
            return Err(InspectError::InvalidIncrement(format!(
                "increment size must be positive, got {increment_size}ms"
            )));
        }
        Ok(Self {
            increment_size,
            overlap_tolerance: tolerance_for(increment_size, DEFAULT_TOLERANCE_FRACTION),
            timeline_start: 0,
            increments: Vec::new(),
        })
    }

    pub fn increment_size(&self) -> i64 {
        self.increment_size
    }

    pub fn overlap_tolerance(&self) -> i64 {
        self.overlap_tolerance
    }

    /// Sets the merge overlap tolerance as a fraction of the increment size.
    pub fn set_overlap_tolerance(&mut self, fraction: f64) -> Result<()> {
        if !(0.0..1.0).contains(&fraction) {
            return Err(InspectError::InvalidIncrement(format!(
                "overlap tolerance must be in [0, 1), got {fraction}"
            )));
        }
        self.overlap_tolerance = tolerance_for(self.increment_size, fraction);
        Ok(())
    }

    /// Anchors the timeline on the increment boundary at or before `creation_millis`.
    pub fn set_timeline_start(&mut self, creation_millis: i64) {
        self.timeline_start = timeline_start(creation_millis, self.increment_size);
    }

    pub fn increment_start(&self, index: usize) -> i64 {
        self.timeline_start + index as i64 * self.increment_size
    }

    /// Exclusive end of the last increment.
    pub fn end(&self) -> i64 {
        self.increment_start(self.increments.len())
    }

    pub fn get_num_increments(&self) -> usize {
        self.increments.len()
    }

    pub fn get_increment(&self, index: usize) -> Result<&IndividualStats> {
        let len = self.increments.len();
        self.increments
            .get(index)
            .ok_or(InspectError::IncrementNotFound { index, len })
    }

    pub fn get_increment_mut(&mut self, index: usize) -> Result<&mut IndividualStats> {
        let len = self.increments.len();
        self.increments
            .get_mut(index)
            .ok_or(InspectError::IncrementNotFound { index, len })
    }

    pub fn make_increment(&mut self) -> &mut IndividualStats {
        self.increments.push(IndividualStats::new());
        let last = self.increments.len() - 1;
        &mut self.increments[last]
    }

    pub fn remove_increment(&mut self, index: usize) -> Result<IndividualStats> {
        if index >= self.increments.len() {
            return Err(InspectError::IncrementNotFound {
                index,
                len: self.increments.len(),
            });
        }
        Ok(self.increments.remove(index))
    }

    pub fn clear_increments(&mut self) {
        self.increments.clear();
    }

    pub fn increments(&self) -> &[IndividualStats] {
        &self.increments
    }

    /// Increments paired with their absolute start time in epoch milliseconds.
    pub fn iter_with_start(&self) -> impl Iterator<Item = (i64, &IndividualStats)> {
        self.increments
            .iter()
            .enumerate()
            .map(|(i, inc)| (self.increment_start(i), inc))
    }

    /// Replaces the increments with buckets built from `revisions`, which
    /// must already be sorted by modification time.
    pub fn bucket_revisions(&mut self, revisions: &[RevisionPoint]) {
        let buckets = bucket_by_time(
            revisions,
            self.timeline_start,
            self.increment_size,
            |r| r.modified_millis,
        );

        self.increments.clear();
        for bucket in buckets {
            let increment = self.make_increment();
            for revision in bucket {
                if let Some(editor) = &revision.editor {
                    increment.editor_entry(editor.as_str()).name = Some(editor.clone());
                }
            }
        }
        debug!(
            revisions = revisions.len(),
            increments = self.increments.len(),
            "bucketed revisions"
        );
    }

    /// Merges `other` into `self`, aligning the two by start time.
    ///
    /// Overlapping timelines are paired increment by increment after the
    /// earlier one's leading increments; disjoint ones are joined with empty
    /// increments covering the gap. Both must share the same increment size.
    pub fn merge_in(&mut self, other: TimelineStats) -> Result<()> {
        if other.increment_size != self.increment_size {
            return Err(InspectError::IncrementSizeMismatch {
                expected: self.increment_size,
                found: other.increment_size,
            });
        }
        if other.increments.is_empty() {
            return Ok(());
        }
        if self.increments.is_empty() {
            self.timeline_start = other.timeline_start;
            self.increments = other.increments;
            return Ok(());
        }

        let size = self.increment_size;
        let tolerance = self.overlap_tolerance;
        let self_start = self.timeline_start;
        let other_start = other.timeline_start;
        let self_end = self.end();
        let other_end = other.end();

        let mut mine: VecDeque<IndividualStats> = std::mem::take(&mut self.increments).into();
        let mut theirs: VecDeque<IndividualStats> = other.increments.into();
        let mut merged = Vec::with_capacity(mine.len() + theirs.len());

        let overlapping =
            self_start <= other_end + tolerance && other_start <= self_end + tolerance;

        if overlapping {
            let (lead, lead_start, follow_start) = if self_start <= other_start {
                (&mut mine, self_start, other_start)
            } else {
                (&mut theirs, other_start, self_start)
            };

            let mut cursor = lead_start;
            while follow_start - cursor > tolerance {
                match lead.pop_front() {
                    Some(increment) => merged.push(increment),
                    None => break,
                }
                cursor += size;
            }

            while !mine.is_empty() && !theirs.is_empty() {
                if let (Some(mut increment), Some(incoming)) = (mine.pop_front(), theirs.pop_front())
                {
                    increment.merge_in(incoming);
                    merged.push(increment);
                }
            }
            // At most one side still has increments.
            merged.extend(mine);
            merged.extend(theirs);
        } else if self_start < other_start {
            let gap = gap_increments(self_end, other_start, size);
            merged.extend(mine);
            merged.extend((0..gap).map(|_| IndividualStats::new()));
            merged.extend(theirs);
        } else {
            let gap = gap_increments(other_end, self_start, size);
            merged.extend(theirs);
            merged.extend((0..gap).map(|_| IndividualStats::new()));
            merged.extend(mine);
        }

        debug!(
            overlapping,
            increments = merged.len(),
            "merged timelines"
        );
        self.increments = merged;
        self.timeline_start = self_start.min(other_start);
        Ok(())
    }
}

fn tolerance_for(increment_size: i64, fraction: f64) -> i64 {
    (increment_size as f64 * fraction).floor() as i64
}

fn gap_increments(earlier_end: i64, later_start: i64, increment_size: i64) -> usize {
    let gap = ((later_start - earlier_end) as f64 / increment_size as f64).round();
    if gap > 0.0 {
        gap as usize
    } else {
        0
    }
}

/// Splits a time-sorted stream into consecutive increments starting at `start`.
///
/// Bucket `k` receives every item with `time <= start + k * size` not taken
/// by an earlier bucket, so an item exactly on a boundary lands in the
/// earlier bucket. Trailing empty buckets are never produced; the walk stops
/// when the stream is exhausted.
pub fn bucket_by_time<I, T, F>(items: I, start: i64, size: i64, time_of: F) -> Vec<Vec<T>>
where
    I: IntoIterator<Item = T>,
    F: Fn(&T) -> i64,
{
    let mut pending = items.into_iter().peekable();
    let mut buckets = Vec::new();
    let mut cursor = start;

    while pending.peek().is_some() {
        let mut bucket = Vec::new();
        while let Some(item) = pending.next_if(|item| time_of(item) <= cursor) {
            bucket.push(item);
        }
        buckets.push(bucket);
        cursor += size;
    }
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn point(millis: i64, editor: &str) -> RevisionPoint {
        RevisionPoint {
            modified_millis: millis,
            editor: Some(editor.to_string()),
        }
    }

    fn timeline(start: i64, size: i64, editors: &[&[(&str, u64)]]) -> TimelineStats {
        let mut tl = TimelineStats::with_increment_size(size).unwrap();
        tl.timeline_start = start;
        for inc in editors {
            let increment = tl.make_increment();
            for (name, additions) in inc.iter() {
                let editor = increment.make_editor(*name);
                editor.add_addition(*additions);
                let snapshot = editor.clone();
                increment.total.merge_in(&snapshot);
            }
        }
        tl
    }

    fn editors_of(tl: &TimelineStats) -> Vec<Vec<&str>> {
        tl.increments().iter().map(|inc| inc.get_editors()).collect()
    }

    #[test]
    fn parses_size_string() {
        let tl = TimelineStats::new("0:1:0").unwrap();
        assert_eq!(tl.increment_size(), 3_600_000);
        assert_eq!(tl.overlap_tolerance(), 1_200_000);
        assert!(TimelineStats::new("0:0:0").is_err());
    }

    #[test]
    fn bucketing_is_right_closed() {
        let mut tl = TimelineStats::with_increment_size(1000).unwrap();
        tl.set_timeline_start(0);
        tl.bucket_revisions(&[
            point(0, "alice"),
            point(1000, "bob"),
            point(1500, "carol"),
            point(3500, "dave"),
        ]);

        assert_eq!(
            editors_of(&tl),
            vec![vec!["alice"], vec!["bob"], vec!["carol"], vec![], vec!["dave"]]
        );
    }

    #[test]
    fn bucketing_skips_anonymous_revisions_and_dedups() {
        let mut tl = TimelineStats::with_increment_size(1000).unwrap();
        tl.bucket_revisions(&[
            point(-10, "alice"),
            RevisionPoint { modified_millis: -5, editor: None },
            point(0, "alice"),
        ]);
        assert_eq!(editors_of(&tl), vec![vec!["alice"]]);
        let alice = tl.get_increment(0).unwrap().get_editor("alice").unwrap();
        assert_eq!(alice.name.as_deref(), Some("alice"));
    }

    #[test]
    fn bucketing_empty_stream_gives_no_increments() {
        let mut tl = TimelineStats::with_increment_size(1000).unwrap();
        tl.make_increment();
        tl.bucket_revisions(&[]);
        assert_eq!(tl.get_num_increments(), 0);
    }

    #[test]
    fn increment_lookup_miss_is_an_error() {
        let mut tl = TimelineStats::with_increment_size(1000).unwrap();
        assert!(matches!(
            tl.get_increment(0),
            Err(InspectError::IncrementNotFound { index: 0, len: 0 })
        ));
        assert!(tl.remove_increment(3).is_err());
    }

    #[test]
    fn disjoint_merge_fills_gap() {
        let mut a = timeline(0, 1000, &[&[("alice", 1)], &[("alice", 2)]]);
        let b = timeline(5000, 1000, &[&[("bob", 1)], &[("bob", 2)]]);
        a.merge_in(b).unwrap();

        assert_eq!(a.get_num_increments(), 7);
        assert_eq!(a.timeline_start, 0);
        assert_eq!(
            editors_of(&a),
            vec![
                vec!["alice"],
                vec!["alice"],
                vec![],
                vec![],
                vec![],
                vec!["bob"],
                vec!["bob"],
            ]
        );
    }

    #[test]
    fn disjoint_merge_later_self() {
        let mut a = timeline(5000, 1000, &[&[("bob", 1)]]);
        let b = timeline(0, 1000, &[&[("alice", 1)]]);
        a.merge_in(b).unwrap();
        assert_eq!(a.timeline_start, 0);
        assert_eq!(
            editors_of(&a),
            vec![vec!["alice"], vec![], vec![], vec![], vec![], vec!["bob"]]
        );
        assert_eq!(a.increment_start(5), 5000);
    }

    #[test]
    fn same_start_merge_pairs_increments() {
        let mut a = timeline(0, 1000, &[&[("alice", 10)]]);
        let b = timeline(0, 1000, &[&[("bob", 5)]]);
        a.merge_in(b).unwrap();

        assert_eq!(a.get_num_increments(), 1);
        let inc = a.get_increment(0).unwrap();
        assert_eq!(inc.get_editor("alice").unwrap().additions, Some(10));
        assert_eq!(inc.get_editor("bob").unwrap().additions, Some(5));
        assert_eq!(inc.total.additions, Some(15));
    }

    #[test]
    fn offset_merge_keeps_leading_increments() {
        let mut a = timeline(0, 1000, &[&[("alice", 1)], &[("alice", 1)], &[("alice", 1)]]);
        let b = timeline(2000, 1000, &[&[("bob", 1)], &[("bob", 1)]]);
        a.merge_in(b).unwrap();

        assert_eq!(a.timeline_start, 0);
        assert_eq!(
            editors_of(&a),
            vec![vec!["alice"], vec!["alice"], vec!["alice", "bob"], vec!["bob"]]
        );
    }

    #[test]
    fn later_self_is_merged_after_other_leads() {
        let mut a = timeline(1000, 1000, &[&[("bob", 1)]]);
        let b = timeline(0, 1000, &[&[("alice", 1)], &[("alice", 1)]]);
        a.merge_in(b).unwrap();

        assert_eq!(a.timeline_start, 0);
        assert_eq!(editors_of(&a), vec![vec!["alice"], vec!["bob", "alice"]]);
    }

    #[test]
    fn clock_noise_within_tolerance_still_pairs() {
        let mut a = timeline(0, 1000, &[&[("alice", 1)]]);
        let b = timeline(200, 1000, &[&[("bob", 1)]]);
        a.merge_in(b).unwrap();
        assert_eq!(editors_of(&a), vec![vec!["alice", "bob"]]);
    }

    #[test]
    fn near_adjacent_timelines_join_without_gap() {
        let mut a = timeline(0, 1000, &[&[("alice", 1)], &[("alice", 1)]]);
        let b = timeline(2200, 1000, &[&[("bob", 1)]]);
        a.merge_in(b).unwrap();
        assert_eq!(editors_of(&a), vec![vec!["alice"], vec!["alice"], vec!["bob"]]);
    }

    #[test]
    fn zero_tolerance_treats_noise_as_offset() {
        let mut a = timeline(0, 1000, &[&[("alice", 1)], &[("alice", 1)]]);
        a.set_overlap_tolerance(0.0).unwrap();
        let b = timeline(200, 1000, &[&[("bob", 1)]]);
        a.merge_in(b).unwrap();
        assert_eq!(editors_of(&a), vec![vec!["alice"], vec!["alice", "bob"]]);
        assert!(a.set_overlap_tolerance(1.0).is_err());
    }

    #[test]
    fn self_merge_doubles_counts() {
        let mut a = timeline(0, 1000, &[&[("alice", 3)], &[("bob", 4)]]);
        let b = a.clone();
        a.merge_in(b).unwrap();
        assert_eq!(a.get_num_increments(), 2);
        assert_eq!(
            a.get_increment(0).unwrap().get_editor("alice").unwrap().additions,
            Some(6)
        );
        assert_eq!(
            a.get_increment(1).unwrap().get_editor("bob").unwrap().changes,
            Some(2)
        );
    }

    #[test]
    fn mismatched_sizes_are_rejected() {
        let mut a = timeline(0, 1000, &[&[("alice", 1)]]);
        let b = timeline(0, 2000, &[&[("bob", 1)]]);
        assert!(matches!(
            a.merge_in(b),
            Err(InspectError::IncrementSizeMismatch { expected: 1000, found: 2000 })
        ));
    }

    #[test]
    fn merging_into_empty_adopts_other() {
        let mut empty = TimelineStats::with_increment_size(1000).unwrap();
        let b = timeline(9000, 1000, &[&[("bob", 1)]]);
        empty.merge_in(b).unwrap();
        assert_eq!(empty.timeline_start, 9000);
        assert_eq!(empty.get_num_increments(), 1);

        let mut a = timeline(0, 1000, &[&[("alice", 1)]]);
        a.merge_in(TimelineStats::with_increment_size(1000).unwrap()).unwrap();
        assert_eq!(a.get_num_increments(), 1);
        assert_eq!(a.timeline_start, 0);
    }

    #[test]
    fn bucket_by_time_generic() {
        let buckets = bucket_by_time(vec![5, 10, 11, 35], 10, 10, |t| *t);
        assert_eq!(buckets, vec![vec![5, 10], vec![11], vec![], vec![35]]);
    }
}
