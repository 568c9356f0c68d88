//! Byte-range algebra: `Range` and `RangeSet`.
//!
//! `Range` uses closed-interval semantics for `contains` while `RangeSet`
//! normalizes and walks gaps using half-open semantics everywhere else. This
//! is deliberate: it is what makes two ranges that merely *touch* register as
//! "covered" when computing gaps, matching the behavior this was ported from.

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};

/// A half-open interval `[start, end)` over byte offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Range {
    pub start: u64,
    pub end: u64,
}

impl Range {
    /// Builds a `Range`. Fails if `start >= end`; empty ranges are not
    /// representable.
    pub fn new(start: u64, end: u64) -> Result<Self> {
        if start >= end {
            return Err(EngineError::InvalidArgument(format!(
                "range start ({start}) must be smaller than end ({end})"
            )));
        }
        Ok(Range { start, end })
    }

    pub fn size(&self) -> u64 {
        self.end - self.start
    }

    /// Closed-interval containment of a point: `start <= p <= end`.
    pub fn contains_point(&self, p: u64) -> bool {
        p >= self.start && p <= self.end
    }

    /// Closed-interval containment of another range: `other` lies within
    /// `[start, end]`, touching boundaries included.
    pub fn contains_range(&self, other: Range) -> bool {
        other.start >= self.start && other.end <= self.end
    }
}

/// An ordered, non-overlapping, non-touching set of [`Range`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeSet {
    ranges: Vec<Range>,
}

impl RangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn ranges(&self) -> &[Range] {
        &self.ranges
    }

    /// The start of the first element, if any.
    pub fn start(&self) -> Option<u64> {
        self.ranges.first().map(|r| r.start)
    }

    /// The end of the last element, if any.
    pub fn end(&self) -> Option<u64> {
        self.ranges.last().map(|r| r.end)
    }

    /// Total bytes covered by all elements.
    pub fn covered_bytes(&self) -> u64 {
        self.ranges.iter().map(Range::size).sum()
    }

    /// Adds `r`, merging it with any overlapping or touching elements.
    pub fn insert(&mut self, r: Range) {
        self.ranges.push(r);
        self.normalize();
    }

    fn normalize(&mut self) {
        self.ranges.sort_by_key(|r| r.start);
        let mut merged: Vec<Range> = Vec::with_capacity(self.ranges.len());
        for r in self.ranges.iter().copied() {
            match merged.last_mut() {
                Some(last) if r.start <= last.end => {
                    last.end = last.end.max(r.end);
                }
                _ => merged.push(r),
            }
        }
        self.ranges = merged;
    }

    pub fn contains_point(&self, p: u64) -> bool {
        self.ranges.iter().any(|r| r.contains_point(p))
    }

    pub fn contains_range(&self, probe: Range) -> bool {
        self.ranges.iter().any(|r| r.contains_range(probe))
    }

    /// The sub-intervals of `probe` not covered by any element, in order.
    pub fn gaps(&self, probe: Range) -> Vec<Range> {
        if self.ranges.is_empty() {
            return vec![probe];
        }
        // Start/end are always present once ranges is non-empty.
        let (set_start, set_end) = (self.start().unwrap(), self.end().unwrap());
        if probe.end <= set_start || probe.start >= set_end {
            return vec![probe];
        }

        let mut gaps = Vec::new();
        let mut cursor = probe.start;
        for r in &self.ranges {
            if r.start >= probe.end {
                break;
            }
            if r.end <= cursor {
                continue;
            }
            if r.start > cursor {
                gaps.push(Range {
                    start: cursor,
                    end: r.start.min(probe.end),
                });
            }
            cursor = cursor.max(r.end);
            if cursor >= probe.end {
                break;
            }
        }
        if cursor < probe.end {
            gaps.push(Range {
                start: cursor,
                end: probe.end,
            });
        }
        gaps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    fn r(start: u64, end: u64) -> Range {
        Range::new(start, end).unwrap()
    }

    #[test]
    fn range_rejects_empty_construction() {
        assert!(Range::new(5, 5).is_err());
        assert!(Range::new(5, 3).is_err());
    }

    /// A scrambled sequence of touching/overlapping inserts merges to a
    /// single covering range.
    #[test]
    fn merges_scrambled_touching_ranges_into_one() {
        let mut set = RangeSet::new();
        set.insert(r(0, 3));
        set.insert(r(6, 10));
        set.insert(r(7, 15));
        set.insert(r(3, 5));
        set.insert(r(5, 6));
        set.insert(r(15, 16));
        set.insert(r(1, 3));
        assert_eq!(set.ranges(), &[r(0, 16)]);
    }

    /// Gaps against a probe overlapping several elements.
    #[test]
    fn gaps_between_several_elements() {
        let mut set = RangeSet::new();
        set.insert(r(0, 3));
        set.insert(r(5, 10));
        set.insert(r(12, 15));
        assert_eq!(set.gaps(r(2, 13)), vec![r(3, 5), r(10, 12)]);
    }

    #[test]
    fn gaps_on_empty_set_is_the_whole_probe() {
        let set = RangeSet::new();
        assert_eq!(set.gaps(r(4, 9)), vec![r(4, 9)]);
    }

    #[test]
    fn gaps_entirely_outside_the_set() {
        let mut set = RangeSet::new();
        set.insert(r(10, 20));
        assert_eq!(set.gaps(r(0, 5)), vec![r(0, 5)]);
        assert_eq!(set.gaps(r(25, 30)), vec![r(25, 30)]);
    }

    #[test]
    fn gaps_touching_boundary_produces_no_gap_there() {
        let mut set = RangeSet::new();
        set.insert(r(0, 10));
        // probe starts exactly where the element ends: no gap spans the seam.
        assert_eq!(set.gaps(r(10, 20)), vec![r(10, 20)]);
        // probe fully inside: no gaps at all.
        set.insert(r(10, 20));
        assert!(set.gaps(r(2, 18)).is_empty());
    }

    #[test]
    fn merge_adjacency() {
        let mut set = RangeSet::new();
        set.insert(r(0, 5));
        set.insert(r(5, 9));
        assert_eq!(set.ranges(), &[r(0, 9)]);
    }

    #[test]
    fn insert_is_idempotent_when_already_covered() {
        let mut set = RangeSet::new();
        set.insert(r(0, 100));
        let before = set.clone();
        set.insert(r(10, 20));
        assert_eq!(set, before);
    }

    fn arb_range(seed: u64, span: u64) -> Range {
        let start = seed % 500;
        let end = start + 1 + (span % 200);
        Range { start, end }
    }

    /// Property: after any sequence of inserts, the set is sorted and no two
    /// elements overlap or touch.
    #[quickcheck]
    fn prop_normalization(seeds: Vec<(u64, u64)>) -> bool {
        let mut set = RangeSet::new();
        for (s, n) in seeds {
            set.insert(arb_range(s, n));
        }
        set.ranges()
            .windows(2)
            .all(|w| w[0].start <= w[1].start && w[0].end < w[1].start)
    }

    /// Property: `gaps(probe)` and the set intersected with `probe` partition
    /// `probe` exactly (every point in `probe` is in exactly one of the two).
    #[quickcheck]
    fn prop_coverage_equality(seeds: Vec<(u64, u64)>, probe_seed: (u64, u64)) -> bool {
        let mut set = RangeSet::new();
        for (s, n) in seeds {
            set.insert(arb_range(s, n));
        }
        let probe = arb_range(probe_seed.0, probe_seed.1.max(1));
        let gaps = set.gaps(probe);

        for point in probe.start..probe.end {
            let in_gap = gaps.iter().any(|g| point >= g.start && point < g.end);
            let in_set = set.ranges().iter().any(|r| point >= r.start && point < r.end);
            if in_gap == in_set {
                return false;
            }
        }
        true
    }

    /// Property: inserting a range already fully covered is a no-op.
    #[quickcheck]
    fn prop_insert_idempotent(seed: u64, span: u64) -> bool {
        let base = arb_range(seed, span.max(10));
        let mut set = RangeSet::new();
        set.insert(base);
        let before = set.clone();
        let sub = Range {
            start: base.start,
            end: base.start + 1,
        };
        set.insert(sub);
        set == before
    }
}
