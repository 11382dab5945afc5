//! Both-closed byte intervals and disjoint interval sets.
//!
//! An [`Interval`] describes the byte range `[start, start + length - 1]` of
//! a memory access. Intervals whose start is unknown, or whose length is
//! zero, are *unknown*: they overlap nothing and are conservatively treated
//! as covered wherever coverage is asked for.
//!
//! A [`DisjointIntervalSet`] is the canonicalised union of intervals used as
//! the "already explained" set while scanning an interval map: no two
//! elements overlap or touch, because touching elements are merged on
//! insertion.

use crate::analysis::memssa::Offset;

/// A both-closed byte interval `[start, start + length - 1]`.
///
/// # Examples
///
/// ```rust
/// use slicescope::Interval;
///
/// let a = Interval::new(0.into(), 4.into());
/// let b = Interval::new(2.into(), 4.into());
/// assert!(a.overlaps(&b));
///
/// // Exactly adjacent intervals merge into the enclosing one.
/// let c = Interval::new(4.into(), 4.into());
/// assert_eq!(a.merge(&c), Some(Interval::new(0.into(), 8.into())));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Interval {
    start: Offset,
    length: Offset,
}

impl Interval {
    /// Creates an interval starting at `start` and covering `length` bytes.
    #[must_use]
    pub const fn new(start: Offset, length: Offset) -> Self {
        Interval { start, length }
    }

    /// Returns the first byte offset covered by this interval.
    #[must_use]
    pub const fn start(&self) -> Offset {
        self.start
    }

    /// Returns the number of bytes covered by this interval.
    #[must_use]
    pub const fn length(&self) -> Offset {
        self.length
    }

    /// Returns the exclusive end offset, `start + length`.
    ///
    /// Unknown start or length saturates to [`Offset::UNKNOWN`].
    #[must_use]
    pub fn end(&self) -> Offset {
        self.start + self.length
    }

    /// Returns `true` if this interval is *unknown*: its start is unknown or
    /// its length is zero.
    ///
    /// Note that a concrete start with an unknown length is *not* unknown;
    /// such an interval behaves as "from `start` to the end of the object".
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        self.start.is_unknown() || self.length == Offset::ZERO
    }

    /// Returns `true` if the closed ranges of the two intervals intersect.
    ///
    /// Unknown intervals overlap nothing.
    #[must_use]
    pub fn overlaps(&self, other: &Interval) -> bool {
        if self.is_unknown() || other.is_unknown() {
            return false;
        }
        self.start < other.end() && other.start < self.end()
    }

    /// Returns `true` if every byte of this interval lies within `other`.
    #[must_use]
    pub fn is_subset_of(&self, other: &Interval) -> bool {
        self.start >= other.start && self.end() <= other.end()
    }

    /// Merges two intervals into the minimal enclosing interval.
    ///
    /// Succeeds when the intervals overlap or are exactly adjacent; returns
    /// `None` otherwise, and always for unknown intervals.
    #[must_use]
    pub fn merge(&self, other: &Interval) -> Option<Interval> {
        if self.is_unknown() || other.is_unknown() {
            return None;
        }
        if self.overlaps(other) || self.end() == other.start || other.end() == self.start {
            let start = self.start.min(other.start);
            let end = self.end().max(other.end());
            return Some(Interval::new(start, end - start));
        }
        None
    }
}

/// A set of intervals with the invariant that no two elements overlap or
/// touch.
///
/// Inserting an interval absorbs every existing element it merges with, so
/// the set always holds the canonical disjoint cover of everything inserted.
/// The [`collect`](crate::IntervalMap::collect) scan uses this as its "what
/// is already explained" accumulator.
#[derive(Clone, Debug, Default)]
pub struct DisjointIntervalSet {
    intervals: Vec<Interval>,
}

impl DisjointIntervalSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an interval, merging it with every existing element it
    /// overlaps or touches.
    pub fn insert(&mut self, interval: Interval) {
        let mut merged = interval;
        self.intervals.retain(|existing| {
            if let Some(wider) = merged.merge(existing) {
                merged = wider;
                false
            } else {
                true
            }
        });
        self.intervals.push(merged);
    }

    /// Returns `true` if `interval` is a subset of the union of elements.
    ///
    /// Unknown intervals count as covered; that is an under-approximation
    /// the interval-map scan relies on.
    #[must_use]
    pub fn covers(&self, interval: &Interval) -> bool {
        if interval.is_unknown() {
            return true;
        }
        // Elements are disjoint and non-touching, so a covered interval is a
        // subset of exactly one of them.
        self.intervals
            .iter()
            .any(|i| interval.overlaps(i) && interval.is_subset_of(i))
    }

    /// Returns the number of elements in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    /// Returns `true` if the set contains no intervals.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Iterates over the disjoint elements in insertion-merge order.
    pub fn iter(&self) -> impl Iterator<Item = &Interval> {
        self.intervals.iter()
    }

    /// Consumes the set and returns its elements.
    #[must_use]
    pub fn into_vec(self) -> Vec<Interval> {
        self.intervals
    }
}

impl FromIterator<Interval> for DisjointIntervalSet {
    fn from_iter<T: IntoIterator<Item = Interval>>(iter: T) -> Self {
        let mut set = DisjointIntervalSet::new();
        for interval in iter {
            set.insert(interval);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iv(start: u64, length: u64) -> Interval {
        Interval::new(start.into(), length.into())
    }

    #[test]
    fn test_interval_overlap() {
        assert!(iv(0, 4).overlaps(&iv(2, 4)));
        assert!(iv(2, 4).overlaps(&iv(0, 4)));
        assert!(iv(0, 8).overlaps(&iv(2, 2)));
        // Adjacent ranges do not overlap.
        assert!(!iv(0, 4).overlaps(&iv(4, 4)));
        assert!(!iv(0, 4).overlaps(&iv(8, 4)));
    }

    #[test]
    fn test_interval_unknown_overlaps_nothing() {
        let unknown = Interval::new(Offset::UNKNOWN, Offset::new(4));
        let zero_len = iv(0, 0);
        assert!(!unknown.overlaps(&iv(0, 100)));
        assert!(!zero_len.overlaps(&iv(0, 100)));
        assert!(unknown.is_unknown());
        assert!(zero_len.is_unknown());
    }

    #[test]
    fn test_interval_unknown_length_extends_to_end() {
        let tail = Interval::new(Offset::new(4), Offset::UNKNOWN);
        assert!(!tail.is_unknown());
        assert!(tail.overlaps(&iv(100, 4)));
        assert!(!tail.overlaps(&iv(0, 4)));
    }

    #[test]
    fn test_interval_subset() {
        assert!(iv(2, 2).is_subset_of(&iv(0, 8)));
        assert!(iv(0, 8).is_subset_of(&iv(0, 8)));
        assert!(!iv(0, 8).is_subset_of(&iv(2, 2)));
        assert!(!iv(6, 4).is_subset_of(&iv(0, 8)));
    }

    #[test]
    fn test_interval_merge_overlapping() {
        assert_eq!(iv(0, 4).merge(&iv(2, 4)), Some(iv(0, 6)));
        assert_eq!(iv(2, 4).merge(&iv(0, 4)), Some(iv(0, 6)));
    }

    #[test]
    fn test_interval_merge_adjacent() {
        assert_eq!(iv(0, 4).merge(&iv(4, 4)), Some(iv(0, 8)));
        assert_eq!(iv(4, 4).merge(&iv(0, 4)), Some(iv(0, 8)));
    }

    #[test]
    fn test_interval_merge_disjoint_fails() {
        assert_eq!(iv(0, 4).merge(&iv(5, 4)), None);
    }

    #[test]
    fn test_interval_merge_unknown_fails() {
        let unknown = Interval::new(Offset::UNKNOWN, Offset::new(4));
        assert_eq!(iv(0, 4).merge(&unknown), None);
        assert_eq!(iv(0, 0).merge(&iv(0, 4)), None);
    }

    #[test]
    fn test_disjoint_set_absorbs_adjacent() {
        let mut set = DisjointIntervalSet::new();
        set.insert(iv(0, 2));
        set.insert(iv(5, 2));
        assert_eq!(set.len(), 2);

        // Bridges the gap and touches both: collapses to one element.
        set.insert(iv(2, 3));
        assert_eq!(set.len(), 1);
        assert!(set.covers(&iv(0, 7)));
    }

    #[test]
    fn test_disjoint_set_invariant() {
        let mut set = DisjointIntervalSet::new();
        for (s, l) in [(0, 4), (8, 4), (4, 4), (20, 2), (16, 4)] {
            set.insert(iv(s, l));
        }
        let elements: Vec<Interval> = set.iter().copied().collect();
        for (i, a) in elements.iter().enumerate() {
            for b in &elements[i + 1..] {
                assert!(!a.overlaps(b), "{a:?} overlaps {b:?}");
                assert_eq!(a.merge(b), None, "{a:?} touches {b:?}");
            }
        }
    }

    #[test]
    fn test_disjoint_set_covers() {
        let set: DisjointIntervalSet = [iv(0, 4), iv(4, 4)].into_iter().collect();
        assert!(set.covers(&iv(0, 8)));
        assert!(set.covers(&iv(2, 4)));
        assert!(!set.covers(&iv(6, 4)));
        // Unknown intervals are treated as covered.
        assert!(set.covers(&Interval::new(Offset::UNKNOWN, Offset::new(1))));
    }
}
