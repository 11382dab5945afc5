//! Ordered mapping from byte intervals to values.
//!
//! An [`IntervalMap`] is an append-ordered sequence of `(interval, value)`
//! buckets. It is deliberately *not* canonicalised: duplicate keys and
//! overlapping keys coexist, and lookups scan the buckets in reverse so that
//! newer writes shadow older ones. This mirrors how definitions accumulate
//! within a basic block: a strong update kills overlapping buckets first, a
//! weak update just appends.

use crate::analysis::memssa::{DisjointIntervalSet, Interval};

/// An append-ordered mapping from [`Interval`] keys to values.
///
/// Used to map ranges of defined memory to the nodes that defined them.
/// Reverse-order lookup makes the most recently added bucket win, which is
/// exactly the program-order shadowing a definitions map needs.
///
/// # Examples
///
/// ```rust
/// use slicescope::{Interval, IntervalMap};
///
/// let mut map: IntervalMap<u32> = IntervalMap::new();
/// map.add(Interval::new(0.into(), 8.into()), 1);
/// map.add(Interval::new(4.into(), 4.into()), 2);
///
/// // Both buckets overlap [0, 8); the newer one is returned first.
/// let values = map.collect_all(&Interval::new(0.into(), 8.into()));
/// assert_eq!(values, vec![2, 1]);
/// ```
#[derive(Clone, Debug)]
pub struct IntervalMap<V> {
    buckets: Vec<(Interval, V)>,
}

impl<V> Default for IntervalMap<V> {
    fn default() -> Self {
        IntervalMap {
            buckets: Vec::new(),
        }
    }
}

impl<V: Clone> IntervalMap<V> {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        IntervalMap {
            buckets: Vec::new(),
        }
    }

    /// Appends a bucket mapping `interval` to `value`.
    ///
    /// No canonicalisation is performed; the new bucket simply shadows older
    /// overlapping buckets during reverse-order lookups.
    pub fn add(&mut self, interval: Interval, value: V) {
        self.buckets.push((interval, value));
    }

    /// Removes every bucket whose interval overlaps `ki`.
    ///
    /// This is a pure kill: when `ki` covers only part of a wider bucket,
    /// the uncovered residues of that bucket are dropped along with it. The
    /// definitions they carried become unreachable on the edges, which is
    /// the conservative direction for a may-analysis.
    pub fn kill_overlapping(&mut self, ki: &Interval) {
        self.buckets.retain(|(interval, _)| !interval.overlaps(ki));
    }

    /// Collects the values whose buckets explain `interval`, newest first.
    ///
    /// Scans the buckets in reverse. A bucket contributes when it overlaps
    /// the query and is not already subsumed by the running disjoint cover;
    /// unknown query or bucket intervals always contribute. The scan keeps
    /// going after the query is covered so that every overlapping value is
    /// retained.
    ///
    /// Returns the contributing values, the final cover, and whether the
    /// query interval ended up fully covered.
    #[must_use]
    pub fn collect(
        &self,
        interval: &Interval,
        covered: &[Interval],
    ) -> (Vec<V>, Vec<Interval>, bool) {
        let mut result = Vec::new();
        let mut cover: DisjointIntervalSet = covered.iter().copied().collect();
        let mut is_covered = false;

        for (bucket, value) in self.buckets.iter().rev() {
            if interval.is_unknown()
                || bucket.is_unknown()
                || (bucket.overlaps(interval) && !cover.covers(bucket))
            {
                cover.insert(*bucket);
                result.push(value.clone());
                is_covered = cover.covers(interval);
            }
        }

        (result, cover.into_vec(), is_covered)
    }

    /// Collects every value whose bucket overlaps `interval`, newest first.
    ///
    /// Unknown query or bucket intervals match everything.
    #[must_use]
    pub fn collect_all(&self, interval: &Interval) -> Vec<V> {
        let mut result = Vec::new();
        for (bucket, value) in self.buckets.iter().rev() {
            if interval.is_unknown() || bucket.is_unknown() || bucket.overlaps(interval) {
                result.push(value.clone());
            }
        }
        result
    }

    /// Iterates over the buckets in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &(Interval, V)> {
        self.buckets.iter()
    }

    /// Iterates over the bucket intervals in insertion order.
    pub fn intervals(&self) -> impl Iterator<Item = &Interval> {
        self.buckets.iter().map(|(interval, _)| interval)
    }

    /// Returns the number of buckets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Returns `true` if the map holds no buckets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}
