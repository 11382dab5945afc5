//! Per-target definitions map with strong and weak update disciplines.
//!
//! A [`DefinitionsMap`] records, for each abstract memory [`Target`], which
//! nodes define which byte ranges of it. It is the per-block summary the
//! value-numbering phases build and query:
//!
//! - a **strong update** ([`update`](DefinitionsMap::update)) kills every
//!   overlapping bucket before recording the new definition
//! - a **weak update** ([`add`](DefinitionsMap::add)) records the definition
//!   without killing anything
//! - a write through an unknown pointer ([`add_all`](DefinitionsMap::add_all))
//!   is fanned out to every known target and additionally registered under
//!   the [`Target::UNKNOWN`] sentinel
//!
//! [`undefined_intervals`](DefinitionsMap::undefined_intervals) computes the
//! holes of a query range, which is what drives PHI insertion: every byte a
//! block cannot explain locally must be explained by its predecessors.

use std::{
    collections::{HashMap, HashSet},
    fmt,
    hash::Hash,
};

use crate::analysis::memssa::{Interval, IntervalMap, Offset};

/// Opaque identity of an abstract memory object.
///
/// Targets are handed to this crate by a pointer analysis; the analysis here
/// never looks inside them. The distinguished [`Target::UNKNOWN`] stands for
/// "some memory we cannot identify" and keys the definitions of writes
/// through unknown pointers.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Target(usize);

impl Target {
    /// The distinguished unknown-memory target.
    pub const UNKNOWN: Target = Target(usize::MAX);

    /// Creates a target from a pointer-analysis object id.
    #[must_use]
    #[inline]
    pub const fn new(id: usize) -> Self {
        Target(id)
    }

    /// Returns the raw object id.
    #[must_use]
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }

    /// Returns `true` if this is the unknown-memory sentinel.
    #[must_use]
    #[inline]
    pub const fn is_unknown(self) -> bool {
        self.0 == usize::MAX
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unknown() {
            write!(f, "Target(?)")
        } else {
            write!(f, "Target({})", self.0)
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unknown() {
            write!(f, "t?")
        } else {
            write!(f, "t{}", self.0)
        }
    }
}

/// A range of bytes in an abstract memory object: `(target, offset, length)`.
///
/// Def-sites describe both write-sites (what a node defines) and read-sites
/// (what a node uses).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct DefSite {
    /// The memory object being accessed.
    pub target: Target,
    /// Byte offset of the access within the object.
    pub offset: Offset,
    /// Length of the access in bytes.
    pub length: Offset,
}

impl DefSite {
    /// The def-site under which writes through unknown pointers are keyed:
    /// the unknown target, from offset zero, of unknown length.
    pub const UNKNOWN: DefSite = DefSite {
        target: Target::UNKNOWN,
        offset: Offset::ZERO,
        length: Offset::UNKNOWN,
    };

    /// Creates a def-site covering `length` bytes of `target` at `offset`.
    #[must_use]
    pub const fn new(target: Target, offset: Offset, length: Offset) -> Self {
        DefSite {
            target,
            offset,
            length,
        }
    }

    /// Returns the byte interval of this def-site.
    #[must_use]
    pub const fn interval(&self) -> Interval {
        Interval::new(self.offset, self.length)
    }
}

impl fmt::Display for DefSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}:{}]", self.target, self.offset, self.length)
    }
}

/// Mapping from memory targets to the interval map of their definitions.
///
/// The value type `V` identifies defining nodes; the analysis instantiates
/// it with node ids.
///
/// # Examples
///
/// ```rust
/// use slicescope::{DefSite, DefinitionsMap, Target};
///
/// let t = Target::new(3);
/// let mut defs: DefinitionsMap<u32> = DefinitionsMap::new();
///
/// defs.update(&DefSite::new(t, 0.into(), 8.into()), 1);
/// defs.add(&DefSite::new(t, 4.into(), 4.into()), 2);
///
/// // Both nodes may define byte 4.
/// let reaching = defs.get(&DefSite::new(t, 4.into(), 1.into()));
/// assert!(reaching.contains(&1) && reaching.contains(&2));
/// ```
#[derive(Clone, Debug)]
pub struct DefinitionsMap<V> {
    targets: HashMap<Target, IntervalMap<V>>,
}

impl<V> Default for DefinitionsMap<V> {
    fn default() -> Self {
        DefinitionsMap {
            targets: HashMap::new(),
        }
    }
}

impl<V: Copy + Eq + Hash> DefinitionsMap<V> {
    /// Creates an empty definitions map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the set of values defining some byte of `ds`.
    #[must_use]
    pub fn get(&self, ds: &DefSite) -> HashSet<V> {
        match self.targets.get(&ds.target) {
            Some(map) => map.collect_all(&ds.interval()).into_iter().collect(),
            None => HashSet::new(),
        }
    }

    /// Strong update: kills every bucket slice overlapping `ds`, then
    /// records `value` as the definition of the whole range.
    pub fn update(&mut self, ds: &DefSite, value: V) {
        let map = self.targets.entry(ds.target).or_default();
        map.kill_overlapping(&ds.interval());
        map.add(ds.interval(), value);
    }

    /// Weak update: records `value` as a definition of `ds` without killing
    /// previous definitions.
    pub fn add(&mut self, ds: &DefSite, value: V) {
        self.targets
            .entry(ds.target)
            .or_default()
            .add(ds.interval(), value);
    }

    /// Records `value` as a may-definition of every bucket of every known
    /// target. Models a write through an unknown pointer.
    pub fn add_all(&mut self, value: V) {
        for map in self.targets.values_mut() {
            let intervals: Vec<Interval> = map.intervals().copied().collect();
            for interval in intervals {
                map.add(interval, value);
            }
        }
    }

    /// Returns the sub-intervals of `ds` not covered by any bucket of its
    /// target, in ascending start order.
    ///
    /// Every returned interval has strictly positive length and none
    /// overlap. A def-site with an unknown offset short-circuits: the whole
    /// query range is one unknown hole that only a PHI can explain.
    #[must_use]
    pub fn undefined_intervals(&self, ds: &DefSite) -> Vec<Interval> {
        if ds.offset.is_unknown() {
            return vec![ds.interval()];
        }
        let Some(map) = self.targets.get(&ds.target) else {
            return vec![ds.interval()];
        };

        let start = ds.offset;
        let end = start + ds.length;

        // Known bucket intervals, left to right.
        let mut buckets: Vec<Interval> = map
            .intervals()
            .filter(|interval| !interval.start().is_unknown())
            .copied()
            .collect();
        buckets.sort_by_key(Interval::start);

        let mut holes = Vec::new();
        let mut cursor = start;
        for bucket in buckets {
            if bucket.end() <= cursor {
                continue;
            }
            if bucket.start() >= end {
                break;
            }
            if bucket.start() > cursor {
                holes.push(Interval::new(cursor, bucket.start() - cursor));
            }
            cursor = cursor.max(bucket.end());
            if cursor >= end {
                break;
            }
        }
        if cursor < end {
            holes.push(Interval::new(cursor, end - cursor));
        }
        holes
    }

    /// Returns `true` if any bucket exists for `target`.
    #[must_use]
    pub fn defines_target(&self, target: Target) -> bool {
        self.targets
            .get(&target)
            .is_some_and(|map| !map.is_empty())
    }

    /// Iterates over `(target, interval map)` entries.
    ///
    /// Iteration order is unspecified; callers accumulate into sets.
    pub fn iter(&self) -> impl Iterator<Item = (&Target, &IntervalMap<V>)> {
        self.targets.iter()
    }

    /// Returns `true` if no target has any definition recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets.values().all(IntervalMap::is_empty)
    }
}
