//! Rail segment cache: memoized maximal straight-through runs.
//!
//! A segment is keyed by the tile/trackdir a vehicle enters it at. The A*
//! engine looks one up before walking a straight run tile-by-tile, and
//! inserts a freshly computed one when the lookup misses. The cache is
//! flushed wholesale whenever [`RailChangeCounter`] advances, rather than
//! tracking per-tile invalidation, because OpenTTD-style segment caches
//! cover runs that can span many tiles and per-tile invalidation would need
//! a reverse index from tile to every segment crossing it.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use enumset::{EnumSet, EnumSetType};

use crate::tile::TileIndex;
use crate::trackdir::Trackdir;

/// Why a segment stopped extending.
#[derive(Debug, EnumSetType)]
#[enumset(repr = "u16")]
pub enum EndSegmentReason {
    DeadEnd,
    RailTypeChange,
    InfiniteLoop,
    SegmentTooLong,
    ChoiceFollows,
    Depot,
    Waypoint,
    Station,
    SafeTile,
    PathTooLong,
    FirstTwoWayRed,
}

pub type EndSegmentReasons = EnumSet<EndSegmentReason>;

impl EndSegmentReason {
    /// The subset of reasons that are safe to cache: the query-independent
    /// ones. `PathTooLong` and `FirstTwoWayRed` depend on how far the
    /// caller has already travelled and what the caller has already seen,
    /// so a cached segment must never short-circuit on them; they're
    /// re-evaluated fresh by the engine on every lookup.
    #[must_use]
    pub const fn is_cacheable(self) -> bool {
        !matches!(self, Self::PathTooLong | Self::FirstTwoWayRed)
    }

    #[must_use]
    pub fn cached_mask() -> EndSegmentReasons {
        EnumSet::<Self>::all()
            .iter()
            .filter(|r| r.is_cacheable())
            .collect()
    }
}

/// Key identifying a cached segment: the tile and trackdir a vehicle enters
/// it at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SegmentKey {
    pub first_tile: TileIndex,
    pub first_trackdir: Trackdir,
}

/// Optional tile/trackdir of the last signal encountered while building a
/// segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentSignal {
    pub tile: TileIndex,
    pub trackdir: Trackdir,
}

/// A memoized maximal straight-through run of identical-rail-type tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub cost: i32,
    pub last_tile: TileIndex,
    pub last_trackdir: Trackdir,
    pub last_signal: Option<SegmentSignal>,
    pub end_reasons: EndSegmentReasons,
}

/// Process-wide, read-mostly cache of [`Segment`]s.
///
/// Backed by [`DashMap`] so concurrent read-only queries (the engine itself
/// is single-threaded per query, per the concurrency model, but a host may
/// run independent queries from several worker threads) can share one
/// cache without a global lock.
#[derive(Debug, Default)]
pub struct SegmentCache {
    entries: DashMap<SegmentKey, Segment>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl SegmentCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, key: SegmentKey) -> Option<Segment> {
        let found = self.entries.get(&key).map(|r| *r.value());
        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        found
    }

    pub fn insert(&self, key: SegmentKey, segment: Segment) {
        self.entries.insert(key, segment);
    }

    /// Drops every cached segment. Called whenever the caller observes that
    /// [`RailChangeCounter`] has advanced since the cache was last used, or
    /// explicitly after a reservation pass (to avoid stale reservation
    /// reads on future queries).
    pub fn clear(&self) {
        let n = self.entries.len();
        self.entries.clear();
        tracing::debug!(cleared = n, "segment cache flushed");
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lookups since construction (or since counters would need resetting;
    /// there is no reset - a host restarts the process to zero these).
    #[must_use]
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}

/// Global counter bumped by `notify_track_layout_change`; a query compares
/// it against the value it last saw and flushes the [`SegmentCache`] on
/// mismatch.
#[derive(Debug, Default)]
pub struct RailChangeCounter(AtomicU64);

impl RailChangeCounter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bump(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    #[must_use]
    pub fn value(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cached_mask_excludes_query_dependent_reasons() {
        let mask = EndSegmentReason::cached_mask();
        assert!(!mask.contains(EndSegmentReason::PathTooLong));
        assert!(!mask.contains(EndSegmentReason::FirstTwoWayRed));
        assert!(mask.contains(EndSegmentReason::DeadEnd));
        assert!(mask.contains(EndSegmentReason::Station));
    }

    #[test]
    fn cache_round_trips_and_clears() {
        let cache = SegmentCache::new();
        let key = SegmentKey {
            first_tile: TileIndex::new(7),
            first_trackdir: Trackdir::NeSw,
        };
        let segment = Segment {
            cost: 300,
            last_tile: TileIndex::new(10),
            last_trackdir: Trackdir::NeSw,
            last_signal: None,
            end_reasons: EndSegmentReason::DeadEnd.into(),
        };
        cache.insert(key, segment);
        assert_eq!(cache.get(key), Some(segment));
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn cache_counts_hits_and_misses() {
        let cache = SegmentCache::new();
        let key = SegmentKey { first_tile: TileIndex::new(1), first_trackdir: Trackdir::NeSw };
        assert_eq!(cache.get(key), None);
        cache.insert(
            key,
            Segment { cost: 100, last_tile: TileIndex::new(2), last_trackdir: Trackdir::NeSw, last_signal: None, end_reasons: EndSegmentReason::DeadEnd.into() },
        );
        assert!(cache.get(key).is_some());
        assert_eq!(cache.misses(), 1);
        assert_eq!(cache.hits(), 1);
    }

    #[test]
    fn change_counter_advances_monotonically() {
        let counter = RailChangeCounter::new();
        assert_eq!(counter.value(), 0);
        assert_eq!(counter.bump(), 1);
        assert_eq!(counter.bump(), 2);
        assert_eq!(counter.value(), 2);
    }
}
