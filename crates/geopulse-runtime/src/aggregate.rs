//! Mention counting and top-N ranking

use geopulse_core::PlaceEntity;
use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use serde::Serialize;
use std::sync::Arc;

/// Type alias for IndexMap with FxBuildHasher: insertion-ordered with fast
/// hashing. Insertion order is load-bearing here: ranking ties resolve by
/// first-recorded place.
pub type FxIndexMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// One row of a ranking snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankingEntry {
    pub display_name: Arc<str>,
    pub count: u64,
}

#[derive(Debug, Clone)]
struct Slot {
    display_name: Arc<str>,
    count: u64,
}

/// Monotonic per-place mention counts.
///
/// Keyed by canonical name; entries are created lazily on first resolution
/// and counts never decrease. Snapshots are independent copies, so callers
/// can hold one across later updates without seeing them.
#[derive(Debug, Clone)]
pub struct MentionCounter {
    counts: FxIndexMap<Arc<str>, Slot>,
}

impl MentionCounter {
    pub fn new() -> Self {
        Self {
            counts: IndexMap::with_hasher(FxBuildHasher),
        }
    }

    /// Count one resolved mention of `place`.
    pub fn record(&mut self, place: &PlaceEntity) {
        self.counts
            .entry(place.canonical_name.clone())
            .or_insert_with(|| Slot {
                display_name: place.display_name.clone(),
                count: 0,
            })
            .count += 1;
    }

    /// Current count for a canonical name (zero when never recorded).
    pub fn count_for(&self, canonical_name: &str) -> u64 {
        self.counts.get(canonical_name).map_or(0, |slot| slot.count)
    }

    /// Number of distinct places recorded so far.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.counts.values().map(|slot| slot.count).sum()
    }

    /// Top `n` places by count, descending.
    ///
    /// The sort is stable over insertion order, so equal counts rank the
    /// first-recorded place higher. Idempotent and side-effect-free; the
    /// returned rows are copies.
    pub fn snapshot_top_n(&self, n: usize) -> Vec<RankingEntry> {
        let mut entries: Vec<RankingEntry> = self
            .counts
            .values()
            .map(|slot| RankingEntry {
                display_name: slot.display_name.clone(),
                count: slot.count,
            })
            .collect();
        entries.sort_by(|a, b| b.count.cmp(&a.count));
        entries.truncate(n);
        entries
    }
}

impl Default for MentionCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geopulse_core::{LonLat, SettlementTier};

    fn place(name: &str) -> PlaceEntity {
        PlaceEntity::new(name, SettlementTier::City, LonLat::new(30.0, 50.0))
    }

    #[test]
    fn test_counts_match_record_calls() {
        let mut counter = MentionCounter::new();
        let kyiv = place("Kyiv");
        let lviv = place("Lviv");

        counter.record(&kyiv);
        counter.record(&kyiv);
        counter.record(&lviv);
        counter.record(&kyiv);

        assert_eq!(counter.count_for("Kyiv"), 3);
        assert_eq!(counter.count_for("Lviv"), 1);
        assert_eq!(counter.count_for("Odesa"), 0);
        assert_eq!(counter.len(), 2);
        assert_eq!(counter.total(), 4);
    }

    #[test]
    fn test_entries_created_lazily() {
        let counter = MentionCounter::new();
        assert!(counter.is_empty());
        assert_eq!(counter.count_for("Kyiv"), 0);
    }

    #[test]
    fn test_top_n_orders_by_count_descending() {
        let mut counter = MentionCounter::new();
        let kyiv = place("Kyiv");
        let lviv = place("Lviv");
        counter.record(&kyiv);
        counter.record(&lviv);
        counter.record(&lviv);

        let top = counter.snapshot_top_n(10);
        assert_eq!(top.len(), 2);
        assert_eq!(&*top[0].display_name, "Lviv");
        assert_eq!(top[0].count, 2);
        assert_eq!(&*top[1].display_name, "Kyiv");
    }

    #[test]
    fn test_ties_rank_first_recorded_higher() {
        // {A:3, B:3, C:5} with A recorded before B ranks [C, A, B].
        let mut counter = MentionCounter::new();
        let a = place("A");
        let b = place("B");
        let c = place("C");
        for _ in 0..3 {
            counter.record(&a);
        }
        for _ in 0..3 {
            counter.record(&b);
        }
        for _ in 0..5 {
            counter.record(&c);
        }

        let top = counter.snapshot_top_n(3);
        let names: Vec<&str> = top.iter().map(|e| &*e.display_name).collect();
        assert_eq!(names, vec!["C", "A", "B"]);
        assert_eq!(top[0].count, 5);
        assert_eq!(top[1].count, 3);
        assert_eq!(top[2].count, 3);
    }

    #[test]
    fn test_snapshot_is_idempotent() {
        let mut counter = MentionCounter::new();
        counter.record(&place("Kyiv"));
        counter.record(&place("Lviv"));

        let first = counter.snapshot_top_n(5);
        let second = counter.snapshot_top_n(5);
        assert_eq!(first, second);
    }

    #[test]
    fn test_snapshot_is_independent_of_later_updates() {
        let mut counter = MentionCounter::new();
        let kyiv = place("Kyiv");
        counter.record(&kyiv);

        let before = counter.snapshot_top_n(5);
        counter.record(&kyiv);
        assert_eq!(before[0].count, 1);
        assert_eq!(counter.snapshot_top_n(5)[0].count, 2);
    }

    #[test]
    fn test_top_n_truncates() {
        let mut counter = MentionCounter::new();
        for name in ["A", "B", "C", "D"] {
            counter.record(&place(name));
        }
        assert_eq!(counter.snapshot_top_n(2).len(), 2);
        assert_eq!(counter.snapshot_top_n(0).len(), 0);
        assert_eq!(counter.snapshot_top_n(100).len(), 4);
    }

    #[test]
    fn test_display_name_captured_on_first_record() {
        let mut counter = MentionCounter::new();
        let mariupol = place("Mariupol").with_display_name("Маріуполь");
        counter.record(&mariupol);
        let top = counter.snapshot_top_n(1);
        assert_eq!(&*top[0].display_name, "Маріуполь");
    }
}
