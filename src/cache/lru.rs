//! LRU Eviction Module
//!
//! Approximate least-recently-used eviction driven by per-item access stamps.
//! Candidates are chosen in a single pass over the map, keeping at most `n`
//! keys in memory.

use std::collections::BinaryHeap;

use tracing::debug;

use crate::cache::store::{CacheStore, Removed};

// == LRU Candidates ==
/// Bounded selection of the `n` least recently accessed keys seen so far.
///
/// Backed by a max-heap on access time: the root is the most recent of the
/// kept candidates, which is the admission threshold once the buffer is
/// full. A full buffer only admits keys accessed strictly before the
/// threshold, and each admission pushes the threshold candidate out, so the
/// buffer always holds the true `n` smallest access times observed.
#[derive(Debug)]
pub struct LruCandidates {
    capacity: usize,
    heap: BinaryHeap<(u64, String)>,
}

impl LruCandidates {
    // == Constructor ==
    /// Creates an empty selection holding at most `capacity` keys.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            heap: BinaryHeap::with_capacity(capacity),
        }
    }

    // == Threshold ==
    /// Largest access time currently kept, None while empty.
    pub fn threshold(&self) -> Option<u64> {
        self.heap.peek().map(|(accessed, _)| *accessed)
    }

    // == Offer ==
    /// Considers a key for eviction. Returns true if it was admitted.
    pub fn offer(&mut self, key: &str, accessed: u64) -> bool {
        if self.capacity == 0 {
            return false;
        }
        if self.heap.len() < self.capacity {
            self.heap.push((accessed, key.to_string()));
            return true;
        }
        match self.threshold() {
            Some(threshold) if accessed < threshold => {
                self.heap.pop();
                self.heap.push((accessed, key.to_string()));
                true
            }
            _ => false,
        }
    }

    // == Length ==
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Consumes the selection, oldest access first.
    pub fn into_sorted(self) -> Vec<(u64, String)> {
        self.heap.into_sorted_vec()
    }
}

impl CacheStore {
    // == Delete LRU ==
    /// Evicts the overage when the item count exceeds the size bound.
    ///
    /// Returns the number of items removed. Does nothing without a bound.
    pub fn delete_lru(&self) -> usize {
        let size_bound = self.settings.read().size_bound;
        if size_bound == 0 {
            return 0;
        }
        let over_count = self.item_count().saturating_sub(size_bound);
        self.delete_lru_amount(over_count)
    }

    // == Delete LRU Amount ==
    /// Evicts up to `count` live items with the oldest access times.
    ///
    /// Access times are only tracked while a size bound is configured, so
    /// this is a no-op for an unbounded cache. An item touched between the
    /// scan and its removal is kept.
    pub fn delete_lru_amount(&self, count: usize) -> usize {
        if count == 0 || !self.tracks_access() {
            return 0;
        }
        let now = self.now();
        let callback = self.eviction_callback();

        let mut candidates = LruCandidates::new(count);
        for entry in self.items.iter() {
            let item = entry.value();
            if !item.is_expired_at(now) {
                candidates.offer(entry.key(), item.last_accessed);
            }
        }

        let removed: Vec<Removed> = candidates
            .into_sorted()
            .into_iter()
            .filter_map(|(accessed, key)| {
                self.remove_if(&key, |item| item.last_accessed == accessed)
            })
            .collect();

        let evicted = removed.len();
        self.stats.record_evictions(evicted);
        self.notify_removed(callback, &removed);

        if evicted > 0 {
            debug!("LRU sweep evicted {} items", evicted);
        }
        evicted
    }
}
