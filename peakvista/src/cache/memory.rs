//! Bounded in-memory tier with strict LRU eviction.
//!
//! Backed by `lru::LruCache` behind a `parking_lot::Mutex`. The lock is only
//! held for the map operation itself and never across an `.await`, so it is
//! safe to use from async tasks.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;

use crate::coord::TileId;

/// Default number of tiles held in memory.
pub const DEFAULT_MEMORY_ENTRIES: usize = 100;

/// In-memory tile payload cache.
///
/// Both `get` and `put` mark the entry most recently used; inserting into a
/// full cache evicts exactly the least recently used entry.
pub struct MemoryTier {
    entries: Mutex<LruCache<TileId, Arc<Vec<u8>>>>,
    /// Statistics - using atomics for lock-free reads
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl MemoryTier {
    /// Creates a tier holding at most `capacity` tiles (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    pub fn get(&self, id: &TileId) -> Option<Arc<Vec<u8>>> {
        let found = self.entries.lock().get(id).cloned();
        let counter = if found.is_some() {
            &self.hits
        } else {
            &self.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    /// Inserts or refreshes a tile, returning the key evicted to make room.
    pub fn put(&self, id: TileId, data: Arc<Vec<u8>>) -> Option<TileId> {
        let displaced = self.entries.lock().push(id, data);
        match displaced {
            Some((old, _)) if old != id => {
                self.evictions.fetch_add(1, Ordering::Relaxed);
                Some(old)
            }
            _ => None,
        }
    }

    /// Presence check that does not affect recency.
    pub fn contains(&self, id: &TileId) -> bool {
        self.entries.lock().contains(id)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.entries.lock().cap().get()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }
}

impl Default for MemoryTier {
    fn default() -> Self {
        Self::new(DEFAULT_MEMORY_ENTRIES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(x: u32) -> TileId {
        TileId::new(10, x, 0).unwrap()
    }

    fn data(v: u8) -> Arc<Vec<u8>> {
        Arc::new(vec![v])
    }

    #[test]
    fn test_put_and_get() {
        let tier = MemoryTier::new(4);
        assert!(tier.get(&id(1)).is_none());
        tier.put(id(1), data(1));
        assert_eq!(tier.get(&id(1)).unwrap().as_slice(), &[1]);
        assert_eq!(tier.hits(), 1);
        assert_eq!(tier.misses(), 1);
    }

    #[test]
    fn test_overflow_evicts_least_recently_used() {
        let tier = MemoryTier::new(3);
        tier.put(id(1), data(1));
        tier.put(id(2), data(2));
        tier.put(id(3), data(3));

        // Touch 1 so 2 becomes the oldest.
        tier.get(&id(1));

        assert_eq!(tier.put(id(4), data(4)), Some(id(2)));
        assert!(!tier.contains(&id(2)));
        assert!(tier.contains(&id(1)));
        assert!(tier.contains(&id(3)));
        assert!(tier.contains(&id(4)));
        assert_eq!(tier.len(), 3);
        assert_eq!(tier.evictions(), 1);
    }

    #[test]
    fn test_reinsert_refreshes_without_eviction() {
        let tier = MemoryTier::new(2);
        tier.put(id(1), data(1));
        tier.put(id(2), data(2));
        assert_eq!(tier.put(id(1), data(9)), None);
        assert_eq!(tier.get(&id(1)).unwrap().as_slice(), &[9]);

        // 1 was refreshed by the put, so 2 goes next.
        assert_eq!(tier.put(id(3), data(3)), Some(id(2)));
        assert_eq!(tier.evictions(), 1);
    }

    #[test]
    fn test_zero_capacity_clamped() {
        let tier = MemoryTier::new(0);
        assert_eq!(tier.capacity(), 1);
        tier.put(id(1), data(1));
        assert_eq!(tier.put(id(2), data(2)), Some(id(1)));
    }

    #[test]
    fn test_clear() {
        let tier = MemoryTier::default();
        tier.put(id(1), data(1));
        tier.clear();
        assert!(tier.is_empty());
        assert_eq!(tier.capacity(), DEFAULT_MEMORY_ENTRIES);
    }
}
