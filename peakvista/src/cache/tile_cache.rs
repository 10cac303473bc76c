//! Two-tier tile payload cache.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info};

use super::memory::MemoryTier;
use super::traits::{CacheError, PersistentStore, StoreSummary, StoredTile, SweepResult};
use crate::coord::TileId;

/// Default age after which persisted tiles are swept (7 days).
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Counters for both tiers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub memory_hits: u64,
    pub persistent_hits: u64,
    pub misses: u64,
    pub memory_evictions: u64,
    pub memory_entries: usize,
    pub memory_capacity: usize,
    /// The persistent tier failed and is no longer consulted.
    pub degraded: bool,
}

impl CacheStats {
    /// Fraction of lookups served from either tier.
    pub fn hit_rate(&self) -> f64 {
        let hits = self.memory_hits + self.persistent_hits;
        let total = hits + self.misses;
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "memory {}/{} entries, {} memory hits, {} persistent hits, {} misses, {} evictions{}",
            self.memory_entries,
            self.memory_capacity,
            self.memory_hits,
            self.persistent_hits,
            self.misses,
            self.memory_evictions,
            if self.degraded { " (memory only)" } else { "" }
        )
    }
}

/// Memory tier in front of a [`PersistentStore`].
///
/// Reads check memory first, then the persistent tier; a persistent hit is
/// promoted into memory. Writes go to both tiers. A tile evicted from memory
/// stays in the persistent tier and can be served again without a network
/// fetch.
///
/// Persistent-tier failures never surface to callers: the error is logged and
/// the cache continues memory-only for the rest of its life.
pub struct TileCache {
    memory: MemoryTier,
    persistent: Option<Arc<dyn PersistentStore>>,
    max_age: Duration,
    degraded: AtomicBool,
    persistent_hits: AtomicU64,
    misses: AtomicU64,
}

impl TileCache {
    pub fn new(memory_entries: usize, persistent: Arc<dyn PersistentStore>) -> Self {
        Self {
            memory: MemoryTier::new(memory_entries),
            persistent: Some(persistent),
            max_age: DEFAULT_MAX_AGE,
            degraded: AtomicBool::new(false),
            persistent_hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// A cache with no persistent tier.
    pub fn memory_only(memory_entries: usize) -> Self {
        Self {
            memory: MemoryTier::new(memory_entries),
            persistent: None,
            max_age: DEFAULT_MAX_AGE,
            degraded: AtomicBool::new(false),
            persistent_hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Relaxed)
    }

    /// Whether `id` is currently held in the memory tier.
    pub fn in_memory(&self, id: &TileId) -> bool {
        self.memory.contains(id)
    }

    fn persistent(&self) -> Option<&dyn PersistentStore> {
        if self.is_degraded() {
            return None;
        }
        self.persistent.as_deref()
    }

    fn degrade(&self, operation: &str, err: &CacheError) {
        if !self.degraded.swap(true, Ordering::Relaxed) {
            error!(
                operation,
                error = %err,
                "Persistent cache failed, continuing memory-only"
            );
        }
    }

    /// Looks up a tile, memory first.
    pub async fn get(&self, id: TileId) -> Option<Arc<Vec<u8>>> {
        if let Some(bytes) = self.memory.get(&id) {
            return Some(bytes);
        }

        if let Some(store) = self.persistent() {
            match store.get(id).await {
                Ok(Some(record)) => {
                    self.persistent_hits.fetch_add(1, Ordering::Relaxed);
                    debug!(tile = %id, "Promoting persistent cache hit");
                    let bytes = Arc::new(record.bytes);
                    self.memory.put(id, Arc::clone(&bytes));
                    return Some(bytes);
                }
                Ok(None) => {}
                Err(e) => self.degrade("get", &e),
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Stores a tile in both tiers.
    pub async fn store(&self, id: TileId, bytes: Vec<u8>) -> Arc<Vec<u8>> {
        let bytes = Arc::new(bytes);
        if let Some(evicted) = self.memory.put(id, Arc::clone(&bytes)) {
            debug!(tile = %id, evicted = %evicted, "Memory cache full, evicted LRU tile");
        }

        if let Some(store) = self.persistent() {
            let record = StoredTile::now(id, bytes.as_ref().clone());
            if let Err(e) = store.put(record).await {
                self.degrade("store", &e);
            }
        }
        bytes
    }

    /// Empties both tiers.
    pub async fn clear(&self) {
        self.memory.clear();
        if let Some(store) = self.persistent() {
            if let Err(e) = store.clear().await {
                self.degrade("clear", &e);
            }
        }
    }

    /// Removes persisted tiles older than the configured max age.
    pub async fn sweep_expired(&self) -> SweepResult {
        let cutoff = chrono::Utc::now().timestamp_millis() - self.max_age.as_millis() as i64;
        self.sweep_before(cutoff).await
    }

    /// Removes persisted tiles written before `cutoff_ms`.
    pub async fn sweep_before(&self, cutoff_ms: i64) -> SweepResult {
        let Some(store) = self.persistent() else {
            return SweepResult::default();
        };
        match store.sweep(cutoff_ms).await {
            Ok(result) => {
                if result.entries_removed > 0 {
                    info!(
                        removed = result.entries_removed,
                        bytes = result.bytes_freed,
                        "Swept expired tiles"
                    );
                }
                result
            }
            Err(e) => {
                self.degrade("sweep", &e);
                SweepResult::default()
            }
        }
    }

    /// Persistent-tier contents, or `None` if there is no usable tier.
    pub async fn persistent_summary(&self) -> Option<StoreSummary> {
        let store = self.persistent()?;
        match store.summary().await {
            Ok(summary) => Some(summary),
            Err(e) => {
                self.degrade("summary", &e);
                None
            }
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            memory_hits: self.memory.hits(),
            persistent_hits: self.persistent_hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            memory_evictions: self.memory.evictions(),
            memory_entries: self.memory.len(),
            memory_capacity: self.memory.capacity(),
            degraded: self.is_degraded(),
        }
    }
}
