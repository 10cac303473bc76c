//! Tile payload caching
//!
//! Raw tile bytes are cached in two tiers:
//!
//! - [`MemoryTier`]: bounded, strict LRU, in process memory
//! - [`PersistentStore`]: unbounded, trimmed only by age ([`DiskStore`] or
//!   [`InMemoryStore`])
//!
//! [`TileCache`] composes them. A persistent-tier failure degrades the cache
//! to memory-only instead of failing the caller.
//!
//! ```ignore
//! use peakvista::cache::{DiskStore, TileCache};
//!
//! let cache = TileCache::new(100, Arc::new(DiskStore::new("/var/cache/peakvista")));
//! cache.store(tile, bytes).await;
//! let hit = cache.get(tile).await;
//! ```

mod disk;
mod in_memory;
mod memory;
mod tile_cache;
mod traits;

pub use disk::DiskStore;
pub use in_memory::InMemoryStore;
pub use memory::{MemoryTier, DEFAULT_MEMORY_ENTRIES};
pub use tile_cache::{CacheStats, TileCache, DEFAULT_MAX_AGE};
pub use traits::{CacheError, PersistentStore, StoreSummary, StoredTile, SweepResult};
