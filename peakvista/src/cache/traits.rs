//! Persistent tier interface.
//!
//! The persistent tier is an unbounded key-value store of raw tile payloads
//! with write timestamps. It is only ever trimmed by age, never by size.
//!
//! Methods return boxed futures so the tier can be held as
//! `Arc<dyn PersistentStore>` and swapped between disk and memory backends.

use std::fmt;
use std::path::PathBuf;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::coord::TileId;

/// Errors from a persistent store.
#[derive(Debug, Error)]
pub enum CacheError {
    /// I/O error during cache operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A record could not be encoded.
    #[error("failed to encode record for {id}: {reason}")]
    Encode { id: TileId, reason: String },

    /// A stored record could not be decoded.
    #[error("corrupt cache record at {}: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },

    /// The store refused the operation.
    #[error("cache store unavailable: {0}")]
    Unavailable(String),
}

/// One persisted tile payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredTile {
    pub key: TileId,
    pub bytes: Vec<u8>,
    /// Write time, milliseconds since the Unix epoch.
    pub timestamp_ms: i64,
}

impl StoredTile {
    pub fn new(key: TileId, bytes: Vec<u8>, timestamp_ms: i64) -> Self {
        Self {
            key,
            bytes,
            timestamp_ms,
        }
    }

    /// Stamped with the current wall-clock time.
    pub fn now(key: TileId, bytes: Vec<u8>) -> Self {
        Self::new(key, bytes, chrono::Utc::now().timestamp_millis())
    }
}

/// Result of an age sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepResult {
    pub entries_removed: usize,
    pub bytes_freed: u64,
}

impl fmt::Display for SweepResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "removed {} entries, freed {} bytes",
            self.entries_removed, self.bytes_freed
        )
    }
}

/// Entry count and payload size of a store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreSummary {
    pub entries: usize,
    pub bytes: u64,
    /// Oldest write time, if any entries exist.
    pub oldest_ms: Option<i64>,
}

/// Unbounded tile store keyed by [`TileId`].
///
/// All implementations must be `Send + Sync` for use across async tasks.
pub trait PersistentStore: Send + Sync {
    /// Retrieve a record.
    ///
    /// - `Ok(Some(record))` if the tile is stored
    /// - `Ok(None)` if it is not
    fn get(&self, id: TileId) -> BoxFuture<'_, Result<Option<StoredTile>, CacheError>>;

    /// Store a record, replacing any existing one for the same key.
    fn put(&self, record: StoredTile) -> BoxFuture<'_, Result<(), CacheError>>;

    /// Remove every record.
    fn clear(&self) -> BoxFuture<'_, Result<(), CacheError>>;

    /// Remove every record written before `cutoff_ms`.
    fn sweep(&self, cutoff_ms: i64) -> BoxFuture<'_, Result<SweepResult, CacheError>>;

    /// Enumerate the store.
    fn summary(&self) -> BoxFuture<'_, Result<StoreSummary, CacheError>>;
}
