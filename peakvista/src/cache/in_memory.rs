//! Volatile persistent-tier implementation.

use std::collections::HashMap;

use futures::future::BoxFuture;
use parking_lot::Mutex;

use super::traits::{CacheError, PersistentStore, StoreSummary, StoredTile, SweepResult};
use crate::coord::TileId;

/// A [`PersistentStore`] that lives only as long as the process.
///
/// Used when no cache directory is configured, and in tests.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: Mutex<HashMap<TileId, StoredTile>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: &TileId) -> bool {
        self.records.lock().contains_key(id)
    }
}

impl PersistentStore for InMemoryStore {
    fn get(&self, id: TileId) -> BoxFuture<'_, Result<Option<StoredTile>, CacheError>> {
        let found = self.records.lock().get(&id).cloned();
        Box::pin(async move { Ok(found) })
    }

    fn put(&self, record: StoredTile) -> BoxFuture<'_, Result<(), CacheError>> {
        self.records.lock().insert(record.key, record);
        Box::pin(async { Ok(()) })
    }

    fn clear(&self) -> BoxFuture<'_, Result<(), CacheError>> {
        self.records.lock().clear();
        Box::pin(async { Ok(()) })
    }

    fn sweep(&self, cutoff_ms: i64) -> BoxFuture<'_, Result<SweepResult, CacheError>> {
        let mut result = SweepResult::default();
        self.records.lock().retain(|_, record| {
            let keep = record.timestamp_ms >= cutoff_ms;
            if !keep {
                result.entries_removed += 1;
                result.bytes_freed += record.bytes.len() as u64;
            }
            keep
        });
        Box::pin(async move { Ok(result) })
    }

    fn summary(&self) -> BoxFuture<'_, Result<StoreSummary, CacheError>> {
        let records = self.records.lock();
        let summary = StoreSummary {
            entries: records.len(),
            bytes: records.values().map(|r| r.bytes.len() as u64).sum(),
            oldest_ms: records.values().map(|r| r.timestamp_ms).min(),
        };
        drop(records);
        Box::pin(async move { Ok(summary) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sweep_by_cutoff() {
        let store = InMemoryStore::new();
        for (x, ts) in [(0, 10), (1, 20), (2, 30)] {
            let id = TileId::new(5, x, 0).unwrap();
            store.put(StoredTile::new(id, vec![0; 3], ts)).await.unwrap();
        }

        let result = store.sweep(20).await.unwrap();
        assert_eq!(result.entries_removed, 1);
        assert_eq!(result.bytes_freed, 3);
        assert_eq!(store.len(), 2);
        assert_eq!(store.summary().await.unwrap().oldest_ms, Some(20));
    }
}
