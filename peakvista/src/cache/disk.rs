//! On-disk persistent tier.
//!
//! Layout: one bincode-encoded [`StoredTile`] per tile at
//! `{root}/{z}/{x}/{y}.tile`. Writes go to a temporary file first and are
//! renamed into place, so a reader never sees a half-written record.

use std::io;
use std::path::{Path, PathBuf};

use futures::future::BoxFuture;
use tracing::{debug, warn};

use super::traits::{CacheError, PersistentStore, StoreSummary, StoredTile, SweepResult};
use crate::coord::TileId;

const RECORD_EXTENSION: &str = "tile";

/// File-per-tile persistent store.
#[derive(Debug, Clone)]
pub struct DiskStore {
    root: PathBuf,
}

impl DiskStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the record for `id`.
    pub fn record_path(&self, id: TileId) -> PathBuf {
        self.root
            .join(id.zoom.to_string())
            .join(id.x.to_string())
            .join(format!("{}.{}", id.y, RECORD_EXTENSION))
    }

    async fn read_record(path: &Path) -> Result<Option<StoredTile>, CacheError> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        bincode::deserialize(&bytes)
            .map(Some)
            .map_err(|e| CacheError::Corrupt {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
    }

    async fn write_record(&self, record: &StoredTile) -> Result<(), CacheError> {
        let path = self.record_path(record.key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let encoded = bincode::serialize(record).map_err(|e| CacheError::Encode {
            id: record.key,
            reason: e.to_string(),
        })?;

        // Write to temp file first, then rename for atomicity
        let temp_path = path.with_extension("tmp");
        tokio::fs::write(&temp_path, encoded).await?;
        tokio::fs::rename(&temp_path, &path).await?;
        Ok(())
    }

    /// Every record file under the root, in no particular order.
    async fn record_files(&self) -> Result<Vec<PathBuf>, CacheError> {
        let mut files = Vec::new();
        let mut pending = vec![self.root.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };

            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                let file_type = entry.file_type().await?;
                if file_type.is_dir() {
                    pending.push(path);
                } else if path.extension().is_some_and(|ext| ext == RECORD_EXTENSION) {
                    files.push(path);
                }
            }
        }

        Ok(files)
    }

    async fn remove_file(path: &Path) -> Result<(), CacheError> {
        match tokio::fs::remove_file(path).await {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

impl PersistentStore for DiskStore {
    fn get(&self, id: TileId) -> BoxFuture<'_, Result<Option<StoredTile>, CacheError>> {
        Box::pin(async move {
            let path = self.record_path(id);
            match Self::read_record(&path).await {
                Ok(Some(record)) if record.key == id => Ok(Some(record)),
                Ok(Some(record)) => {
                    warn!(path = %path.display(), found = %record.key, "Cache record key mismatch, discarding");
                    Self::remove_file(&path).await?;
                    Ok(None)
                }
                Ok(None) => Ok(None),
                Err(CacheError::Corrupt { path, reason }) => {
                    warn!(path = %path.display(), reason = %reason, "Corrupt cache record, discarding");
                    Self::remove_file(&path).await?;
                    Ok(None)
                }
                Err(e) => Err(e),
            }
        })
    }

    fn put(&self, record: StoredTile) -> BoxFuture<'_, Result<(), CacheError>> {
        Box::pin(async move { self.write_record(&record).await })
    }

    fn clear(&self) -> BoxFuture<'_, Result<(), CacheError>> {
        Box::pin(async move {
            match tokio::fs::remove_dir_all(&self.root).await {
                Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
                _ => Ok(()),
            }
        })
    }

    fn sweep(&self, cutoff_ms: i64) -> BoxFuture<'_, Result<SweepResult, CacheError>> {
        Box::pin(async move {
            let mut result = SweepResult::default();

            for path in self.record_files().await? {
                let size = tokio::fs::metadata(&path).await.map(|m| m.len()).unwrap_or(0);
                let expired = match Self::read_record(&path).await {
                    Ok(Some(record)) => record.timestamp_ms < cutoff_ms,
                    Ok(None) => false,
                    Err(CacheError::Corrupt { .. }) => true,
                    Err(e) => return Err(e),
                };

                if expired {
                    Self::remove_file(&path).await?;
                    result.entries_removed += 1;
                    result.bytes_freed += size;
                }
            }

            debug!(
                root = %self.root.display(),
                removed = result.entries_removed,
                bytes = result.bytes_freed,
                "Disk cache sweep complete"
            );
            Ok(result)
        })
    }

    fn summary(&self) -> BoxFuture<'_, Result<StoreSummary, CacheError>> {
        Box::pin(async move {
            let mut summary = StoreSummary::default();

            for path in self.record_files().await? {
                let Ok(Some(record)) = Self::read_record(&path).await else {
                    continue;
                };
                summary.entries += 1;
                summary.bytes += record.bytes.len() as u64;
                summary.oldest_ms = Some(match summary.oldest_ms {
                    Some(oldest) => oldest.min(record.timestamp_ms),
                    None => record.timestamp_ms,
                });
            }

            Ok(summary)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn id(x: u32, y: u32) -> TileId {
        TileId::new(14, x, y).unwrap()
    }

    #[test]
    fn test_record_path_layout() {
        let store = DiskStore::new("/cache");
        assert_eq!(
            store.record_path(id(14505, 6469)),
            PathBuf::from("/cache/14/14505/6469.tile")
        );
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let temp = TempDir::new().unwrap();
        let store = DiskStore::new(temp.path());

        let record = StoredTile::new(id(1, 2), vec![1, 2, 3], 1_000);
        store.put(record.clone()).await.unwrap();

        assert_eq!(store.get(id(1, 2)).await.unwrap(), Some(record));
        assert_eq!(store.get(id(1, 3)).await.unwrap(), None);
        assert!(store.record_path(id(1, 2)).exists());
    }

    #[tokio::test]
    async fn test_put_replaces_existing() {
        let temp = TempDir::new().unwrap();
        let store = DiskStore::new(temp.path());

        store.put(StoredTile::new(id(1, 2), vec![1], 1)).await.unwrap();
        store.put(StoredTile::new(id(1, 2), vec![2], 2)).await.unwrap();

        let record = store.get(id(1, 2)).await.unwrap().unwrap();
        assert_eq!(record.bytes, vec![2]);
        assert_eq!(store.summary().await.unwrap().entries, 1);
    }

    #[tokio::test]
    async fn test_corrupt_record_is_discarded() {
        let temp = TempDir::new().unwrap();
        let store = DiskStore::new(temp.path());
        let path = store.record_path(id(5, 5));
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"not a record").unwrap();

        assert_eq!(store.get(id(5, 5)).await.unwrap(), None);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_sweep_removes_only_expired() {
        let temp = TempDir::new().unwrap();
        let store = DiskStore::new(temp.path());

        store.put(StoredTile::new(id(1, 1), vec![0; 10], 100)).await.unwrap();
        store.put(StoredTile::new(id(1, 2), vec![0; 10], 200)).await.unwrap();
        store.put(StoredTile::new(id(2, 1), vec![0; 10], 300)).await.unwrap();

        let result = store.sweep(250).await.unwrap();
        assert_eq!(result.entries_removed, 2);
        assert!(result.bytes_freed > 20);

        assert_eq!(store.get(id(1, 1)).await.unwrap(), None);
        assert_eq!(store.get(id(1, 2)).await.unwrap(), None);
        assert!(store.get(id(2, 1)).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_summary_and_clear() {
        let temp = TempDir::new().unwrap();
        let store = DiskStore::new(temp.path().join("tiles"));

        assert_eq!(store.summary().await.unwrap(), StoreSummary::default());

        store.put(StoredTile::new(id(1, 1), vec![0; 4], 50)).await.unwrap();
        store.put(StoredTile::new(id(1, 2), vec![0; 6], 20)).await.unwrap();

        let summary = store.summary().await.unwrap();
        assert_eq!(summary.entries, 2);
        assert_eq!(summary.bytes, 10);
        assert_eq!(summary.oldest_ms, Some(20));

        store.clear().await.unwrap();
        assert_eq!(store.summary().await.unwrap().entries, 0);
        // Clearing an absent root is not an error.
        store.clear().await.unwrap();
    }
}
