//! Cache management CLI commands.

use chrono::{TimeZone, Utc};
use clap::Subcommand;
use peakvista::cache::TileCache;
use peakvista::config::format_size;
use peakvista::pipeline::CacheConfig;

use super::common::load_config;
use crate::error::CliError;

/// Cache action subcommands.
#[derive(Debug, Subcommand)]
pub enum CacheAction {
    /// Show disk cache statistics
    Stats,
    /// Clear the disk cache, removing all cached tiles
    Clear,
    /// Remove tiles older than the configured maximum age
    Sweep {
        /// Override the maximum age in days
        #[arg(long)]
        max_age_days: Option<u64>,
    },
}

/// Run a cache subcommand.
pub fn run(action: CacheAction) -> Result<(), CliError> {
    let config = load_config();
    let cache_config = CacheConfig {
        directory: Some(config.cache.directory.clone()),
        memory_entries: config.cache.memory_entries,
        max_age: std::time::Duration::from_secs(config.cache.max_age_days * 86_400),
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;

    let report = runtime.block_on(execute(action, &cache_config))?;
    println!("{}", report);
    Ok(())
}

/// Performs `action` against the cache described by `config` and returns
/// the text to print.
async fn execute(action: CacheAction, config: &CacheConfig) -> Result<String, CliError> {
    let location = config
        .directory
        .as_ref()
        .map(|d| d.display().to_string())
        .unwrap_or_else(|| "(memory)".to_string());

    match action {
        CacheAction::Stats => {
            let cache = config.build();
            let summary = summary_or_unavailable(&cache, &location).await?;
            let oldest = summary
                .oldest_ms
                .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
                .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                .unwrap_or_else(|| "-".to_string());

            Ok(format!(
                "Disk cache: {}\n  Tiles:  {}\n  Size:   {}\n  Oldest: {}",
                location,
                summary.entries,
                format_size(summary.bytes),
                oldest
            ))
        }
        CacheAction::Clear => {
            let cache = config.build();
            let before = summary_or_unavailable(&cache, &location).await?;
            cache.clear().await;
            if cache.is_degraded() {
                return Err(CliError::CacheUnavailable(location));
            }
            Ok(format!(
                "Cleared disk cache at {}: deleted {} tiles, freed {}",
                location,
                before.entries,
                format_size(before.bytes)
            ))
        }
        CacheAction::Sweep { max_age_days } => {
            let mut config = config.clone();
            if let Some(days) = max_age_days {
                config.max_age = std::time::Duration::from_secs(days * 86_400);
            }
            let cache = config.build();
            let result = cache.sweep_expired().await;
            if cache.is_degraded() {
                return Err(CliError::CacheUnavailable(location));
            }
            Ok(format!(
                "Swept {} (max age {} days): removed {} tiles, freed {}",
                location,
                config.max_age.as_secs() / 86_400,
                result.entries_removed,
                format_size(result.bytes_freed)
            ))
        }
    }
}

async fn summary_or_unavailable(
    cache: &TileCache,
    location: &str,
) -> Result<peakvista::cache::StoreSummary, CliError> {
    cache
        .persistent_summary()
        .await
        .ok_or_else(|| CliError::CacheUnavailable(location.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use peakvista::coord::TileId;

    fn disk_config(dir: &std::path::Path) -> CacheConfig {
        CacheConfig {
            directory: Some(dir.to_path_buf()),
            ..CacheConfig::default()
        }
    }

    async fn seed(config: &CacheConfig, count: u32) {
        let cache = config.build();
        for x in 0..count {
            let id = TileId::new(14, 14505 + x, 6469).unwrap();
            cache.store(id, vec![7u8; 1024]).await;
        }
    }

    #[tokio::test]
    async fn test_stats_reports_disk_tier() {
        let temp = tempfile::tempdir().unwrap();
        let config = disk_config(temp.path());
        seed(&config, 3).await;

        let report = execute(CacheAction::Stats, &config).await.unwrap();
        assert!(report.contains("Tiles:  3"));
        assert!(!report.contains("Oldest: -"));
    }

    #[tokio::test]
    async fn test_clear_removes_everything() {
        let temp = tempfile::tempdir().unwrap();
        let config = disk_config(temp.path());
        seed(&config, 2).await;

        let report = execute(CacheAction::Clear, &config).await.unwrap();
        assert!(report.contains("deleted 2 tiles"));

        let report = execute(CacheAction::Stats, &config).await.unwrap();
        assert!(report.contains("Tiles:  0"));
    }

    #[tokio::test]
    async fn test_sweep_keeps_fresh_tiles() {
        let temp = tempfile::tempdir().unwrap();
        let config = disk_config(temp.path());
        seed(&config, 2).await;

        let report = execute(CacheAction::Sweep { max_age_days: None }, &config)
            .await
            .unwrap();
        assert!(report.contains("removed 0 tiles"));
    }

    #[tokio::test]
    async fn test_memory_only_has_no_disk_stats() {
        let result = execute(CacheAction::Stats, &CacheConfig::default()).await;
        assert!(matches!(result, Err(CliError::CacheUnavailable(_))));
    }
}
