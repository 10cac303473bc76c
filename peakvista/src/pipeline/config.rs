//! Runtime configuration for [`TerrainPipeline`](super::TerrainPipeline).

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use super::types::DeviceLimits;
use crate::cache::{DiskStore, TileCache, DEFAULT_MAX_AGE, DEFAULT_MEMORY_ENTRIES};
use crate::config::{ConfigFile, DEFAULT_DIRECTION_BATCH, DEFAULT_MAX_IN_FLIGHT};
use crate::mesh::MeshConfig;
use crate::provider::{FetchConfig, RetryPolicy, TileEndpoint, DEFAULT_SAMPLING_ZOOM};
use crate::select::SelectorConfig;

/// Cache construction settings.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Persistent tier root. `None` keeps tiles in memory only.
    pub directory: Option<PathBuf>,
    pub memory_entries: usize,
    pub max_age: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            directory: None,
            memory_entries: DEFAULT_MEMORY_ENTRIES,
            max_age: DEFAULT_MAX_AGE,
        }
    }
}

impl CacheConfig {
    /// Builds the two-tier cache these settings describe.
    pub fn build(&self) -> TileCache {
        let cache = match &self.directory {
            Some(dir) => TileCache::new(self.memory_entries, Arc::new(DiskStore::new(dir))),
            None => TileCache::memory_only(self.memory_entries),
        };
        cache.with_max_age(self.max_age)
    }
}

/// Everything the pipeline needs besides its HTTP client.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub endpoint: TileEndpoint,
    pub fetch: FetchConfig,
    /// Zoom level tiles are requested at.
    pub sampling_zoom: u8,
    /// Concurrent network fetches across the whole pipeline.
    pub max_in_flight: usize,
    /// New tiles loaded per view-direction change.
    pub direction_batch: usize,
    pub selector: SelectorConfig,
    pub mesh: MeshConfig,
    /// Fixed mesh edge length; `None` uses the ground width of a tile at the
    /// first viewpoint's latitude.
    pub tile_size_meters: Option<f32>,
    pub device_limits: DeviceLimits,
    pub cache: CacheConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            endpoint: TileEndpoint::default(),
            fetch: FetchConfig::default(),
            sampling_zoom: DEFAULT_SAMPLING_ZOOM,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            direction_batch: DEFAULT_DIRECTION_BATCH,
            selector: SelectorConfig::default(),
            mesh: MeshConfig::default(),
            tile_size_meters: None,
            device_limits: DeviceLimits::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Create pipeline config from the user configuration file.
    ///
    /// Keeps the translation from file settings to runtime types in one
    /// place rather than scattered in CLI code.
    pub fn from_config_file(config: &ConfigFile) -> Self {
        let endpoint = TileEndpoint::new(
            config.endpoint.origin.clone(),
            config.endpoint.extension.clone(),
            config.endpoint.format,
        );

        let fetch = FetchConfig {
            timeout: Duration::from_millis(config.fetch.timeout_ms),
            retry: RetryPolicy {
                max_attempts: config.fetch.max_attempts.max(1),
                base_delay: Duration::from_millis(config.fetch.base_delay_ms),
                ..RetryPolicy::default()
            },
        };

        let selector = SelectorConfig {
            meters_per_tile: config.view.tile_size_meters.map(f64::from),
            ..SelectorConfig::default()
        };

        Self {
            endpoint,
            fetch,
            sampling_zoom: config.endpoint.sampling_zoom,
            max_in_flight: config.fetch.max_in_flight,
            direction_batch: config.view.direction_batch,
            selector,
            mesh: MeshConfig {
                vertical_exaggeration: config.view.vertical_exaggeration,
            },
            tile_size_meters: config.view.tile_size_meters,
            device_limits: DeviceLimits {
                max_resident_tiles: config.device.max_resident_tiles,
                max_lod: config.device.max_lod,
            },
            cache: CacheConfig {
                directory: Some(config.cache.directory.clone()),
                memory_entries: config.cache.memory_entries,
                max_age: Duration::from_secs(config.cache.max_age_days * 24 * 60 * 60),
            },
        }
    }

    pub fn with_endpoint(mut self, endpoint: TileEndpoint) -> Self {
        self.endpoint = endpoint;
        self
    }

    pub fn with_fetch(mut self, fetch: FetchConfig) -> Self {
        self.fetch = fetch;
        self
    }

    pub fn with_sampling_zoom(mut self, zoom: u8) -> Self {
        self.sampling_zoom = zoom;
        self
    }

    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight;
        self
    }

    pub fn with_direction_batch(mut self, batch: usize) -> Self {
        self.direction_batch = batch;
        self
    }

    pub fn with_selector(mut self, selector: SelectorConfig) -> Self {
        self.selector = selector;
        self
    }

    /// Fixes both the selector's tile width and the mesh edge length.
    pub fn with_tile_size_meters(mut self, meters: f32) -> Self {
        self.tile_size_meters = Some(meters);
        self.selector.meters_per_tile = Some(f64::from(meters));
        self
    }

    pub fn with_device_limits(mut self, limits: DeviceLimits) -> Self {
        self.device_limits = limits;
        self
    }

    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }
}
