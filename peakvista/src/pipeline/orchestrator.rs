//! Tile pipeline orchestration.
//!
//! Ties selection, caching, fetching, decoding and meshing together and keeps
//! the resident set within the device budget.

use std::sync::{Arc, OnceLock};

use futures::stream::{self, StreamExt};
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch, Semaphore};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::config::PipelineConfig;
use super::registry::{ResidentRegistry, ResidentTile};
use super::single_flight::SingleFlight;
use super::types::{DeviceLimits, LoadSummary, PipelineError, PipelineEvent};
use crate::cache::TileCache;
use crate::coord::{tile_width_meters, TileId, MAX_ZOOM};
use crate::elevation::{ElevationGrid, TileFormat};
use crate::mesh::{EdgeNeighbors, Lod, MeshError, MeshGenerator, TerrainMesh};
use crate::provider::{AsyncHttpClient, FetchError, NetworkFetcher};
use crate::select::{TileRequest, Viewpoint, ViewportTileSelector};

type FetchResult = Result<Arc<Vec<u8>>, FetchError>;

/// Tiles whose east, south or south-east border touches a given tile.
const BORDERING: [(i64, i64); 3] = [(-1, 0), (0, -1), (-1, -1)];

/// How one tile request ended.
enum TileOutcome {
    Loaded,
    Failed,
    Missing,
}

/// Progressive terrain loader for a single viewpoint.
///
/// Results are delivered through [`subscribe`](Self::subscribe) as they
/// complete, in no guaranteed order. The pipeline only holds channel senders;
/// it never references the renderer.
pub struct TerrainPipeline<C: AsyncHttpClient + 'static> {
    config: PipelineConfig,
    fetcher: Arc<NetworkFetcher<C>>,
    cache: Arc<TileCache>,
    selector: ViewportTileSelector,
    mesher: MeshGenerator,
    format: TileFormat,
    mesh_width: OnceLock<f32>,
    viewpoint: Mutex<Option<Viewpoint>>,
    limits: Mutex<DeviceLimits>,
    resident: Mutex<ResidentRegistry>,
    in_flight: SingleFlight<TileId, FetchResult>,
    fetch_permits: Arc<Semaphore>,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<PipelineEvent>>>,
}

impl<C: AsyncHttpClient + 'static> TerrainPipeline<C> {
    /// Creates a pipeline using the cache described by `config.cache`.
    pub fn new(client: C, config: PipelineConfig) -> Result<Self, PipelineError> {
        let cache = config.cache.build();
        Self::with_cache(client, cache, config)
    }

    /// Creates a pipeline around an existing cache.
    pub fn with_cache(
        client: C,
        cache: TileCache,
        config: PipelineConfig,
    ) -> Result<Self, PipelineError> {
        if config.sampling_zoom > MAX_ZOOM {
            return Err(PipelineError::InvalidZoom(config.sampling_zoom));
        }
        if config.max_in_flight == 0 {
            return Err(PipelineError::InvalidConfig(
                "max_in_flight must be at least 1".to_string(),
            ));
        }
        if let Some(size) = config.tile_size_meters {
            if !size.is_finite() || size <= 0.0 {
                return Err(PipelineError::InvalidConfig(format!(
                    "tile size {} m must be positive",
                    size
                )));
            }
        }

        let mesher = MeshGenerator::new(config.mesh)?;
        let format = config.endpoint.format();
        let fetcher = NetworkFetcher::new(client, config.endpoint.clone(), config.fetch.clone());

        Ok(Self {
            fetcher: Arc::new(fetcher),
            cache: Arc::new(cache),
            selector: ViewportTileSelector::new(config.selector.clone()),
            mesher,
            format,
            mesh_width: OnceLock::new(),
            viewpoint: Mutex::new(None),
            limits: Mutex::new(config.device_limits),
            resident: Mutex::new(ResidentRegistry::new()),
            in_flight: SingleFlight::new(),
            fetch_permits: Arc::new(Semaphore::new(config.max_in_flight)),
            subscribers: Mutex::new(Vec::new()),
            config,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn cache(&self) -> &TileCache {
        &self.cache
    }

    pub fn client(&self) -> &C {
        self.fetcher.client()
    }

    pub fn set_viewpoint(&self, viewpoint: Viewpoint) {
        debug!(lat = viewpoint.lat, lon = viewpoint.lon, "Viewpoint set");
        *self.viewpoint.lock() = Some(viewpoint);
    }

    pub fn viewpoint(&self) -> Option<Viewpoint> {
        *self.viewpoint.lock()
    }

    pub fn set_device_limits(&self, limits: DeviceLimits) {
        *self.limits.lock() = limits;
    }

    pub fn device_limits(&self) -> DeviceLimits {
        *self.limits.lock()
    }

    /// Resident tiles with their LODs, most recently used first.
    pub fn resident_tiles(&self) -> Vec<(TileId, Lod)> {
        self.resident.lock().snapshot()
    }

    pub fn resident_count(&self) -> usize {
        self.resident.lock().len()
    }

    /// Registers a new event receiver.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<PipelineEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().push(tx);
        rx
    }

    fn emit(&self, event: PipelineEvent) {
        self.subscribers
            .lock()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Sets the viewpoint and loads it.
    pub async fn load_view_at(&self, viewpoint: Viewpoint) -> Result<LoadSummary, PipelineError> {
        self.set_viewpoint(viewpoint);
        self.load_view().await
    }

    /// Loads every tile the current viewpoint needs.
    ///
    /// Individual tile failures are counted in the summary, never returned.
    pub async fn load_view(&self) -> Result<LoadSummary, PipelineError> {
        let viewpoint = self.viewpoint().ok_or(PipelineError::NoViewpoint)?;
        let limits = self.device_limits();
        let requests = self.required_tiles(&viewpoint, limits);

        info!(
            lat = viewpoint.lat,
            lon = viewpoint.lon,
            tiles = requests.len(),
            "Loading view"
        );

        let mut summary = LoadSummary {
            requested: requests.len(),
            ..LoadSummary::default()
        };
        let pending: Vec<TileRequest> = requests
            .into_iter()
            .filter(|r| {
                let resident = self.resident.lock().touch_at(&r.id, r.lod);
                summary.skipped_resident += usize::from(resident);
                !resident
            })
            .collect();

        let width = self.mesh_width(&viewpoint);
        self.load_requests(pending, width, &mut summary).await;
        self.finish_pass(limits, summary)
    }

    /// Loads up to `direction_batch` non-resident tiles, best aligned with
    /// `heading_deg` first. The viewpoint itself is left unchanged.
    pub async fn on_view_direction_changed(
        &self,
        heading_deg: f64,
    ) -> Result<LoadSummary, PipelineError> {
        let viewpoint = self.viewpoint().ok_or(PipelineError::NoViewpoint)?;
        let limits = self.device_limits();
        let requests = self.required_tiles(&viewpoint, limits);
        let ordered = self.selector.prioritize_by_heading(&requests, heading_deg);

        let mut summary = LoadSummary::default();
        let mut pending = Vec::new();
        for request in ordered {
            if pending.len() >= self.config.direction_batch {
                break;
            }
            let resident = self.resident.lock().touch_at(&request.id, request.lod);
            if resident {
                summary.skipped_resident += 1;
            } else {
                pending.push(request);
            }
        }
        summary.requested = pending.len();

        debug!(heading = heading_deg, tiles = pending.len(), "View direction changed");
        let width = self.mesh_width(&viewpoint);
        self.load_requests(pending, width, &mut summary).await;
        self.finish_pass(limits, summary)
    }

    /// Evicts least recently used resident tiles until at most `max_count`
    /// remain, notifying subscribers of each.
    pub fn evict_resident(&self, max_count: usize) -> Vec<TileId> {
        let evicted = self.resident.lock().evict_to(max_count);
        for id in &evicted {
            debug!(tile = %id, "Evicting resident tile");
            self.emit(PipelineEvent::TileEvicted { id: *id });
        }
        evicted
    }

    /// Spawns a task that reloads on heading changes until `cancel` fires or
    /// the sender is dropped. Bursts of updates coalesce to the latest value.
    pub fn spawn_direction_listener(
        self: Arc<Self>,
        mut headings: watch::Receiver<f64>,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;

                    _ = cancel.cancelled() => {
                        debug!("Direction listener cancelled");
                        break;
                    }

                    changed = headings.changed() => {
                        if changed.is_err() {
                            debug!("Heading channel closed");
                            break;
                        }
                        let heading = *headings.borrow_and_update();
                        match self.on_view_direction_changed(heading).await {
                            Ok(summary) => debug!(heading, %summary, "Direction load complete"),
                            Err(e) => debug!(heading, error = %e, "Direction change ignored"),
                        }
                    }
                }
            }
        })
    }

    /// Selection clamped to the device budget.
    fn required_tiles(&self, viewpoint: &Viewpoint, limits: DeviceLimits) -> Vec<TileRequest> {
        let mut requests = match self
            .selector
            .compute_required_tiles(viewpoint, self.config.sampling_zoom)
        {
            Ok(requests) => requests,
            Err(e) => {
                warn!(error = %e, "Tile selection failed");
                Vec::new()
            }
        };

        requests.truncate(limits.max_resident_tiles);
        for request in &mut requests {
            request.lod = request.lod.min(limits.max_lod);
        }
        requests
    }

    fn finish_pass(
        &self,
        limits: DeviceLimits,
        summary: LoadSummary,
    ) -> Result<LoadSummary, PipelineError> {
        self.evict_resident(limits.max_resident_tiles);
        info!(%summary, "Load pass complete");
        self.emit(PipelineEvent::ViewCompleted(summary.clone()));
        Ok(summary)
    }

    /// Serves cache hits immediately, then fetches the misses with bounded
    /// concurrency, publishing each tile as it completes.
    async fn load_requests(&self, requests: Vec<TileRequest>, width: f32, summary: &mut LoadSummary) {
        let mut misses = Vec::new();
        for request in requests {
            match self.cache.get(request.id).await {
                Some(bytes) => {
                    if let TileOutcome::Loaded = self.process(&request, &bytes, width) {
                        summary.loaded += 1;
                        summary.from_cache += 1;
                    } else {
                        summary.failed += 1;
                    }
                }
                None => misses.push(request),
            }
        }

        let mut fetches = stream::iter(misses)
            .map(|request| async move {
                let result = self.fetch(request.id).await;
                (request, result)
            })
            .buffer_unordered(self.config.max_in_flight);

        while let Some((request, result)) = fetches.next().await {
            let outcome = match result {
                Ok(bytes) => self.process(&request, &bytes, width),
                Err(FetchError::NotFound(id)) => {
                    debug!(tile = %id, "Tile not available");
                    TileOutcome::Missing
                }
                Err(e) => {
                    warn!(tile = %request.id, error = %e, "Tile fetch failed");
                    TileOutcome::Failed
                }
            };
            match outcome {
                TileOutcome::Loaded => summary.loaded += 1,
                TileOutcome::Failed => summary.failed += 1,
                TileOutcome::Missing => summary.missing += 1,
            }
        }
    }

    /// Fetches and caches a tile, sharing the work with any concurrent
    /// request for the same id.
    ///
    /// The cache is checked again once a permit is held: another caller may
    /// have completed the same fetch since this one missed.
    async fn fetch(&self, id: TileId) -> FetchResult {
        let fetcher = Arc::clone(&self.fetcher);
        let cache = Arc::clone(&self.cache);
        let permits = Arc::clone(&self.fetch_permits);

        self.in_flight
            .run(id, move || async move {
                let _permit = permits.acquire_owned().await.ok();
                if let Some(bytes) = cache.get(id).await {
                    return Ok(bytes);
                }
                let bytes = fetcher.fetch_tile(id).await?;
                Ok(cache.store(id, bytes).await)
            })
            .await
    }

    /// Decodes, meshes and publishes one tile.
    ///
    /// A tile that becomes resident also re-meshes its resident west, north
    /// and north-west neighbours, whose far borders now read from its grid.
    /// The registry stays locked while meshing so concurrent arrivals see
    /// each other's grids.
    fn process(&self, request: &TileRequest, bytes: &[u8], width: f32) -> TileOutcome {
        let id = request.id;
        let grid = match self.format.decode(bytes) {
            Ok(grid) => Arc::new(grid),
            Err(e) => {
                warn!(tile = %id, error = %e, "Tile decode failed");
                return TileOutcome::Failed;
            }
        };

        let mut published = Vec::new();
        {
            let mut resident = self.resident.lock();
            let mesh = match self.mesh_tile(&resident, id, &grid, request.lod, width) {
                Ok(mesh) => Arc::new(mesh),
                Err(e) => {
                    warn!(tile = %id, error = %e, "Mesh generation failed");
                    return TileOutcome::Failed;
                }
            };

            let replaced = resident.insert(
                id,
                ResidentTile {
                    lod: request.lod,
                    mesh: Arc::clone(&mesh),
                    grid,
                },
            );
            if replaced != Some(request.lod) {
                published.push((id, request.lod, mesh));
            }
            if replaced.is_none() {
                for (dx, dy) in BORDERING {
                    if let Some(neighbor) = id.neighbor(dx, dy) {
                        published.extend(self.remesh(&mut resident, neighbor, width));
                    }
                }
            }
        }

        for (id, lod, mesh) in published {
            self.emit(PipelineEvent::TileLoaded { id, lod, mesh });
        }
        TileOutcome::Loaded
    }

    /// Rebuilds a resident tile's mesh at its current LOD.
    fn remesh(
        &self,
        resident: &mut ResidentRegistry,
        id: TileId,
        width: f32,
    ) -> Option<(TileId, Lod, Arc<TerrainMesh>)> {
        let (lod, grid) = resident.mesh_source(&id)?;
        match self.mesh_tile(resident, id, &grid, lod, width) {
            Ok(mesh) => {
                let mesh = Arc::new(mesh);
                resident.replace_mesh(&id, Arc::clone(&mesh));
                debug!(tile = %id, ?lod, "Re-meshed border");
                Some((id, lod, mesh))
            }
            Err(e) => {
                warn!(tile = %id, error = %e, "Mesh generation failed");
                None
            }
        }
    }

    fn mesh_tile(
        &self,
        resident: &ResidentRegistry,
        id: TileId,
        grid: &ElevationGrid,
        lod: Lod,
        width: f32,
    ) -> Result<TerrainMesh, MeshError> {
        let grid_at = |dx, dy| id.neighbor(dx, dy).and_then(|n| resident.grid_of(&n));
        let (east, south, south_east) = (grid_at(1, 0), grid_at(0, 1), grid_at(1, 1));
        let neighbors = EdgeNeighbors {
            east: east.as_deref(),
            south: south.as_deref(),
            south_east: south_east.as_deref(),
        };
        self.mesher.generate_with_neighbors(grid, width, lod, neighbors)
    }

    /// Mesh width shared by every tile, so neighbours line up.
    ///
    /// Without a configured size it is the ground width of a tile at the
    /// first viewpoint's latitude, fixed for the life of the pipeline.
    fn mesh_width(&self, viewpoint: &Viewpoint) -> f32 {
        self.config.tile_size_meters.unwrap_or_else(|| {
            *self
                .mesh_width
                .get_or_init(|| tile_width_meters(viewpoint.lat, self.config.sampling_zoom) as f32)
        })
    }
}
