//! Pipeline inputs, outputs and errors.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::coord::TileId;
use crate::mesh::{Lod, MeshError, TerrainMesh};

/// Default resident tile budget.
pub const DEFAULT_MAX_RESIDENT_TILES: usize = 256;

/// Rendering budget supplied by the device-capability collaborator.
///
/// Both values are hard ceilings: selections are truncated to
/// `max_resident_tiles` and no tile is meshed finer than `max_lod`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceLimits {
    pub max_resident_tiles: usize,
    pub max_lod: Lod,
}

impl Default for DeviceLimits {
    fn default() -> Self {
        Self {
            max_resident_tiles: DEFAULT_MAX_RESIDENT_TILES,
            max_lod: Lod::Fine,
        }
    }
}

/// Counts from one load pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Tiles considered after device clamping.
    pub requested: usize,
    /// Tiles meshed and published, including cache hits.
    pub loaded: usize,
    /// Subset of `loaded` served without a network fetch.
    pub from_cache: usize,
    /// Fetch, decode or mesh failures.
    pub failed: usize,
    /// Tiles the service does not have (HTTP 404).
    pub missing: usize,
    /// Tiles already resident at the requested LOD.
    pub skipped_resident: usize,
}

impl fmt::Display for LoadSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} requested: {} loaded ({} from cache), {} failed, {} missing, {} already resident",
            self.requested,
            self.loaded,
            self.from_cache,
            self.failed,
            self.missing,
            self.skipped_resident
        )
    }
}

/// Notifications sent to subscribers.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    /// A mesh is ready to render. Replaces any earlier mesh for `id`; sent
    /// again when a neighbour's arrival changes the tile's borders.
    TileLoaded {
        id: TileId,
        lod: Lod,
        mesh: Arc<TerrainMesh>,
    },
    /// A mesh left the resident set and should be dropped by the renderer.
    TileEvicted { id: TileId },
    /// A load pass finished.
    ViewCompleted(LoadSummary),
}

/// Pipeline errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    /// A load was requested before any viewpoint was set.
    #[error("no viewpoint set")]
    NoViewpoint,

    #[error("sampling zoom {0} is out of range")]
    InvalidZoom(u8),

    #[error("invalid mesh configuration: {0}")]
    Mesh(#[from] MeshError),

    #[error("invalid pipeline configuration: {0}")]
    InvalidConfig(String),
}
