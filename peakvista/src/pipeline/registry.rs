//! Meshes currently handed to the renderer.

use std::sync::Arc;

use lru::LruCache;

use crate::coord::TileId;
use crate::elevation::ElevationGrid;
use crate::mesh::{Lod, TerrainMesh};

/// A published tile.
#[derive(Debug, Clone)]
pub struct ResidentTile {
    pub lod: Lod,
    pub mesh: Arc<TerrainMesh>,
    /// Kept so later neighbours can match this tile's borders.
    pub grid: Arc<ElevationGrid>,
}

/// Resident tiles in recency order.
///
/// Inserting or touching a tile makes it most recently used; eviction removes
/// least recently used tiles first.
pub struct ResidentRegistry {
    tiles: LruCache<TileId, ResidentTile>,
}

impl ResidentRegistry {
    pub fn new() -> Self {
        Self {
            tiles: LruCache::unbounded(),
        }
    }

    /// Inserts or replaces a tile. Returns the LOD it replaced, if any.
    pub fn insert(&mut self, id: TileId, tile: ResidentTile) -> Option<Lod> {
        self.tiles.push(id, tile).and_then(|(old_id, old)| (old_id == id).then_some(old.lod))
    }

    /// Marks `id` used if it is resident at exactly `lod`.
    pub fn touch_at(&mut self, id: &TileId, lod: Lod) -> bool {
        match self.tiles.get(id) {
            Some(tile) => tile.lod == lod,
            None => false,
        }
    }

    /// Resident LOD without affecting recency.
    pub fn lod_of(&self, id: &TileId) -> Option<Lod> {
        self.tiles.peek(id).map(|t| t.lod)
    }

    /// Grid of a resident tile without affecting recency.
    pub fn grid_of(&self, id: &TileId) -> Option<Arc<ElevationGrid>> {
        self.tiles.peek(id).map(|t| Arc::clone(&t.grid))
    }

    /// LOD and grid to rebuild a resident tile's mesh from.
    pub fn mesh_source(&self, id: &TileId) -> Option<(Lod, Arc<ElevationGrid>)> {
        self.tiles.peek(id).map(|t| (t.lod, Arc::clone(&t.grid)))
    }

    /// Swaps the mesh of a resident tile without affecting recency.
    pub fn replace_mesh(&mut self, id: &TileId, mesh: Arc<TerrainMesh>) -> bool {
        match self.tiles.peek_mut(id) {
            Some(tile) => {
                tile.mesh = mesh;
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: &TileId) -> bool {
        self.tiles.contains(id)
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Evicts least recently used tiles until at most `max_count` remain.
    pub fn evict_to(&mut self, max_count: usize) -> Vec<TileId> {
        let mut evicted = Vec::new();
        while self.tiles.len() > max_count {
            match self.tiles.pop_lru() {
                Some((id, _)) => evicted.push(id),
                None => break,
            }
        }
        evicted
    }

    /// Resident ids with their LODs, most recently used first.
    pub fn snapshot(&self) -> Vec<(TileId, Lod)> {
        self.tiles.iter().map(|(id, t)| (*id, t.lod)).collect()
    }
}

impl Default for ResidentRegistry {
    fn default() -> Self {
        Self::new()
    }
}
