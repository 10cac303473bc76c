//! Mesh output and errors.

use thiserror::Error;

use super::Lod;

/// Errors from mesh generation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MeshError {
    /// Tile edge length must be finite and positive.
    #[error("invalid tile size {0} m")]
    InvalidTileSize(f32),

    /// Vertical exaggeration must be finite and positive.
    #[error("invalid vertical exaggeration {0}")]
    InvalidExaggeration(f32),
}

/// A triangulated terrain tile in local meters.
///
/// X points east, Y up, Z south; the tile is centered on the origin. Normals
/// are unit length and were computed from the final positions, so a renderer
/// that applies a non-uniform scale must recompute them rather than reuse
/// these.
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainMesh {
    pub(super) positions: Vec<[f32; 3]>,
    pub(super) normals: Vec<[f32; 3]>,
    pub(super) indices: Vec<u32>,
    pub(super) lod: Lod,
}

impl TerrainMesh {
    /// Vertex positions.
    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    /// Per-vertex unit normals, parallel to [`positions`](Self::positions).
    pub fn normals(&self) -> &[[f32; 3]] {
        &self.normals
    }

    /// Triangle list indices, counter-clockwise seen from above.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Level of detail this mesh was generated at.
    pub fn lod(&self) -> Lod {
        self.lod
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Axis-aligned bounds as `(min, max)`.
    pub fn bounds(&self) -> ([f32; 3], [f32; 3]) {
        let mut min = [f32::INFINITY; 3];
        let mut max = [f32::NEG_INFINITY; 3];
        for p in &self.positions {
            for axis in 0..3 {
                min[axis] = min[axis].min(p[axis]);
                max[axis] = max[axis].max(p[axis]);
            }
        }
        (min, max)
    }

    /// Consumes the mesh, returning `(positions, normals, indices)`.
    pub fn into_parts(self) -> (Vec<[f32; 3]>, Vec<[f32; 3]>, Vec<u32>) {
        (self.positions, self.normals, self.indices)
    }
}
