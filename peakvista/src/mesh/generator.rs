//! Regular-grid terrain triangulation.

use glam::Vec3;

use super::{Lod, MeshError, TerrainMesh, SAMPLES_PER_SIDE};
use crate::elevation::ElevationGrid;

/// Default vertical exaggeration (none).
pub const DEFAULT_VERTICAL_EXAGGERATION: f32 = 1.0;

/// Mesh generation settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshConfig {
    /// Multiplier applied to elevations before normals are computed.
    pub vertical_exaggeration: f32,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            vertical_exaggeration: DEFAULT_VERTICAL_EXAGGERATION,
        }
    }
}

/// Grids bordering a tile on its east, south and south-east sides.
///
/// The last vertex row and column of a tile sit on the shared edge with
/// these neighbours. When a neighbour is present its first row/column
/// supplies those heights, so both tiles place identical vertices on the
/// border. When absent, the tile's own last sample is repeated.
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeNeighbors<'a> {
    pub east: Option<&'a ElevationGrid>,
    pub south: Option<&'a ElevationGrid>,
    pub south_east: Option<&'a ElevationGrid>,
}

/// Converts elevation grids into [`TerrainMesh`]es.
///
/// Generation is a pure function of its inputs: the same grid, size, LOD and
/// config always yield bit-identical arrays.
#[derive(Debug, Clone, Default)]
pub struct MeshGenerator {
    config: MeshConfig,
}

impl MeshGenerator {
    pub fn new(config: MeshConfig) -> Result<Self, MeshError> {
        let exaggeration = config.vertical_exaggeration;
        if !exaggeration.is_finite() || exaggeration <= 0.0 {
            return Err(MeshError::InvalidExaggeration(exaggeration));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &MeshConfig {
        &self.config
    }

    /// Generates a mesh for a tile `tile_size_m` meters across.
    ///
    /// No-data samples are meshed at zero elevation.
    pub fn generate(
        &self,
        grid: &ElevationGrid,
        tile_size_m: f32,
        lod: Lod,
    ) -> Result<TerrainMesh, MeshError> {
        self.generate_with_neighbors(grid, tile_size_m, lod, EdgeNeighbors::default())
    }

    /// Generates a mesh whose east and south border heights come from the
    /// neighbouring grids, matching the neighbours' own west/north borders.
    pub fn generate_with_neighbors(
        &self,
        grid: &ElevationGrid,
        tile_size_m: f32,
        lod: Lod,
        neighbors: EdgeNeighbors<'_>,
    ) -> Result<TerrainMesh, MeshError> {
        if !tile_size_m.is_finite() || tile_size_m <= 0.0 {
            return Err(MeshError::InvalidTileSize(tile_size_m));
        }

        let stride = lod.stride();
        let side = lod.vertices_per_side();
        let half = tile_size_m / 2.0;

        let mut positions = Vec::with_capacity(side * side);
        for j in 0..side {
            let row = j * stride;
            let z = edge_fraction(row) * tile_size_m - half;
            for i in 0..side {
                let col = i * stride;
                let x = edge_fraction(col) * tile_size_m - half;
                let y = sample_height(grid, &neighbors, col, row) * self.config.vertical_exaggeration;
                positions.push([x, y, z]);
            }
        }

        let indices = triangulate(side);
        let normals = vertex_normals(&positions, &indices);

        Ok(TerrainMesh {
            positions,
            normals,
            indices,
            lod,
        })
    }
}

#[inline]
fn edge_fraction(sample: usize) -> f32 {
    sample as f32 / SAMPLES_PER_SIDE as f32
}

/// Height for a sample index in `0..=256` on each axis. Index 256 lies on the
/// far edge and reads from the neighbour when one is available.
fn sample_height(
    grid: &ElevationGrid,
    neighbors: &EdgeNeighbors<'_>,
    col: usize,
    row: usize,
) -> f32 {
    let last = SAMPLES_PER_SIDE - 1;
    let past_east = col >= SAMPLES_PER_SIDE;
    let past_south = row >= SAMPLES_PER_SIDE;

    let source = match (past_east, past_south) {
        (false, false) => Some((grid, col, row)),
        (true, false) => neighbors.east.map(|g| (g, 0, row)),
        (false, true) => neighbors.south.map(|g| (g, col, 0)),
        (true, true) => neighbors.south_east.map(|g| (g, 0, 0)),
    };

    match source {
        Some((g, c, r)) => g.height_or_zero(c, r),
        None => grid.height_or_zero(col.min(last), row.min(last)),
    }
}

/// Two right triangles per grid cell, counter-clockwise seen from +Y.
fn triangulate(side: usize) -> Vec<u32> {
    let cells = side - 1;
    let mut indices = Vec::with_capacity(cells * cells * 6);
    for j in 0..cells {
        for i in 0..cells {
            let i0 = (j * side + i) as u32;
            let i1 = i0 + 1;
            let i2 = ((j + 1) * side + i) as u32;
            let i3 = i2 + 1;

            indices.extend_from_slice(&[i0, i2, i1]);
            indices.extend_from_slice(&[i1, i2, i3]);
        }
    }
    indices
}

/// Area-weighted vertex normals: unnormalised face cross products summed per
/// vertex, normalised once.
fn vertex_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut accumulated = vec![Vec3::ZERO; positions.len()];

    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let v0 = Vec3::from_array(positions[a]);
        let v1 = Vec3::from_array(positions[b]);
        let v2 = Vec3::from_array(positions[c]);

        let face = (v1 - v0).cross(v2 - v0);
        accumulated[a] += face;
        accumulated[b] += face;
        accumulated[c] += face;
    }

    accumulated
        .into_iter()
        .map(|n| n.try_normalize().unwrap_or(Vec3::Y).to_array())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TILE: f32 = 1994.0;

    fn ramp_grid() -> ElevationGrid {
        ElevationGrid::from_fn(|col, row| Some(col as f32 * 2.0 + (row as f32 * 0.37).sin() * 15.0))
    }

    fn generator() -> MeshGenerator {
        MeshGenerator::default()
    }

    #[test]
    fn test_vertex_and_triangle_counts() {
        let grid = ElevationGrid::flat(0.0);
        for lod in Lod::ALL {
            let mesh = generator().generate(&grid, TILE, lod).unwrap();
            let side = lod.vertices_per_side();
            assert_eq!(mesh.vertex_count(), side * side);
            assert_eq!(mesh.triangle_count(), (side - 1) * (side - 1) * 2);
            assert_eq!(mesh.normals().len(), mesh.vertex_count());
            assert_eq!(mesh.lod(), lod);
        }
    }

    #[test]
    fn test_coarser_lod_has_fewer_triangles() {
        let grid = ramp_grid();
        let coarse = generator().generate(&grid, TILE, Lod::Coarse).unwrap();
        let medium = generator().generate(&grid, TILE, Lod::Medium).unwrap();
        let fine = generator().generate(&grid, TILE, Lod::Fine).unwrap();
        assert!(coarse.triangle_count() < medium.triangle_count());
        assert!(medium.triangle_count() < fine.triangle_count());
    }

    #[test]
    fn test_mesh_spans_full_tile() {
        let mesh = generator().generate(&ElevationGrid::flat(50.0), TILE, Lod::Medium).unwrap();
        let (min, max) = mesh.bounds();
        assert_eq!(min, [-TILE / 2.0, 50.0, -TILE / 2.0]);
        assert_eq!(max, [TILE / 2.0, 50.0, TILE / 2.0]);
    }

    #[test]
    fn test_flat_grid_normals_point_up() {
        let mesh = generator().generate(&ElevationGrid::flat(120.0), TILE, Lod::Coarse).unwrap();
        for n in mesh.normals() {
            assert_eq!(*n, [0.0, 1.0, 0.0]);
        }
    }

    #[test]
    fn test_winding_faces_up_on_rough_terrain() {
        let mesh = generator().generate(&ramp_grid(), TILE, Lod::Fine).unwrap();
        let p = mesh.positions();
        for tri in mesh.indices().chunks_exact(3) {
            let v0 = Vec3::from_array(p[tri[0] as usize]);
            let v1 = Vec3::from_array(p[tri[1] as usize]);
            let v2 = Vec3::from_array(p[tri[2] as usize]);
            assert!((v1 - v0).cross(v2 - v0).y > 0.0);
        }
    }

    #[test]
    fn test_normals_are_unit_length() {
        let mesh = generator().generate(&ramp_grid(), TILE, Lod::Medium).unwrap();
        for n in mesh.normals() {
            let len = Vec3::from_array(*n).length();
            assert!((len - 1.0).abs() < 1e-5, "normal length {}", len);
        }
    }

    #[test]
    fn test_slope_tilts_normals_downhill() {
        // Elevation rises to the east, so normals lean west (-X).
        let grid = ElevationGrid::from_fn(|col, _| Some(col as f32 * 10.0));
        let mesh = generator().generate(&grid, TILE, Lod::Medium).unwrap();
        let side = Lod::Medium.vertices_per_side();
        let center = mesh.normals()[side * (side / 2) + side / 2];
        assert!(center[0] < 0.0);
        assert!(center[1] > 0.0);
        assert!(center[2].abs() < 1e-6);
    }

    #[test]
    fn test_generation_is_deterministic() {
        let grid = ramp_grid();
        let a = generator().generate(&grid, TILE, Lod::Fine).unwrap();
        let b = generator().generate(&grid, TILE, Lod::Fine).unwrap();

        let bits = |mesh: &TerrainMesh| {
            let p: Vec<u32> = mesh.positions().iter().flatten().map(|v| v.to_bits()).collect();
            let n: Vec<u32> = mesh.normals().iter().flatten().map(|v| v.to_bits()).collect();
            (p, n, mesh.indices().to_vec())
        };
        assert_eq!(bits(&a), bits(&b));
    }

    #[test]
    fn test_no_data_meshed_at_zero() {
        let grid = ElevationGrid::from_fn(|col, row| if col == 0 && row == 0 { None } else { Some(500.0) });
        let mesh = generator().generate(&grid, TILE, Lod::Coarse).unwrap();
        assert_eq!(mesh.positions()[0][1], 0.0);
        assert_eq!(mesh.positions()[1][1], 500.0);
    }

    #[test]
    fn test_last_row_clamps_without_neighbors() {
        let grid = ElevationGrid::from_fn(|col, row| Some((col + row) as f32));
        let mesh = generator().generate(&grid, TILE, Lod::Coarse).unwrap();
        let side = Lod::Coarse.vertices_per_side();
        let corner = mesh.positions()[side * side - 1];
        assert_eq!(corner[1], (255 + 255) as f32);
    }

    #[test]
    fn test_adjacent_tiles_share_border_vertices() {
        let west = ElevationGrid::from_fn(|col, row| Some(col as f32 + row as f32 * 3.0));
        let east = ElevationGrid::from_fn(|col, row| Some(1000.0 + col as f32 * 0.5 - row as f32));
        let gen = generator();

        for lod in Lod::ALL {
            let neighbors = EdgeNeighbors {
                east: Some(&east),
                ..Default::default()
            };
            let west_mesh = gen.generate_with_neighbors(&west, TILE, lod, neighbors).unwrap();
            let east_mesh = gen.generate(&east, TILE, lod).unwrap();
            let side = lod.vertices_per_side();

            for j in 0..side - 1 {
                // East edge of the west tile, shifted into the east tile's frame.
                let mut a = west_mesh.positions()[j * side + side - 1];
                a[0] -= TILE;
                let b = east_mesh.positions()[j * side];
                assert_eq!(a, b, "row {} at {}", j, lod);
            }
        }
    }

    #[test]
    fn test_south_and_corner_neighbors_used() {
        let grid = ElevationGrid::flat(1.0);
        let south = ElevationGrid::flat(2.0);
        let south_east = ElevationGrid::flat(3.0);
        let neighbors = EdgeNeighbors {
            east: None,
            south: Some(&south),
            south_east: Some(&south_east),
        };
        let mesh = generator()
            .generate_with_neighbors(&grid, TILE, Lod::Coarse, neighbors)
            .unwrap();
        let side = Lod::Coarse.vertices_per_side();
        assert_eq!(mesh.positions()[(side - 1) * side][1], 2.0);
        assert_eq!(mesh.positions()[side * side - 1][1], 3.0);
        assert_eq!(mesh.positions()[side - 1][1], 1.0);
    }

    #[test]
    fn test_vertical_exaggeration_scales_heights() {
        let gen = MeshGenerator::new(MeshConfig {
            vertical_exaggeration: 1.5,
        })
        .unwrap();
        let mesh = gen.generate(&ElevationGrid::flat(100.0), TILE, Lod::Coarse).unwrap();
        assert_eq!(mesh.positions()[0][1], 150.0);
    }

    #[test]
    fn test_rejects_invalid_parameters() {
        let grid = ElevationGrid::flat(0.0);
        assert_eq!(
            generator().generate(&grid, 0.0, Lod::Fine),
            Err(MeshError::InvalidTileSize(0.0))
        );
        assert!(generator().generate(&grid, f32::NAN, Lod::Fine).is_err());
        assert!(MeshGenerator::new(MeshConfig {
            vertical_exaggeration: -1.0
        })
        .is_err());
    }
}
