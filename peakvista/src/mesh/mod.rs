//! Terrain mesh generation
//!
//! Builds triangle meshes from [`ElevationGrid`](crate::elevation::ElevationGrid)s
//! at one of three [`Lod`]s. Vertices are laid on a regular grid covering the
//! full tile extent, so the mesh of one tile meets its neighbours edge to edge.
//!
//! # Example
//!
//! ```
//! use peakvista::elevation::ElevationGrid;
//! use peakvista::mesh::{Lod, MeshGenerator};
//!
//! let grid = ElevationGrid::flat(100.0);
//! let mesh = MeshGenerator::default().generate(&grid, 2000.0, Lod::Coarse).unwrap();
//! assert_eq!(mesh.vertex_count(), 33 * 33);
//! ```

mod generator;
mod lod;
mod types;

pub use generator::{EdgeNeighbors, MeshConfig, MeshGenerator, DEFAULT_VERTICAL_EXAGGERATION};
pub use lod::Lod;
pub use types::{MeshError, TerrainMesh};

/// Sample intervals along one tile edge; vertex sample indices run `0..=256`.
pub const SAMPLES_PER_SIDE: usize = crate::elevation::GRID_SIZE;
