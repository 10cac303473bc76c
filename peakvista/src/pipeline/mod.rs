//! Progressive terrain loading
//!
//! [`TerrainPipeline`] turns a [`Viewpoint`](crate::select::Viewpoint) into
//! meshes:
//!
//! ```text
//! viewpoint ─► select ─► cache ─┬─ hit ──────────────┐
//!                               └─ miss ─► fetch ─► store ─┴─► decode ─► mesh ─► TileLoaded
//! ```
//!
//! Tiles are published one at a time through [`PipelineEvent`] channels as
//! soon as each is ready. Fetches for the same tile are shared between
//! concurrent passes, and the resident set is kept within
//! [`DeviceLimits`] by least-recently-used eviction.

mod config;
mod orchestrator;
mod registry;
mod single_flight;
mod types;

pub use config::{CacheConfig, PipelineConfig};
pub use orchestrator::TerrainPipeline;
pub use registry::{ResidentRegistry, ResidentTile};
pub use single_flight::SingleFlight;
pub use types::{
    DeviceLimits, LoadSummary, PipelineError, PipelineEvent, DEFAULT_MAX_RESIDENT_TILES,
};
