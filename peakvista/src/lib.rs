//! PeakVista - Progressive level-of-detail terrain from remote elevation tiles
//!
//! This library turns a grid of remotely hosted elevation tiles into meshes
//! around a geographic viewpoint, loading nearby tiles at higher detail
//! first and keeping the resident set within a device budget.
//!
//! # Modules
//!
//! - [`coord`] - Slippy-map tile math
//! - [`elevation`] - Elevation tile decoding
//! - [`mesh`] - Level-of-detail terrain meshes
//! - [`provider`] - Tile endpoints and network fetching with retry
//! - [`cache`] - Memory and persistent tile caches
//! - [`select`] - Viewport tile selection and prioritization
//! - [`pipeline`] - The orchestrator tying it all together
//! - [`config`] - `~/.peakvista/config.ini`
//! - [`logging`] - Tracing subscriber setup
//!
//! # Example
//!
//! ```no_run
//! use peakvista::pipeline::{PipelineConfig, PipelineEvent, TerrainPipeline};
//! use peakvista::provider::ReqwestClient;
//! use peakvista::select::Viewpoint;
//! use std::time::Duration;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ReqwestClient::new(Duration::from_secs(5))?;
//! let pipeline = TerrainPipeline::new(client, PipelineConfig::default())?;
//! let mut events = pipeline.subscribe();
//!
//! pipeline.set_viewpoint(Viewpoint::new(35.3606, 138.7274).with_view_distance_km(10.0));
//! let summary = pipeline.load_view().await?;
//! println!("{}", summary);
//!
//! while let Ok(PipelineEvent::TileLoaded { id, mesh, .. }) = events.try_recv() {
//!     println!("{} -> {} triangles", id, mesh.triangle_count());
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod coord;
pub mod elevation;
pub mod logging;
pub mod mesh;
pub mod pipeline;
pub mod provider;
pub mod select;
