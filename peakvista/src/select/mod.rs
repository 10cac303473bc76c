//! Viewport-driven tile selection
//!
//! [`ViewportTileSelector`] maps a [`Viewpoint`] to the disc of tiles its
//! view distance covers, assigns each a [`Lod`](crate::mesh::Lod) by
//! distance, and orders them nearest first. When only the viewing direction
//! changes, [`ViewportTileSelector::prioritize_by_heading`] reorders the same
//! set so tiles ahead of the observer load first.

mod selector;
mod types;

pub use selector::{
    SelectorConfig, ViewportTileSelector, DEFAULT_FINE_THRESHOLD, DEFAULT_HEADING_WEIGHT,
    DEFAULT_MAX_RADIUS_TILES, DEFAULT_MEDIUM_THRESHOLD,
};
pub use types::{heading_vector, TileRequest, Viewpoint, DEFAULT_VIEW_DISTANCE_KM};
