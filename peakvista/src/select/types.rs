//! Viewpoint and tile request types.

use crate::coord::{TileId, MAX_LAT, MIN_LAT};
use crate::mesh::Lod;

/// Default view radius when none is given.
pub const DEFAULT_VIEW_DISTANCE_KM: f64 = 10.0;

/// The observer: where terrain is needed and which way they are looking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewpoint {
    pub lat: f64,
    pub lon: f64,
    /// Ground elevation under the observer, in meters.
    pub ground_elevation_m: f64,
    /// Degrees clockwise from north.
    pub heading_deg: f64,
    /// Radius of required terrain coverage.
    pub view_distance_km: f64,
}

impl Viewpoint {
    /// A viewpoint facing north with the default view distance.
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            lat: lat.clamp(MIN_LAT, MAX_LAT),
            lon,
            ground_elevation_m: 0.0,
            heading_deg: 0.0,
            view_distance_km: DEFAULT_VIEW_DISTANCE_KM,
        }
    }

    pub fn with_heading(mut self, heading_deg: f64) -> Self {
        self.heading_deg = heading_deg.rem_euclid(360.0);
        self
    }

    pub fn with_view_distance_km(mut self, km: f64) -> Self {
        self.view_distance_km = km.max(0.0);
        self
    }

    pub fn with_ground_elevation(mut self, meters: f64) -> Self {
        self.ground_elevation_m = meters;
        self
    }

    pub fn view_distance_m(&self) -> f64 {
        self.view_distance_km * 1000.0
    }
}

/// Unit heading vector in tile space, where y grows southwards.
pub fn heading_vector(heading_deg: f64) -> (f64, f64) {
    let h = heading_deg.to_radians();
    (h.sin(), -h.cos())
}

/// A tile the current view needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileRequest {
    pub id: TileId,
    pub lod: Lod,
    /// Position in the load order, 0 first.
    pub priority: u32,
    /// Euclidean distance from the centre tile, in tiles.
    pub distance_tiles: f64,
    /// Distance divided by the selection radius, in `[0, 1]`.
    pub normalized_distance: f64,
    /// Tile offset `(dx, dy)` from the centre tile.
    pub offset: (i64, i64),
}

impl TileRequest {
    /// Alignment of this tile's direction with a heading vector, in `[-1, 1]`.
    ///
    /// The centre tile is always fully aligned.
    pub fn heading_alignment(&self, heading: (f64, f64)) -> f64 {
        if self.distance_tiles == 0.0 {
            return 1.0;
        }
        let (dx, dy) = (self.offset.0 as f64, self.offset.1 as f64);
        (dx * heading.0 + dy * heading.1) / self.distance_tiles
    }
}
