//! Tile identifier and coordinate errors.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Latitude limit applied before projecting (degrees).
///
/// Slightly inside the true Web Mercator limit of 85.05112878°.
pub const MAX_LAT: f64 = 85.0;

/// Southern latitude limit (degrees).
pub const MIN_LAT: f64 = -85.0;

/// Minimum valid longitude.
pub const MIN_LON: f64 = -180.0;

/// Maximum valid longitude.
pub const MAX_LON: f64 = 180.0;

/// Highest zoom level accepted by [`TileId::new`].
pub const MAX_ZOOM: u8 = 22;

/// Errors from coordinate validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordError {
    /// Zoom level above [`MAX_ZOOM`].
    #[error("invalid zoom level {0} (max {MAX_ZOOM})")]
    InvalidZoom(u8),

    /// Tile index outside `[0, 2^zoom)`.
    #[error("tile {x}/{y} out of range at zoom {zoom}")]
    OutOfRange { zoom: u8, x: u32, y: u32 },
}

/// Address of one tile in the slippy quad-tree: `(zoom, x, y)`.
///
/// `x` grows east from the antimeridian, `y` grows south from the northern
/// projection limit. The value is `Copy` and hashes as three integers, so it
/// is used directly as the key of every cache and registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileId {
    /// Zoom level.
    pub zoom: u8,
    /// Column, west to east.
    pub x: u32,
    /// Row, north to south.
    pub y: u32,
}

impl TileId {
    /// Creates a tile id, validating zoom and index range.
    pub fn new(zoom: u8, x: u32, y: u32) -> Result<Self, CoordError> {
        if zoom > MAX_ZOOM {
            return Err(CoordError::InvalidZoom(zoom));
        }
        let n = tiles_per_side(zoom);
        if x >= n || y >= n {
            return Err(CoordError::OutOfRange { zoom, x, y });
        }
        Ok(Self { zoom, x, y })
    }

    /// Returns the tile containing the given geographic point.
    ///
    /// Latitude is clamped to the projection limits and the result is clamped
    /// into `[0, 2^zoom)` so points on the eastern/southern edge stay valid.
    pub fn from_lat_lon(lat: f64, lon: f64, zoom: u8) -> Result<Self, CoordError> {
        if zoom > MAX_ZOOM {
            return Err(CoordError::InvalidZoom(zoom));
        }
        let max_index = f64::from(tiles_per_side(zoom) - 1);
        let x = super::lat_lon_to_tile_x(lon, zoom).floor().clamp(0.0, max_index) as u32;
        let y = super::lat_lon_to_tile_y(lat, zoom).floor().clamp(0.0, max_index) as u32;
        Ok(Self { zoom, x, y })
    }

    /// Latitude/longitude of the tile's northwest corner.
    pub fn northwest_lat_lon(&self) -> (f64, f64) {
        super::tile_to_lat_lon(f64::from(self.x), f64::from(self.y), self.zoom)
    }

    /// Latitude/longitude of the tile's center.
    pub fn center_lat_lon(&self) -> (f64, f64) {
        super::tile_to_lat_lon(f64::from(self.x) + 0.5, f64::from(self.y) + 0.5, self.zoom)
    }

    /// Returns the tile offset by `(dx, dy)`, or `None` when it falls outside
    /// the tile grid at this zoom.
    pub fn neighbor(&self, dx: i64, dy: i64) -> Option<Self> {
        let n = i64::from(tiles_per_side(self.zoom));
        let x = i64::from(self.x) + dx;
        let y = i64::from(self.y) + dy;
        if (0..n).contains(&x) && (0..n).contains(&y) {
            Some(Self {
                zoom: self.zoom,
                x: x as u32,
                y: y as u32,
            })
        } else {
            None
        }
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

/// Number of tiles along one side of the grid at `zoom`.
#[inline]
pub fn tiles_per_side(zoom: u8) -> u32 {
    1u32 << zoom
}
