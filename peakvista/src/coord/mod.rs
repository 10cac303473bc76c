//! Coordinate conversion module
//!
//! Provides conversions between geographic coordinates (latitude/longitude)
//! and Web Mercator tile coordinates used by elevation tile providers.
//!
//! Tile coordinates are returned as fractional values so callers can both
//! floor them into a [`TileId`] and measure sub-tile offsets.

mod types;

pub use types::{tiles_per_side, CoordError, TileId, MAX_LAT, MAX_LON, MAX_ZOOM, MIN_LAT, MIN_LON};

use std::f64::consts::PI;

/// Mean Earth radius used for great-circle distances.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Equatorial circumference of the Web Mercator sphere in meters.
pub const EQUATORIAL_CIRCUMFERENCE_M: f64 = 40_075_016.686;

/// Converts a longitude to a fractional tile X coordinate.
#[inline]
pub fn lat_lon_to_tile_x(lon: f64, zoom: u8) -> f64 {
    let n = f64::from(tiles_per_side(zoom));
    (lon + 180.0) / 360.0 * n
}

/// Converts a latitude to a fractional tile Y coordinate.
///
/// Latitude is clamped to [`MIN_LAT`]..=[`MAX_LAT`] first.
#[inline]
pub fn lat_lon_to_tile_y(lat: f64, zoom: u8) -> f64 {
    let n = f64::from(tiles_per_side(zoom));
    let lat_rad = lat.clamp(MIN_LAT, MAX_LAT).to_radians();
    (1.0 - lat_rad.tan().asinh() / PI) / 2.0 * n
}

/// Converts (possibly fractional) tile coordinates back to latitude/longitude.
///
/// Integral inputs give the tile's northwest corner.
#[inline]
pub fn tile_to_lat_lon(tile_x: f64, tile_y: f64, zoom: u8) -> (f64, f64) {
    let n = f64::from(tiles_per_side(zoom));

    let lon = tile_x / n * 360.0 - 180.0;

    let y = tile_y / n;
    let lat = (PI * (1.0 - 2.0 * y)).sinh().atan().to_degrees();

    (lat, lon)
}

/// Great-circle distance between two points in kilometers (haversine).
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Ground width of one tile at the given latitude, in meters.
#[inline]
pub fn tile_width_meters(lat: f64, zoom: u8) -> f64 {
    let lat_rad = lat.clamp(MIN_LAT, MAX_LAT).to_radians();
    EQUATORIAL_CIRCUMFERENCE_M * lat_rad.cos() / f64::from(tiles_per_side(zoom))
}
