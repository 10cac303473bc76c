//! Tile URL construction.

use crate::coord::TileId;
use crate::elevation::TileFormat;

/// GSI (Geospatial Information Authority of Japan) DEM PNG tiles.
pub const DEFAULT_ORIGIN: &str = "https://cyberjapandata.gsi.go.jp/xyz/dem_png";

pub const DEFAULT_EXTENSION: &str = "png";

/// Zoom level at which elevation tiles are requested.
pub const DEFAULT_SAMPLING_ZOOM: u8 = 14;

/// An XYZ elevation tile service: `{origin}/{z}/{x}/{y}.{ext}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileEndpoint {
    origin: String,
    extension: String,
    format: TileFormat,
}

impl TileEndpoint {
    pub fn new(origin: impl Into<String>, extension: impl Into<String>, format: TileFormat) -> Self {
        let origin = origin.into().trim_end_matches('/').to_string();
        let extension = extension.into().trim_start_matches('.').to_string();
        Self {
            origin,
            extension,
            format,
        }
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn format(&self) -> TileFormat {
        self.format
    }

    pub fn url(&self, id: TileId) -> String {
        format!(
            "{}/{}/{}/{}.{}",
            self.origin, id.zoom, id.x, id.y, self.extension
        )
    }
}

impl Default for TileEndpoint {
    fn default() -> Self {
        Self::new(DEFAULT_ORIGIN, DEFAULT_EXTENSION, TileFormat::Png)
    }
}
