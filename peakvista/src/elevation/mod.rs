//! Elevation tile decoding
//!
//! Turns raw tile payloads into fixed 256×256 [`ElevationGrid`]s. Two
//! payload formats are supported:
//!
//! - [`TileFormat::Png`]: RGB-packed centimeter elevations ([`decode_raster`])
//! - [`TileFormat::Text`]: comma-separated meter values ([`decode_text`])
//!
//! Decoding is synchronous and CPU-bound; a failure is local to one tile.

mod decoder;
mod error;
mod grid;
mod text;

pub use decoder::{
    decode_raster, decode_sample, encode_elevation, encode_png, ELEVATION_SCALE, NO_DATA_VALUE,
};
pub use error::DecodeError;
pub use grid::{ElevationGrid, GRID_SAMPLES, GRID_SIZE};
pub use text::{decode_text, TEXT_NO_DATA};

use std::fmt;
use std::str::FromStr;

/// Payload format served by an elevation endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TileFormat {
    /// RGB-encoded raster image.
    #[default]
    Png,
    /// Comma-separated text grid.
    Text,
}

impl TileFormat {
    /// Decodes a payload in this format.
    pub fn decode(self, bytes: &[u8]) -> Result<ElevationGrid, DecodeError> {
        match self {
            TileFormat::Png => decode_raster(bytes),
            TileFormat::Text => decode_text(bytes),
        }
    }

    /// Name used in configuration files.
    pub fn name(self) -> &'static str {
        match self {
            TileFormat::Png => "png",
            TileFormat::Text => "text",
        }
    }
}

impl fmt::Display for TileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TileFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "png" => Ok(TileFormat::Png),
            "text" | "txt" => Ok(TileFormat::Text),
            other => Err(format!("unknown tile format '{}'", other)),
        }
    }
}
