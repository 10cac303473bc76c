//! RGB-encoded elevation raster decoding.
//!
//! Each pixel packs one elevation sample into its three 8-bit colour
//! channels:
//!
//! ```text
//! u = R·65536 + G·256 + B
//!
//! u <  2^23  →  elevation = u × 0.01 m
//! u == 2^23  →  no data
//! u >  2^23  →  elevation = (u − 2^24) × 0.01 m
//! ```
//!
//! Resolution is one centimeter; the representable range is roughly
//! ±83 886 m.

use std::io::Cursor;

use image::{ColorType, DynamicImage, GenericImageView, ImageBuffer, ImageFormat, ImageReader, Rgb};

use super::grid::{ElevationGrid, GRID_SIZE};
use super::DecodeError;

/// Encoded value reserved for "no data".
pub const NO_DATA_VALUE: u32 = 1 << 23;

/// Meters per encoded unit.
pub const ELEVATION_SCALE: f64 = 0.01;

const WRAP: i64 = 1 << 24;
const MAX_UNITS: i64 = (1 << 23) - 1;

/// Decodes one pixel's channels into an elevation, `None` for no data.
#[inline]
pub fn decode_sample(r: u8, g: u8, b: u8) -> Option<f32> {
    let u = (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b);
    match u.cmp(&NO_DATA_VALUE) {
        std::cmp::Ordering::Less => Some((f64::from(u) * ELEVATION_SCALE) as f32),
        std::cmp::Ordering::Equal => None,
        std::cmp::Ordering::Greater => {
            Some(((i64::from(u) - WRAP) as f64 * ELEVATION_SCALE) as f32)
        }
    }
}

/// Encodes an elevation into RGB channels; the inverse of [`decode_sample`].
///
/// Values are rounded to the nearest centimeter and saturate at the
/// representable range.
pub fn encode_elevation(elevation: Option<f32>) -> [u8; 3] {
    let u = match elevation {
        None => i64::from(NO_DATA_VALUE),
        Some(meters) => {
            let units = (f64::from(meters) / ELEVATION_SCALE).round() as i64;
            let units = units.clamp(-MAX_UNITS, MAX_UNITS);
            if units < 0 {
                units + WRAP
            } else {
                units
            }
        }
    };
    [(u >> 16) as u8, (u >> 8) as u8, u as u8]
}

/// Decodes an encoded raster tile into an elevation grid.
///
/// The image format is sniffed from the payload. The image must be 256×256
/// with 8-bit RGB or RGBA channels; alpha is ignored.
pub fn decode_raster(bytes: &[u8]) -> Result<ElevationGrid, DecodeError> {
    let image = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .decode()?;

    let (width, height) = image.dimensions();
    if width as usize != GRID_SIZE || height as usize != GRID_SIZE {
        return Err(DecodeError::InvalidDimensions { width, height });
    }

    match image.color() {
        ColorType::Rgb8 | ColorType::Rgba8 => {}
        other => return Err(DecodeError::UnsupportedColor(format!("{:?}", other))),
    }

    let rgb = image.to_rgb8();
    let samples: Vec<Option<f32>> = rgb
        .pixels()
        .map(|pixel| decode_sample(pixel[0], pixel[1], pixel[2]))
        .collect();

    ElevationGrid::from_samples(&samples)
}

/// Encodes a grid as an RGB PNG tile using the same channel scheme.
pub fn encode_png(grid: &ElevationGrid) -> Result<Vec<u8>, DecodeError> {
    let size = GRID_SIZE as u32;
    let buffer = ImageBuffer::from_fn(size, size, |col, row| {
        Rgb(encode_elevation(grid.get(col as usize, row as usize)))
    });

    let mut out = Vec::new();
    DynamicImage::ImageRgb8(buffer).write_to(&mut Cursor::new(&mut out), ImageFormat::Png)?;
    Ok(out)
}
