//! Error types for elevation decoding.

use thiserror::Error;

/// Errors raised while turning a tile payload into an [`ElevationGrid`].
///
/// A decode failure only ever affects the one tile whose payload failed.
///
/// [`ElevationGrid`]: super::ElevationGrid
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The payload is not an image the decoder understands.
    #[error("image decode failed: {0}")]
    Image(#[from] image::ImageError),

    /// Reading the payload failed before decoding started.
    #[error("I/O error reading tile payload: {0}")]
    Io(#[from] std::io::Error),

    /// The image decoded but is not 256×256.
    #[error("invalid tile dimensions {width}×{height}, expected 256×256")]
    InvalidDimensions { width: u32, height: u32 },

    /// The image is not 8-bit RGB/RGBA.
    #[error("unsupported colour type {0}, expected 8-bit RGB")]
    UnsupportedColor(String),

    /// A sample buffer had the wrong length.
    #[error("expected {expected} elevation samples, got {actual}")]
    SampleCount { expected: usize, actual: usize },

    /// A text tile was not valid UTF-8.
    #[error("text tile is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// A text tile row did not contain 256 values.
    #[error("text tile row {row} has {count} values, expected 256")]
    TextRowLength { row: usize, count: usize },

    /// A text tile did not contain 256 rows.
    #[error("text tile has {0} rows, expected 256")]
    TextRowCount(usize),

    /// A text tile value was neither a number nor the no-data marker.
    #[error("invalid elevation value {value:?} at row {row}, column {col}")]
    InvalidValue { row: usize, col: usize, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_display() {
        let err = DecodeError::InvalidDimensions {
            width: 512,
            height: 256,
        };
        assert_eq!(
            err.to_string(),
            "invalid tile dimensions 512×256, expected 256×256"
        );

        let err = DecodeError::InvalidValue {
            row: 3,
            col: 7,
            value: "x".to_string(),
        };
        assert!(err.to_string().contains("row 3"));
    }
}
