//! Comma-separated text elevation tiles.
//!
//! Some providers publish the same 256×256 grid as plain text: 256 lines of
//! 256 comma-separated meter values, with `e` marking a sample without data.
//! Blank lines are ignored.

use super::grid::{ElevationGrid, GRID_SAMPLES, GRID_SIZE};
use super::DecodeError;

/// Marker used by text tiles for samples without data.
pub const TEXT_NO_DATA: &str = "e";

/// Parses a text tile payload.
pub fn decode_text(bytes: &[u8]) -> Result<ElevationGrid, DecodeError> {
    let text = std::str::from_utf8(bytes)?;

    let mut samples = Vec::with_capacity(GRID_SAMPLES);
    let mut rows = 0;

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if rows == GRID_SIZE {
            return Err(DecodeError::TextRowCount(rows + 1));
        }

        let before = samples.len();
        for (col, value) in line.split(',').map(str::trim).enumerate() {
            let sample = if value == TEXT_NO_DATA {
                None
            } else {
                let meters = value.parse::<f32>().map_err(|_| DecodeError::InvalidValue {
                    row: rows,
                    col,
                    value: value.to_string(),
                })?;
                Some(meters)
            };
            samples.push(sample);
        }

        let count = samples.len() - before;
        if count != GRID_SIZE {
            return Err(DecodeError::TextRowLength { row: rows, count });
        }
        rows += 1;
    }

    if rows != GRID_SIZE {
        return Err(DecodeError::TextRowCount(rows));
    }

    ElevationGrid::from_samples(&samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_tile(f: impl Fn(usize, usize) -> String) -> String {
        (0..GRID_SIZE)
            .map(|row| {
                (0..GRID_SIZE)
                    .map(|col| f(col, row))
                    .collect::<Vec<_>>()
                    .join(",")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_decode_text_values_and_no_data() {
        let text = text_tile(|col, row| match (col, row) {
            (5, 5) => "e".to_string(),
            _ => format!("{:.2}", col as f32 + row as f32 / 100.0),
        });
        let grid = decode_text(text.as_bytes()).unwrap();

        assert_eq!(grid.get(5, 5), None);
        assert_eq!(grid.get(10, 0), Some(10.0));
        assert!((grid.get(3, 50).unwrap() - 3.5).abs() < 1e-4);
    }

    #[test]
    fn test_decode_text_ignores_blank_lines_and_crlf() {
        let text = text_tile(|_, _| "1.5".to_string()).replace('\n', "\r\n\r\n");
        let grid = decode_text(text.as_bytes()).unwrap();
        assert_eq!(grid.get(255, 255), Some(1.5));
    }

    #[test]
    fn test_decode_text_rejects_short_row() {
        let mut text = text_tile(|_, _| "0".to_string());
        text.push_str("\n0,0");
        let mut lines: Vec<&str> = text.lines().collect();
        lines.remove(0);
        let text = lines.join("\n");

        let result = decode_text(text.as_bytes());
        assert!(matches!(
            result,
            Err(DecodeError::TextRowLength { row: 255, count: 2 })
        ));
    }

    #[test]
    fn test_decode_text_rejects_missing_rows() {
        let text = "1,2,3\n";
        assert!(decode_text(text.as_bytes()).is_err());

        let full: String = (0..10)
            .map(|_| vec!["0"; GRID_SIZE].join(","))
            .collect::<Vec<_>>()
            .join("\n");
        assert!(matches!(
            decode_text(full.as_bytes()),
            Err(DecodeError::TextRowCount(10))
        ));
    }

    #[test]
    fn test_decode_text_rejects_bad_value() {
        let text = text_tile(|col, row| {
            if (col, row) == (7, 3) {
                "n/a".to_string()
            } else {
                "0".to_string()
            }
        });
        let result = decode_text(text.as_bytes());
        assert!(matches!(
            result,
            Err(DecodeError::InvalidValue { row: 3, col: 7, .. })
        ));
    }

    #[test]
    fn test_decode_text_rejects_extra_rows() {
        let mut text = text_tile(|_, _| "0".to_string());
        text.push('\n');
        text.push_str(&vec!["0"; GRID_SIZE].join(","));
        assert!(matches!(
            decode_text(text.as_bytes()),
            Err(DecodeError::TextRowCount(257))
        ));
    }
}
