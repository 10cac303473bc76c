//! Fixed-size elevation sample grid.

use super::DecodeError;

/// Samples along one side of every elevation tile.
pub const GRID_SIZE: usize = 256;

/// Total samples in one elevation tile.
pub const GRID_SAMPLES: usize = GRID_SIZE * GRID_SIZE;

/// A 256×256 row-major grid of elevations in meters.
///
/// Each sample carries a no-data flag. Samples flagged as no data store
/// `0.0` so consumers that ignore the flag see sea level rather than garbage.
/// The dimensions never vary with zoom.
#[derive(Debug, Clone, PartialEq)]
pub struct ElevationGrid {
    heights: Vec<f32>,
    no_data: Vec<bool>,
}

impl ElevationGrid {
    /// Builds a grid from per-sample values, `None` meaning no data.
    pub fn from_samples(samples: &[Option<f32>]) -> Result<Self, DecodeError> {
        if samples.len() != GRID_SAMPLES {
            return Err(DecodeError::SampleCount {
                expected: GRID_SAMPLES,
                actual: samples.len(),
            });
        }

        let heights = samples.iter().map(|s| s.unwrap_or(0.0)).collect();
        let no_data = samples.iter().map(Option::is_none).collect();
        Ok(Self { heights, no_data })
    }

    /// Builds a grid by evaluating `f(col, row)` for every sample.
    pub fn from_fn(mut f: impl FnMut(usize, usize) -> Option<f32>) -> Self {
        let mut heights = Vec::with_capacity(GRID_SAMPLES);
        let mut no_data = Vec::with_capacity(GRID_SAMPLES);
        for row in 0..GRID_SIZE {
            for col in 0..GRID_SIZE {
                let sample = f(col, row);
                heights.push(sample.unwrap_or(0.0));
                no_data.push(sample.is_none());
            }
        }
        Self { heights, no_data }
    }

    /// A grid with every sample at the same elevation.
    pub fn flat(elevation: f32) -> Self {
        Self {
            heights: vec![elevation; GRID_SAMPLES],
            no_data: vec![false; GRID_SAMPLES],
        }
    }

    /// Elevation at `(col, row)`, or `None` for no data.
    ///
    /// # Panics
    ///
    /// Panics if `col` or `row` is 256 or more.
    #[inline]
    pub fn get(&self, col: usize, row: usize) -> Option<f32> {
        let idx = index(col, row);
        if self.no_data[idx] {
            None
        } else {
            Some(self.heights[idx])
        }
    }

    /// Elevation at `(col, row)` with no-data samples read as zero.
    #[inline]
    pub fn height_or_zero(&self, col: usize, row: usize) -> f32 {
        self.heights[index(col, row)]
    }

    /// Whether `(col, row)` is flagged as no data.
    #[inline]
    pub fn is_no_data(&self, col: usize, row: usize) -> bool {
        self.no_data[index(col, row)]
    }

    /// Number of samples flagged as no data.
    pub fn no_data_count(&self) -> usize {
        self.no_data.iter().filter(|&&flag| flag).count()
    }

    /// Row-major heights, no-data samples as zero.
    pub fn heights(&self) -> &[f32] {
        &self.heights
    }

    /// Lowest and highest valid elevation, or `None` if every sample is no data.
    pub fn min_max(&self) -> Option<(f32, f32)> {
        self.heights
            .iter()
            .zip(&self.no_data)
            .filter_map(|(&h, &flag)| (!flag).then_some(h))
            .fold(None, |acc, h| match acc {
                None => Some((h, h)),
                Some((lo, hi)) => Some((lo.min(h), hi.max(h))),
            })
    }
}

#[inline]
fn index(col: usize, row: usize) -> usize {
    assert!(col < GRID_SIZE && row < GRID_SIZE, "sample ({col}, {row}) out of range");
    row * GRID_SIZE + col
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_samples_rejects_wrong_length() {
        let result = ElevationGrid::from_samples(&[Some(1.0); 100]);
        assert!(matches!(
            result,
            Err(DecodeError::SampleCount {
                expected: GRID_SAMPLES,
                actual: 100
            })
        ));
    }

    #[test]
    fn test_from_fn_is_row_major() {
        let grid = ElevationGrid::from_fn(|col, row| Some((row * 1000 + col) as f32));
        assert_eq!(grid.get(3, 2), Some(2003.0));
        assert_eq!(grid.heights()[2 * GRID_SIZE + 3], 2003.0);
    }

    #[test]
    fn test_no_data_reads_as_zero() {
        let grid = ElevationGrid::from_fn(|col, _| if col == 0 { None } else { Some(5.0) });
        assert_eq!(grid.get(0, 10), None);
        assert!(grid.is_no_data(0, 10));
        assert_eq!(grid.height_or_zero(0, 10), 0.0);
        assert_eq!(grid.no_data_count(), GRID_SIZE);
    }

    #[test]
    fn test_min_max_skips_no_data() {
        let grid = ElevationGrid::from_fn(|col, row| match (col, row) {
            (0, 0) => None,
            (1, 0) => Some(-12.5),
            (2, 0) => Some(3776.0),
            _ => Some(100.0),
        });
        assert_eq!(grid.min_max(), Some((-12.5, 3776.0)));

        let empty = ElevationGrid::from_fn(|_, _| None);
        assert_eq!(empty.min_max(), None);
    }
}
