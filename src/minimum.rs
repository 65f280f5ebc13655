//! # Windowed Minimum Finder
//!
//! Scans a rectangular sub-window of a [`Grid`] for its smallest value. The window keeps
//! the search away from the lateral boundary of the model domain, where the pressure
//! field is unreliable.

use crate::error::{Result, TrackError};
use crate::grid::{Grid, GridShape};
use serde::{Deserialize, Serialize};

/// Inclusive row/column bounds of the search area
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub min_row: usize,
    pub max_row: usize,
    pub min_col: usize,
    pub max_col: usize,
}

impl Window {
    pub fn new(min_row: usize, max_row: usize, min_col: usize, max_col: usize) -> Self {
        Window {
            min_row,
            max_row,
            min_col,
            max_col,
        }
    }

    /// Window covering every cell of `shape`
    pub fn full(shape: GridShape) -> Self {
        Window::new(
            0,
            shape.rows.saturating_sub(1),
            0,
            shape.cols.saturating_sub(1),
        )
    }

    /// Checks `0 <= min_row <= max_row < rows` and `0 <= min_col <= max_col < cols`.
    pub fn validate(&self, shape: GridShape) -> Result<()> {
        if self.min_row > self.max_row {
            return Err(TrackError::invalid_window(format!(
                "min_row {} is greater than max_row {}",
                self.min_row, self.max_row
            )));
        }
        if self.min_col > self.max_col {
            return Err(TrackError::invalid_window(format!(
                "min_col {} is greater than max_col {}",
                self.min_col, self.max_col
            )));
        }
        if self.max_row >= shape.rows {
            return Err(TrackError::invalid_window(format!(
                "max_row {} is outside a grid of {} rows",
                self.max_row, shape.rows
            )));
        }
        if self.max_col >= shape.cols {
            return Err(TrackError::invalid_window(format!(
                "max_col {} is outside a grid of {} columns",
                self.max_col, shape.cols
            )));
        }
        Ok(())
    }

    /// Number of cells covered; zero for an inverted window
    pub fn cell_count(&self) -> usize {
        let rows = (self.max_row + 1).saturating_sub(self.min_row);
        let cols = (self.max_col + 1).saturating_sub(self.min_col);
        rows * cols
    }
}

impl Default for Window {
    /// Area of interest of the snow-cover runs: latitude rows 25..=119 and longitude
    /// columns 80 to the eastern edge of the 209-column domain.
    fn default() -> Self {
        Window::new(25, 119, 80, 208)
    }
}

/// The minimum found inside a window and where it sits
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinimumRecord {
    pub value: f64,
    pub row: usize,
    pub col: usize,
}

/// Finds the smallest value of `grid` inside `window`.
///
/// Rows are scanned from `min_row` to `max_row` and, within a row, columns from `min_col`
/// to `max_col`. The running minimum only moves on a strictly smaller value, so among
/// equal minima the first one in that row-major order wins.
///
/// # Errors
///
/// [`TrackError::InvalidWindow`] if the window does not fit the grid, or if it holds no
/// comparable (non-NaN) value.
pub fn find_minimum(grid: &Grid, window: &Window) -> Result<MinimumRecord> {
    window.validate(grid.shape())?;

    let mut best = MinimumRecord {
        value: f64::INFINITY,
        row: window.min_row,
        col: window.min_col,
    };
    let mut found = false;

    for row in window.min_row..=window.max_row {
        let Some(cells) = grid.row(row) else {
            continue;
        };
        for (col, &value) in cells
            .iter()
            .enumerate()
            .take(window.max_col + 1)
            .skip(window.min_col)
        {
            if value < best.value || (!found && value == best.value) {
                best = MinimumRecord { value, row, col };
                found = true;
            }
        }
    }

    if !found {
        return Err(TrackError::invalid_window(format!(
            "no finite value inside rows {}..={} and columns {}..={}",
            window.min_row, window.max_row, window.min_col, window.max_col
        )));
    }
    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_3x3(values: [f64; 9]) -> Grid {
        Grid::from_values(GridShape::new(3, 3), values.to_vec()).unwrap()
    }

    /// Exhaustive reference scan used to check the finder
    fn brute_force_min(grid: &Grid, window: &Window) -> f64 {
        let mut min = f64::INFINITY;
        for r in window.min_row..=window.max_row {
            for c in window.min_col..=window.max_col {
                min = min.min(grid.get(r, c).unwrap());
            }
        }
        min
    }

    #[test]
    fn test_full_window_scenario() {
        let grid = grid_3x3([5.0, 1.0, 9.0, 4.0, 2.0, 6.0, 8.0, 7.0, 3.0]);
        let record = find_minimum(&grid, &Window::full(grid.shape())).unwrap();
        assert_eq!(
            record,
            MinimumRecord {
                value: 1.0,
                row: 0,
                col: 1
            }
        );

        let grid = grid_3x3([9.0, 8.0, 7.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0]);
        let record = find_minimum(&grid, &Window::full(grid.shape())).unwrap();
        assert_eq!(
            record,
            MinimumRecord {
                value: 1.0,
                row: 2,
                col: 2
            }
        );
    }

    #[test]
    fn test_matches_brute_force() {
        let shape = GridShape::new(12, 17);
        // Deterministic pseudo-random field
        let values: Vec<f64> = (0..shape.len())
            .map(|i| 1000.0 + ((i * 7919 + 13) % 257) as f64 * 0.25)
            .collect();
        let grid = Grid::from_values(shape, values).unwrap();

        let windows = [
            Window::full(shape),
            Window::new(2, 9, 3, 15),
            Window::new(0, 0, 0, 16),
            Window::new(5, 11, 16, 16),
            Window::new(4, 4, 8, 8),
        ];
        for window in &windows {
            let record = find_minimum(&grid, window).unwrap();
            assert_eq!(record.value, brute_force_min(&grid, window));
            assert_eq!(grid.get(record.row, record.col), Some(record.value));
            assert!(record.row >= window.min_row && record.row <= window.max_row);
            assert!(record.col >= window.min_col && record.col <= window.max_col);
        }
    }

    #[test]
    fn test_ties_keep_first_in_row_major_order() {
        let grid = grid_3x3([4.0, 2.0, 2.0, 2.0, 3.0, 2.0, 5.0, 2.0, 6.0]);
        let record = find_minimum(&grid, &Window::full(grid.shape())).unwrap();
        assert_eq!((record.row, record.col), (0, 1));

        // Same row, later column loses
        let record = find_minimum(&grid, &Window::new(1, 2, 0, 2)).unwrap();
        assert_eq!((record.row, record.col), (1, 0));
    }

    #[test]
    fn test_window_excludes_outside_minimum() {
        let grid = grid_3x3([0.0, 9.0, 9.0, 9.0, 5.0, 6.0, 9.0, 7.0, 8.0]);
        let record = find_minimum(&grid, &Window::new(1, 2, 1, 2)).unwrap();
        assert_eq!(
            record,
            MinimumRecord {
                value: 5.0,
                row: 1,
                col: 1
            }
        );
    }

    #[test]
    fn test_single_cell_window() {
        let grid = grid_3x3([5.0, 1.0, 9.0, 4.0, 20000.0, 6.0, 8.0, 7.0, 3.0]);
        let record = find_minimum(&grid, &Window::new(1, 1, 1, 1)).unwrap();
        assert_eq!(
            record,
            MinimumRecord {
                value: 20000.0,
                row: 1,
                col: 1
            }
        );
    }

    #[test]
    fn test_infinite_single_cell_is_still_returned() {
        let grid = grid_3x3([5.0, 1.0, 9.0, 4.0, f64::INFINITY, 6.0, 8.0, 7.0, 3.0]);
        let record = find_minimum(&grid, &Window::new(1, 1, 1, 1)).unwrap();
        assert_eq!((record.row, record.col), (1, 1));
        assert!(record.value.is_infinite());
    }

    #[test]
    fn test_nan_cells_are_skipped() {
        let grid = grid_3x3([f64::NAN, 3.0, f64::NAN, 2.5, f64::NAN, 4.0, 1.0, 1.0, 1.0]);
        let record = find_minimum(&grid, &Window::new(0, 1, 0, 2)).unwrap();
        assert_eq!((record.value, record.row, record.col), (2.5, 1, 0));

        let err = find_minimum(&grid, &Window::new(0, 0, 0, 0)).unwrap_err();
        assert!(matches!(err, TrackError::InvalidWindow(_)));
    }

    #[test]
    fn test_invalid_windows() {
        let grid = grid_3x3([1.0; 9]);
        let bad = [
            Window::new(2, 1, 0, 2),
            Window::new(0, 2, 2, 1),
            Window::new(0, 3, 0, 2),
            Window::new(0, 2, 0, 3),
        ];
        for window in &bad {
            let err = find_minimum(&grid, window).unwrap_err();
            assert!(matches!(err, TrackError::InvalidWindow(_)), "{window:?}");
        }
    }

    #[test]
    fn test_default_window_fits_default_shape() {
        let window = Window::default();
        assert!(window.validate(GridShape::default()).is_ok());
        assert_eq!(window.max_col, GridShape::default().cols - 1);
        assert_eq!(window.cell_count(), 95 * 129);
    }

    #[test]
    fn test_cell_count_of_inverted_window() {
        assert_eq!(Window::new(5, 1, 0, 2).cell_count(), 0);
        assert_eq!(Window::new(0, 2, 7, 3).cell_count(), 0);
        assert_eq!(Window::new(4, 4, 6, 6).cell_count(), 1);
    }
}
