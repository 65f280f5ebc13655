//! # Grid Loader
//!
//! Reshapes a flat, row-major sequence of SLP values into a fixed-shape 2-D [`Grid`].
//! Row index is the latitude (south_north) index, column index the longitude
//! (west_east) index, both zero-based.

use crate::error::{Result, TrackError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Shape of every grid in a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridShape {
    /// Number of latitude rows
    pub rows: usize,
    /// Number of longitude columns
    pub cols: usize,
}

impl GridShape {
    pub fn new(rows: usize, cols: usize) -> Self {
        GridShape { rows, cols }
    }

    /// Total number of cells, i.e. the number of values a raw grid must hold
    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for GridShape {
    /// The 143 x 209 WRF domain of the snow-cover experiments
    fn default() -> Self {
        GridShape { rows: 143, cols: 209 }
    }
}

/// A single timestep of a scalar field, stored row-major
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    shape: GridShape,
    values: Vec<f64>,
}

impl Grid {
    /// Builds a grid from values already in row-major order.
    ///
    /// # Errors
    ///
    /// Returns [`TrackError::ShapeMismatch`] if `values.len()` differs from `rows * cols`.
    pub fn from_values(shape: GridShape, values: Vec<f64>) -> Result<Self> {
        if values.len() != shape.len() {
            return Err(TrackError::ShapeMismatch {
                expected: shape.len(),
                actual: values.len(),
            });
        }
        Ok(Grid { shape, values })
    }

    /// Parses whitespace separated numeric tokens (one per line in NCL `asciiwrite`
    /// output) into a grid.
    ///
    /// `origin` is only used to label parse errors.
    pub fn from_text(shape: GridShape, text: &str, origin: &Path) -> Result<Self> {
        let mut values = Vec::with_capacity(shape.len());
        for (i, token) in text.split_whitespace().enumerate() {
            let value = token.parse::<f64>().map_err(|_| TrackError::Parse {
                path: origin.to_path_buf(),
                position: i + 1,
                token: token.to_string(),
            })?;
            values.push(value);
        }
        Self::from_values(shape, values)
    }

    pub fn shape(&self) -> GridShape {
        self.shape
    }

    /// Value at `(row, col)`, `None` outside the grid
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row < self.shape.rows && col < self.shape.cols {
            Some(self.values[row * self.shape.cols + col])
        } else {
            None
        }
    }

    /// One latitude row as a slice
    pub fn row(&self, row: usize) -> Option<&[f64]> {
        if row >= self.shape.rows {
            return None;
        }
        let start = row * self.shape.cols;
        Some(&self.values[start..start + self.shape.cols])
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}
