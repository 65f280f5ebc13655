//! # Dual-Series Differencer
//!
//! Pairs the two datasets timestep by timestep: the pressure difference `B - A` and the
//! mean longitude index of the two minima, which is where the difference is plotted.

use crate::error::{Result, TrackError};
use crate::series::Series;
use serde::{Deserialize, Serialize};

/// One paired timestep
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifferencePoint {
    /// `B.value - A.value`
    pub value: f64,
    /// `(A.col + B.col) / 2`, kept fractional as an x-axis position
    pub col: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DifferenceSeries {
    points: Vec<DifferencePoint>,
}

impl DifferenceSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[DifferencePoint] {
        &self.points
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn cols(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.col).collect()
    }

    /// Difference curve as `(col, value)` points
    pub fn curve(&self) -> Vec<(f64, f64)> {
        self.points.iter().map(|p| (p.col, p.value)).collect()
    }

    /// Smallest and largest difference, `None` when empty
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.points.iter().fold(None, |acc, p| match acc {
            None => Some((p.value, p.value)),
            Some((lo, hi)) => Some((lo.min(p.value), hi.max(p.value))),
        })
    }
}

/// Computes `B - A` per timestep.
///
/// # Errors
///
/// [`TrackError::LengthMismatch`] when the series differ in length. Pairing is by index
/// only, so a missing timestep in one dataset would shift every later pair.
pub fn difference(a: &Series, b: &Series) -> Result<DifferenceSeries> {
    if a.len() != b.len() {
        return Err(TrackError::LengthMismatch {
            a: a.len(),
            b: b.len(),
        });
    }

    let points = a
        .records()
        .iter()
        .zip(b.records())
        .map(|(ra, rb)| DifferencePoint {
            value: rb.value - ra.value,
            col: (ra.col as f64 + rb.col as f64) / 2.0,
        })
        .collect();

    Ok(DifferenceSeries { points })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::minimum::MinimumRecord;

    fn series(records: &[(f64, usize, usize)]) -> Series {
        records
            .iter()
            .map(|&(value, row, col)| MinimumRecord { value, row, col })
            .collect()
    }

    #[test]
    fn test_difference_values_and_mean_column() {
        let a = series(&[(1000.0, 50, 100), (995.5, 52, 105), (990.0, 55, 111)]);
        let b = series(&[(998.0, 51, 102), (996.0, 53, 106), (985.25, 54, 120)]);
        let diff = difference(&a, &b).unwrap();

        assert_eq!(diff.len(), 3);
        for i in 0..3 {
            let (ra, rb) = (a.get(i).unwrap(), b.get(i).unwrap());
            assert_eq!(diff.points()[i].value, rb.value - ra.value);
            assert_eq!(diff.points()[i].col, (ra.col + rb.col) as f64 / 2.0);
        }
        assert_eq!(diff.cols(), vec![101.0, 105.5, 115.5]);
        assert_eq!(diff.values(), vec![-2.0, 0.5, -4.75]);
        assert_eq!(diff.value_range(), Some((-4.75, 0.5)));
    }

    #[test]
    fn test_length_mismatch_is_an_error() {
        let a = series(&[(1.0, 0, 0), (2.0, 0, 1), (3.0, 0, 2)]);
        let b = series(&[(1.0, 0, 0), (2.0, 0, 1)]);
        let err = difference(&a, &b).unwrap_err();
        assert!(matches!(err, TrackError::LengthMismatch { a: 3, b: 2 }));
    }

    #[test]
    fn test_empty_series() {
        let diff = difference(&Series::default(), &Series::default()).unwrap();
        assert!(diff.is_empty());
        assert_eq!(diff.value_range(), None);
    }
}
