//! # Series Builder
//!
//! Runs the windowed minimum search over every timestep of one dataset. Timesteps do not
//! depend on each other, so the work is a parallel map over the timestep index; rayon
//! keeps the collected records in timestep order.

use crate::error::{Result, TrackError};
use crate::grid::{Grid, GridShape};
use crate::minimum::{MinimumRecord, Window, find_minimum};
use crate::source::GridSource;
use indicatif::{ProgressBar, ProgressStyle};
use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// One minimum per timestep, in timestep order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    records: Vec<MinimumRecord>,
}

impl Series {
    pub fn new(records: Vec<MinimumRecord>) -> Self {
        Series { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&MinimumRecord> {
        self.records.get(index)
    }

    pub fn records(&self) -> &[MinimumRecord] {
        &self.records
    }

    /// Minimum pressure per timestep
    pub fn values(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.value).collect()
    }

    /// Latitude index of the minimum per timestep
    pub fn rows(&self) -> Vec<usize> {
        self.records.iter().map(|r| r.row).collect()
    }

    /// Longitude index of the minimum per timestep
    pub fn cols(&self) -> Vec<usize> {
        self.records.iter().map(|r| r.col).collect()
    }

    /// Track of the minimum as `(col, row)` points, ready to plot longitude on x
    pub fn trajectory(&self) -> Vec<(f64, f64)> {
        self.records
            .iter()
            .map(|r| (r.col as f64, r.row as f64))
            .collect()
    }

    /// Deepest minimum over the whole run, first one on ties
    pub fn deepest(&self) -> Option<(usize, &MinimumRecord)> {
        self.records
            .iter()
            .enumerate()
            .fold(None, |best, (i, r)| match best {
                Some((_, b)) if b.value <= r.value => best,
                _ => Some((i, r)),
            })
    }
}

impl FromIterator<MinimumRecord> for Series {
    fn from_iter<I: IntoIterator<Item = MinimumRecord>>(iter: I) -> Self {
        Series::new(iter.into_iter().collect())
    }
}

/// How a series is built
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesOptions {
    /// Fan the timesteps out over the rayon pool
    pub parallel: bool,
    /// Draw a progress bar on stderr
    pub progress: bool,
}

impl Default for SeriesOptions {
    fn default() -> Self {
        SeriesOptions {
            parallel: true,
            progress: false,
        }
    }
}

/// Builds a series from grids that are already in memory.
///
/// The first failing timestep aborts the build and is reported as
/// [`TrackError::Timestep`].
pub fn build_series(grids: &[Grid], window: &Window) -> Result<Series> {
    grids
        .iter()
        .enumerate()
        .map(|(i, grid)| find_minimum(grid, window).map_err(|e| TrackError::at_timestep(i, e)))
        .collect::<Result<Vec<_>>>()
        .map(Series::new)
}

/// Loads every timestep of `source`, finds its windowed minimum and drops the grid.
pub fn build_series_from_source(
    source: &dyn GridSource,
    shape: GridShape,
    window: &Window,
    options: &SeriesOptions,
) -> Result<Series> {
    window.validate(shape)?;

    let count = source.len();
    debug!(
        "Building series '{}' over {} timesteps (parallel: {})",
        source.name(),
        count,
        options.parallel
    );

    let progress = if options.progress {
        progress_bar(source.name(), count)
    } else {
        ProgressBar::hidden()
    };

    let process = |index: usize| -> Result<MinimumRecord> {
        let record = source
            .load(index, shape)
            .and_then(|grid| find_minimum(&grid, window))
            .map_err(|e| TrackError::at_timestep(index, e))?;
        progress.inc(1);
        Ok(record)
    };

    let records = if options.parallel {
        (0..count).into_par_iter().map(process).collect::<Result<Vec<_>>>()
    } else {
        (0..count).map(process).collect::<Result<Vec<_>>>()
    };

    match records {
        Ok(records) => {
            progress.finish_and_clear();
            Ok(Series::new(records))
        }
        Err(e) => {
            progress.abandon();
            Err(e)
        }
    }
}

fn progress_bar(name: &str, count: usize) -> ProgressBar {
    let bar = ProgressBar::new(count as u64);
    if let Ok(style) =
        ProgressStyle::with_template("{prefix:>10} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        bar.set_style(style.progress_chars("█▉▊▋▌▍▎▏  "));
    }
    bar.set_prefix(name.to_string());
    bar
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(value: f64, row: usize, col: usize) -> MinimumRecord {
        MinimumRecord { value, row, col }
    }

    #[test]
    fn test_series_accessors() {
        let series = Series::new(vec![record(990.0, 40, 100), record(985.5, 42, 110)]);
        assert_eq!(series.len(), 2);
        assert_eq!(series.values(), vec![990.0, 985.5]);
        assert_eq!(series.rows(), vec![40, 42]);
        assert_eq!(series.cols(), vec![100, 110]);
        assert_eq!(series.trajectory(), vec![(100.0, 40.0), (110.0, 42.0)]);
        assert_eq!(series.get(1), Some(&record(985.5, 42, 110)));
        assert_eq!(series.get(2), None);
    }

    #[test]
    fn test_deepest_prefers_first_on_tie() {
        let series = Series::new(vec![
            record(990.0, 1, 1),
            record(980.0, 2, 2),
            record(980.0, 3, 3),
        ]);
        let (index, deepest) = series.deepest().unwrap();
        assert_eq!(index, 1);
        assert_eq!(deepest.row, 2);
        assert!(Series::default().deepest().is_none());
    }

    #[test]
    fn test_build_series_keeps_timestep_order() {
        let shape = GridShape::new(2, 2);
        let grids = vec![
            Grid::from_values(shape, vec![4.0, 3.0, 2.0, 1.0]).unwrap(),
            Grid::from_values(shape, vec![1.0, 2.0, 3.0, 4.0]).unwrap(),
            Grid::from_values(shape, vec![2.0, 1.0, 3.0, 4.0]).unwrap(),
        ];
        let series = build_series(&grids, &Window::full(shape)).unwrap();
        assert_eq!(series.rows(), vec![1, 0, 0]);
        assert_eq!(series.cols(), vec![1, 0, 1]);
        assert_eq!(series.values(), vec![1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_build_series_reports_failing_timestep() {
        let shape = GridShape::new(2, 2);
        let grids = vec![
            Grid::from_values(shape, vec![1.0; 4]).unwrap(),
            Grid::from_values(shape, vec![f64::NAN; 4]).unwrap(),
        ];
        let err = build_series(&grids, &Window::full(shape)).unwrap_err();
        match err {
            TrackError::Timestep { index, source } => {
                assert_eq!(index, 1);
                assert!(matches!(*source, TrackError::InvalidWindow(_)));
            }
            other => panic!("Expected timestep error, got {other:?}"),
        }
    }
}
