//! # slptrack
//!
//! Tracks the sea-level-pressure minimum of two parallel WRF simulations (for instance a
//! snow-covered control run and a snowless run) through time, and plots both tracks
//! together with the pressure difference between them.
//!
//! ## Pipeline
//!
//! 1. Raw `wrfout` files are turned into per-timestep SLP text grids by NCL
//!    ([`extract`]), inside a scratch directory that is removed afterwards.
//! 2. Each grid is reshaped ([`grid`]) and searched for its minimum inside a fixed window
//!    ([`minimum`]), giving one [`series::Series`] per dataset ([`series`]).
//! 3. The two series are paired timestep by timestep ([`difference`]).
//! 4. Both tracks and the difference are drawn on a dual-axis chart ([`chart`]).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use slptrack::{analyze_text_dir, config::AnalysisConfig, chart::write_chart};
//! use std::path::Path;
//!
//! let config = AnalysisConfig::default();
//! let report = analyze_text_dir(&config, Path::new("grids"))?;
//! write_chart(&config, &report.a, &report.b, &report.difference)?;
//! # Ok::<(), slptrack::TrackError>(())
//! ```

pub mod chart;
pub mod cli;
pub mod config;
pub mod difference;
pub mod error;
pub mod extract;
pub mod grid;
pub mod log;
pub mod minimum;
pub mod series;
pub mod source;


pub use crate::error::{Result, TrackError};

use crate::config::AnalysisConfig;
use crate::difference::{DifferenceSeries, difference};
use crate::extract::{RawInputs, run_extraction};
use crate::series::{Series, SeriesOptions, build_series_from_source};
use crate::source::{GridSource, NetCdfGridSource, TextGridSource};
use ::log::{debug, info};
use std::path::Path;

/// Everything a run computes: one series per dataset and their pairing
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisReport {
    pub a: Series,
    pub b: Series,
    pub difference: DifferenceSeries,
}

/// Builds both series from two grid sources and pairs them.
///
/// # Errors
///
/// - [`TrackError::LengthMismatch`] if the sources hold a different number of timesteps;
///   this is checked before any grid is read.
/// - [`TrackError::MissingInput`] if dataset A has no timesteps at all.
/// - Any configuration or per-timestep error.
pub fn analyze_sources(
    config: &AnalysisConfig,
    a: &dyn GridSource,
    b: &dyn GridSource,
) -> Result<AnalysisReport> {
    config.validate()?;

    if a.len() != b.len() {
        return Err(TrackError::LengthMismatch {
            a: a.len(),
            b: b.len(),
        });
    }
    if a.is_empty() {
        return Err(TrackError::MissingInput {
            index: 0,
            path: Default::default(),
            reason: format!("no timesteps found for '{}'", a.name()),
        });
    }
    info!("{} files of each dataset to sort through", a.len());

    let options = SeriesOptions {
        parallel: config.parallel,
        progress: config.progress,
    };
    let series_a = build_series_from_source(a, config.shape, &config.window, &options)?;
    let series_b = build_series_from_source(b, config.shape, &config.window, &options)?;
    let diff = difference(&series_a, &series_b)?;

    Ok(AnalysisReport {
        a: series_a,
        b: series_b,
        difference: diff,
    })
}

/// Analyses text grids already present in `dir`.
pub fn analyze_text_dir(config: &AnalysisConfig, dir: &Path) -> Result<AnalysisReport> {
    let (a, b) = text_sources(config, dir)?;
    analyze_sources(config, &a, &b)
}

fn text_sources(
    config: &AnalysisConfig,
    dir: &Path,
) -> Result<(TextGridSource, TextGridSource)> {
    let a = TextGridSource::discover(
        &config.dataset_a.label,
        dir,
        config.dataset_a.text.clone(),
    )?;
    let b = TextGridSource::discover(
        &config.dataset_b.label,
        dir,
        config.dataset_b.text.clone(),
    )?;
    Ok((a, b))
}

/// Fails on the first timestep the extraction should have produced but did not.
fn check_extracted(source: &TextGridSource, expected: usize) -> Result<()> {
    let found = source.len();
    if found < expected {
        return Err(TrackError::MissingInput {
            index: found,
            path: source.path_for(found),
            reason: format!(
                "extraction produced {} of {} '{}' grids",
                found,
                expected,
                source.name()
            ),
        });
    }
    Ok(())
}

/// Analyses post-processed NetCDF files in `dir` that carry the SLP variable directly.
pub fn analyze_netcdf_dir(config: &AnalysisConfig, dir: &Path) -> Result<AnalysisReport> {
    let variable = &config.extraction.variable;
    let a = NetCdfGridSource::open(
        &config.dataset_a.label,
        dir,
        &config.dataset_a.file_prefix,
        variable,
        config.shape,
    )?;
    let b = NetCdfGridSource::open(
        &config.dataset_b.label,
        dir,
        &config.dataset_b.file_prefix,
        variable,
        config.shape,
    )?;
    analyze_sources(config, &a, &b)
}

/// Full run on raw `wrfout` files: NCL extraction into a scratch directory, then the
/// analysis of the extracted grids. The scratch directory is removed when this returns,
/// whether or not the run succeeded.
pub fn run_pipeline(config: &AnalysisConfig, input_dir: &Path) -> Result<AnalysisReport> {
    config.validate()?;
    let inputs = RawInputs::discover(input_dir, config)?;

    let scratch = tempfile::Builder::new().prefix("slptrack-").tempdir()?;
    debug!("Scratch directory: {}", scratch.path().display());

    run_extraction(&inputs, scratch.path(), config)?;
    let (a, b) = text_sources(config, scratch.path())?;
    check_extracted(&a, inputs.len())?;
    check_extracted(&b, inputs.len())?;
    analyze_sources(config, &a, &b)
}
