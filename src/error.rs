//! # Error Types
//!
//! Every failure in the analysis is fatal: a bad grid shape, an empty window or two
//! misaligned datasets would otherwise produce silently wrong trajectories. All library
//! functions return [`TrackError`] through the crate-wide [`Result`] alias.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while extracting, loading or analysing SLP grids
#[derive(Error, Debug)]
pub enum TrackError {
    #[error("Grid shape mismatch: expected {expected} values, found {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("Invalid window: {0}")]
    InvalidWindow(String),

    #[error("Series length mismatch: dataset A has {a} timesteps, dataset B has {b}")]
    LengthMismatch { a: usize, b: usize },

    #[error("Missing input for timestep {index} ({}): {reason}", .path.display())]
    MissingInput {
        index: usize,
        path: PathBuf,
        reason: String,
    },

    #[error("Invalid value '{token}' at position {position} in {}", .path.display())]
    Parse {
        path: PathBuf,
        position: usize,
        token: String,
    },

    #[error("Timestep {index} failed: {source}")]
    Timestep {
        index: usize,
        #[source]
        source: Box<TrackError>,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Extraction failed: {0}")]
    Extraction(String),

    #[error("Chart rendering failed: {0}")]
    Render(String),

    #[error("NetCDF error: {0}")]
    NetCdf(#[from] netcdf::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TrackError {
    /// Wraps an error with the timestep it occurred in
    pub fn at_timestep(index: usize, source: TrackError) -> Self {
        TrackError::Timestep {
            index,
            source: Box::new(source),
        }
    }

    pub fn invalid_window(msg: impl Into<String>) -> Self {
        TrackError::InvalidWindow(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        TrackError::Config(msg.into())
    }
}

impl From<serde_json::Error> for TrackError {
    fn from(err: serde_json::Error) -> Self {
        TrackError::Config(err.to_string())
    }
}

impl From<serde_yaml::Error> for TrackError {
    fn from(err: serde_yaml::Error) -> Self {
        TrackError::Config(err.to_string())
    }
}

/// Result type for slptrack operations
pub type Result<T> = std::result::Result<T, TrackError>;
