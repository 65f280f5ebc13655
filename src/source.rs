//! # Grid Sources
//!
//! Where the per-timestep SLP grids of one dataset come from. A run pairs two sources, one
//! per dataset, and only relies on them agreeing on the timestep count.
//!
//! - [`TextGridSource`]: one text file per timestep with one value per line, named
//!   `<prefix><zero padded index><extension>` (`temp_a_slp000.txt`, ...). This is what
//!   NCL `asciiwrite` produces during extraction.
//! - [`NetCdfGridSource`]: an SLP variable read straight from post-processed NetCDF files
//!   (for instance wrf-python output), one timestep per time slice.

use crate::error::{Result, TrackError};
use crate::grid::{Grid, GridShape};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// A dataset of time-ordered grids
pub trait GridSource: Send + Sync {
    /// Label used in logs and progress output
    fn name(&self) -> &str;

    /// Number of timesteps available
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Loads timestep `index` as a grid of `shape`
    fn load(&self, index: usize, shape: GridShape) -> Result<Grid>;
}

/// File naming of a text grid dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextLayout {
    /// File name prefix, e.g. `temp_a_slp`
    pub prefix: String,
    /// Width of the zero padded timestep index
    pub digits: usize,
    /// File name suffix including the dot
    pub extension: String,
}

impl TextLayout {
    pub fn new(prefix: &str) -> Self {
        TextLayout {
            prefix: prefix.to_string(),
            ..Default::default()
        }
    }

    /// File name of timestep `index`
    pub fn file_name(&self, index: usize) -> String {
        format!(
            "{}{:0width$}{}",
            self.prefix,
            index,
            self.extension,
            width = self.digits
        )
    }
}

impl Default for TextLayout {
    fn default() -> Self {
        TextLayout {
            prefix: "temp_a_slp".to_string(),
            digits: 3,
            extension: ".txt".to_string(),
        }
    }
}

/// Text grids on the local filesystem
#[derive(Debug, Clone)]
pub struct TextGridSource {
    name: String,
    dir: PathBuf,
    layout: TextLayout,
    count: usize,
}

impl TextGridSource {
    /// Source with a known timestep count. Missing files surface on load.
    pub fn new(name: &str, dir: impl Into<PathBuf>, layout: TextLayout, count: usize) -> Self {
        TextGridSource {
            name: name.to_string(),
            dir: dir.into(),
            layout,
            count,
        }
    }

    /// Counts the timesteps present in `dir`: consecutive indices from 0 until the first
    /// file that does not exist.
    pub fn discover(name: &str, dir: impl Into<PathBuf>, layout: TextLayout) -> Result<Self> {
        let dir = dir.into();
        if !dir.is_dir() {
            return Err(TrackError::MissingInput {
                index: 0,
                path: dir,
                reason: "grid directory does not exist".to_string(),
            });
        }

        let mut count = 0;
        while dir.join(layout.file_name(count)).is_file() {
            count += 1;
        }
        debug!(
            "Discovered {} '{}' grid files in {}",
            count,
            layout.prefix,
            dir.display()
        );

        Ok(Self::new(name, dir, layout, count))
    }

    pub fn path_for(&self, index: usize) -> PathBuf {
        self.dir.join(self.layout.file_name(index))
    }
}

impl GridSource for TextGridSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn len(&self) -> usize {
        self.count
    }

    fn load(&self, index: usize, shape: GridShape) -> Result<Grid> {
        let path = self.path_for(index);
        if index >= self.count {
            return Err(TrackError::MissingInput {
                index,
                path,
                reason: format!("dataset has only {} timesteps", self.count),
            });
        }

        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) => {
                let reason = match e.kind() {
                    ErrorKind::NotFound => "file not found".to_string(),
                    _ => format!("unreadable: {}", e),
                };
                return Err(TrackError::MissingInput {
                    index,
                    path,
                    reason,
                });
            }
        };
        Grid::from_text(shape, &text, &path)
    }
}

/// One time slice of one NetCDF file
#[derive(Debug, Clone, PartialEq, Eq)]
struct Slice {
    path: PathBuf,
    time_index: usize,
    /// Whether the variable carries a leading time dimension
    has_time: bool,
}

/// SLP variable read from NetCDF files
#[derive(Debug, Clone)]
pub struct NetCdfGridSource {
    name: String,
    variable: String,
    slices: Vec<Slice>,
}

impl NetCdfGridSource {
    /// Indexes every time slice of `variable` in the files of `dir` whose name starts
    /// with `prefix`, in lexical file order.
    ///
    /// # Errors
    ///
    /// Fails if a file cannot be opened, lacks the variable, or the variable's trailing
    /// dimensions are not `shape`.
    pub fn open(
        name: &str,
        dir: &Path,
        prefix: &str,
        variable: &str,
        shape: GridShape,
    ) -> Result<Self> {
        let files = list_prefixed_files(dir, prefix)?;
        let mut slices = Vec::new();

        for path in files {
            let file = netcdf::open(&path)?;
            let var = file.variable(variable).ok_or_else(|| TrackError::MissingInput {
                index: slices.len(),
                path: path.clone(),
                reason: format!("variable '{}' not found", variable),
            })?;

            let dims: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
            let (steps, has_time) = match dims.as_slice() {
                [rows, cols] if *rows == shape.rows && *cols == shape.cols => (1, false),
                [time, rows, cols] if *rows == shape.rows && *cols == shape.cols => {
                    (*time, true)
                }
                _ => {
                    return Err(TrackError::ShapeMismatch {
                        expected: shape.len(),
                        actual: dims.iter().skip(dims.len().saturating_sub(2)).product(),
                    });
                }
            };

            debug!(
                "{}: '{}' {:?}, {} timesteps",
                path.display(),
                variable,
                dims,
                steps
            );
            for time_index in 0..steps {
                slices.push(Slice {
                    path: path.clone(),
                    time_index,
                    has_time,
                });
            }
        }

        Ok(NetCdfGridSource {
            name: name.to_string(),
            variable: variable.to_string(),
            slices,
        })
    }
}

impl GridSource for NetCdfGridSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn len(&self) -> usize {
        self.slices.len()
    }

    fn load(&self, index: usize, shape: GridShape) -> Result<Grid> {
        let slice = self.slices.get(index).ok_or_else(|| TrackError::MissingInput {
            index,
            path: PathBuf::new(),
            reason: format!("dataset has only {} timesteps", self.slices.len()),
        })?;

        let file = netcdf::open(&slice.path)?;
        let var = file
            .variable(&self.variable)
            .ok_or_else(|| TrackError::MissingInput {
                index,
                path: slice.path.clone(),
                reason: format!("variable '{}' not found", self.variable),
            })?;

        let values = if slice.has_time {
            let t = slice.time_index;
            var.get_values::<f64, _>((t..t + 1, 0..shape.rows, 0..shape.cols))?
        } else {
            var.get_values::<f64, _>((0..shape.rows, 0..shape.cols))?
        };
        Grid::from_values(shape, values)
    }
}

/// Files of `dir` whose name starts with `prefix`, sorted by name
pub fn list_prefixed_files(dir: &Path, prefix: &str) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(prefix))
        })
        .collect();
    files.sort();
    Ok(files)
}
