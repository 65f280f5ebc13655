//! # Analysis Configuration
//!
//! Every run parameter lives in one immutable [`AnalysisConfig`], built once at startup
//! and handed to the components that need it. The defaults are the constants of the
//! February 2008 snow-cover experiment (143 x 209 domain, area of interest rows 25..=119,
//! columns 80..=208), so a run needs no configuration file at all.
//!
//! A JSON or YAML file may override any subset of the fields:
//!
//! ```rust
//! use slptrack::config::AnalysisConfig;
//!
//! let json = r#"
//! {
//!   "window": { "min_row": 10, "max_row": 100, "min_col": 20, "max_col": 180 },
//!   "chart": { "output": "trajectory.png" }
//! }"#;
//! let config = AnalysisConfig::from_json(json)?;
//! assert_eq!(config.shape.rows, 143);
//! assert_eq!(config.window.min_row, 10);
//! # Ok::<(), slptrack::TrackError>(())
//! ```

use crate::error::{Result, TrackError};
use crate::grid::GridShape;
use crate::minimum::Window;
use crate::source::TextLayout;
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Complete configuration of one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Shape of every SLP grid
    pub shape: GridShape,
    /// Area of interest searched for the minimum
    pub window: Window,
    /// Reference dataset; differences are `B - A`
    #[serde(deserialize_with = "snowy_dataset")]
    pub dataset_a: DatasetConfig,
    /// Second dataset
    #[serde(deserialize_with = "snowless_dataset")]
    pub dataset_b: DatasetConfig,
    /// External NCL extraction
    pub extraction: ExtractionConfig,
    /// Chart output
    pub chart: ChartConfig,
    /// Process timesteps on the rayon thread pool
    pub parallel: bool,
    /// Show progress bars while building series
    pub progress: bool,
}

/// One of the two parallel simulation datasets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Legend label
    pub label: String,
    /// Line colour, any SVG colour
    pub color: String,
    /// Name prefix of the raw simulation files (wrfout or NetCDF)
    pub file_prefix: String,
    /// Naming of the extracted per-timestep text grids
    pub text: TextLayout,
}

impl DatasetConfig {
    /// Snowy control run: `wrfout*` files, extracted to `temp_a_slpNNN.txt`
    pub fn snowy() -> Self {
        DatasetConfig {
            label: "Snowy".to_string(),
            color: "red".to_string(),
            file_prefix: "wrfout".to_string(),
            text: TextLayout::new("temp_a_slp"),
        }
    }

    /// Snowless run: `nosno_*` files, extracted to `temp_b_slpNNN.txt`
    pub fn snowless() -> Self {
        DatasetConfig {
            label: "Snowless".to_string(),
            color: "blue".to_string(),
            file_prefix: "nosno_".to_string(),
            text: TextLayout::new("temp_b_slp"),
        }
    }
}

/// Dataset section as written in a file. Every field is optional and falls back to the
/// defaults of the dataset it describes.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DatasetPatch {
    label: Option<String>,
    color: Option<String>,
    file_prefix: Option<String>,
    text: TextLayoutPatch,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TextLayoutPatch {
    prefix: Option<String>,
    digits: Option<usize>,
    extension: Option<String>,
}

impl DatasetPatch {
    fn apply(self, mut dataset: DatasetConfig) -> DatasetConfig {
        if let Some(label) = self.label {
            dataset.label = label;
        }
        if let Some(color) = self.color {
            dataset.color = color;
        }
        if let Some(file_prefix) = self.file_prefix {
            dataset.file_prefix = file_prefix;
        }
        if let Some(prefix) = self.text.prefix {
            dataset.text.prefix = prefix;
        }
        if let Some(digits) = self.text.digits {
            dataset.text.digits = digits;
        }
        if let Some(extension) = self.text.extension {
            dataset.text.extension = extension;
        }
        dataset
    }
}

fn snowy_dataset<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<DatasetConfig, D::Error> {
    DatasetPatch::deserialize(deserializer).map(|patch| patch.apply(DatasetConfig::snowy()))
}

fn snowless_dataset<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<DatasetConfig, D::Error> {
    DatasetPatch::deserialize(deserializer).map(|patch| patch.apply(DatasetConfig::snowless()))
}

/// How raw simulation output becomes SLP grids
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// NCL executable
    pub ncl_command: String,
    /// Diagnostic passed to `wrf_user_getvar`, also the NetCDF variable name
    pub variable: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        ExtractionConfig {
            ncl_command: "ncl".to_string(),
            variable: "slp".to_string(),
        }
    }
}

/// Trajectory chart settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub title: String,
    /// Output path; `.svg` or `.png`
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub x_label: String,
    pub y_label: String,
    /// Difference colour
    pub diff_color: String,
    /// Secondary axis `(bottom, top)`; `None` fits the data
    pub diff_axis: Option<(f64, f64)>,
}

impl Default for ChartConfig {
    fn default() -> Self {
        ChartConfig {
            title: "02/25-02/27 2008 Pressure minimum trajectory".to_string(),
            output: PathBuf::from("slp_min_dist.svg"),
            width: 800,
            height: 600,
            x_label: "Longitudinal Value".to_string(),
            y_label: "Latitudinal Value".to_string(),
            diff_color: "green".to_string(),
            diff_axis: Some((0.0, -7.5)),
        }
    }
}

/// Chart file formats, picked from the output extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartFormat {
    Svg,
    Png,
}

impl ChartFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("svg") => Ok(ChartFormat::Svg),
            Some("png") => Ok(ChartFormat::Png),
            _ => Err(TrackError::config(format!(
                "chart output '{}' must end in .svg or .png",
                path.display()
            ))),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            shape: GridShape::default(),
            window: Window::default(),
            dataset_a: DatasetConfig::snowy(),
            dataset_b: DatasetConfig::snowless(),
            extraction: ExtractionConfig::default(),
            chart: ChartConfig::default(),
            parallel: true,
            progress: true,
        }
    }
}

impl AnalysisConfig {
    /// Loads a configuration file, YAML for `.yaml`/`.yml` and JSON otherwise.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            TrackError::config(format!("cannot read '{}': {}", path.display(), e))
        })?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml(&content),
            _ => Self::from_json(&content),
        }
    }

    pub fn from_json(json_str: &str) -> Result<Self> {
        let config: AnalysisConfig = serde_json::from_str(json_str)?;
        Ok(config)
    }

    pub fn from_yaml(yaml_str: &str) -> Result<Self> {
        let config: AnalysisConfig = serde_yaml::from_str(yaml_str)?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Checks the invariants every component relies on.
    ///
    /// # Errors
    ///
    /// [`TrackError::InvalidWindow`] for a window that does not fit the grid, and
    /// [`TrackError::Config`] for everything else.
    pub fn validate(&self) -> Result<()> {
        if self.shape.is_empty() {
            return Err(TrackError::config("grid shape must have at least one row and column"));
        }
        self.window.validate(self.shape)?;

        for (name, dataset) in [("dataset_a", &self.dataset_a), ("dataset_b", &self.dataset_b)] {
            if dataset.label.trim().is_empty() {
                return Err(TrackError::config(format!("{} label cannot be empty", name)));
            }
            if dataset.text.prefix.is_empty() {
                return Err(TrackError::config(format!("{} text prefix cannot be empty", name)));
            }
            if dataset.text.digits == 0 {
                return Err(TrackError::config(format!(
                    "{} text index width must be at least 1",
                    name
                )));
            }
        }
        if self.dataset_a.text.prefix == self.dataset_b.text.prefix {
            return Err(TrackError::config(
                "both datasets use the same text prefix and would read the same grids",
            ));
        }
        if self.dataset_a.file_prefix == self.dataset_b.file_prefix {
            return Err(TrackError::config("both datasets use the same raw file prefix"));
        }

        if self.chart.width == 0 || self.chart.height == 0 {
            return Err(TrackError::config("chart width and height must be positive"));
        }
        if let Some((bottom, top)) = self.chart.diff_axis
            && (bottom == top || !bottom.is_finite() || !top.is_finite())
        {
            return Err(TrackError::config(format!(
                "difference axis limits ({}, {}) must be finite and distinct",
                bottom, top
            )));
        }
        ChartFormat::from_path(&self.chart.output)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_are_valid() {
        let config = AnalysisConfig::default();
        config.validate().unwrap();
        assert_eq!(config.window, Window::new(25, 119, 80, 208));
        assert_eq!(config.dataset_a.text.file_name(7), "temp_a_slp007.txt");
        assert_eq!(config.dataset_b.file_prefix, "nosno_");
        assert_eq!(config.chart.diff_axis, Some((0.0, -7.5)));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{ "parallel": false, "chart": { "width": 1024 } }"#;
        let config = AnalysisConfig::from_json(json).unwrap();
        assert!(!config.parallel);
        assert_eq!(config.chart.width, 1024);
        assert_eq!(config.chart.height, 600);
        assert_eq!(config.shape, GridShape::default());
    }

    #[test]
    fn test_partial_dataset_section() {
        let json = r#"{ "dataset_b": { "label": "No snow", "text": { "digits": 4 } } }"#;
        let config = AnalysisConfig::from_json(json).unwrap();

        assert_eq!(config.dataset_b.label, "No snow");
        assert_eq!(config.dataset_b.color, "blue");
        assert_eq!(config.dataset_b.file_prefix, "nosno_");
        assert_eq!(config.dataset_b.text.file_name(3), "temp_b_slp0003.txt");
        assert_eq!(config.dataset_a, DatasetConfig::snowy());
        config.validate().unwrap();
    }

    #[test]
    fn test_partial_dataset_section_yaml() {
        let yaml = "dataset_a:\n  color: black\n";
        let config = AnalysisConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.dataset_a.color, "black");
        assert_eq!(config.dataset_a.label, "Snowy");
        assert_eq!(config.dataset_a.text.prefix, "temp_a_slp");
        assert_eq!(config.dataset_b, DatasetConfig::snowless());
    }

    #[test]
    fn test_yaml_round_trip_through_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.yaml");
        let mut config = AnalysisConfig::default();
        config.dataset_b.label = "No snow".to_string();
        fs::write(&path, config.to_yaml().unwrap()).unwrap();

        let loaded = AnalysisConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_json_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.json");
        let json = r#"{
            "shape": { "rows": 10, "cols": 12 },
            "window": { "min_row": 1, "max_row": 8, "min_col": 2, "max_col": 11 }
        }"#;
        fs::write(&path, json).unwrap();
        let config = AnalysisConfig::from_file(&path).unwrap();
        assert_eq!(config.shape, GridShape::new(10, 12));
        config.validate().unwrap();
    }

    #[test]
    fn test_invalid_json() {
        let err = AnalysisConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, TrackError::Config(_)));
    }

    #[test]
    fn test_window_outside_shape() {
        let mut config = AnalysisConfig::default();
        config.shape = GridShape::new(100, 100);
        let err = config.validate().unwrap_err();
        assert!(matches!(err, TrackError::InvalidWindow(_)));
    }

    #[test]
    fn test_same_prefix_rejected() {
        let mut config = AnalysisConfig::default();
        config.dataset_b.text.prefix = config.dataset_a.text.prefix.clone();
        assert!(matches!(config.validate(), Err(TrackError::Config(_))));
    }

    #[test]
    fn test_chart_format() {
        assert_eq!(ChartFormat::from_path(Path::new("a.svg")).unwrap(), ChartFormat::Svg);
        assert_eq!(ChartFormat::from_path(Path::new("a.PNG")).unwrap(), ChartFormat::Png);
        assert!(ChartFormat::from_path(Path::new("a.pdf")).is_err());
        assert!(ChartFormat::from_path(Path::new("chart")).is_err());

        let mut config = AnalysisConfig::default();
        config.chart.diff_axis = Some((1.0, 1.0));
        assert!(config.validate().is_err());
    }
}
