//! # CLI Module
//!
//! Command-line interface for slptrack:
//! - Argument parsing with clap
//! - Configuration file loading (JSON/YAML), located by `--config` or `SLPTRACK_CONFIG`
//! - Subcommands for the full run, analysis of existing grids, validation, templates and
//!   shell completions

use crate::config::AnalysisConfig;
use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

/// Sea-level-pressure minimum tracker for paired WRF runs
#[derive(Parser, Debug)]
#[command(name = "slptrack")]
#[command(about = "Track and plot sea-level-pressure minima of two parallel WRF runs")]
#[command(version)]
#[command(long_about = "
slptrack follows the sea-level-pressure minimum of two simultaneous WRF simulations
through time, inside a fixed area of interest, and plots both trajectories together
with the pressure difference between them.

EXAMPLES:
  # Full run on wrfout*/nosno_* files in the current directory (needs NCL)
  slptrack run

  # Full run on another directory, PNG output
  slptrack run /data/feb2008 -o trajectory.png

  # Analyse text grids extracted earlier (temp_a_slp000.txt, temp_b_slp000.txt, ...)
  slptrack analyze /scratch/grids

  # Analyse NetCDF files that already contain the 'slp' variable
  slptrack analyze /data/postprocessed --netcdf

  # Print and validate a configuration
  slptrack template --format yaml > slptrack.yaml
  slptrack validate slptrack.yaml
")]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet mode - suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Configuration file path (JSON or YAML)
    #[arg(short, long, global = true, env = "SLPTRACK_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract SLP with NCL from raw wrfout files, then analyse and plot
    Run {
        /// Directory holding the raw files of both datasets
        #[arg(value_name = "INPUT_DIR", default_value = ".")]
        input_dir: PathBuf,

        #[command(flatten)]
        overrides: RunOverrides,
    },

    /// Analyse SLP grids that are already extracted
    Analyze {
        /// Directory holding the text grids (or NetCDF files with --netcdf)
        #[arg(value_name = "GRID_DIR", default_value = ".")]
        grid_dir: PathBuf,

        /// Read the SLP variable from NetCDF files instead of text grids
        #[arg(long)]
        netcdf: bool,

        #[command(flatten)]
        overrides: RunOverrides,
    },

    /// Validate a configuration file
    Validate {
        /// Configuration file to validate (defaults to --config)
        config_file: Option<PathBuf>,
    },

    /// Print the default configuration
    Template {
        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Configuration format
        #[arg(long, value_enum, default_value_t = ConfigFormat::Json)]
        format: ConfigFormat,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Per-run overrides of the configuration
#[derive(clap::Args, Debug, Clone, Default, PartialEq)]
pub struct RunOverrides {
    /// Chart output path (.svg or .png)
    #[arg(short, long, env = "SLPTRACK_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Process timesteps one after another instead of in parallel
    #[arg(long)]
    pub sequential: bool,
}

impl RunOverrides {
    pub fn apply(&self, config: &mut AnalysisConfig) {
        if let Some(output) = &self.output {
            config.chart.output = output.clone();
        }
        if self.sequential {
            config.parallel = false;
        }
    }
}

#[derive(ValueEnum, Clone, Debug, PartialEq, Eq)]
pub enum ConfigFormat {
    /// JSON configuration format
    Json,
    /// YAML configuration format
    Yaml,
}
