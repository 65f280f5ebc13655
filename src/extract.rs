//! # NCL Extraction
//!
//! Sea-level pressure is not stored in `wrfout` files; it is diagnosed by NCL's
//! `wrf_user_getvar(f, "slp", -1)`. This module writes a small NCL script into the
//! scratch directory, runs it, and leaves one text grid per input file and dataset
//! behind (`temp_a_slp000.txt`, `temp_b_slp000.txt`, ...). Those grids are then read
//! with [`crate::source::TextGridSource`].
//!
//! Input files of the two datasets are paired by their position in the sorted file list.

use crate::config::AnalysisConfig;
use crate::error::{Result, TrackError};
use crate::source::{TextLayout, list_prefixed_files};
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Name of the generated script inside the scratch directory
pub const SCRIPT_NAME: &str = "temp_ncl.ncl";

/// Raw simulation files of both datasets, paired by index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawInputs {
    pub a: Vec<PathBuf>,
    pub b: Vec<PathBuf>,
}

impl RawInputs {
    /// Lists the raw files of both datasets in `input_dir`.
    ///
    /// # Errors
    ///
    /// [`TrackError::MissingInput`] when dataset A has no files, and
    /// [`TrackError::LengthMismatch`] when the datasets hold a different number of files.
    pub fn discover(input_dir: &Path, config: &AnalysisConfig) -> Result<Self> {
        let a = list_prefixed_files(input_dir, &config.dataset_a.file_prefix)?;
        let b = list_prefixed_files(input_dir, &config.dataset_b.file_prefix)?;

        if a.is_empty() {
            return Err(TrackError::MissingInput {
                index: 0,
                path: input_dir.join(format!("{}*", config.dataset_a.file_prefix)),
                reason: "no raw simulation files found".to_string(),
            });
        }
        if a.len() != b.len() {
            return Err(TrackError::LengthMismatch {
                a: a.len(),
                b: b.len(),
            });
        }
        Ok(RawInputs { a, b })
    }

    pub fn len(&self) -> usize {
        self.a.len()
    }

    pub fn is_empty(&self) -> bool {
        self.a.is_empty()
    }
}

/// NCL `sprinti` format for a text layout, e.g. `temp_a_slp%03d.txt`
fn ncl_name_format(layout: &TextLayout) -> String {
    format!("{}%0{}d{}", layout.prefix, layout.digits, layout.extension)
}

fn ncl_string_array(paths: &[PathBuf]) -> String {
    let quoted: Vec<String> = paths
        .iter()
        .map(|p| format!("\"{}\"", p.display()))
        .collect();
    format!("(/ {} /)", quoted.join(", "))
}

/// Generates the NCL script that writes the text grids of both datasets into
/// `scratch_dir`.
pub fn render_script(inputs: &RawInputs, scratch_dir: &Path, config: &AnalysisConfig) -> String {
    let variable = &config.extraction.variable;
    let a_name = ncl_name_format(&config.dataset_a.text);
    let b_name = ncl_name_format(&config.dataset_b.text);
    let scratch = scratch_dir.display();

    let mut script = String::new();
    script.push_str("load \"$NCARG_ROOT/lib/ncarg/nclscripts/csm/gsn_code.ncl\"\n");
    script.push_str("load \"$NCARG_ROOT/lib/ncarg/nclscripts/wrf/WRFUserARW.ncl\"\n");
    script.push_str("begin\n");
    script.push_str(&format!("  fList = {}\n", ncl_string_array(&inputs.a)));
    script.push_str(&format!("  gList = {}\n", ncl_string_array(&inputs.b)));
    script.push_str("  nFiles = dimsizes(fList)\n");
    script.push_str("  do iFile = 0, nFiles - 1\n");
    script.push_str(&format!(
        "    filenamea = \"{}/\" + sprinti(\"{}\", iFile)\n",
        scratch, a_name
    ));
    script.push_str(&format!(
        "    filenameb = \"{}/\" + sprinti(\"{}\", iFile)\n",
        scratch, b_name
    ));
    script.push_str("    a = addfile(fList(iFile), \"r\")\n");
    script.push_str("    b = addfile(gList(iFile), \"r\")\n");
    script.push_str(&format!(
        "    slp_a = wrf_user_getvar(a, \"{}\", -1)\n",
        variable
    ));
    script.push_str(&format!(
        "    slp_b = wrf_user_getvar(b, \"{}\", -1)\n",
        variable
    ));
    script.push_str("    asciiwrite(filenamea, slp_a)\n");
    script.push_str("    asciiwrite(filenameb, slp_b)\n");
    script.push_str("  end do\n");
    script.push_str("end\n");
    script
}

/// Writes the script to `scratch_dir` and runs NCL on it.
///
/// NCL reports most script errors on stdout with a `fatal:` prefix while still exiting
/// with status 0, so both the exit status and the output are checked.
pub fn run_extraction(
    inputs: &RawInputs,
    scratch_dir: &Path,
    config: &AnalysisConfig,
) -> Result<PathBuf> {
    let script_path = scratch_dir.join(SCRIPT_NAME);
    fs::write(&script_path, render_script(inputs, scratch_dir, config))?;
    debug!("Wrote NCL script to {}", script_path.display());

    info!(
        "Running {} over {} file pairs",
        config.extraction.ncl_command,
        inputs.len()
    );
    let output = Command::new(&config.extraction.ncl_command)
        .arg(&script_path)
        .current_dir(scratch_dir)
        .output()
        .map_err(|e| {
            TrackError::Extraction(format!(
                "cannot start '{}': {}",
                config.extraction.ncl_command, e
            ))
        })?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    debug!("NCL stdout:\n{}", stdout);
    if !stderr.trim().is_empty() {
        warn!("NCL stderr:\n{}", stderr);
    }

    if !output.status.success() {
        return Err(TrackError::Extraction(format!(
            "{} exited with {}",
            config.extraction.ncl_command, output.status
        )));
    }
    if let Some(line) = stdout.lines().find(|l| l.trim_start().starts_with("fatal:")) {
        return Err(TrackError::Extraction(line.trim().to_string()));
    }

    Ok(script_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_ncl_name_format() {
        assert_eq!(
            ncl_name_format(&TextLayout::new("temp_a_slp")),
            "temp_a_slp%03d.txt"
        );
    }

    #[test]
    fn test_render_script() {
        let config = AnalysisConfig::default();
        let inputs = RawInputs {
            a: vec![PathBuf::from("/data/wrfout_d01_00"), PathBuf::from("/data/wrfout_d01_06")],
            b: vec![PathBuf::from("/data/nosno_d01_00"), PathBuf::from("/data/nosno_d01_06")],
        };
        let script = render_script(&inputs, Path::new("/tmp/scratch"), &config);

        assert!(script.contains("WRFUserARW.ncl"));
        assert!(script.contains(r#"fList = (/ "/data/wrfout_d01_00", "/data/wrfout_d01_06" /)"#));
        assert!(script.contains(r#"gList = (/ "/data/nosno_d01_00", "/data/nosno_d01_06" /)"#));
        assert!(script.contains(
            r#"filenamea = "/tmp/scratch/" + sprinti("temp_a_slp%03d.txt", iFile)"#
        ));
        assert!(script.contains(
            r#"filenameb = "/tmp/scratch/" + sprinti("temp_b_slp%03d.txt", iFile)"#
        ));
        assert!(script.contains(r#"wrf_user_getvar(a, "slp", -1)"#));
        assert!(script.trim_end().ends_with("end"));
    }

    #[test]
    fn test_discover_pairs_inputs() {
        let dir = tempdir().unwrap();
        for name in ["wrfout_1", "wrfout_0", "nosno_0", "nosno_1", "other"] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        let inputs = RawInputs::discover(dir.path(), &AnalysisConfig::default()).unwrap();
        assert_eq!(inputs.len(), 2);
        assert!(inputs.a[0].ends_with("wrfout_0"));
        assert!(inputs.b[1].ends_with("nosno_1"));
    }

    #[test]
    fn test_discover_unbalanced_inputs() {
        let dir = tempdir().unwrap();
        for name in ["wrfout_0", "wrfout_1", "nosno_0"] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        let err = RawInputs::discover(dir.path(), &AnalysisConfig::default()).unwrap_err();
        assert!(matches!(err, TrackError::LengthMismatch { a: 2, b: 1 }));
    }

    #[test]
    fn test_discover_no_inputs() {
        let dir = tempdir().unwrap();
        let err = RawInputs::discover(dir.path(), &AnalysisConfig::default()).unwrap_err();
        assert!(matches!(err, TrackError::MissingInput { .. }));
    }

    #[test]
    fn test_missing_ncl_binary() {
        let dir = tempdir().unwrap();
        let mut config = AnalysisConfig::default();
        config.extraction.ncl_command = "slptrack-no-such-ncl".to_string();
        let inputs = RawInputs {
            a: vec![PathBuf::from("wrfout_0")],
            b: vec![PathBuf::from("nosno_0")],
        };
        let err = run_extraction(&inputs, dir.path(), &config).unwrap_err();
        assert!(matches!(err, TrackError::Extraction(_)));
        assert!(dir.path().join(SCRIPT_NAME).is_file());
    }
}
