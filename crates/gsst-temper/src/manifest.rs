use std::fs;
use std::path::{Path, PathBuf};

use gsst_core::errors::ErrorInfo;
use gsst_core::{GsstError, RunProvenance};
use serde::{Deserialize, Serialize};

use crate::config::RunConfig;

/// Structured manifest describing a completed tempering run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    /// Configuration used for the run.
    pub config: RunConfig,
    /// Seeds, hashes and timestamp.
    pub provenance: RunProvenance,
    /// Optional seed label captured from the configuration.
    pub seed_label: Option<String>,
    /// Trace file (relative to the run directory).
    pub trace_file: Option<PathBuf>,
    /// Free-energy report (relative to the run directory).
    pub report_file: Option<PathBuf>,
    /// Checkpoint files generated during the run, oldest first.
    pub checkpoints: Vec<PathBuf>,
}

impl RunManifest {
    /// Writes the manifest to a JSON file.
    pub fn write(&self, path: &Path) -> Result<(), GsstError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| {
                GsstError::Serde(
                    ErrorInfo::new("manifest-mkdir", err.to_string())
                        .with_context("path", parent.display().to_string()),
                )
            })?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|err| {
            GsstError::Serde(
                ErrorInfo::new("manifest-serialize", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        fs::write(path, json).map_err(|err| {
            GsstError::Serde(
                ErrorInfo::new("manifest-write", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })
    }

    /// Loads a manifest from disk.
    pub fn load(path: &Path) -> Result<Self, GsstError> {
        let contents = fs::read_to_string(path).map_err(|err| {
            GsstError::Serde(
                ErrorInfo::new("manifest-read", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        serde_json::from_str(&contents).map_err(|err| {
            GsstError::Serde(
                ErrorInfo::new("manifest-parse", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })
    }
}
