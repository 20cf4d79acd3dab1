use std::fs;
use std::path::Path;

use gsst_core::errors::ErrorInfo;
use gsst_core::{GsstError, SchemaVersion};
use serde::{Deserialize, Serialize};

use crate::controller::{Phase, TemperingController, TemperingSession};
use crate::weights::ZeroPoint;

/// Relative free energies handed to downstream estimators.
///
/// `free_energies[k]` is the reduced free energy of state `k` minus that of
/// `reference_state`, i.e. `-(w_k - w_ref)`. The raw weights and the
/// convention they satisfy are kept alongside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreeEnergyReport {
    /// Payload schema.
    pub schema_version: SchemaVersion,
    /// Controlled term.
    pub parameter: String,
    /// Ladder coordinates.
    pub coordinates: Vec<f64>,
    /// State pinned to zero free energy.
    pub reference_state: usize,
    /// Reduced free energies relative to the reference state.
    pub free_energies: Vec<f64>,
    /// Raw learned weights.
    pub weights: Vec<f64>,
    /// Zero-point convention of `weights`.
    pub zero_point: ZeroPoint,
    /// Lifetime visits per state.
    pub visits: Vec<u64>,
    /// Production estimate `-(w_k + ln h_k)` relative to the reference, where
    /// `h` is the histogram collected with frozen weights. Absent until every
    /// state has been visited in production.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub histogram_corrected: Option<Vec<f64>>,
    /// Schedule phase of the session.
    pub phase: Phase,
    /// Increment in force.
    pub increment: f64,
    /// Attempts completed.
    pub steps_completed: u64,
}

impl FreeEnergyReport {
    /// Builds the report relative to `reference_state`.
    pub fn from_session(
        session: &TemperingSession,
        reference_state: usize,
    ) -> Result<Self, GsstError> {
        let table = session.weights();
        let free_energies = table
            .relative_to(reference_state)?
            .into_iter()
            .map(|w| if w == 0.0 { 0.0 } else { -w })
            .collect();
        Ok(Self {
            schema_version: SchemaVersion::new(1, 0, 0),
            parameter: session.ladder().term().to_string(),
            coordinates: session.ladder().coordinates(),
            reference_state,
            free_energies,
            weights: table.weights(),
            zero_point: table.zero_point(),
            visits: table.entries().iter().map(|entry| entry.total_visits).collect(),
            histogram_corrected: None,
            phase: session.phase(),
            increment: session.increment(),
            steps_completed: session.steps_completed(),
        })
    }

    /// Like [`FreeEnergyReport::from_session`], adding the histogram-corrected
    /// estimate when the controller's weights are frozen in production.
    pub fn from_controller(
        controller: &TemperingController,
        reference_state: usize,
    ) -> Result<Self, GsstError> {
        let session = controller.session();
        let mut report = Self::from_session(session, reference_state)?;
        let frozen = session.phase() == Phase::Production && controller.applied_increment() == 0.0;
        let entries = session.weights().entries();
        if frozen && entries.iter().all(|entry| entry.visits > 0) {
            let raw: Vec<f64> = entries
                .iter()
                .map(|entry| -(entry.weight + (entry.visits as f64).ln()))
                .collect();
            let offset = raw[reference_state];
            report.histogram_corrected = Some(raw.iter().map(|f| f - offset).collect());
        }
        Ok(report)
    }

    /// Free energy differences between neighbouring states, `f_{k+1} - f_k`.
    pub fn adjacent_differences(&self) -> Vec<f64> {
        self.free_energies
            .windows(2)
            .map(|pair| pair[1] - pair[0])
            .collect()
    }

    /// Writes the report as pretty JSON.
    pub fn write(&self, path: &Path) -> Result<(), GsstError> {
        let json = serde_json::to_string_pretty(self).map_err(|err| {
            GsstError::Serde(
                ErrorInfo::new("report-serialize", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        fs::write(path, json).map_err(|err| {
            GsstError::Serde(
                ErrorInfo::new("report-write", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })
    }
}
