use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use gsst_core::errors::ErrorInfo;
use gsst_core::{GsstError, SchemaVersion};
use serde::{Deserialize, Serialize};

use crate::config::RunConfig;
use crate::controller::{
    ControllerSettings, Phase, StepCounters, TemperingController, TemperingSession,
};
use crate::ladder::StateLadder;
use crate::weights::WeightTable;

/// Schema written into every checkpoint.
pub const CHECKPOINT_SCHEMA: SchemaVersion = SchemaVersion::new(1, 0, 0);

/// Ladder as stored in a checkpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LadderSnapshot {
    /// Controlled term.
    pub parameter: String,
    /// Coordinates in ladder order.
    pub coordinates: Vec<f64>,
    /// SHA-256 fingerprint of the ladder.
    pub fingerprint: String,
}

/// Everything needed to resume a session bit-for-bit.
///
/// The weight table carries its zero-point convention so that downstream
/// estimators can compare the weights without re-deriving the offset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionCheckpoint {
    /// Payload schema.
    pub schema_version: SchemaVersion,
    /// Completed tempering attempts.
    pub steps_completed: u64,
    /// Master seed of the per-step substreams.
    pub master_seed: u64,
    /// Ladder the weights belong to.
    pub ladder: LadderSnapshot,
    /// Weights, visit histogram and zero-point convention.
    pub weights: WeightTable,
    /// Current Wang-Landau increment.
    pub increment: f64,
    /// Schedule phase.
    pub phase: Phase,
    /// Active state index.
    pub active_state: usize,
    /// Controller tallies, including the fault streak.
    pub counters: StepCounters,
    /// Controller settings in force when the checkpoint was taken.
    pub settings: ControllerSettings,
    /// Run configuration snapshot.
    pub config: RunConfig,
}

impl SessionCheckpoint {
    /// Captures the controller state.
    pub fn capture(controller: &TemperingController, config: &RunConfig) -> Self {
        let session = controller.session();
        let ladder = session.ladder();
        Self {
            schema_version: CHECKPOINT_SCHEMA,
            steps_completed: session.steps_completed(),
            master_seed: session.master_seed(),
            ladder: LadderSnapshot {
                parameter: ladder.term().to_string(),
                coordinates: ladder.coordinates(),
                fingerprint: ladder.fingerprint(),
            },
            weights: session.weights().clone(),
            increment: session.increment(),
            phase: session.phase(),
            active_state: session.active(),
            counters: *controller.counters(),
            settings: *controller.settings(),
            config: config.clone(),
        }
    }

    /// Rebuilds the controller, checking schema and ladder fingerprint.
    pub fn restore(&self) -> Result<TemperingController, GsstError> {
        if !CHECKPOINT_SCHEMA.is_compatible_with(&self.schema_version) {
            return Err(GsstError::Serde(
                ErrorInfo::new("checkpoint-schema", "unsupported checkpoint schema")
                    .with_context(
                        "found",
                        format!(
                            "{}.{}.{}",
                            self.schema_version.major,
                            self.schema_version.minor,
                            self.schema_version.patch
                        ),
                    ),
            ));
        }
        let ladder = Arc::new(StateLadder::new(
            self.ladder.parameter.clone(),
            &self.ladder.coordinates,
        )?);
        if ladder.fingerprint() != self.ladder.fingerprint {
            return Err(GsstError::Serde(
                ErrorInfo::new("checkpoint-fingerprint", "ladder does not match its fingerprint")
                    .with_context("expected", self.ladder.fingerprint.clone())
                    .with_context("found", ladder.fingerprint()),
            ));
        }
        let session = TemperingSession::new(
            ladder,
            self.weights.clone(),
            self.active_state,
            self.increment,
            self.phase,
            self.master_seed,
        )?
        .with_steps_completed(self.steps_completed);
        Ok(TemperingController::new(session, self.settings)?.with_counters(self.counters))
    }

    /// Restores the payload from disk.
    pub fn load(path: &Path) -> Result<Self, GsstError> {
        let contents = fs::read_to_string(path).map_err(|err| {
            GsstError::Serde(
                ErrorInfo::new("checkpoint-read", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        serde_json::from_str(&contents).map_err(|err| {
            GsstError::Serde(
                ErrorInfo::new("checkpoint-parse", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })
    }

    /// Writes the payload to disk.
    pub fn store(&self, path: &Path) -> Result<(), GsstError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| {
                GsstError::Serde(
                    ErrorInfo::new("checkpoint-mkdir", err.to_string())
                        .with_context("path", parent.display().to_string()),
                )
            })?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|err| {
            GsstError::Serde(
                ErrorInfo::new("checkpoint-serialize", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        fs::write(path, json).map_err(|err| {
            GsstError::Serde(
                ErrorInfo::new("checkpoint-write", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })
    }
}

/// Checkpoint file path for the given attempt count.
pub fn checkpoint_path(root: &Path, step: u64) -> PathBuf {
    root.join(format!("ckpt_{step:08}.json"))
}
