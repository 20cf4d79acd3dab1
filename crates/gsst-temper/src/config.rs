use std::fs;
use std::path::{Path, PathBuf};

use gsst_core::errors::ErrorInfo;
use gsst_core::GsstError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::proposal::ProposalStrategy;

/// YAML-configurable parameters governing a tempering run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Ladder of tempering states.
    #[serde(default)]
    pub ladder: LadderConfig,
    /// Wang-Landau increment schedule.
    #[serde(default)]
    pub wang_landau: WangLandauConfig,
    /// Proposal strategy.
    #[serde(default)]
    pub proposal: ProposalStrategy,
    /// Acceptance test settings.
    #[serde(default)]
    pub acceptance: AcceptanceConfig,
    /// Engine fault escalation policy.
    #[serde(default)]
    pub faults: FaultPolicy,
    /// Initial weights and whether they are learned.
    #[serde(default)]
    pub weights: WeightsConfig,
    /// Ladder index the run starts in.
    #[serde(default)]
    pub initial_state: usize,
    /// Number of tempering attempts in the run.
    #[serde(default = "default_steps")]
    pub steps: u64,
    /// Engine time steps integrated between tempering attempts.
    #[serde(default = "default_change_interval")]
    pub change_interval: usize,
    /// Attempts between trace rows (0 disables the trace).
    #[serde(default = "default_report_interval")]
    pub report_interval: u64,
    /// Checkpointing behaviour.
    #[serde(default)]
    pub checkpoint: CheckpointConfig,
    /// Master seed and label.
    #[serde(default)]
    pub seed_policy: SeedPolicy,
    /// Output directory configuration.
    #[serde(default)]
    pub output: OutputConfig,
}

fn default_steps() -> u64 {
    10_000
}

fn default_change_interval() -> usize {
    1000
}

fn default_report_interval() -> u64 {
    1
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            ladder: LadderConfig::default(),
            wang_landau: WangLandauConfig::default(),
            proposal: ProposalStrategy::default(),
            acceptance: AcceptanceConfig::default(),
            faults: FaultPolicy::default(),
            weights: WeightsConfig::default(),
            initial_state: 0,
            steps: default_steps(),
            change_interval: default_change_interval(),
            report_interval: default_report_interval(),
            checkpoint: CheckpointConfig::default(),
            seed_policy: SeedPolicy::default(),
            output: OutputConfig::default(),
        }
    }
}

impl RunConfig {
    /// Parses a YAML document.
    pub fn from_yaml_str(text: &str) -> Result<Self, GsstError> {
        serde_yaml::from_str(text)
            .map_err(|err| GsstError::Serde(ErrorInfo::new("config-parse", err.to_string())))
    }

    /// Reads and parses a YAML file.
    pub fn load(path: &Path) -> Result<Self, GsstError> {
        let text = fs::read_to_string(path).map_err(|err| {
            GsstError::Serde(
                ErrorInfo::new("config-read", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        Self::from_yaml_str(&text).map_err(|err| match err {
            GsstError::Serde(info) => {
                GsstError::Serde(info.with_context("path", path.display().to_string()))
            }
            other => other,
        })
    }

    /// Checks every cross-field constraint. Ladder monotonicity is checked
    /// when the ladder is built.
    pub fn validate(&self) -> Result<(), GsstError> {
        self.wang_landau.validate()?;
        self.acceptance.validate()?;
        self.faults.validate()?;
        let states = self.ladder.coordinates.len();
        if self.initial_state >= states {
            return Err(GsstError::Config(
                ErrorInfo::new("initial-state", "initial state outside the ladder")
                    .with_context("initial_state", self.initial_state.to_string())
                    .with_context("states", states.to_string()),
            ));
        }
        if let Some(initial) = &self.weights.initial {
            if initial.len() != states {
                return Err(GsstError::Config(
                    ErrorInfo::new("initial-weights", "one initial weight per ladder state")
                        .with_context("weights", initial.len().to_string())
                        .with_context("states", states.to_string()),
                ));
            }
        } else if !self.weights.learn {
            return Err(GsstError::Config(
                ErrorInfo::new("frozen-without-weights", "learn = false needs initial weights")
                    .with_hint("supply weights.initial or enable weights.learn"),
            ));
        }
        if self.change_interval == 0 {
            return Err(GsstError::config(
                "change-interval",
                "change_interval must be at least one time step",
            ));
        }
        Ok(())
    }

    /// SHA-256 of the canonical JSON form, used in manifests.
    pub fn fingerprint(&self) -> Result<String, GsstError> {
        let bytes = serde_json::to_vec(self)
            .map_err(|err| GsstError::Serde(ErrorInfo::new("config-serialize", err.to_string())))?;
        Ok(hex::encode(Sha256::digest(&bytes)))
    }
}

/// Ladder definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LadderConfig {
    /// Name of the tempered parameter or bias term.
    #[serde(default = "default_parameter")]
    pub parameter: String,
    /// Strictly monotonic tempering coordinates.
    #[serde(default = "default_coordinates")]
    pub coordinates: Vec<f64>,
}

fn default_parameter() -> String {
    "lambda".to_string()
}

fn default_coordinates() -> Vec<f64> {
    vec![0.0, 0.25, 0.5, 0.75, 1.0]
}

impl Default for LadderConfig {
    fn default() -> Self {
        Self {
            parameter: default_parameter(),
            coordinates: default_coordinates(),
        }
    }
}

/// Wang-Landau increment schedule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WangLandauConfig {
    /// Increment used until the histogram first flattens.
    #[serde(default = "default_initial_increment")]
    pub initial_increment: f64,
    /// Smallest increment; reaching it ends the learning phases.
    #[serde(default = "default_floor")]
    pub floor: f64,
    /// Histogram counts as flat when `(max - min) / mean` drops below this.
    #[serde(default = "default_flatness_threshold")]
    pub flatness_threshold: f64,
    /// Every state must be visited more than this often before a flatness check passes.
    #[serde(default = "default_min_visits")]
    pub min_visits: u64,
    /// Factor applied to the increment at each flat histogram.
    #[serde(default = "default_decay_factor")]
    pub decay_factor: f64,
    /// Stop updating weights once production starts.
    #[serde(default = "default_freeze")]
    pub freeze_in_production: bool,
}

fn default_initial_increment() -> f64 {
    1.0
}

fn default_floor() -> f64 {
    1e-2
}

fn default_flatness_threshold() -> f64 {
    0.2
}

fn default_min_visits() -> u64 {
    20
}

fn default_decay_factor() -> f64 {
    0.5
}

fn default_freeze() -> bool {
    true
}

impl Default for WangLandauConfig {
    fn default() -> Self {
        Self {
            initial_increment: default_initial_increment(),
            floor: default_floor(),
            flatness_threshold: default_flatness_threshold(),
            min_visits: default_min_visits(),
            decay_factor: default_decay_factor(),
            freeze_in_production: default_freeze(),
        }
    }
}

impl WangLandauConfig {
    /// Rejects schedules that could never terminate or never start.
    pub fn validate(&self) -> Result<(), GsstError> {
        let schedule_error = |code: &str, message: &str| {
            GsstError::Config(
                ErrorInfo::new(code, message)
                    .with_context("initial_increment", self.initial_increment.to_string())
                    .with_context("floor", self.floor.to_string()),
            )
        };
        if !(self.floor.is_finite() && self.floor > 0.0) {
            return Err(schedule_error("increment-floor", "floor must be positive"));
        }
        if !self.initial_increment.is_finite() || self.floor >= self.initial_increment {
            return Err(schedule_error(
                "increment-floor",
                "floor must be smaller than the initial increment",
            ));
        }
        if !(self.flatness_threshold.is_finite() && self.flatness_threshold > 0.0) {
            return Err(GsstError::Config(
                ErrorInfo::new("flatness-threshold", "flatness threshold must be positive")
                    .with_context("flatness_threshold", self.flatness_threshold.to_string()),
            ));
        }
        if !(self.decay_factor > 0.0 && self.decay_factor < 1.0) {
            return Err(GsstError::Config(
                ErrorInfo::new("decay-factor", "decay factor must lie in (0, 1)")
                    .with_context("decay_factor", self.decay_factor.to_string()),
            ));
        }
        Ok(())
    }
}

/// Acceptance test settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AcceptanceConfig {
    /// Ceiling applied to |ΔU| before exponentiation.
    #[serde(default = "default_max_delta_u")]
    pub max_delta_u: f64,
}

fn default_max_delta_u() -> f64 {
    500.0
}

impl Default for AcceptanceConfig {
    fn default() -> Self {
        Self {
            max_delta_u: default_max_delta_u(),
        }
    }
}

impl AcceptanceConfig {
    fn validate(&self) -> Result<(), GsstError> {
        if !(self.max_delta_u.is_finite() && self.max_delta_u > 0.0) {
            return Err(GsstError::Config(
                ErrorInfo::new("delta-u-ceiling", "max_delta_u must be positive and finite")
                    .with_context("max_delta_u", self.max_delta_u.to_string()),
            ));
        }
        Ok(())
    }
}

/// When recoverable engine faults become fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaultPolicy {
    /// Consecutive faulted steps tolerated before the run aborts.
    #[serde(default = "default_max_consecutive")]
    pub max_consecutive: u32,
}

fn default_max_consecutive() -> u32 {
    10
}

impl Default for FaultPolicy {
    fn default() -> Self {
        Self {
            max_consecutive: default_max_consecutive(),
        }
    }
}

impl FaultPolicy {
    fn validate(&self) -> Result<(), GsstError> {
        if self.max_consecutive == 0 {
            return Err(GsstError::config(
                "fault-threshold",
                "max_consecutive must allow at least one fault",
            ));
        }
        Ok(())
    }
}

/// Initial weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightsConfig {
    /// Pre-equilibrated weights, one per state. Zeros when absent.
    #[serde(default)]
    pub initial: Option<Vec<f64>>,
    /// Learn weights with Wang-Landau. When false the run starts in production.
    #[serde(default = "default_learn")]
    pub learn: bool,
}

fn default_learn() -> bool {
    true
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            initial: None,
            learn: default_learn(),
        }
    }
}

/// Checkpointing configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointConfig {
    /// Attempts between checkpoint writes (0 disables checkpoints).
    #[serde(default)]
    pub interval: u64,
    /// Maximum number of checkpoints to retain.
    #[serde(default = "default_checkpoint_retention")]
    pub max_to_keep: usize,
}

fn default_checkpoint_retention() -> usize {
    4
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            interval: 0,
            max_to_keep: default_checkpoint_retention(),
        }
    }
}

/// Deterministic seeding configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedPolicy {
    /// Master seed used for the run.
    #[serde(default = "default_master_seed")]
    pub master_seed: u64,
    /// Optional label recorded in manifests.
    #[serde(default)]
    pub label: Option<String>,
}

fn default_master_seed() -> u64 {
    0x6557_5354_0000_0001
}

impl Default for SeedPolicy {
    fn default() -> Self {
        Self {
            master_seed: default_master_seed(),
            label: None,
        }
    }
}

/// Output directory layout configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Root directory for run artefacts. Nothing is written when absent.
    #[serde(default)]
    pub run_directory: Option<PathBuf>,
    /// Trace filename relative to `run_directory`.
    #[serde(default = "default_trace_filename")]
    pub trace_file: PathBuf,
    /// Manifest filename relative to `run_directory`.
    #[serde(default = "default_manifest_filename")]
    pub manifest_file: PathBuf,
    /// Subdirectory used for checkpoint files.
    #[serde(default = "default_checkpoint_dir")]
    pub checkpoint_dir: PathBuf,
    /// Free-energy report filename relative to `run_directory`.
    #[serde(default = "default_report_filename")]
    pub report_file: PathBuf,
}

fn default_trace_filename() -> PathBuf {
    PathBuf::from("trace.csv")
}

fn default_manifest_filename() -> PathBuf {
    PathBuf::from("manifest.json")
}

fn default_checkpoint_dir() -> PathBuf {
    PathBuf::from("checkpoints")
}

fn default_report_filename() -> PathBuf {
    PathBuf::from("free_energies.json")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            run_directory: None,
            trace_file: default_trace_filename(),
            manifest_file: default_manifest_filename(),
            checkpoint_dir: default_checkpoint_dir(),
            report_file: default_report_filename(),
        }
    }
}
