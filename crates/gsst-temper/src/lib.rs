#![deny(missing_docs)]

//! Generalized serial simulated tempering.
//!
//! A [`TemperingController`] walks one configuration across a ladder of
//! tempering states (temperatures, alchemical lambdas, restraint targets).
//! Each attempt proposes a new state, asks the external engine for the
//! reduced potential of the current configuration under both states, and
//! accepts with a Metropolis-Hastings test corrected by learned weights. The
//! weights are estimated on the fly with the Wang-Landau scheme until the
//! increment reaches its floor, after which they estimate the relative free
//! energies of the states.

/// Metropolis-Hastings acceptance test.
pub mod acceptance;
/// Session checkpoints.
pub mod checkpoint;
/// YAML configuration schema and defaults.
pub mod config;
/// Per-session state machine.
pub mod controller;
/// Deterministic seed derivation helpers.
pub mod determinism;
/// Contract with the external simulation engine.
pub mod engine;
/// Run driver and `run`/`resume` entry points.
pub mod kernel;
/// Ordered ladder of tempering states.
pub mod ladder;
/// Run manifest serialization helpers.
pub mod manifest;
pub mod merge;
/// Run trace recording.
pub mod metrics;
/// Proposal strategies.
pub mod proposal;
/// Free-energy reports.
pub mod report;
pub mod testsystems;
/// Wang-Landau weight table.
pub mod weights;

pub use acceptance::{AcceptanceDecision, AcceptanceEvaluator, AcceptanceInputs};
pub use checkpoint::SessionCheckpoint;
pub use config::{
    AcceptanceConfig, CheckpointConfig, FaultPolicy, LadderConfig, OutputConfig, RunConfig,
    SeedPolicy, WangLandauConfig, WeightsConfig,
};
pub use controller::{
    ControllerSettings, Phase, PhaseTransition, StepCounters, StepOutcome, TemperingController,
    TemperingSession,
};
pub use engine::{Dynamics, TemperingEngine};
pub use kernel::{resume, resume_from, run, RunSummary};
pub use ladder::{State, StateLadder};
pub use merge::{merge_checkpoints, merge_tables};
pub use proposal::{IndependenceDistribution, Proposal, ProposalSampler, ProposalStrategy};
pub use report::FreeEnergyReport;
pub use weights::{Normalization, WeightEntry, WeightTable, ZeroPoint};
