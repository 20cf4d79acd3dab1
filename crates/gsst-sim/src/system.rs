//! Simulation configuration: a [`RunConfig`] plus the synthetic system to drive.

use std::error::Error;
use std::fs;
use std::path::Path;

use gsst_core::GsstError;
use gsst_temper::testsystems::{FixedLadderSystem, HarmonicLadderSystem};
use gsst_temper::{Dynamics, RunConfig, State, TemperingEngine};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    #[serde(flatten)]
    pub run: RunConfig,
    #[serde(default)]
    pub system: SystemConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SystemConfig {
    /// Reduced potential rising by `gap` per rung.
    Linear { gap: f64 },
    /// Explicit per-state reduced potentials.
    Fixed { energies: Vec<f64> },
    /// Harmonic oscillator family resampled exactly between attempts.
    Harmonic {
        offsets: Vec<f64>,
        force_constants: Vec<f64>,
        #[serde(default)]
        seed: Option<u64>,
    },
}

impl Default for SystemConfig {
    fn default() -> Self {
        SystemConfig::Linear { gap: 1.0 }
    }
}

impl SimConfig {
    pub fn load(path: &Path) -> Result<Self, Box<dyn Error>> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&contents)?)
    }
}

pub enum SimSystem {
    Fixed(FixedLadderSystem),
    Harmonic(HarmonicLadderSystem),
}

impl SimSystem {
    /// Builds the system for a ladder of `states` rungs.
    pub fn build(config: &SystemConfig, states: usize, master_seed: u64) -> Result<Self, GsstError> {
        match config {
            SystemConfig::Linear { gap } => {
                Ok(SimSystem::Fixed(FixedLadderSystem::linear(states, *gap)))
            }
            SystemConfig::Fixed { energies } => {
                if energies.len() != states {
                    return Err(GsstError::config(
                        "system-shape",
                        format!("{} energies for {states} ladder states", energies.len()),
                    ));
                }
                Ok(SimSystem::Fixed(FixedLadderSystem::new(energies.clone())))
            }
            SystemConfig::Harmonic {
                offsets,
                force_constants,
                seed,
            } => {
                if offsets.len() != states {
                    return Err(GsstError::config(
                        "system-shape",
                        format!("{} oscillators for {states} ladder states", offsets.len()),
                    ));
                }
                let system = HarmonicLadderSystem::new(
                    offsets.clone(),
                    force_constants.clone(),
                    seed.unwrap_or(master_seed ^ 0x5eed),
                )?;
                Ok(SimSystem::Harmonic(system))
            }
        }
    }

    /// Analytic free energies relative to state 0.
    pub fn analytic_free_energies(&self) -> Vec<f64> {
        match self {
            SimSystem::Fixed(system) => system.analytic_free_energies(),
            SimSystem::Harmonic(system) => system.analytic_free_energies(),
        }
    }
}

impl TemperingEngine for SimSystem {
    fn reduced_potential(&mut self, state: &State) -> Result<f64, GsstError> {
        match self {
            SimSystem::Fixed(system) => system.reduced_potential(state),
            SimSystem::Harmonic(system) => system.reduced_potential(state),
        }
    }

    fn apply_state(&mut self, state: &State) -> Result<(), GsstError> {
        match self {
            SimSystem::Fixed(system) => system.apply_state(state),
            SimSystem::Harmonic(system) => system.apply_state(state),
        }
    }
}

impl Dynamics for SimSystem {
    fn advance(&mut self, steps: usize) -> Result<(), GsstError> {
        match self {
            SimSystem::Fixed(system) => system.advance(steps),
            SimSystem::Harmonic(system) => system.advance(steps),
        }
    }
}
