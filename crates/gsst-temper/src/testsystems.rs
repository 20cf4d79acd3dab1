//! Synthetic engines with known free energies.
//!
//! Both systems honour the [`TemperingEngine`] contract and can be told to
//! misbehave for particular states, which is how the fault-handling paths
//! are exercised.

use std::collections::BTreeSet;

use gsst_core::errors::ErrorInfo;
use gsst_core::{GsstError, RngHandle};
use rand_distr::{Distribution, Normal};

use crate::engine::{Dynamics, TemperingEngine};
use crate::ladder::State;

/// Deliberate contract violations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FaultPlan {
    /// States whose energy query fails.
    pub energy_failures: BTreeSet<usize>,
    /// States whose energy query returns NaN.
    pub nan_energies: BTreeSet<usize>,
    /// States the engine refuses to apply.
    pub apply_failures: BTreeSet<usize>,
}

impl FaultPlan {
    fn check_energy(&self, index: usize) -> Result<(), GsstError> {
        if self.energy_failures.contains(&index) {
            return Err(GsstError::Engine(
                ErrorInfo::new("energy-unavailable", "engine has no energy for this state")
                    .with_context("state", index.to_string()),
            ));
        }
        Ok(())
    }

    fn check_apply(&self, index: usize) -> Result<(), GsstError> {
        if self.apply_failures.contains(&index) {
            return Err(GsstError::Engine(
                ErrorInfo::new("apply-refused", "engine refused the state parameters")
                    .with_context("state", index.to_string()),
            ));
        }
        Ok(())
    }
}

fn unknown_state(index: usize, states: usize) -> GsstError {
    GsstError::Engine(
        ErrorInfo::new("unknown-state", "engine was asked about a state it does not model")
            .with_context("state", index.to_string())
            .with_context("states", states.to_string()),
    )
}

/// Reduced potential per state that does not depend on any configuration.
///
/// With energies `u_k` the learned weights converge to `-u_k` up to a
/// constant.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedLadderSystem {
    energies: Vec<f64>,
    active: usize,
    faults: FaultPlan,
    applied: u64,
}

impl FixedLadderSystem {
    /// System with the given per-state reduced potentials.
    pub fn new(energies: Vec<f64>) -> Self {
        Self {
            energies,
            active: 0,
            faults: FaultPlan::default(),
            applied: 0,
        }
    }

    /// `states` states whose energy rises by `gap` per rung.
    pub fn linear(states: usize, gap: f64) -> Self {
        Self::new((0..states).map(|k| k as f64 * gap).collect())
    }

    /// Replaces the fault plan.
    pub fn with_faults(mut self, faults: FaultPlan) -> Self {
        self.faults = faults;
        self
    }

    /// Mutable access to the fault plan.
    pub fn faults_mut(&mut self) -> &mut FaultPlan {
        &mut self.faults
    }

    /// State currently applied.
    pub fn active(&self) -> usize {
        self.active
    }

    /// Successful `apply_state` calls so far.
    pub fn applied(&self) -> u64 {
        self.applied
    }

    /// `f_k - f_0`, which here is just `u_k - u_0`.
    pub fn analytic_free_energies(&self) -> Vec<f64> {
        let base = self.energies.first().copied().unwrap_or(0.0);
        self.energies.iter().map(|u| u - base).collect()
    }
}

impl TemperingEngine for FixedLadderSystem {
    fn reduced_potential(&mut self, state: &State) -> Result<f64, GsstError> {
        let index = state.index();
        self.faults.check_energy(index)?;
        if self.faults.nan_energies.contains(&index) {
            return Ok(f64::NAN);
        }
        self.energies
            .get(index)
            .copied()
            .ok_or_else(|| unknown_state(index, self.energies.len()))
    }

    fn apply_state(&mut self, state: &State) -> Result<(), GsstError> {
        let index = state.index();
        if index >= self.energies.len() {
            return Err(unknown_state(index, self.energies.len()));
        }
        self.faults.check_apply(index)?;
        self.active = index;
        self.applied += 1;
        Ok(())
    }
}

impl Dynamics for FixedLadderSystem {
    fn advance(&mut self, _steps: usize) -> Result<(), GsstError> {
        Ok(())
    }
}

/// One-dimensional harmonic oscillator with state-dependent offset and force constant.
///
/// `u_k(x) = ½ K_k (x - O_k)²`. Advancing the dynamics redraws `x` exactly from
/// the Boltzmann distribution of the applied state, so successive attempts
/// see independent configurations.
#[derive(Debug, Clone)]
pub struct HarmonicLadderSystem {
    offsets: Vec<f64>,
    force_constants: Vec<f64>,
    active: usize,
    position: f64,
    rng: RngHandle,
    faults: FaultPlan,
}

impl HarmonicLadderSystem {
    /// Builds the oscillator family. Force constants must be positive and
    /// both vectors must have the same length.
    pub fn new(offsets: Vec<f64>, force_constants: Vec<f64>, seed: u64) -> Result<Self, GsstError> {
        if offsets.len() != force_constants.len() || offsets.is_empty() {
            return Err(GsstError::Config(
                ErrorInfo::new("oscillator-shape", "offsets and force constants must pair up")
                    .with_context("offsets", offsets.len().to_string())
                    .with_context("force_constants", force_constants.len().to_string()),
            ));
        }
        if let Some(k) = force_constants.iter().position(|k| !(k.is_finite() && *k > 0.0)) {
            return Err(GsstError::Config(
                ErrorInfo::new("oscillator-force-constant", "force constants must be positive")
                    .with_context("state", k.to_string()),
            ));
        }
        let position = offsets[0];
        Ok(Self {
            offsets,
            force_constants,
            active: 0,
            position,
            rng: RngHandle::from_seed(seed),
            faults: FaultPlan::default(),
        })
    }

    /// Replaces the fault plan.
    pub fn with_faults(mut self, faults: FaultPlan) -> Self {
        self.faults = faults;
        self
    }

    /// Current position.
    pub fn position(&self) -> f64 {
        self.position
    }

    /// `f_k - f_0 = ½ ln(K_k / K_0)`.
    pub fn analytic_free_energies(&self) -> Vec<f64> {
        let base = self.force_constants[0];
        self.force_constants
            .iter()
            .map(|k| 0.5 * (k / base).ln())
            .collect()
    }
}

impl TemperingEngine for HarmonicLadderSystem {
    fn reduced_potential(&mut self, state: &State) -> Result<f64, GsstError> {
        let index = state.index();
        self.faults.check_energy(index)?;
        if self.faults.nan_energies.contains(&index) {
            return Ok(f64::NAN);
        }
        let (offset, k) = self
            .offsets
            .get(index)
            .zip(self.force_constants.get(index))
            .ok_or_else(|| unknown_state(index, self.offsets.len()))?;
        let dx = self.position - offset;
        Ok(0.5 * k * dx * dx)
    }

    fn apply_state(&mut self, state: &State) -> Result<(), GsstError> {
        let index = state.index();
        if index >= self.offsets.len() {
            return Err(unknown_state(index, self.offsets.len()));
        }
        self.faults.check_apply(index)?;
        self.active = index;
        Ok(())
    }
}

impl Dynamics for HarmonicLadderSystem {
    fn advance(&mut self, steps: usize) -> Result<(), GsstError> {
        if steps == 0 {
            return Ok(());
        }
        let sigma = self.force_constants[self.active].recip().sqrt();
        let boltzmann = Normal::new(self.offsets[self.active], sigma).map_err(|err| {
            GsstError::Engine(
                ErrorInfo::new("oscillator-width", err.to_string())
                    .with_context("state", self.active.to_string()),
            )
        })?;
        self.position = boltzmann.sample(&mut self.rng);
        Ok(())
    }
}
