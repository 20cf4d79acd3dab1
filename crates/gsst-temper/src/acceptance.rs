use gsst_core::errors::ErrorInfo;
use gsst_core::{GsstError, RngHandle};
use serde::{Deserialize, Serialize};

/// Quantities entering one Metropolis-Hastings test.
///
/// Both reduced potentials are evaluated at the same configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AcceptanceInputs {
    /// Reduced potential under the active state.
    pub current_energy: f64,
    /// Reduced potential under the candidate state.
    pub candidate_energy: f64,
    /// Learned weight of the active state.
    pub current_weight: f64,
    /// Learned weight of the candidate state.
    pub candidate_weight: f64,
    /// `ln(q_reverse / q_forward)`; zero for symmetric proposals.
    pub log_proposal_ratio: f64,
}

/// Result of an acceptance test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AcceptanceDecision {
    /// Metropolis-Hastings acceptance probability.
    pub probability: f64,
    /// Uniform draw compared against `probability`.
    pub draw: f64,
    /// Whether the move was accepted.
    pub accepted: bool,
    /// True when the energy difference hit the ceiling.
    pub clamped: bool,
}

/// Computes `min(1, exp(-ΔU + (w_current - w_candidate)) * q_reverse / q_forward)`.
///
/// ΔU is clamped to `±max_delta_u` and the whole expression is evaluated in
/// log space, so severe overlaps (ΔU → +∞) come out as a clean rejection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcceptanceEvaluator {
    max_delta_u: f64,
}

impl AcceptanceEvaluator {
    /// Creates an evaluator with the given ΔU ceiling.
    pub fn new(max_delta_u: f64) -> Result<Self, GsstError> {
        if !(max_delta_u.is_finite() && max_delta_u > 0.0) {
            return Err(GsstError::Config(
                ErrorInfo::new("delta-u-ceiling", "the ΔU ceiling must be positive and finite")
                    .with_context("max_delta_u", max_delta_u.to_string()),
            ));
        }
        Ok(Self { max_delta_u })
    }

    /// Configured ceiling.
    pub fn max_delta_u(&self) -> f64 {
        self.max_delta_u
    }

    /// Clamped energy difference and whether clamping occurred.
    pub fn clamped_delta(&self, current_energy: f64, candidate_energy: f64) -> (f64, bool) {
        let delta = candidate_energy - current_energy;
        if delta.is_nan() {
            // inf - inf: both states in overlap; treat as uphill.
            return (self.max_delta_u, true);
        }
        if delta > self.max_delta_u {
            (self.max_delta_u, true)
        } else if delta < -self.max_delta_u {
            (-self.max_delta_u, true)
        } else {
            (delta, false)
        }
    }

    /// Log acceptance probability (≤ 0) and the clamp flag.
    pub fn log_probability(&self, inputs: &AcceptanceInputs) -> (f64, bool) {
        let (delta_u, clamped) = self.clamped_delta(inputs.current_energy, inputs.candidate_energy);
        let delta_w = inputs.current_weight - inputs.candidate_weight;
        let log_a = -delta_u + delta_w + inputs.log_proposal_ratio;
        if log_a.is_nan() {
            return (f64::NEG_INFINITY, clamped);
        }
        (log_a.min(0.0), clamped)
    }

    /// Acceptance probability in `[0, 1]`.
    pub fn probability(&self, inputs: &AcceptanceInputs) -> f64 {
        self.log_probability(inputs).0.exp()
    }

    /// Draws once from `rng` and decides.
    pub fn decide(&self, inputs: &AcceptanceInputs, rng: &mut RngHandle) -> AcceptanceDecision {
        let (log_a, clamped) = self.log_probability(inputs);
        let probability = log_a.exp();
        let draw = rng.uniform();
        AcceptanceDecision {
            probability,
            draw,
            accepted: draw < probability,
            clamped,
        }
    }
}
