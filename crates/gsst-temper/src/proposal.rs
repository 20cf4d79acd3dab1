use gsst_core::errors::ErrorInfo;
use gsst_core::{GsstError, RngHandle};
use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::ladder::StateLadder;
use crate::weights::WeightTable;

/// Candidate distribution used by independence proposals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum IndependenceDistribution {
    /// Every ladder state is equally likely.
    #[default]
    Uniform,
    /// State `k` is drawn with probability proportional to `exp(w_k)`.
    Weighted,
}

/// Closed set of proposal strategies, selected once per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ProposalStrategy {
    /// Uniformly pick one of the adjacent states.
    #[default]
    Local,
    /// Draw from the whole ladder independently of the current state.
    Independence {
        /// Candidate distribution.
        #[serde(default)]
        distribution: IndependenceDistribution,
    },
    /// Draw from the full conditional `p_k ∝ exp(-u_k - w_k)` of the current
    /// configuration. Needs the reduced potential at every ladder state.
    Gibbs,
}

/// Candidate state together with its forward and reverse proposal log probabilities.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    /// Proposed state index.
    pub candidate: usize,
    /// `ln q(current -> candidate)`.
    pub log_forward: f64,
    /// `ln q(candidate -> current)`.
    pub log_reverse: f64,
}

impl Proposal {
    /// Log of the Hastings correction `q(candidate -> current) / q(current -> candidate)`.
    pub fn log_ratio(&self) -> f64 {
        if self.log_forward == self.log_reverse {
            0.0
        } else {
            self.log_reverse - self.log_forward
        }
    }

    /// True when the candidate is the current state.
    pub fn is_self_transition(&self, current: usize) -> bool {
        self.candidate == current
    }
}

/// Proposes the next ladder state for the current configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProposalSampler {
    strategy: ProposalStrategy,
}

impl ProposalSampler {
    /// Creates a sampler for `strategy`.
    pub fn new(strategy: ProposalStrategy) -> Self {
        Self { strategy }
    }

    /// Strategy in use.
    pub fn strategy(&self) -> ProposalStrategy {
        self.strategy
    }

    /// True when the strategy needs reduced potentials for every state before proposing.
    pub fn needs_all_energies(&self) -> bool {
        matches!(self.strategy, ProposalStrategy::Gibbs)
    }

    /// Draws a candidate.
    ///
    /// `energies` holds the reduced potential of the current configuration at
    /// every state and is only consulted by [`ProposalStrategy::Gibbs`].
    pub fn propose(
        &self,
        current: usize,
        ladder: &StateLadder,
        weights: &WeightTable,
        energies: Option<&[f64]>,
        rng: &mut RngHandle,
    ) -> Result<Proposal, GsstError> {
        ladder.checked_state(current)?;
        if weights.len() != ladder.len() {
            return Err(shape_mismatch("weights", weights.len(), ladder.len()));
        }
        match self.strategy {
            ProposalStrategy::Local => propose_local(current, ladder, rng),
            ProposalStrategy::Independence {
                distribution: IndependenceDistribution::Uniform,
            } => {
                let n = ladder.len();
                let candidate = rng.gen_range(0..n);
                let log_q = -(n as f64).ln();
                Ok(Proposal {
                    candidate,
                    log_forward: log_q,
                    log_reverse: log_q,
                })
            }
            ProposalStrategy::Independence {
                distribution: IndependenceDistribution::Weighted,
            } => {
                let log_q = normalized_log_probabilities(&weights.weights());
                Ok(draw_independent(current, &log_q, rng))
            }
            ProposalStrategy::Gibbs => {
                let energies = energies.ok_or_else(|| {
                    GsstError::State(ErrorInfo::new(
                        "energies-missing",
                        "gibbs proposals need the reduced potential at every state",
                    ))
                })?;
                if energies.len() != ladder.len() {
                    return Err(shape_mismatch("energies", energies.len(), ladder.len()));
                }
                let log_p: Vec<f64> = energies
                    .iter()
                    .zip(weights.weights())
                    .map(|(u, w)| -u - w)
                    .collect();
                let log_p = normalized_log_probabilities(&log_p);
                Ok(draw_independent(current, &log_p, rng))
            }
        }
    }
}

fn propose_local(
    current: usize,
    ladder: &StateLadder,
    rng: &mut RngHandle,
) -> Result<Proposal, GsstError> {
    let neighbors = ladder.neighbors(current);
    let Some(&candidate) = neighbors.choose(rng) else {
        return Err(GsstError::State(
            ErrorInfo::new("state-isolated", "state has no adjacent state")
                .with_context("state", current.to_string()),
        ));
    };
    Ok(Proposal {
        candidate,
        log_forward: -(ladder.degree(current) as f64).ln(),
        log_reverse: -(ladder.degree(candidate) as f64).ln(),
    })
}

fn draw_independent(current: usize, log_q: &[f64], rng: &mut RngHandle) -> Proposal {
    // No finite mass anywhere leaves the walker where it is.
    let candidate = WeightedIndex::new(log_q.iter().map(|lp| lp.exp()))
        .map(|categorical| categorical.sample(rng))
        .unwrap_or(current);
    Proposal {
        candidate,
        log_forward: log_q[candidate],
        log_reverse: log_q[current],
    }
}

/// Numerically stable `ln(sum(exp(values)))`.
pub fn log_sum_exp(values: &[f64]) -> f64 {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return max;
    }
    let sum: f64 = values.iter().map(|value| (value - max).exp()).sum();
    max + sum.ln()
}

/// Shifts `log_weights` so that their exponentials sum to one.
pub fn normalized_log_probabilities(log_weights: &[f64]) -> Vec<f64> {
    let offset = log_sum_exp(log_weights);
    log_weights.iter().map(|value| value - offset).collect()
}

fn shape_mismatch(what: &str, got: usize, expected: usize) -> GsstError {
    GsstError::State(
        ErrorInfo::new("shape-mismatch", format!("{what} length does not match the ladder"))
            .with_context("got", got.to_string())
            .with_context("expected", expected.to_string()),
    )
}
