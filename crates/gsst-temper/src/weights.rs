use gsst_core::errors::ErrorInfo;
use gsst_core::GsstError;
use serde::{Deserialize, Serialize};

/// Per-state Wang-Landau accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightEntry {
    /// Learned log weight of the state.
    pub weight: f64,
    /// Visits since the histogram was last reset.
    pub visits: u64,
    /// Visits over the lifetime of the table.
    pub total_visits: u64,
}

impl WeightEntry {
    fn with_weight(weight: f64) -> Self {
        Self {
            weight,
            visits: 0,
            total_visits: 0,
        }
    }
}

/// Zero-point convention currently satisfied by the stored weights.
///
/// Only weight differences carry meaning. The convention is recorded so that
/// consumers of a persisted table know which offset was removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ZeroPoint {
    /// Arbitrary offset, e.g. the raw accumulation since construction.
    #[default]
    Unnormalized,
    /// Weights sum to zero.
    Mean,
    /// The weight of `state` is zero.
    Reference {
        /// Pinned state index.
        state: usize,
    },
}

/// Normalization requested by a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Normalization {
    /// Subtract the mean weight.
    ZeroMean,
    /// Subtract the weight of `state`.
    Pin {
        /// State whose weight becomes zero.
        state: usize,
    },
}

/// Mutable per-state weight estimates with their visit histogram.
///
/// The stationary occupation of state `k` is proportional to
/// `Z_k * exp(-w_k)`, so a flat histogram is reached when `w_k` equals the log
/// partition function of the state up to a shared constant. The reduced free
/// energy difference `f_k - f_j` is therefore `-(w_k - w_j)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightTable {
    entries: Vec<WeightEntry>,
    #[serde(default)]
    zero_point: ZeroPoint,
}

impl WeightTable {
    /// Creates a table of `len` zero weights.
    pub fn zeros(len: usize) -> Self {
        Self {
            entries: vec![WeightEntry::with_weight(0.0); len],
            zero_point: ZeroPoint::Unnormalized,
        }
    }

    /// Creates a table from initial weight guesses.
    pub fn from_weights(weights: &[f64]) -> Result<Self, GsstError> {
        if let Some(position) = weights.iter().position(|w| !w.is_finite()) {
            return Err(GsstError::Config(
                ErrorInfo::new("weights-non-finite", "initial weights must be finite")
                    .with_context("index", position.to_string()),
            ));
        }
        Ok(Self {
            entries: weights.iter().copied().map(WeightEntry::with_weight).collect(),
            zero_point: ZeroPoint::Unnormalized,
        })
    }

    /// Rebuilds a table from persisted entries.
    pub fn from_entries(entries: Vec<WeightEntry>, zero_point: ZeroPoint) -> Self {
        Self {
            entries,
            zero_point,
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Read-only view of the entries.
    pub fn entries(&self) -> &[WeightEntry] {
        &self.entries
    }

    /// Convention satisfied by the current weights.
    pub fn zero_point(&self) -> ZeroPoint {
        self.zero_point
    }

    /// Weight of `state`.
    pub fn weight(&self, state: usize) -> Result<f64, GsstError> {
        self.entry(state).map(|entry| entry.weight)
    }

    /// All weights in ladder order.
    pub fn weights(&self) -> Vec<f64> {
        self.entries.iter().map(|entry| entry.weight).collect()
    }

    /// Visits since the last histogram reset, in ladder order.
    pub fn visits(&self) -> Vec<u64> {
        self.entries.iter().map(|entry| entry.visits).collect()
    }

    /// Sum of the lifetime visit counters.
    pub fn total_visits(&self) -> u64 {
        self.entries.iter().map(|entry| entry.total_visits).sum()
    }

    /// Smallest per-state visit count since the last reset.
    pub fn min_visits(&self) -> u64 {
        self.entries.iter().map(|entry| entry.visits).min().unwrap_or(0)
    }

    /// Adds `increment` to the weight of `state` and counts one visit.
    ///
    /// An index outside the table is an error; nothing is clamped.
    pub fn reinforce(&mut self, state: usize, increment: f64) -> Result<(), GsstError> {
        if !increment.is_finite() {
            return Err(GsstError::State(
                ErrorInfo::new("increment-non-finite", "weight increment must be finite")
                    .with_context("increment", increment.to_string()),
            ));
        }
        let len = self.entries.len();
        let entry = self.entries.get_mut(state).ok_or_else(|| out_of_range(state, len))?;
        entry.weight += increment;
        entry.visits += 1;
        entry.total_visits += 1;
        if increment != 0.0 {
            self.zero_point = ZeroPoint::Unnormalized;
        }
        Ok(())
    }

    /// `(max visits - min visits) / mean visits` over the current histogram.
    ///
    /// Returns infinity while the histogram is empty.
    pub fn flatness_ratio(&self) -> f64 {
        let visits = self.visits();
        let total: u64 = visits.iter().sum();
        if visits.is_empty() || total == 0 {
            return f64::INFINITY;
        }
        let max = visits.iter().copied().max().unwrap_or(0);
        let min = visits.iter().copied().min().unwrap_or(0);
        let mean = total as f64 / visits.len() as f64;
        (max - min) as f64 / mean
    }

    /// Zeroes the per-stage histogram. Lifetime counters are kept.
    pub fn reset_visits(&mut self) {
        for entry in &mut self.entries {
            entry.visits = 0;
        }
    }

    /// Shifts all weights by a common offset to satisfy `policy`.
    ///
    /// Applying the same policy twice leaves the weights unchanged.
    pub fn normalize(&mut self, policy: Normalization) -> Result<(), GsstError> {
        match policy {
            Normalization::ZeroMean => {
                if self.zero_point == ZeroPoint::Mean || self.entries.is_empty() {
                    return Ok(());
                }
                let mean = self.entries.iter().map(|entry| entry.weight).sum::<f64>()
                    / self.entries.len() as f64;
                for entry in &mut self.entries {
                    entry.weight -= mean;
                }
                self.zero_point = ZeroPoint::Mean;
            }
            Normalization::Pin { state } => {
                let offset = self.weight(state)?;
                for entry in &mut self.entries {
                    entry.weight -= offset;
                }
                self.zero_point = ZeroPoint::Reference { state };
            }
        }
        Ok(())
    }

    /// Weights relative to `reference`, leaving the table untouched.
    pub fn relative_to(&self, reference: usize) -> Result<Vec<f64>, GsstError> {
        let offset = self.weight(reference)?;
        Ok(self.entries.iter().map(|entry| entry.weight - offset).collect())
    }

    fn entry(&self, state: usize) -> Result<&WeightEntry, GsstError> {
        self.entries
            .get(state)
            .ok_or_else(|| out_of_range(state, self.entries.len()))
    }
}

fn out_of_range(state: usize, len: usize) -> GsstError {
    GsstError::State(
        ErrorInfo::new("state-out-of-range", "state index outside the weight table")
            .with_context("index", state.to_string())
            .with_context("states", len.to_string()),
    )
}
