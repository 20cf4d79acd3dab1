use gsst_core::errors::ErrorInfo;
use gsst_core::GsstError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One rung of the tempering ladder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct State {
    index: usize,
    coordinate: f64,
    term: String,
}

impl State {
    /// Position of the state within its ladder.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Tempering coordinate (temperature, lambda or collective-variable target).
    pub fn coordinate(&self) -> f64 {
        self.coordinate
    }

    /// Name of the bias or potential term this state controls.
    pub fn term(&self) -> &str {
        &self.term
    }
}

/// Direction in which the tempering coordinate runs along the ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Ordering {
    /// Coordinates strictly increase with the index.
    Increasing,
    /// Coordinates strictly decrease with the index.
    Decreasing,
}

/// Immutable ordered set of tempering states.
///
/// Neighbours are the previous and next index. There is no wraparound, so the
/// two end states each have a single neighbour.
#[derive(Debug, Clone, PartialEq)]
pub struct StateLadder {
    states: Vec<State>,
    ordering: Ordering,
}

impl StateLadder {
    /// Builds a ladder over `coordinates` controlling the term `term`.
    ///
    /// Fails with a configuration error when fewer than two coordinates are
    /// given, when a coordinate is not finite, or when the sequence is not
    /// strictly monotonic (which also rules out duplicates).
    pub fn new(term: impl Into<String>, coordinates: &[f64]) -> Result<Self, GsstError> {
        let term = term.into();
        if coordinates.len() < 2 {
            return Err(GsstError::Config(
                ErrorInfo::new("ladder-too-short", "a ladder needs at least two states")
                    .with_context("states", coordinates.len().to_string()),
            ));
        }
        if let Some(position) = coordinates.iter().position(|value| !value.is_finite()) {
            return Err(GsstError::Config(
                ErrorInfo::new("ladder-non-finite", "ladder coordinates must be finite")
                    .with_context("index", position.to_string()),
            ));
        }
        let ordering = if coordinates[1] > coordinates[0] {
            Ordering::Increasing
        } else {
            Ordering::Decreasing
        };
        for (index, pair) in coordinates.windows(2).enumerate() {
            let ok = match ordering {
                Ordering::Increasing => pair[1] > pair[0],
                Ordering::Decreasing => pair[1] < pair[0],
            };
            if !ok {
                let code = if pair[1] == pair[0] {
                    "ladder-duplicate"
                } else {
                    "ladder-not-monotonic"
                };
                return Err(GsstError::Config(
                    ErrorInfo::new(code, "ladder coordinates must be strictly monotonic")
                        .with_context("index", (index + 1).to_string())
                        .with_context("previous", pair[0].to_string())
                        .with_context("value", pair[1].to_string()),
                ));
            }
        }
        let states = coordinates
            .iter()
            .enumerate()
            .map(|(index, &coordinate)| State {
                index,
                coordinate,
                term: term.clone(),
            })
            .collect();
        Ok(Self { states, ordering })
    }

    /// Number of states.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Always false; a ladder holds at least two states.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Name of the controlled term.
    pub fn term(&self) -> &str {
        &self.states[0].term
    }

    /// Direction of the coordinate sequence.
    pub fn ordering(&self) -> Ordering {
        self.ordering
    }

    /// Returns the state at `index`.
    pub fn state(&self, index: usize) -> Option<&State> {
        self.states.get(index)
    }

    /// Returns the state at `index` or a state error naming the bad index.
    pub fn checked_state(&self, index: usize) -> Result<&State, GsstError> {
        self.states.get(index).ok_or_else(|| {
            GsstError::State(
                ErrorInfo::new("state-out-of-range", "state index outside the ladder")
                    .with_context("index", index.to_string())
                    .with_context("states", self.states.len().to_string()),
            )
        })
    }

    /// Coordinate of the state at `index`.
    pub fn coordinate(&self, index: usize) -> Option<f64> {
        self.states.get(index).map(State::coordinate)
    }

    /// All coordinates in ladder order.
    pub fn coordinates(&self) -> Vec<f64> {
        self.states.iter().map(State::coordinate).collect()
    }

    /// Iterates over the states in ladder order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &State> + '_ {
        self.states.iter()
    }

    /// Index of the previous state, if any.
    pub fn previous(&self, index: usize) -> Option<usize> {
        if index == 0 || index >= self.states.len() {
            None
        } else {
            Some(index - 1)
        }
    }

    /// Index of the next state, if any.
    pub fn next(&self, index: usize) -> Option<usize> {
        if index + 1 < self.states.len() {
            Some(index + 1)
        } else {
            None
        }
    }

    /// Adjacent indices of `index` in ladder order (one at the ends, two inside).
    pub fn neighbors(&self, index: usize) -> Vec<usize> {
        self.previous(index)
            .into_iter()
            .chain(self.next(index))
            .collect()
    }

    /// Number of adjacent states of `index`.
    pub fn degree(&self, index: usize) -> usize {
        usize::from(self.previous(index).is_some()) + usize::from(self.next(index).is_some())
    }

    /// Stable SHA-256 fingerprint of the term name and the coordinate bit patterns.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        let term = self.term().as_bytes();
        hasher.update((term.len() as u64).to_le_bytes());
        hasher.update(term);
        hasher.update((self.states.len() as u64).to_le_bytes());
        for state in &self.states {
            hasher.update(state.coordinate.to_bits().to_le_bytes());
        }
        hex::encode(hasher.finalize())
    }
}
