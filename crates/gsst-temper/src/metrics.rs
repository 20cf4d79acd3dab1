use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::controller::{Phase, StepOutcome, TemperingSession};

/// One row of the run trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceRow {
    /// Attempts completed when the row was taken.
    pub step: u64,
    /// Wang-Landau increment.
    pub increment: f64,
    /// Schedule phase.
    pub phase: Phase,
    /// Active state index.
    pub state: usize,
    /// Coordinate of the active state.
    pub coordinate: f64,
    /// Reduced potential under the active state; absent after an engine fault.
    pub reduced_potential: Option<f64>,
    /// Weights relative to state 0.
    pub weights: Vec<f64>,
}

impl TraceRow {
    /// Builds a row from the outcome of an attempt and the session after it.
    pub fn from_outcome(outcome: &StepOutcome, session: &TemperingSession) -> Self {
        let weights = session
            .weights()
            .relative_to(0)
            .unwrap_or_else(|_| session.weights().weights());
        Self {
            step: outcome.step + 1,
            increment: session.increment(),
            phase: outcome.phase,
            state: outcome.active,
            coordinate: session.active_coordinate(),
            reduced_potential: outcome.active_energy,
            weights,
        }
    }
}

/// Collects trace rows and per-run tallies.
#[derive(Debug, Default)]
pub struct TraceRecorder {
    rows: Vec<TraceRow>,
    transitions: usize,
}

impl TraceRecorder {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a row.
    pub fn push(&mut self, row: TraceRow) {
        self.rows.push(row);
    }

    /// Counts a schedule transition.
    pub fn note_transition(&mut self) {
        self.transitions += 1;
    }

    /// Schedule transitions observed.
    pub fn transitions(&self) -> usize {
        self.transitions
    }

    /// Recorded rows.
    pub fn rows(&self) -> &[TraceRow] {
        &self.rows
    }

    /// Writes the trace as CSV with one weight column per ladder coordinate.
    pub fn write_csv<P: AsRef<Path>>(&self, path: P, coordinates: &[f64]) -> std::io::Result<()> {
        let mut file = BufWriter::new(File::create(path)?);
        write!(file, "step,increment,phase,state,coordinate,reduced_potential")?;
        for coordinate in coordinates {
            write!(file, ",w[{coordinate}]")?;
        }
        writeln!(file)?;
        for row in &self.rows {
            write!(
                file,
                "{},{:.6e},{},{},{},",
                row.step,
                row.increment,
                row.phase.as_str(),
                row.state,
                row.coordinate
            )?;
            if let Some(energy) = row.reduced_potential {
                write!(file, "{energy:.6}")?;
            }
            for weight in &row.weights {
                write!(file, ",{weight:.6}")?;
            }
            writeln!(file)?;
        }
        file.flush()
    }
}
