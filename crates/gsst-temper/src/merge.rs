//! Synchronization of weight tables across independent walkers.
//!
//! Merging is only meaningful between steps; every walker owns its own
//! session and nothing here touches a live controller.

use gsst_core::errors::ErrorInfo;
use gsst_core::GsstError;

use crate::checkpoint::SessionCheckpoint;
use crate::weights::{Normalization, WeightEntry, WeightTable, ZeroPoint};

/// Merges walker tables into one.
///
/// Each table is zero-centred first so that arbitrary per-walker offsets
/// cancel. Per state, the merged weight is the average weighted by lifetime
/// visits (a plain mean when no walker visited the state); visit counters add.
pub fn merge_tables(tables: &[WeightTable]) -> Result<WeightTable, GsstError> {
    let Some(first) = tables.first() else {
        return Err(GsstError::State(ErrorInfo::new(
            "merge-empty",
            "nothing to merge",
        )));
    };
    let len = first.len();
    if let Some((walker, table)) = tables.iter().enumerate().find(|(_, t)| t.len() != len) {
        return Err(GsstError::State(
            ErrorInfo::new("merge-shape", "walker tables differ in length")
                .with_context("walker", walker.to_string())
                .with_context("expected", len.to_string())
                .with_context("found", table.len().to_string()),
        ));
    }

    let centred = tables
        .iter()
        .map(|table| {
            let mut table = table.clone();
            table.normalize(Normalization::ZeroMean)?;
            Ok(table)
        })
        .collect::<Result<Vec<_>, GsstError>>()?;

    let mut entries = Vec::with_capacity(len);
    for state in 0..len {
        let mut weighted = 0.0;
        let mut plain = 0.0;
        let mut mass = 0u64;
        let mut visits = 0u64;
        let mut total_visits = 0u64;
        for table in &centred {
            let entry = table.entries()[state];
            weighted += entry.weight * entry.total_visits as f64;
            plain += entry.weight;
            mass += entry.total_visits;
            visits += entry.visits;
            total_visits += entry.total_visits;
        }
        let weight = if mass == 0 {
            plain / centred.len() as f64
        } else {
            weighted / mass as f64
        };
        entries.push(WeightEntry {
            weight,
            visits,
            total_visits,
        });
    }
    let mut merged = WeightTable::from_entries(entries, ZeroPoint::Unnormalized);
    merged.normalize(Normalization::ZeroMean)?;
    Ok(merged)
}

/// Merges the tables of several checkpoints taken on the same ladder.
pub fn merge_checkpoints(checkpoints: &[SessionCheckpoint]) -> Result<WeightTable, GsstError> {
    if let Some(first) = checkpoints.first() {
        for (walker, checkpoint) in checkpoints.iter().enumerate() {
            if checkpoint.ladder.fingerprint != first.ladder.fingerprint {
                return Err(GsstError::State(
                    ErrorInfo::new("merge-ladder", "checkpoints come from different ladders")
                        .with_context("walker", walker.to_string()),
                ));
            }
        }
    }
    let tables: Vec<WeightTable> = checkpoints
        .iter()
        .map(|checkpoint| checkpoint.weights.clone())
        .collect();
    merge_tables(&tables)
}
