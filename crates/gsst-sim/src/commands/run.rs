use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use gsst_temper::RunSummary;
use serde_json::json;
use tracing::info;

use crate::system::{SimConfig, SimSystem};
use crate::write_json;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// YAML run configuration with an optional `system` section.
    #[arg(long)]
    pub config: PathBuf,
    /// Output directory for run artefacts.
    #[arg(long)]
    pub out: PathBuf,
    /// Override the configured number of attempts.
    #[arg(long)]
    pub steps: Option<u64>,
    /// Override the master seed.
    #[arg(long)]
    pub seed: Option<u64>,
}

pub fn run(args: &RunArgs) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(&args.out)?;
    let sim = SimConfig::load(&args.config)?;
    let mut config = sim.run.clone();
    config.output.run_directory = Some(args.out.clone());
    if let Some(steps) = args.steps {
        config.steps = steps;
    }
    if let Some(seed) = args.seed {
        config.seed_policy.master_seed = seed;
    }

    let mut system = SimSystem::build(
        &sim.system,
        config.ladder.coordinates.len(),
        config.seed_policy.master_seed,
    )?;
    let summary = gsst_temper::run(&config, &mut system)?;
    write_summary(&args.out, &summary, &system)?;

    // Keep the exact input next to the artefacts.
    let kept = args.out.join("config.yaml");
    if !same_file(&args.config, &kept) {
        fs::copy(&args.config, &kept)?;
    }
    info!(out = %args.out.display(), "run artefacts written");
    Ok(())
}

fn same_file(left: &Path, right: &Path) -> bool {
    match (fs::canonicalize(left), fs::canonicalize(right)) {
        (Ok(left), Ok(right)) => left == right,
        _ => false,
    }
}

pub(crate) fn write_summary(
    out: &Path,
    summary: &RunSummary,
    system: &SimSystem,
) -> Result<(), Box<dyn Error>> {
    let value = json!({
        "steps_completed": summary.steps_completed,
        "phase": summary.phase,
        "increment": summary.increment,
        "active_state": summary.active_state,
        "counters": summary.counters,
        "acceptance_rate": summary.counters.acceptance_rate(),
        "transitions": summary.transitions,
        "free_energies": summary.report.free_energies,
        "histogram_corrected": summary.report.histogram_corrected,
        "analytic_free_energies": system.analytic_free_energies(),
        "checkpoints": summary.checkpoints,
    });
    write_json(out.join("summary.json"), &value)
}
