use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::Args;
use gsst_temper::SessionCheckpoint;
use tracing::info;

use crate::commands::run::write_summary;
use crate::system::{SimConfig, SimSystem, SystemConfig};

#[derive(Args, Debug)]
pub struct ResumeArgs {
    /// Checkpoint written by a previous run.
    #[arg(long)]
    pub checkpoint: PathBuf,
    /// Configuration whose `system` section rebuilds the engine. Defaults to a
    /// linear ladder with unit gaps.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Output directory for the continued run.
    #[arg(long)]
    pub out: PathBuf,
    /// Total attempts to reach, counting those already in the checkpoint.
    #[arg(long)]
    pub steps: Option<u64>,
}

pub fn run(args: &ResumeArgs) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(&args.out)?;
    let payload = SessionCheckpoint::load(&args.checkpoint)?;
    let system_config = match &args.config {
        Some(path) => SimConfig::load(path)?.system,
        None => SystemConfig::default(),
    };

    let mut config = payload.config.clone();
    config.output.run_directory = Some(args.out.clone());
    let total = args.steps.unwrap_or(config.steps);
    if total < payload.steps_completed {
        return Err(format!(
            "checkpoint already holds {} attempts, more than the requested {total}",
            payload.steps_completed
        )
        .into());
    }

    let mut system = SimSystem::build(
        &system_config,
        payload.ladder.coordinates.len(),
        payload.master_seed,
    )?;
    let summary = gsst_temper::resume_from(&payload, &config, total, &mut system)?;
    write_summary(&args.out, &summary, &system)?;
    info!(
        from = payload.steps_completed,
        to = summary.steps_completed,
        "resumed run finished"
    );
    Ok(())
}
