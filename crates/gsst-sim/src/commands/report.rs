use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use gsst_temper::{FreeEnergyReport, SessionCheckpoint};

#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Checkpoint to report on.
    #[arg(long)]
    pub checkpoint: PathBuf,
    /// State whose free energy is pinned to zero.
    #[arg(long, default_value_t = 0)]
    pub reference: usize,
}

pub fn run(args: &ReportArgs) -> Result<(), Box<dyn Error>> {
    let controller = SessionCheckpoint::load(&args.checkpoint)?.restore()?;
    let report = FreeEnergyReport::from_controller(&controller, args.reference)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
