use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use gsst_temper::{merge_checkpoints, SessionCheckpoint};
use tracing::info;

use crate::write_json;

#[derive(Args, Debug)]
pub struct MergeArgs {
    /// Walker checkpoints taken on the same ladder.
    #[arg(long = "inputs", value_name = "PATH", num_args = 1.., required = true)]
    pub inputs: Vec<PathBuf>,
    /// Destination for the merged weight table.
    #[arg(long)]
    pub out: PathBuf,
}

pub fn run(args: &MergeArgs) -> Result<(), Box<dyn Error>> {
    let checkpoints = args
        .inputs
        .iter()
        .map(|path| SessionCheckpoint::load(path))
        .collect::<Result<Vec<_>, _>>()?;
    let merged = merge_checkpoints(&checkpoints)?;
    write_json(&args.out, &merged)?;
    info!(
        walkers = checkpoints.len(),
        visits = merged.total_visits(),
        out = %args.out.display(),
        "weight tables merged"
    );
    Ok(())
}
