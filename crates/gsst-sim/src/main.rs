use std::error::Error;
use std::fs;
use std::path::Path;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{
    merge::{self, MergeArgs},
    report::{self, ReportArgs},
    resume::{self, ResumeArgs},
    run::{self, RunArgs},
};

mod commands;
mod system;

#[derive(Parser, Debug)]
#[command(name = "gsst-sim", about = "Generalized serial simulated tempering driver")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Learn weights on a synthetic system from a YAML configuration.
    Run(RunArgs),
    /// Continue a run from a checkpoint file.
    Resume(ResumeArgs),
    /// Merge the weight tables of several walker checkpoints.
    Merge(MergeArgs),
    /// Print the free-energy report stored in a checkpoint.
    Report(ReportArgs),
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Run(args) => run::run(&args),
        Command::Resume(args) => resume::run(&args),
        Command::Merge(args) => merge::run(&args),
        Command::Report(args) => report::run(&args),
    }
}

pub(crate) fn write_json<P: AsRef<Path>, T: serde::Serialize>(
    path: P,
    value: &T,
) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = path.as_ref().parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}
