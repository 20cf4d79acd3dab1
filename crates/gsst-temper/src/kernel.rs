use std::path::{Path, PathBuf};

use chrono::Utc;
use gsst_core::errors::ErrorInfo;
use gsst_core::{GsstError, RunProvenance};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::checkpoint::{self, SessionCheckpoint};
use crate::config::{OutputConfig, RunConfig};
use crate::controller::{Phase, StepCounters, TemperingController};
use crate::engine::{Dynamics, TemperingEngine};
use crate::manifest::RunManifest;
use crate::metrics::{TraceRecorder, TraceRow};
use crate::report::FreeEnergyReport;

/// Summary returned to callers after a run completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Attempts completed by the session, including those before a resume.
    pub steps_completed: u64,
    /// Final schedule phase.
    pub phase: Phase,
    /// Final increment.
    pub increment: f64,
    /// Final active state.
    pub active_state: usize,
    /// Controller tallies.
    pub counters: StepCounters,
    /// Schedule transitions during this invocation.
    pub transitions: usize,
    /// Free energies relative to state 0.
    pub report: FreeEnergyReport,
    /// Trace rows collected during this invocation.
    pub trace: Vec<TraceRow>,
    /// Trace CSV written during the run.
    pub trace_path: Option<PathBuf>,
    /// Free-energy report path.
    pub report_path: Option<PathBuf>,
    /// Manifest path, if emitted.
    pub manifest_path: Option<PathBuf>,
    /// Checkpoint files still on disk.
    pub checkpoints: Vec<PathBuf>,
}

/// Runs a fresh session for `config.steps` attempts.
#[instrument(skip_all, name = "tempering_run", fields(steps = config.steps))]
pub fn run<E>(config: &RunConfig, engine: &mut E) -> Result<RunSummary, GsstError>
where
    E: TemperingEngine + Dynamics + ?Sized,
{
    let controller = TemperingController::from_config(config)?;
    controller.apply_active(engine)?;
    info!(
        states = controller.session().ladder().len(),
        parameter = controller.session().ladder().term(),
        "starting tempering run"
    );
    drive(controller, config, engine, config.steps)
}

/// Resumes from a checkpoint file and continues up to the configured step count.
#[instrument(skip_all, name = "tempering_resume", fields(path = %path.display()))]
pub fn resume<E>(path: &Path, engine: &mut E) -> Result<RunSummary, GsstError>
where
    E: TemperingEngine + Dynamics + ?Sized,
{
    let payload = SessionCheckpoint::load(path)?;
    let total = payload.config.steps;
    resume_from(&payload, &payload.config, total, engine)
}

/// Resumes from an in-memory checkpoint, writing artefacts per `config` and
/// stopping once `total_steps` attempts have been completed overall.
pub fn resume_from<E>(
    payload: &SessionCheckpoint,
    config: &RunConfig,
    total_steps: u64,
    engine: &mut E,
) -> Result<RunSummary, GsstError>
where
    E: TemperingEngine + Dynamics + ?Sized,
{
    let controller = payload.restore()?;
    controller.apply_active(engine)?;
    info!(
        from_step = payload.steps_completed,
        phase = payload.phase.as_str(),
        "resuming tempering run"
    );
    drive(controller, config, engine, total_steps)
}

fn drive<E>(
    mut controller: TemperingController,
    config: &RunConfig,
    engine: &mut E,
    total_steps: u64,
) -> Result<RunSummary, GsstError>
where
    E: TemperingEngine + Dynamics + ?Sized,
{
    let layout = resolve_output_paths(&config.output);
    if let Some(run_dir) = &layout.run_directory {
        std::fs::create_dir_all(run_dir).map_err(|err| {
            GsstError::Serde(
                ErrorInfo::new("run-dir-mkdir", err.to_string())
                    .with_context("path", run_dir.display().to_string()),
            )
        })?;
    }
    let mut recorder = TraceRecorder::new();
    let mut checkpoints = Vec::new();

    while controller.session().steps_completed() < total_steps {
        engine.advance(config.change_interval)?;
        let outcome = controller.step(engine)?;
        if outcome.transition.is_some() {
            recorder.note_transition();
        }
        let done = outcome.step + 1;
        if config.report_interval > 0 && done % config.report_interval == 0 {
            recorder.push(TraceRow::from_outcome(&outcome, controller.session()));
        }
        if config.checkpoint.interval > 0 && done % config.checkpoint.interval == 0 {
            if let Some(dir) = &layout.checkpoint_dir {
                let path = checkpoint::checkpoint_path(dir, done);
                SessionCheckpoint::capture(&controller, config).store(&path)?;
                checkpoints.push(path);
                enforce_checkpoint_retention(&mut checkpoints, config.checkpoint.max_to_keep)?;
            }
        }
    }

    let session = controller.session();
    let report = FreeEnergyReport::from_controller(&controller, 0)?;
    let coordinates = session.ladder().coordinates();

    let trace_path = match (&layout.run_directory, &layout.trace_file) {
        (Some(_), Some(path)) if config.report_interval > 0 => {
            recorder.write_csv(path, &coordinates).map_err(|err| {
                GsstError::Serde(
                    ErrorInfo::new("trace-write", err.to_string())
                        .with_context("path", path.display().to_string()),
                )
            })?;
            Some(path.clone())
        }
        _ => None,
    };

    let report_path = match &layout.report_file {
        Some(path) => {
            report.write(path)?;
            Some(path.clone())
        }
        None => None,
    };

    let manifest_path = if let Some(run_dir) = &layout.run_directory {
        let path = run_dir.join(&config.output.manifest_file);
        let relative = |p: &PathBuf| p.strip_prefix(run_dir).ok().map(Path::to_path_buf);
        let manifest = RunManifest {
            config: config.clone(),
            provenance: RunProvenance {
                config_hash: config.fingerprint()?,
                ladder_fingerprint: session.ladder().fingerprint(),
                seed: session.master_seed(),
                created_at: Utc::now().to_rfc3339(),
                tool_versions: [(
                    env!("CARGO_PKG_NAME").to_string(),
                    env!("CARGO_PKG_VERSION").to_string(),
                )]
                .into_iter()
                .collect(),
            },
            seed_label: config.seed_policy.label.clone(),
            trace_file: trace_path.as_ref().and_then(relative),
            report_file: report_path.as_ref().and_then(relative),
            checkpoints: checkpoints.iter().filter_map(relative).collect(),
        };
        manifest.write(&path)?;
        Some(path)
    } else {
        None
    };

    info!(
        steps = session.steps_completed(),
        phase = session.phase().as_str(),
        increment = session.increment(),
        acceptance = controller.counters().acceptance_rate(),
        "tempering run finished"
    );

    Ok(RunSummary {
        steps_completed: session.steps_completed(),
        phase: session.phase(),
        increment: session.increment(),
        active_state: session.active(),
        counters: *controller.counters(),
        transitions: recorder.transitions(),
        report,
        trace: recorder.rows().to_vec(),
        trace_path,
        report_path,
        manifest_path,
        checkpoints,
    })
}

fn enforce_checkpoint_retention(
    paths: &mut Vec<PathBuf>,
    max_to_keep: usize,
) -> Result<(), GsstError> {
    while paths.len() > max_to_keep.max(1) {
        let path = paths.remove(0);
        std::fs::remove_file(&path).map_err(|err| {
            GsstError::Serde(
                ErrorInfo::new("checkpoint-remove", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
    }
    Ok(())
}

#[derive(Default)]
struct ResolvedOutput {
    run_directory: Option<PathBuf>,
    trace_file: Option<PathBuf>,
    checkpoint_dir: Option<PathBuf>,
    report_file: Option<PathBuf>,
}

fn resolve_output_paths(config: &OutputConfig) -> ResolvedOutput {
    match &config.run_directory {
        None => ResolvedOutput::default(),
        Some(run_dir) => ResolvedOutput {
            run_directory: Some(run_dir.clone()),
            trace_file: Some(run_dir.join(&config.trace_file)),
            checkpoint_dir: Some(run_dir.join(&config.checkpoint_dir)),
            report_file: Some(run_dir.join(&config.report_file)),
        },
    }
}
