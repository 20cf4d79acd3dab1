use std::sync::Arc;

use gsst_core::errors::ErrorInfo;
use gsst_core::{GsstError, RngHandle};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::acceptance::{AcceptanceDecision, AcceptanceEvaluator, AcceptanceInputs};
use crate::config::{FaultPolicy, RunConfig, WangLandauConfig};
use crate::determinism;
use crate::engine::{self, TemperingEngine};
use crate::ladder::StateLadder;
use crate::proposal::{Proposal, ProposalSampler};
use crate::weights::WeightTable;

/// Stage of the Wang-Landau schedule.
///
/// Every flat histogram decays the increment. A decay that lands below the
/// floor ends in [`Phase::Production`] from whichever phase it started, so a
/// first decay already under the floor moves `Warmup` straight to
/// `Production` without an intermediate `Refining` stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    /// Initial increment, weights still coarse.
    Warmup,
    /// Increment shrinking at each flat histogram.
    Refining,
    /// Increment at its floor; weights used for reporting.
    Production,
}

impl Phase {
    /// Lowercase label used in traces.
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Warmup => "warmup",
            Phase::Refining => "refining",
            Phase::Production => "production",
        }
    }
}

/// Live state of one tempering run.
///
/// Owns its weight table exclusively; the ladder is shared read-only.
#[derive(Debug, Clone, PartialEq)]
pub struct TemperingSession {
    ladder: Arc<StateLadder>,
    weights: WeightTable,
    active: usize,
    increment: f64,
    phase: Phase,
    steps_completed: u64,
    master_seed: u64,
}

impl TemperingSession {
    /// Creates a session in `phase` with the given weights and increment.
    pub fn new(
        ladder: Arc<StateLadder>,
        weights: WeightTable,
        active: usize,
        increment: f64,
        phase: Phase,
        master_seed: u64,
    ) -> Result<Self, GsstError> {
        ladder.checked_state(active)?;
        if weights.len() != ladder.len() {
            return Err(GsstError::State(
                ErrorInfo::new("shape-mismatch", "one weight entry per ladder state")
                    .with_context("weights", weights.len().to_string())
                    .with_context("states", ladder.len().to_string()),
            ));
        }
        Ok(Self {
            ladder,
            weights,
            active,
            increment,
            phase,
            steps_completed: 0,
            master_seed,
        })
    }

    pub(crate) fn with_steps_completed(mut self, steps: u64) -> Self {
        self.steps_completed = steps;
        self
    }

    /// Shared ladder.
    pub fn ladder(&self) -> &Arc<StateLadder> {
        &self.ladder
    }

    /// Current weights.
    pub fn weights(&self) -> &WeightTable {
        &self.weights
    }

    /// Index of the active state.
    pub fn active(&self) -> usize {
        self.active
    }

    /// Coordinate of the active state.
    pub fn active_coordinate(&self) -> f64 {
        self.ladder.coordinate(self.active).unwrap_or(f64::NAN)
    }

    /// Current Wang-Landau increment.
    pub fn increment(&self) -> f64 {
        self.increment
    }

    /// Current schedule phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Completed tempering attempts.
    pub fn steps_completed(&self) -> u64 {
        self.steps_completed
    }

    /// Master seed of the per-step substreams.
    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }
}

/// Settings the controller needs beyond the session itself.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControllerSettings {
    /// Increment schedule.
    pub wang_landau: WangLandauConfig,
    /// Proposal strategy.
    pub proposal: crate::proposal::ProposalStrategy,
    /// ΔU ceiling.
    pub max_delta_u: f64,
    /// Fault escalation.
    pub faults: FaultPolicy,
}

impl From<&RunConfig> for ControllerSettings {
    fn from(config: &RunConfig) -> Self {
        Self {
            wang_landau: config.wang_landau,
            proposal: config.proposal,
            max_delta_u: config.acceptance.max_delta_u,
            faults: config.faults,
        }
    }
}

/// Running tallies kept alongside the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StepCounters {
    /// Attempts that produced a proposal.
    pub proposed: u64,
    /// Accepted moves to a different state.
    pub accepted: u64,
    /// Proposals of the current state.
    pub self_transitions: u64,
    /// Acceptance tests whose ΔU hit the ceiling.
    pub clamped: u64,
    /// Steps that ended in a recoverable engine fault.
    pub engine_faults: u64,
    /// Length of the current run of faulted steps.
    pub consecutive_faults: u32,
}

impl StepCounters {
    /// Accepted fraction of genuine moves (self transitions excluded).
    pub fn acceptance_rate(&self) -> f64 {
        let moves = self.proposed.saturating_sub(self.self_transitions);
        if moves == 0 {
            0.0
        } else {
            self.accepted as f64 / moves as f64
        }
    }
}

/// Increment decay event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseTransition {
    /// Phase before the flat histogram.
    pub from: Phase,
    /// Phase after it.
    pub to: Phase,
    /// Increment after the decay.
    pub increment: f64,
}

/// Everything that happened in one tempering attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepOutcome {
    /// Zero-based attempt index.
    pub step: u64,
    /// Active state before the attempt.
    pub previous: usize,
    /// Active state after the attempt.
    pub active: usize,
    /// Proposal drawn, if the attempt got that far.
    pub proposal: Option<Proposal>,
    /// Acceptance test, absent for self transitions and faults.
    pub decision: Option<AcceptanceDecision>,
    /// Reduced potential of the configuration under the active state.
    pub active_energy: Option<f64>,
    /// Amount added to the active state's weight.
    pub increment_applied: f64,
    /// Phase after the attempt.
    pub phase: Phase,
    /// Decay event triggered by this attempt.
    pub transition: Option<PhaseTransition>,
    /// Recoverable engine fault that turned the attempt into a rejection.
    pub fault: Option<ErrorInfo>,
}

impl StepOutcome {
    /// True when the active state changed.
    pub fn moved(&self) -> bool {
        self.active != self.previous
    }
}

struct Attempt {
    proposal: Proposal,
    decision: Option<AcceptanceDecision>,
    active_energy: f64,
}

/// Drives one [`TemperingSession`] through propose, evaluate, accept and reinforce.
#[derive(Debug, Clone)]
pub struct TemperingController {
    session: TemperingSession,
    settings: ControllerSettings,
    sampler: ProposalSampler,
    evaluator: AcceptanceEvaluator,
    counters: StepCounters,
}

impl TemperingController {
    /// Builds the ladder, weights and session described by `config`.
    pub fn from_config(config: &RunConfig) -> Result<Self, GsstError> {
        config.validate()?;
        let ladder = Arc::new(StateLadder::new(
            config.ladder.parameter.clone(),
            &config.ladder.coordinates,
        )?);
        Self::with_ladder(ladder, config)
    }

    /// Like [`TemperingController::from_config`] but reuses an existing ladder,
    /// e.g. one shared by several walkers.
    pub fn with_ladder(ladder: Arc<StateLadder>, config: &RunConfig) -> Result<Self, GsstError> {
        let mut config = config.clone();
        config.ladder.parameter = ladder.term().to_string();
        config.ladder.coordinates = ladder.coordinates();
        config.validate()?;
        let weights = match &config.weights.initial {
            Some(initial) => WeightTable::from_weights(initial)?,
            None => WeightTable::zeros(ladder.len()),
        };
        let (phase, increment) = if config.weights.learn {
            (Phase::Warmup, config.wang_landau.initial_increment)
        } else {
            (Phase::Production, config.wang_landau.floor)
        };
        let session = TemperingSession::new(
            ladder,
            weights,
            config.initial_state,
            increment,
            phase,
            config.seed_policy.master_seed,
        )?;
        Self::new(session, ControllerSettings::from(&config))
    }

    /// Wraps an existing session.
    pub fn new(session: TemperingSession, settings: ControllerSettings) -> Result<Self, GsstError> {
        settings.wang_landau.validate()?;
        if settings.faults.max_consecutive == 0 {
            return Err(GsstError::config(
                "fault-threshold",
                "max_consecutive must allow at least one fault",
            ));
        }
        if session.increment < settings.wang_landau.floor || !session.increment.is_finite() {
            return Err(GsstError::Config(
                ErrorInfo::new("increment-floor", "session increment below the configured floor")
                    .with_context("increment", session.increment.to_string())
                    .with_context("floor", settings.wang_landau.floor.to_string()),
            ));
        }
        Ok(Self {
            evaluator: AcceptanceEvaluator::new(settings.max_delta_u)?,
            sampler: ProposalSampler::new(settings.proposal),
            session,
            settings,
            counters: StepCounters::default(),
        })
    }

    pub(crate) fn with_counters(mut self, counters: StepCounters) -> Self {
        self.counters = counters;
        self
    }

    /// Read-only view of the session.
    pub fn session(&self) -> &TemperingSession {
        &self.session
    }

    /// Consumes the controller, keeping the final session.
    pub fn into_session(self) -> TemperingSession {
        self.session
    }

    /// Controller settings.
    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    /// Tallies so far.
    pub fn counters(&self) -> &StepCounters {
        &self.counters
    }

    /// Weight actually added on the next reinforcement.
    pub fn applied_increment(&self) -> f64 {
        if self.session.phase == Phase::Production && self.settings.wang_landau.freeze_in_production
        {
            0.0
        } else {
            self.session.increment
        }
    }

    /// Installs weights merged across walkers. Only valid between steps.
    pub fn replace_weights(&mut self, weights: WeightTable) -> Result<(), GsstError> {
        if weights.len() != self.session.ladder.len() {
            return Err(GsstError::State(
                ErrorInfo::new("shape-mismatch", "replacement table does not match the ladder")
                    .with_context("weights", weights.len().to_string())
                    .with_context("states", self.session.ladder.len().to_string()),
            ));
        }
        self.session.weights = weights;
        Ok(())
    }

    /// Pushes the parameters of the active state to the engine.
    pub fn apply_active<E: TemperingEngine + ?Sized>(&self, engine: &mut E) -> Result<(), GsstError> {
        let state = self.session.ladder.checked_state(self.session.active)?;
        engine::apply_state(engine, state)
    }

    /// Performs one tempering attempt against `engine`.
    ///
    /// Engine faults reject the move and are reported in the outcome; the
    /// active state is still reinforced. Once `faults.max_consecutive` attempts
    /// in a row have faulted, the fault is returned as an error instead and the
    /// session and counters are left as they were before the call.
    pub fn step<E: TemperingEngine + ?Sized>(
        &mut self,
        engine: &mut E,
    ) -> Result<StepOutcome, GsstError> {
        let step = self.session.steps_completed;
        let mut rng = RngHandle::from_seed(determinism::step_seed(self.session.master_seed, step));
        let previous = self.session.active;
        let counters_before = self.counters;

        let (proposal, decision, active_energy, fault) = match self.attempt(engine, &mut rng) {
            Ok(attempt) => {
                self.counters.consecutive_faults = 0;
                (
                    Some(attempt.proposal),
                    attempt.decision,
                    Some(attempt.active_energy),
                    None,
                )
            }
            Err(GsstError::Engine(info)) => {
                let streak = self.counters.consecutive_faults + 1;
                if streak >= self.settings.faults.max_consecutive {
                    self.counters = counters_before;
                    error!(step, streak, code = %info.code, "engine faults escalated");
                    return Err(GsstError::Engine(
                        ErrorInfo::new(
                            "engine-fault-escalated",
                            format!("{streak} consecutive engine faults: {}", info.message),
                        )
                        .with_context("step", step.to_string())
                        .with_context("last_code", info.code.clone()),
                    ));
                }
                self.counters.consecutive_faults = streak;
                self.counters.engine_faults += 1;
                warn!(step, streak, code = %info.code, "engine fault, move rejected");
                (None, None, None, Some(info))
            }
            Err(other) => return Err(other),
        };

        let increment_applied = self.applied_increment();
        self.session
            .weights
            .reinforce(self.session.active, increment_applied)?;
        self.session.steps_completed += 1;
        let transition = self.advance_schedule();

        Ok(StepOutcome {
            step,
            previous,
            active: self.session.active,
            proposal,
            decision,
            active_energy,
            increment_applied,
            phase: self.session.phase,
            transition,
            fault,
        })
    }

    fn attempt<E: TemperingEngine + ?Sized>(
        &mut self,
        engine: &mut E,
        rng: &mut RngHandle,
    ) -> Result<Attempt, GsstError> {
        let ladder = Arc::clone(&self.session.ladder);
        let current = self.session.active;
        let all_energies = if self.sampler.needs_all_energies() {
            let mut energies = Vec::with_capacity(ladder.len());
            for state in ladder.iter() {
                energies.push(engine::query_energy(engine, state)?);
            }
            Some(energies)
        } else {
            None
        };

        let proposal = self.sampler.propose(
            current,
            &ladder,
            &self.session.weights,
            all_energies.as_deref(),
            rng,
        )?;
        self.counters.proposed += 1;

        let current_energy = match &all_energies {
            Some(energies) => energies[current],
            None => engine::query_energy(engine, ladder.checked_state(current)?)?,
        };
        if proposal.is_self_transition(current) {
            self.counters.self_transitions += 1;
            return Ok(Attempt {
                proposal,
                decision: None,
                active_energy: current_energy,
            });
        }

        let candidate = ladder.checked_state(proposal.candidate)?;
        let candidate_energy = match &all_energies {
            Some(energies) => energies[proposal.candidate],
            None => engine::query_energy(engine, candidate)?,
        };
        let inputs = AcceptanceInputs {
            current_energy,
            candidate_energy,
            current_weight: self.session.weights.weight(current)?,
            candidate_weight: self.session.weights.weight(proposal.candidate)?,
            log_proposal_ratio: proposal.log_ratio(),
        };
        let decision = self.evaluator.decide(&inputs, rng);
        if decision.clamped {
            self.counters.clamped += 1;
        }
        debug!(
            from = current,
            to = proposal.candidate,
            probability = decision.probability,
            accepted = decision.accepted,
            "tempering attempt"
        );
        if !decision.accepted {
            return Ok(Attempt {
                proposal,
                decision: Some(decision),
                active_energy: current_energy,
            });
        }

        if let Err(err) = engine::apply_state(engine, candidate) {
            // Best effort: put the engine back on the state we keep.
            if let Err(restore) = engine::apply_state(engine, ladder.checked_state(current)?) {
                warn!(state = current, code = %restore.info().code, "could not restore active state");
            }
            return Err(err);
        }
        self.session.active = proposal.candidate;
        self.counters.accepted += 1;
        Ok(Attempt {
            proposal,
            decision: Some(decision),
            active_energy: candidate_energy,
        })
    }

    fn advance_schedule(&mut self) -> Option<PhaseTransition> {
        if self.session.phase == Phase::Production {
            return None;
        }
        let schedule = &self.settings.wang_landau;
        let weights = &mut self.session.weights;
        if weights.min_visits() <= schedule.min_visits
            || weights.flatness_ratio() >= schedule.flatness_threshold
        {
            return None;
        }
        let from = self.session.phase;
        let decayed = self.session.increment * schedule.decay_factor;
        weights.reset_visits();
        if decayed < schedule.floor {
            self.session.increment = schedule.floor;
            self.session.phase = Phase::Production;
        } else {
            self.session.increment = decayed;
            self.session.phase = Phase::Refining;
        }
        info!(
            step = self.session.steps_completed,
            from = from.as_str(),
            to = self.session.phase.as_str(),
            increment = self.session.increment,
            "flat histogram, increment decayed"
        );
        Some(PhaseTransition {
            from,
            to: self.session.phase,
            increment: self.session.increment,
        })
    }
}
