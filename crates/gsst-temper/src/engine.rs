use gsst_core::errors::ErrorInfo;
use gsst_core::GsstError;

use crate::ladder::State;

/// Request/response contract between the tempering controller and an external
/// simulation engine.
///
/// The controller never touches simulation state directly. Every call happens
/// synchronously on the thread that advances the engine.
pub trait TemperingEngine {
    /// Reduced potential of the live configuration evaluated under `state`.
    ///
    /// Must not change the live configuration or the active state parameters.
    fn reduced_potential(&mut self, state: &State) -> Result<f64, GsstError>;

    /// Applies the parameters of `state` (interaction scaling, temperature,
    /// restraint target) so that subsequent dynamics and energy evaluations
    /// use them. A failed call must leave the previous parameters in place.
    fn apply_state(&mut self, state: &State) -> Result<(), GsstError>;
}

/// Engines that can be advanced by the run driver between tempering attempts.
pub trait Dynamics {
    /// Integrates `steps` time steps under the currently applied state.
    fn advance(&mut self, steps: usize) -> Result<(), GsstError>;
}

impl<E: TemperingEngine + ?Sized> TemperingEngine for &mut E {
    fn reduced_potential(&mut self, state: &State) -> Result<f64, GsstError> {
        (**self).reduced_potential(state)
    }

    fn apply_state(&mut self, state: &State) -> Result<(), GsstError> {
        (**self).apply_state(state)
    }
}

/// Queries the reduced potential under `state`, turning every failure and
/// every NaN into an engine contract violation.
pub(crate) fn query_energy<E: TemperingEngine + ?Sized>(
    engine: &mut E,
    state: &State,
) -> Result<f64, GsstError> {
    let energy = engine
        .reduced_potential(state)
        .map_err(|err| as_engine_fault(err, "energy-query-failed", state))?;
    if energy.is_nan() {
        return Err(GsstError::Engine(
            ErrorInfo::new("energy-nan", "engine reported NaN for a reduced potential")
                .with_context("state", state.index().to_string()),
        ));
    }
    Ok(energy)
}

/// Applies `state`, turning every failure into an engine contract violation.
pub(crate) fn apply_state<E: TemperingEngine + ?Sized>(
    engine: &mut E,
    state: &State,
) -> Result<(), GsstError> {
    engine
        .apply_state(state)
        .map_err(|err| as_engine_fault(err, "apply-state-failed", state))
}

fn as_engine_fault(err: GsstError, code: &str, state: &State) -> GsstError {
    match err {
        GsstError::Engine(info) => {
            GsstError::Engine(info.with_context("state", state.index().to_string()))
        }
        other => GsstError::Engine(
            ErrorInfo::new(code, other.info().message.clone())
                .with_context("state", state.index().to_string())
                .with_context("source", other.info().code.clone()),
        ),
    }
}
