use gsst_temper::testsystems::{FixedLadderSystem, HarmonicLadderSystem};
use gsst_temper::{Dynamics, StateLadder, TemperingEngine};

#[test]
fn fixed_system_reports_its_energies() {
    let ladder = StateLadder::new("lambda", &[0.0, 0.5, 1.0]).unwrap();
    let mut engine = FixedLadderSystem::new(vec![0.5, 1.5, 4.0]);
    let energies: Vec<f64> = ladder
        .iter()
        .map(|state| engine.reduced_potential(state).unwrap())
        .collect();
    assert_eq!(energies, vec![0.5, 1.5, 4.0]);
    assert_eq!(engine.analytic_free_energies(), vec![0.0, 1.0, 3.5]);

    engine.apply_state(ladder.state(2).unwrap()).unwrap();
    assert_eq!(engine.active(), 2);
    assert_eq!(engine.applied(), 1);
}

#[test]
fn fixed_system_rejects_states_it_does_not_model() {
    let ladder = StateLadder::new("lambda", &[0.0, 0.5, 1.0]).unwrap();
    let mut engine = FixedLadderSystem::linear(2, 1.0);
    let err = engine.reduced_potential(ladder.state(2).unwrap()).unwrap_err();
    assert_eq!(err.info().code, "unknown-state");
    assert!(engine.apply_state(ladder.state(2).unwrap()).is_err());
    assert_eq!(engine.active(), 0);
}

#[test]
fn harmonic_system_validates_its_parameters() {
    let err = HarmonicLadderSystem::new(vec![0.0, 1.0], vec![1.0], 1).unwrap_err();
    assert_eq!(err.info().code, "oscillator-shape");
    let err = HarmonicLadderSystem::new(vec![0.0, 1.0], vec![1.0, -2.0], 1).unwrap_err();
    assert_eq!(err.info().code, "oscillator-force-constant");
    assert!(err.is_config());
}

#[test]
fn harmonic_resampling_matches_the_applied_state() {
    let ladder = StateLadder::new("restraint", &[0.0, 1.0]).unwrap();
    let mut engine = HarmonicLadderSystem::new(vec![0.0, 3.0], vec![1.0, 4.0], 99).unwrap();
    engine.apply_state(ladder.state(1).unwrap()).unwrap();

    let samples = 20_000;
    let mut sum = 0.0;
    let mut sum_sq = 0.0;
    for _ in 0..samples {
        engine.advance(10).unwrap();
        let x = engine.position();
        sum += x;
        sum_sq += x * x;
    }
    let mean = sum / samples as f64;
    let variance = sum_sq / samples as f64 - mean * mean;
    assert!((mean - 3.0).abs() < 0.02, "mean {mean}");
    assert!((variance - 0.25).abs() < 0.02, "variance {variance}");

    let energy = engine.reduced_potential(ladder.state(1).unwrap()).unwrap();
    let dx = engine.position() - 3.0;
    assert!((energy - 2.0 * dx * dx).abs() < 1e-12);
}

#[test]
fn harmonic_analytic_free_energies_follow_force_constants() {
    let engine = HarmonicLadderSystem::new(vec![0.0; 3], vec![1.0, 2.0, 8.0], 1).unwrap();
    let f = engine.analytic_free_energies();
    assert_eq!(f[0], 0.0);
    assert!((f[1] - 0.5 * 2f64.ln()).abs() < 1e-12);
    assert!((f[2] - 1.5 * 2f64.ln()).abs() < 1e-12);
}
