use gsst_core::RngHandle;
use gsst_temper::testsystems::FixedLadderSystem;
use gsst_temper::{AcceptanceEvaluator, AcceptanceInputs, RunConfig, TemperingController};

fn inputs(current_energy: f64, candidate_energy: f64) -> AcceptanceInputs {
    AcceptanceInputs {
        current_energy,
        candidate_energy,
        current_weight: 0.0,
        candidate_weight: 0.0,
        log_proposal_ratio: 0.0,
    }
}

#[test]
fn metropolis_formula_combines_energy_weight_and_proposal_terms() {
    let evaluator = AcceptanceEvaluator::new(500.0).unwrap();
    let probability = evaluator.probability(&AcceptanceInputs {
        current_energy: 0.0,
        candidate_energy: 1.0,
        current_weight: 0.5,
        candidate_weight: 0.0,
        log_proposal_ratio: 0.0,
    });
    assert!((probability - (-0.5f64).exp()).abs() < 1e-12);

    let with_ratio = evaluator.probability(&AcceptanceInputs {
        current_energy: 0.0,
        candidate_energy: 1.0,
        current_weight: 0.0,
        candidate_weight: 0.0,
        log_proposal_ratio: 2.0f64.ln(),
    });
    assert!((with_ratio - 2.0 * (-1.0f64).exp()).abs() < 1e-12);

    assert_eq!(evaluator.probability(&inputs(3.0, 1.0)), 1.0);
}

#[test]
fn extreme_energies_are_clamped_and_rejected() {
    let evaluator = AcceptanceEvaluator::new(500.0).unwrap();
    let mut rng = RngHandle::from_seed(5);
    for candidate in [1e6, 1e308, f64::MAX, f64::INFINITY] {
        let (log_a, clamped) = evaluator.log_probability(&inputs(0.0, candidate));
        assert!(clamped);
        assert!(!log_a.is_nan());
        let decision = evaluator.decide(&inputs(0.0, candidate), &mut rng);
        assert!(!decision.probability.is_nan());
        assert!(decision.probability < 1e-200);
        assert!(!decision.accepted);
        assert!(decision.clamped);
    }
}

#[test]
fn overlap_on_both_sides_is_treated_as_uphill() {
    let evaluator = AcceptanceEvaluator::new(50.0).unwrap();
    let (delta, clamped) = evaluator.clamped_delta(f64::INFINITY, f64::INFINITY);
    assert_eq!(delta, 50.0);
    assert!(clamped);
    let probability = evaluator.probability(&inputs(f64::INFINITY, f64::INFINITY));
    assert!((probability - (-50.0f64).exp()).abs() < 1e-30);
}

#[test]
fn huge_downhill_move_is_always_accepted() {
    let evaluator = AcceptanceEvaluator::new(500.0).unwrap();
    let mut rng = RngHandle::from_seed(6);
    let decision = evaluator.decide(&inputs(1e300, 0.0), &mut rng);
    assert_eq!(decision.probability, 1.0);
    assert!(decision.accepted);
    assert!(decision.clamped);
}

#[test]
fn ceiling_must_be_positive_and_finite() {
    for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
        let err = AcceptanceEvaluator::new(bad).unwrap_err();
        assert!(err.is_config());
        assert_eq!(err.info().code, "delta-u-ceiling");
    }
}

#[test]
fn overlapping_candidate_state_is_never_entered() {
    let mut config = RunConfig::default();
    config.ladder.coordinates = vec![0.0, 1.0];
    let mut controller = TemperingController::from_config(&config).unwrap();
    let mut engine = FixedLadderSystem::new(vec![0.0, f64::INFINITY]);
    controller.apply_active(&mut engine).unwrap();
    for _ in 0..100 {
        let outcome = controller.step(&mut engine).unwrap();
        assert_eq!(outcome.active, 0);
        assert!(outcome.fault.is_none());
        let decision = outcome.decision.unwrap();
        assert!(!decision.accepted);
        assert!(!decision.probability.is_nan());
    }
    assert_eq!(controller.counters().clamped, 100);
    assert_eq!(controller.counters().accepted, 0);
    assert_eq!(engine.active(), 0);
}
