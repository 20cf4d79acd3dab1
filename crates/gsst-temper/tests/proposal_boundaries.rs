use gsst_core::RngHandle;
use gsst_temper::{
    IndependenceDistribution, ProposalSampler, ProposalStrategy, StateLadder, WeightTable,
};

fn five_state_ladder() -> StateLadder {
    StateLadder::new("lambda", &[0.0, 0.25, 0.5, 0.75, 1.0]).unwrap()
}

#[test]
fn local_proposals_at_endpoints_only_offer_the_single_neighbour() {
    let ladder = five_state_ladder();
    let weights = WeightTable::zeros(ladder.len());
    let sampler = ProposalSampler::new(ProposalStrategy::Local);
    let mut rng = RngHandle::from_seed(11);
    for _ in 0..200 {
        let low = sampler.propose(0, &ladder, &weights, None, &mut rng).unwrap();
        assert_eq!(low.candidate, 1);
        let high = sampler.propose(4, &ladder, &weights, None, &mut rng).unwrap();
        assert_eq!(high.candidate, 3);
    }
}

#[test]
fn local_proposals_at_interior_states_never_stay_put() {
    let ladder = five_state_ladder();
    let weights = WeightTable::zeros(ladder.len());
    let sampler = ProposalSampler::new(ProposalStrategy::Local);
    let mut rng = RngHandle::from_seed(12);
    let mut seen = [0usize; 2];
    for _ in 0..400 {
        let proposal = sampler.propose(2, &ladder, &weights, None, &mut rng).unwrap();
        assert!(!proposal.is_self_transition(2));
        match proposal.candidate {
            1 => seen[0] += 1,
            3 => seen[1] += 1,
            other => panic!("non-adjacent candidate {other}"),
        }
        assert_eq!(proposal.log_ratio(), 0.0);
    }
    assert!(seen[0] > 150 && seen[1] > 150, "{seen:?}");
}

#[test]
fn local_proposals_carry_the_edge_hastings_ratio() {
    let ladder = five_state_ladder();
    let weights = WeightTable::zeros(ladder.len());
    let sampler = ProposalSampler::new(ProposalStrategy::Local);
    let mut rng = RngHandle::from_seed(13);

    let outward = sampler.propose(0, &ladder, &weights, None, &mut rng).unwrap();
    assert!((outward.log_ratio() - 0.5f64.ln()).abs() < 1e-12);

    let inward = loop {
        let proposal = sampler.propose(1, &ladder, &weights, None, &mut rng).unwrap();
        if proposal.candidate == 0 {
            break proposal;
        }
    };
    assert!((inward.log_ratio() - 2.0f64.ln()).abs() < 1e-12);
}

#[test]
fn two_state_local_proposal_is_symmetric() {
    let ladder = StateLadder::new("lambda", &[0.0, 1.0]).unwrap();
    let weights = WeightTable::zeros(2);
    let sampler = ProposalSampler::new(ProposalStrategy::Local);
    let mut rng = RngHandle::from_seed(14);
    let proposal = sampler.propose(1, &ladder, &weights, None, &mut rng).unwrap();
    assert_eq!(proposal.candidate, 0);
    assert_eq!(proposal.log_ratio(), 0.0);
}

#[test]
fn uniform_independence_may_repropose_the_current_state() {
    let ladder = five_state_ladder();
    let weights = WeightTable::zeros(ladder.len());
    let sampler = ProposalSampler::new(ProposalStrategy::Independence {
        distribution: IndependenceDistribution::Uniform,
    });
    let mut rng = RngHandle::from_seed(15);
    let mut counts = [0usize; 5];
    for _ in 0..5_000 {
        let proposal = sampler.propose(2, &ladder, &weights, None, &mut rng).unwrap();
        assert_eq!(proposal.log_ratio(), 0.0);
        counts[proposal.candidate] += 1;
    }
    assert!(counts[2] > 0);
    for count in counts {
        assert!((800..1200).contains(&count), "{counts:?}");
    }
}

#[test]
fn weighted_independence_follows_exponentiated_weights() {
    let ladder = StateLadder::new("lambda", &[0.0, 0.5, 1.0]).unwrap();
    let weights = WeightTable::from_weights(&[0.0, 2.0f64.ln(), 0.0]).unwrap();
    let sampler = ProposalSampler::new(ProposalStrategy::Independence {
        distribution: IndependenceDistribution::Weighted,
    });
    let mut rng = RngHandle::from_seed(16);
    let mut counts = [0usize; 3];
    for _ in 0..8_000 {
        let proposal = sampler.propose(0, &ladder, &weights, None, &mut rng).unwrap();
        counts[proposal.candidate] += 1;
        if proposal.candidate == 1 {
            // q(1 -> 0) / q(0 -> 1) = 1 / 2
            assert!((proposal.log_ratio() - 0.5f64.ln()).abs() < 1e-12);
        }
    }
    let middle = counts[1] as f64 / 8_000.0;
    assert!((middle - 0.5).abs() < 0.03, "{counts:?}");
}

#[test]
fn gibbs_requires_energies_for_every_state() {
    let ladder = five_state_ladder();
    let weights = WeightTable::zeros(ladder.len());
    let sampler = ProposalSampler::new(ProposalStrategy::Gibbs);
    assert!(sampler.needs_all_energies());
    let mut rng = RngHandle::from_seed(17);

    let err = sampler.propose(0, &ladder, &weights, None, &mut rng).unwrap_err();
    assert_eq!(err.info().code, "energies-missing");
    let short = [0.0, 1.0];
    let err = sampler
        .propose(0, &ladder, &weights, Some(&short), &mut rng)
        .unwrap_err();
    assert_eq!(err.info().code, "shape-mismatch");
}

#[test]
fn gibbs_draws_follow_the_weighted_conditional() {
    let ladder = StateLadder::new("lambda", &[0.0, 0.5, 1.0]).unwrap();
    let weights = WeightTable::from_weights(&[0.0, 0.0, -(2.0f64.ln())]).unwrap();
    let sampler = ProposalSampler::new(ProposalStrategy::Gibbs);
    // exp(-u - w) = [1, 1/2, 1/2]
    let energies = [0.0, 2.0f64.ln(), 4.0f64.ln()];
    let mut rng = RngHandle::from_seed(20);
    let draws = 8_000;
    let mut counts = [0usize; 3];
    for _ in 0..draws {
        let proposal = sampler
            .propose(1, &ladder, &weights, Some(&energies), &mut rng)
            .unwrap();
        counts[proposal.candidate] += 1;
        if proposal.candidate == 0 {
            // q(0 -> 1) / q(1 -> 0) = 1 / 2
            assert!((proposal.log_ratio() - 0.5f64.ln()).abs() < 1e-12);
        }
    }
    let expected = [0.5, 0.25, 0.25];
    for (count, p) in counts.iter().zip(expected) {
        let observed = *count as f64 / draws as f64;
        assert!((observed - p).abs() < 0.03, "{counts:?}");
    }
}

#[test]
fn gibbs_never_picks_an_infinite_energy_state() {
    let ladder = StateLadder::new("lambda", &[0.0, 0.5, 1.0]).unwrap();
    let weights = WeightTable::zeros(3);
    let sampler = ProposalSampler::new(ProposalStrategy::Gibbs);
    let energies = [0.0, 0.0, f64::INFINITY];
    let mut rng = RngHandle::from_seed(18);
    for _ in 0..500 {
        let proposal = sampler
            .propose(0, &ladder, &weights, Some(&energies), &mut rng)
            .unwrap();
        assert_ne!(proposal.candidate, 2);
    }
}

#[test]
fn proposing_from_outside_the_ladder_fails() {
    let ladder = five_state_ladder();
    let weights = WeightTable::zeros(ladder.len());
    let sampler = ProposalSampler::default();
    let mut rng = RngHandle::from_seed(19);
    let err = sampler.propose(5, &ladder, &weights, None, &mut rng).unwrap_err();
    assert_eq!(err.info().code, "state-out-of-range");
}
