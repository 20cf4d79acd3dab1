use gsst_temper::ladder::Ordering;
use gsst_temper::StateLadder;

#[test]
fn increasing_ladder_exposes_states_in_order() {
    let ladder = StateLadder::new("temperature", &[300.0, 320.0, 345.0, 375.0]).unwrap();
    assert_eq!(ladder.len(), 4);
    assert_eq!(ladder.ordering(), Ordering::Increasing);
    assert_eq!(ladder.term(), "temperature");
    let state = ladder.state(2).unwrap();
    assert_eq!(state.index(), 2);
    assert_eq!(state.coordinate(), 345.0);
    assert_eq!(state.term(), "temperature");
    assert_eq!(ladder.coordinates(), vec![300.0, 320.0, 345.0, 375.0]);
}

#[test]
fn decreasing_ladder_is_accepted() {
    let ladder = StateLadder::new("lambda", &[1.0, 0.5, 0.0]).unwrap();
    assert_eq!(ladder.ordering(), Ordering::Decreasing);
    assert_eq!(ladder.coordinate(0), Some(1.0));
}

#[test]
fn malformed_ladders_are_configuration_errors() {
    let cases: [(&[f64], &str); 5] = [
        (&[], "ladder-too-short"),
        (&[0.5], "ladder-too-short"),
        (&[0.0, f64::NAN, 1.0], "ladder-non-finite"),
        (&[0.0, 0.5, 0.5, 1.0], "ladder-duplicate"),
        (&[0.0, 0.75, 0.5, 1.0], "ladder-not-monotonic"),
    ];
    for (coordinates, code) in cases {
        let err = StateLadder::new("lambda", coordinates).unwrap_err();
        assert!(err.is_config(), "{coordinates:?} should be a config error");
        assert_eq!(err.info().code, code, "{coordinates:?}");
    }
}

#[test]
fn adjacency_at_interior_and_endpoints() {
    let ladder = StateLadder::new("lambda", &[0.0, 0.25, 0.5, 0.75, 1.0]).unwrap();
    assert_eq!(ladder.neighbors(0), vec![1]);
    assert_eq!(ladder.neighbors(2), vec![1, 3]);
    assert_eq!(ladder.neighbors(4), vec![3]);
    assert_eq!(ladder.degree(0), 1);
    assert_eq!(ladder.degree(3), 2);
    assert_eq!(ladder.previous(0), None);
    assert_eq!(ladder.next(4), None);
    assert_eq!(ladder.next(1), Some(2));
}

#[test]
fn out_of_range_lookup_is_a_state_error() {
    let ladder = StateLadder::new("lambda", &[0.0, 1.0]).unwrap();
    assert!(ladder.state(2).is_none());
    let err = ladder.checked_state(2).unwrap_err();
    assert_eq!(err.info().code, "state-out-of-range");
    assert!(!err.is_config());
}

#[test]
fn fingerprint_tracks_term_and_coordinates() {
    let a = StateLadder::new("lambda", &[0.0, 0.5, 1.0]).unwrap();
    let b = StateLadder::new("lambda", &[0.0, 0.5, 1.0]).unwrap();
    let c = StateLadder::new("lambda", &[0.0, 0.6, 1.0]).unwrap();
    let d = StateLadder::new("restraint", &[0.0, 0.5, 1.0]).unwrap();
    assert_eq!(a.fingerprint(), b.fingerprint());
    assert_ne!(a.fingerprint(), c.fingerprint());
    assert_ne!(a.fingerprint(), d.fingerprint());
    assert_eq!(a.fingerprint().len(), 64);
}
