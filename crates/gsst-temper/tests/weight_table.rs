use gsst_temper::{Normalization, WeightTable, ZeroPoint};

#[test]
fn reinforce_adds_increment_and_counts_visit() {
    let mut table = WeightTable::zeros(3);
    table.reinforce(1, 0.5).unwrap();
    table.reinforce(1, 0.5).unwrap();
    table.reinforce(2, 0.25).unwrap();
    assert_eq!(table.weights(), vec![0.0, 1.0, 0.25]);
    assert_eq!(table.visits(), vec![0, 2, 1]);
    assert_eq!(table.total_visits(), 3);
    assert_eq!(table.zero_point(), ZeroPoint::Unnormalized);
}

#[test]
fn reinforce_out_of_range_leaves_table_untouched() {
    let mut table = WeightTable::from_weights(&[0.1, 0.2]).unwrap();
    let before = table.clone();
    let err = table.reinforce(2, 1.0).unwrap_err();
    assert_eq!(err.info().code, "state-out-of-range");
    assert_eq!(table, before);

    let err = table.reinforce(0, f64::NAN).unwrap_err();
    assert_eq!(err.info().code, "increment-non-finite");
    assert_eq!(table, before);
}

#[test]
fn non_finite_initial_weights_are_rejected() {
    let err = WeightTable::from_weights(&[0.0, f64::INFINITY]).unwrap_err();
    assert!(err.is_config());
}

#[test]
fn zero_mean_normalization_is_idempotent() {
    let mut table = WeightTable::from_weights(&[3.0, 1.0, -1.0, 5.0]).unwrap();
    table.normalize(Normalization::ZeroMean).unwrap();
    let once = table.clone();
    table.normalize(Normalization::ZeroMean).unwrap();
    assert_eq!(table, once);
    assert_eq!(table.zero_point(), ZeroPoint::Mean);
    let sum: f64 = table.weights().iter().sum();
    assert!(sum.abs() < 1e-12);
}

#[test]
fn pinned_normalization_is_idempotent_and_preserves_differences() {
    let mut table = WeightTable::from_weights(&[3.0, 1.0, -1.0]).unwrap();
    table.normalize(Normalization::Pin { state: 1 }).unwrap();
    assert_eq!(table.weights(), vec![2.0, 0.0, -2.0]);
    let once = table.clone();
    table.normalize(Normalization::Pin { state: 1 }).unwrap();
    assert_eq!(table, once);
    assert_eq!(table.zero_point(), ZeroPoint::Reference { state: 1 });

    let err = table.normalize(Normalization::Pin { state: 3 }).unwrap_err();
    assert_eq!(err.info().code, "state-out-of-range");
}

#[test]
fn relative_view_does_not_mutate() {
    let table = WeightTable::from_weights(&[2.0, 1.5, 0.5]).unwrap();
    assert_eq!(table.relative_to(0).unwrap(), vec![0.0, -0.5, -1.5]);
    assert_eq!(table.weights(), vec![2.0, 1.5, 0.5]);
}

#[test]
fn flatness_ratio_and_stage_reset() {
    let mut table = WeightTable::zeros(2);
    assert!(table.flatness_ratio().is_infinite());
    for _ in 0..3 {
        table.reinforce(0, 0.1).unwrap();
    }
    table.reinforce(1, 0.1).unwrap();
    // max 3, min 1, mean 2
    assert!((table.flatness_ratio() - 1.0).abs() < 1e-12);
    assert_eq!(table.min_visits(), 1);

    table.reset_visits();
    assert_eq!(table.visits(), vec![0, 0]);
    assert_eq!(table.total_visits(), 4);
    assert!((table.weights()[0] - 0.3).abs() < 1e-12);
}

#[test]
fn table_serializes_with_zero_point() {
    let mut table = WeightTable::from_weights(&[1.0, -1.0]).unwrap();
    table.normalize(Normalization::Pin { state: 0 }).unwrap();
    let json = serde_json::to_string(&table).unwrap();
    let restored: WeightTable = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, table);
}
