use gsst_temper::{IndependenceDistribution, ProposalStrategy, RunConfig};
use tempfile::tempdir;

#[test]
fn empty_document_yields_defaults() {
    let config = RunConfig::from_yaml_str("{}").unwrap();
    assert_eq!(config, RunConfig::default());
    assert_eq!(config.wang_landau.initial_increment, 1.0);
    assert_eq!(config.wang_landau.floor, 0.01);
    assert_eq!(config.wang_landau.flatness_threshold, 0.2);
    assert_eq!(config.wang_landau.min_visits, 20);
    assert!(config.wang_landau.freeze_in_production);
    assert_eq!(config.acceptance.max_delta_u, 500.0);
    assert_eq!(config.faults.max_consecutive, 10);
    assert_eq!(config.proposal, ProposalStrategy::Local);
    assert_eq!(config.change_interval, 1000);
    assert!(config.validate().is_ok());
}

#[test]
fn full_document_round_trips_through_yaml() {
    let text = r#"
ladder:
  parameter: temperature
  coordinates: [300.0, 310.0, 321.0, 333.0]
wang_landau:
  initial_increment: 2.0
  floor: 0.005
  flatness_threshold: 0.1
  min_visits: 50
  freeze_in_production: false
proposal:
  type: independence
  distribution: weighted
acceptance:
  max_delta_u: 200.0
faults:
  max_consecutive: 4
weights:
  initial: [0.0, -1.0, -2.0, -3.0]
initial_state: 2
steps: 5000
change_interval: 250
report_interval: 10
checkpoint:
  interval: 1000
seed_policy:
  master_seed: 99
  label: heated
"#;
    let config = RunConfig::from_yaml_str(text).unwrap();
    config.validate().unwrap();
    assert_eq!(config.ladder.parameter, "temperature");
    assert_eq!(
        config.proposal,
        ProposalStrategy::Independence {
            distribution: IndependenceDistribution::Weighted
        }
    );
    assert_eq!(config.checkpoint.max_to_keep, 4);
    assert_eq!(config.seed_policy.label.as_deref(), Some("heated"));

    let yaml = serde_yaml::to_string(&config).unwrap();
    assert_eq!(RunConfig::from_yaml_str(&yaml).unwrap(), config);
}

#[test]
fn proposal_variants_parse_by_tag() {
    let gibbs = RunConfig::from_yaml_str("proposal:\n  type: gibbs\n").unwrap();
    assert_eq!(gibbs.proposal, ProposalStrategy::Gibbs);
    let independence = RunConfig::from_yaml_str("proposal:\n  type: independence\n").unwrap();
    assert_eq!(
        independence.proposal,
        ProposalStrategy::Independence {
            distribution: IndependenceDistribution::Uniform
        }
    );
    let err = RunConfig::from_yaml_str("proposal:\n  type: teleport\n").unwrap_err();
    assert_eq!(err.info().code, "config-parse");
}

#[test]
fn load_reports_the_offending_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.yaml");
    std::fs::write(&path, "ladder: [not, a, map]\n").unwrap();
    let err = RunConfig::load(&path).unwrap_err();
    assert_eq!(err.info().code, "config-parse");
    assert!(err.info().context.contains_key("path"));

    let missing = RunConfig::load(&dir.path().join("absent.yaml")).unwrap_err();
    assert_eq!(missing.info().code, "config-read");
}

#[test]
fn fingerprint_changes_with_content() {
    let a = RunConfig::default();
    let mut b = RunConfig::default();
    b.steps += 1;
    assert_eq!(a.fingerprint().unwrap(), RunConfig::default().fingerprint().unwrap());
    assert_ne!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
}
