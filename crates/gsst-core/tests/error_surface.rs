use gsst_core::errors::{ErrorInfo, GsstError};

fn sample_info(code: &str, message: &str) -> ErrorInfo {
    ErrorInfo::new(code, message)
        .with_context("state", "3")
        .with_context("reason", "example")
}

#[test]
fn config_error_surface() {
    let err = GsstError::Config(sample_info("ladder-not-monotonic", "coordinates out of order"));
    assert_eq!(err.info().code, "ladder-not-monotonic");
    assert!(err.info().context.contains_key("state"));
    assert!(err.is_config());
}

#[test]
fn engine_error_surface() {
    let err = GsstError::engine("energy-missing", "no energy for candidate");
    assert_eq!(err.info().code, "energy-missing");
    assert!(!err.is_config());
}

#[test]
fn state_error_surface() {
    let err = GsstError::State(sample_info("state-out-of-range", "index 9 of 5"));
    assert_eq!(err.info().code, "state-out-of-range");
    assert!(err.info().context.contains_key("reason"));
}

#[test]
fn display_includes_context_and_hint() {
    let err = GsstError::Serde(
        ErrorInfo::new("checkpoint-read", "missing file")
            .with_context("path", "/tmp/ckpt.json")
            .with_hint("check the run directory"),
    );
    let rendered = err.to_string();
    assert!(rendered.starts_with("serde error: missing file (code: checkpoint-read)"));
    assert!(rendered.contains("path=/tmp/ckpt.json"));
    assert!(rendered.contains("hint: check the run directory"));
}

#[test]
fn errors_round_trip_json() {
    let err = GsstError::Engine(sample_info("apply-failed", "engine refused state"));
    let json = serde_json::to_string(&err).expect("serialize");
    assert!(json.contains("\"family\":\"Engine\""));
    let decoded: GsstError = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(decoded, err);
}
