use letterloop::error::EngineError;
use letterloop::logging::init_logging;

#[test]
fn test_error_creation() {
    let error = EngineError::new("Test error", "test_stage");
    assert_eq!(error.message, "Test error");
    assert_eq!(error.stage, "test_stage");
    assert!(!error.is_not_found());
}

#[test]
fn test_error_with_context() {
    let error = EngineError::new("Test error", "test_stage")
        .with_context("Additional context");
    assert!(error.context.is_some());
    assert_eq!(error.context.unwrap(), "Additional context");
}

#[test]
fn test_error_with_profile() {
    let error = EngineError::new("Profile not found", "not_found")
        .with_profile("1700000000000");
    assert!(error.is_not_found());
    assert_eq!(error.profile_id.as_deref(), Some("1700000000000"));
}

#[test]
fn test_error_display() {
    let error = EngineError::new("Test error", "test_stage")
        .with_context("context")
        .with_profile("p1");
    let display = format!("{}", error);
    assert!(display.starts_with("[test_stage] Test error"));
    assert!(display.contains("(profile: p1)"));
    assert!(display.contains("(context: context)"));
}

#[test]
fn test_conversions_pick_stage() {
    let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
    assert_eq!(EngineError::from(io).stage, "io");

    let json = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    assert_eq!(EngineError::from(json).stage, "json_parse");

    let toml = toml::from_str::<toml::Value>("= 1").unwrap_err();
    assert_eq!(EngineError::from(toml).stage, "config_parse");

    let any = anyhow::anyhow!("inner").context("outer");
    let err = EngineError::from(any);
    assert_eq!(err.stage, "unknown");
    assert!(err.message.contains("outer"));
    assert!(err.message.contains("inner"));
}

#[test]
fn test_second_logging_init_is_an_error() {
    let _ = init_logging();
    let err = init_logging().unwrap_err();
    assert_eq!(err.stage, "logging");
}
