use super::*;

#[test]
fn test_default_config() {
    let config = FrameworkConfig::default();
    assert_eq!(config.connect_timeout(), Duration::from_secs(5));
    assert!(config.candidate_timeout().is_none());
    assert_eq!(config.log_filter, "eduframe=info");
}

#[test]
fn test_missing_fields_fall_back_to_defaults() {
    let config: FrameworkConfig =
        serde_json::from_str(r#"{ "candidate_timeout_ms": 250 }"#).unwrap();
    assert_eq!(config.connect_timeout_ms, DEFAULT_CONNECT_TIMEOUT_MS);
    assert_eq!(config.candidate_timeout(), Some(Duration::from_millis(250)));
}

#[test]
fn test_unset_options_are_not_serialized() {
    let json = serde_json::to_value(FrameworkConfig::default()).unwrap();
    assert!(json.get("candidate_timeout_ms").is_none());
    assert!(json.get("log_dir").is_none());
}
