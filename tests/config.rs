use reflective_di::{DiError, RuntimeConfig};
use serial_test::serial;
use std::env;

const VARS: [&str; 3] = ["REFLECTIVE_DI_NAME", "REFLECTIVE_DI_EAGER", "REFLECTIVE_DI_TRACE"];

fn clear_env() {
    for var in VARS {
        env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_from_env_defaults() {
    clear_env();
    let config = RuntimeConfig::from_env().unwrap();
    assert_eq!(config, RuntimeConfig::default());
    assert_eq!(config.name, "app");
    assert!(config.eager_instantiation);
    assert!(!config.trace_resolution);
}

#[test]
#[serial]
fn test_from_env_overrides() {
    clear_env();
    env::set_var("REFLECTIVE_DI_NAME", "billing");
    env::set_var("REFLECTIVE_DI_EAGER", "off");
    env::set_var("REFLECTIVE_DI_TRACE", " YES ");

    let config = RuntimeConfig::from_env().unwrap();
    clear_env();

    assert_eq!(config.name, "billing");
    assert!(!config.eager_instantiation);
    assert!(config.trace_resolution);
}

#[test]
#[serial]
fn test_from_env_rejects_bad_boolean() {
    clear_env();
    env::set_var("REFLECTIVE_DI_EAGER", "sometimes");

    let err = RuntimeConfig::from_env().unwrap_err();
    clear_env();

    match err {
        DiError::Config(message) => {
            assert!(message.contains("REFLECTIVE_DI_EAGER"));
            assert!(message.contains("sometimes"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_builder_methods() {
    let config = RuntimeConfig::new("svc")
        .eager_instantiation(false)
        .trace_resolution(true);
    assert_eq!(config.name, "svc");
    assert!(!config.eager_instantiation);
    assert!(config.trace_resolution);
}

#[cfg(feature = "config")]
mod json {
    use reflective_di::{DiError, ProviderScope, RuntimeConfig};

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = RuntimeConfig::from_json(r#"{ "name": "billing" }"#).unwrap();
        assert_eq!(config.name, "billing");
        assert!(config.eager_instantiation);
        assert!(!config.trace_resolution);
    }

    #[test]
    fn test_json_round_trip() {
        let config = RuntimeConfig::new("svc").trace_resolution(true);
        let json = config.to_json().unwrap();
        assert_eq!(RuntimeConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_invalid_json_is_a_config_error() {
        assert!(matches!(
            RuntimeConfig::from_json("{ not json"),
            Err(DiError::Config(_))
        ));
    }

    #[test]
    fn test_scope_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&ProviderScope::Operation).unwrap(), "\"operation\"");
    }
}
