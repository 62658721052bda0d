//! Configuration loading and validation against real files.

use std::io::Write;

use progression::config::loader::{LoaderOptions, load_config, load_or_builtin};
use progression::config::{EngineConfig, validate_config};
use progression::error::{ConfigError, ProgressionError};
use progression::profile::{BehaviorType, TriggerKind};

fn write_yaml(config: &EngineConfig) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(serde_yaml::to_string(config).unwrap().as_bytes())
        .unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn builtin_config_round_trips_through_yaml() {
    let file = write_yaml(&EngineConfig::builtin());
    let loaded = load_config(file.path(), LoaderOptions::default()).unwrap();
    assert_eq!(loaded.config.triggers.len(), 7);
    assert_eq!(loaded.config.behaviors.len(), 7);
    assert!(loaded.warnings.is_empty());
}

#[test]
fn trigger_order_is_preserved() {
    let file = write_yaml(&EngineConfig::builtin());
    let loaded = load_config(file.path(), LoaderOptions::default()).unwrap();
    let kinds: Vec<&str> = loaded.config.triggers.keys().map(TriggerKind::as_str).collect();
    assert_eq!(kinds[0], "abandonment_signal");
    assert_eq!(kinds.last().copied(), Some("explicit_rejection"));
}

#[test]
fn missing_file_is_a_config_error() {
    let err = load_config(
        std::path::Path::new("/no/such/config.yaml"),
        LoaderOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        ProgressionError::Config(ConfigError::MissingFile { .. })
    ));
}

#[test]
fn malformed_yaml_is_a_parse_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"triggers: [oops: {").unwrap();
    file.flush().unwrap();
    let err = load_config(file.path(), LoaderOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        ProgressionError::Config(ConfigError::ParseError { .. })
    ));
}

#[test]
fn validation_reports_every_error_at_once() {
    let mut config = EngineConfig::builtin();
    config
        .triggers
        .get_mut(&TriggerKind::new("criticism"))
        .unwrap()
        .patterns
        .push("[bad".to_string());
    config
        .triggers
        .get_mut(&TriggerKind::new("reassurance"))
        .unwrap()
        .patterns
        .push("(also bad".to_string());
    config
        .behaviors
        .get_mut(&BehaviorType::Codependency)
        .unwrap()
        .phases
        .advance = vec![0.9, 0.5];

    let file = write_yaml(&config);
    let err = load_config(file.path(), LoaderOptions::default()).unwrap_err();
    let ProgressionError::Config(ConfigError::ValidationError { errors, .. }) = err else {
        panic!("expected a validation error");
    };
    assert!(errors.len() >= 3, "expected all errors collected, got {errors:?}");
}

#[test]
fn clampable_values_warn_but_load() {
    let mut config = EngineConfig::builtin();
    config
        .behaviors
        .get_mut(&BehaviorType::BorderlinePd)
        .unwrap()
        .defaults
        .volatility = 1.8;
    let file = write_yaml(&config);
    let loaded = load_config(file.path(), LoaderOptions::default()).unwrap();
    assert!(!loaded.warnings.is_empty());

    // Under strict the same file is rejected.
    let err = load_config(file.path(), LoaderOptions { strict: true }).unwrap_err();
    assert!(matches!(
        err,
        ProgressionError::Config(ConfigError::ValidationError { .. })
    ));
}

#[test]
fn builtin_fallback_needs_no_file() {
    let loaded = load_or_builtin(None, LoaderOptions { strict: true }).unwrap();
    assert!(validate_config(&loaded.config).is_ok());
}

#[test]
fn custom_safety_ladder_survives_the_trip() {
    let mut config = EngineConfig::builtin();
    let yaml = serde_yaml::to_string(&config).unwrap();
    let parsed: EngineConfig = serde_yaml::from_str(&yaml).unwrap();
    // Phase tables and overrides must survive serialization untouched.
    for bt in BehaviorType::ALL {
        assert_eq!(
            parsed.behaviors[&bt].phases.advance,
            config.behaviors[&bt].phases.advance
        );
    }
    config
        .behaviors
        .get_mut(&BehaviorType::AvoidantAttachment)
        .unwrap()
        .trigger_overrides
        .insert(TriggerKind::new("criticism"), 0.95);
    let file = write_yaml(&config);
    let loaded = load_config(file.path(), LoaderOptions::default()).unwrap();
    assert_eq!(
        loaded
            .config
            .effective_weight(&TriggerKind::new("criticism"), BehaviorType::AvoidantAttachment),
        Some(0.95)
    );
}
