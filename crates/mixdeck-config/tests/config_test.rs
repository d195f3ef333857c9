#![allow(clippy::unwrap_used)]
// Integration tests for config loading, saving and translation.

use std::time::Duration;

use mixdeck_config::{
    Config, ConfigError, load_config_from, save_config_to, to_controller_config,
};
use mixdeck_core::RangePolicy;

#[test]
fn test_missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();

    assert_eq!(cfg.host, "localhost");
    assert_eq!(cfg.timeout, 10);
    assert_eq!(cfg.range_policy, RangePolicy::PassThrough);
    assert!(cfg.log_file.is_none());
}

#[test]
fn test_file_values_override_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        "host = \"pipedal.local\"\ntimeout = 3\nrange_policy = \"clamp\"\n",
    )
    .unwrap();

    let cfg = load_config_from(&path).unwrap();

    assert_eq!(cfg.host, "pipedal.local");
    assert_eq!(cfg.timeout, 3);
    assert_eq!(cfg.range_policy, RangePolicy::Clamp);
}

#[test]
fn test_unknown_range_policy_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "range_policy = \"sometimes\"\n").unwrap();

    let err = load_config_from(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Figment(_)));
}

#[test]
fn test_save_then_load_preserves_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");
    let cfg = Config {
        host: "10.0.0.5".into(),
        timeout: 4,
        range_policy: RangePolicy::Reject,
        log_file: Some(dir.path().join("mixdeck.log")),
    };

    save_config_to(&cfg, &path).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("range_policy = \"reject\""));

    assert_eq!(load_config_from(&path).unwrap(), cfg);
}

#[test]
fn test_translation_to_controller_config() {
    let cfg = Config {
        host: "mixer.lan".into(),
        timeout: 2,
        range_policy: RangePolicy::Clamp,
        log_file: None,
    };

    let controller = to_controller_config(&cfg).unwrap();

    assert_eq!(controller.base_url.as_str(), "http://mixer.lan:5000/api");
    assert_eq!(controller.timeout, Duration::from_secs(2));
    assert_eq!(controller.range_policy, RangePolicy::Clamp);
}

#[test]
fn test_translation_validates_fields() {
    let empty_host = Config {
        host: "  ".into(),
        ..Config::default()
    };
    assert!(matches!(
        to_controller_config(&empty_host),
        Err(ConfigError::Validation { ref field, .. }) if field == "host"
    ));

    let zero_timeout = Config {
        timeout: 0,
        ..Config::default()
    };
    assert!(matches!(
        to_controller_config(&zero_timeout),
        Err(ConfigError::Validation { ref field, .. }) if field == "timeout"
    ));

    let bad_host = Config {
        host: "no such host".into(),
        ..Config::default()
    };
    assert!(to_controller_config(&bad_host).is_err());
}
