//! Integration tests for TOML configuration loading, writing and resolution

use regwatch_common::config::{
    load_toml_config, resolve_config_path, write_toml_config, AnalyzerConfig, LoggingConfig,
    SeverityPolicy, TomlConfig, CONFIG_ENV_VAR,
};
use serial_test::serial;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn sample_config() -> TomlConfig {
    TomlConfig {
        analyzer: AnalyzerConfig {
            base_url: Some("http://10.0.0.5:8000".to_string()),
            request_timeout_secs: 30,
            max_concurrent: Some(4),
            severity_policy: SeverityPolicy::Fixed,
            fixed_severity: Some("high".to_string()),
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
        },
    }
}

#[test]
fn test_missing_file_yields_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let config = load_toml_config(&temp_dir.path().join("absent.toml")).unwrap();
    assert_eq!(config, TomlConfig::default());
}

#[test]
fn test_write_then_load_preserves_fields() {
    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("nested").join("regwatch.toml");

    write_toml_config(&sample_config(), &target).unwrap();

    assert!(target.exists());
    let staging = temp_dir.path().join("nested").join("regwatch.toml.tmp");
    assert!(!staging.exists());
    assert_eq!(load_toml_config(&target).unwrap(), sample_config());
}

#[test]
fn test_default_config_omits_unset_options() {
    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("regwatch.toml");

    write_toml_config(&TomlConfig::default(), &target).unwrap();

    let content = std::fs::read_to_string(&target).unwrap();
    assert!(content.contains("request_timeout_secs = 120"));
    assert!(!content.contains("base_url"));
    assert!(!content.contains("max_concurrent"));
}

#[test]
fn test_malformed_file_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("broken.toml");
    std::fs::write(&target, "[analyzer\nbase_url = ").unwrap();

    let err = load_toml_config(&target).unwrap_err();
    assert!(matches!(err, regwatch_common::Error::Toml(_)));
}

#[test]
#[serial]
fn test_cli_path_beats_environment() {
    std::env::set_var(CONFIG_ENV_VAR, "/from/env.toml");
    let resolved = resolve_config_path(Some(Path::new("/from/cli.toml"))).unwrap();
    std::env::remove_var(CONFIG_ENV_VAR);

    assert_eq!(resolved, PathBuf::from("/from/cli.toml"));
}

#[test]
#[serial]
fn test_environment_beats_default() {
    std::env::set_var(CONFIG_ENV_VAR, "/from/env.toml");
    let resolved = resolve_config_path(None).unwrap();
    std::env::remove_var(CONFIG_ENV_VAR);

    assert_eq!(resolved, PathBuf::from("/from/env.toml"));
}

#[test]
#[serial]
fn test_blank_environment_falls_back_to_default() {
    std::env::set_var(CONFIG_ENV_VAR, "   ");
    let resolved = resolve_config_path(None);
    std::env::remove_var(CONFIG_ENV_VAR);

    if let Ok(path) = resolved {
        assert!(path.ends_with("regwatch/regwatch.toml"));
    }
}
