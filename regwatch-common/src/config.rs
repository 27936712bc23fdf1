//! Configuration loading, writing and config file resolution
//!
//! The TOML file is bootstrap-only: it is read once at startup. Values that
//! can also come from the command line or the environment are resolved by the
//! consuming crate (see `regwatch_tracker::config`).

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "REGWATCH_CONFIG";

/// Default analysis service base URL
pub const DEFAULT_ANALYZER_URL: &str = "http://localhost:8000";

/// Default per-request timeout for the analysis service
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Remote analysis service settings
    #[serde(default)]
    pub analyzer: AnalyzerConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Remote analysis service settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Base URL of the analysis service (without the `/api/...` path)
    #[serde(default)]
    pub base_url: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Upper bound on in-flight analyses; absent means unbounded
    #[serde(default)]
    pub max_concurrent: Option<usize>,

    /// How violation severity is assigned during normalization
    #[serde(default)]
    pub severity_policy: SeverityPolicy,

    /// Severity used when `severity_policy = "fixed"` (low, medium, high, critical)
    #[serde(default)]
    pub fixed_severity: Option<String>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            request_timeout_secs: default_request_timeout_secs(),
            max_concurrent: None,
            severity_policy: SeverityPolicy::default(),
            fixed_severity: None,
        }
    }
}

/// Severity assignment policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityPolicy {
    /// Deterministic, derived from the violation text
    #[default]
    Keyword,
    /// Uniformly random across all levels
    Random,
    /// Every violation gets `fixed_severity`
    Fixed,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Config file resolution in priority order:
/// 1. Command-line argument (highest priority)
/// 2. `REGWATCH_CONFIG` environment variable
/// 3. OS-dependent default (`<config dir>/regwatch/regwatch.toml`)
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = cli_arg {
        return Ok(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Ok(PathBuf::from(path));
        }
    }

    default_config_path()
}

/// Platform default config file location
pub fn default_config_path() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|d| d.join("regwatch").join("regwatch.toml"))
        .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
}

/// Load configuration from `path`
///
/// A missing file is not an error: defaults are returned so a fresh install
/// works without any setup. A file that exists but fails to parse is an error.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "Config file not found, using defaults");
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)?;
    let config: TomlConfig = toml::from_str(&content)?;
    info!(path = %path.display(), "Loaded configuration");
    Ok(config)
}

/// Write configuration atomically (temp file + rename)
///
/// Parent directories are created as needed.
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(".tmp");
    let temp_path = PathBuf::from(temp_name);

    std::fs::write(&temp_path, content)?;
    if let Err(e) = std::fs::rename(&temp_path, path) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(Error::Io(e));
    }

    info!(path = %path.display(), "Configuration written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TomlConfig::default();
        assert_eq!(config.analyzer.base_url, None);
        assert_eq!(config.analyzer.request_timeout_secs, 120);
        assert_eq!(config.analyzer.severity_policy, SeverityPolicy::Keyword);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: TomlConfig = toml::from_str(
            r#"
            [analyzer]
            base_url = "http://analyzer.internal:9000"
            severity_policy = "random"
            "#,
        )
        .unwrap();

        assert_eq!(
            config.analyzer.base_url.as_deref(),
            Some("http://analyzer.internal:9000")
        );
        assert_eq!(config.analyzer.severity_policy, SeverityPolicy::Random);
        assert_eq!(config.analyzer.request_timeout_secs, 120);
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn test_unknown_policy_rejected() {
        let result: std::result::Result<TomlConfig, _> = toml::from_str(
            r#"
            [analyzer]
            severity_policy = "astrology"
            "#,
        );
        assert!(result.is_err());
    }
}
