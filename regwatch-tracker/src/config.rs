//! Runtime settings resolution for regwatch-tracker
//!
//! Provides tiered resolution of the analyzer URL with
//! CLI → ENV → TOML → built-in default priority.

use regwatch_common::config::{TomlConfig, DEFAULT_ANALYZER_URL};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::services::severity_classifier::{self, SeverityClassifier};

/// Environment variable overriding the analyzer URL
pub const ANALYZER_URL_ENV_VAR: &str = "REGWATCH_ANALYZER_URL";

/// Settings the tracker runs with
#[derive(Clone)]
pub struct RuntimeSettings {
    pub analyzer_url: String,
    pub request_timeout: Duration,
    pub max_concurrent: Option<usize>,
    pub classifier: Arc<dyn SeverityClassifier>,
}

impl RuntimeSettings {
    /// Resolve settings from the command line override and the TOML file
    pub fn resolve(cli_analyzer_url: Option<&str>, toml_config: &TomlConfig) -> Self {
        let env_url = std::env::var(ANALYZER_URL_ENV_VAR).ok();
        let analyzer_url = resolve_analyzer_url(
            cli_analyzer_url,
            env_url.as_deref(),
            toml_config.analyzer.base_url.as_deref(),
        );

        Self {
            analyzer_url,
            request_timeout: Duration::from_secs(toml_config.analyzer.request_timeout_secs.max(1)),
            max_concurrent: toml_config.analyzer.max_concurrent,
            classifier: severity_classifier::from_config(&toml_config.analyzer),
        }
    }
}

/// Pick the analyzer URL from the first tier holding a usable value
///
/// **Priority:** CLI → ENV → TOML → default
pub fn resolve_analyzer_url(cli: Option<&str>, env: Option<&str>, toml: Option<&str>) -> String {
    let tiers = [("command line", cli), ("environment", env), ("TOML", toml)];

    let configured: Vec<&str> = tiers
        .iter()
        .filter(|(_, value)| value.map_or(false, is_non_blank))
        .map(|(source, _)| *source)
        .collect();

    if configured.len() > 1 {
        warn!(
            "Analyzer URL found in multiple sources: {}. Using {} (highest priority).",
            configured.join(", "),
            configured[0]
        );
    }

    for (source, value) in tiers {
        if let Some(url) = value.filter(|v| is_non_blank(v)) {
            info!(source, url = %url.trim(), "Analyzer URL resolved");
            return url.trim().to_string();
        }
    }

    info!(url = DEFAULT_ANALYZER_URL, "Analyzer URL not configured, using default");
    DEFAULT_ANALYZER_URL.to_string()
}

/// Non-empty, non-whitespace
pub fn is_non_blank(url: &str) -> bool {
    !url.trim().is_empty()
}
