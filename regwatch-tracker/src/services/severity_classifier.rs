//! Severity assignment policies
//!
//! The analysis service returns free text without a severity, so the
//! normalizer delegates the choice to a `SeverityClassifier`. The keyword
//! classifier is deterministic and the default; the uniform random one
//! reproduces the dashboard's placeholder behavior.

use crate::models::{Category, Severity};
use rand::seq::SliceRandom;
use regwatch_common::config::{AnalyzerConfig, SeverityPolicy};
use std::sync::Arc;

/// Picks a severity for one raw violation description
pub trait SeverityClassifier: Send + Sync {
    /// `lowered` is the description in lower case; `category` is already derived
    fn classify(&self, lowered: &str, category: Category) -> Severity;

    /// Same input always yields the same severity
    fn is_deterministic(&self) -> bool {
        true
    }
}

/// Keyword-driven classification
///
/// Tiers are checked from most to least severe; the first tier with a
/// matching keyword wins. PHI with no keyword match is `High`, anything else
/// `Medium`.
#[derive(Debug, Clone, Default)]
pub struct KeywordClassifier;

const CRITICAL_KEYWORDS: &[&str] = &[
    "critical",
    "ssn",
    "social security",
    "credit card",
    "passport",
    "bank account",
];
const HIGH_KEYWORDS: &[&str] = &[
    "high risk",
    "high severity",
    "diagnosis",
    "medical record",
    "prescription",
    "date of birth",
    "unencrypted",
];
const LOW_KEYWORDS: &[&str] = &["low risk", "low severity", "minor", "no content found"];

impl SeverityClassifier for KeywordClassifier {
    fn classify(&self, lowered: &str, category: Category) -> Severity {
        let hit = |keywords: &[&str]| keywords.iter().any(|k| lowered.contains(k));

        if hit(CRITICAL_KEYWORDS) {
            Severity::Critical
        } else if hit(HIGH_KEYWORDS) {
            Severity::High
        } else if hit(LOW_KEYWORDS) {
            Severity::Low
        } else if category == Category::Phi {
            Severity::High
        } else {
            Severity::Medium
        }
    }
}

/// Uniformly random severity, ignoring content
#[derive(Debug, Clone, Default)]
pub struct UniformRandomClassifier;

impl SeverityClassifier for UniformRandomClassifier {
    fn classify(&self, _lowered: &str, _category: Category) -> Severity {
        *Severity::ALL
            .choose(&mut rand::thread_rng())
            .unwrap_or(&Severity::Medium)
    }

    fn is_deterministic(&self) -> bool {
        false
    }
}

/// Same severity for everything
#[derive(Debug, Clone)]
pub struct FixedClassifier(pub Severity);

impl SeverityClassifier for FixedClassifier {
    fn classify(&self, _lowered: &str, _category: Category) -> Severity {
        self.0
    }
}

/// Build the classifier selected by configuration
///
/// `fixed` without a parsable `fixed_severity` falls back to `Medium`.
pub fn from_config(config: &AnalyzerConfig) -> Arc<dyn SeverityClassifier> {
    match config.severity_policy {
        SeverityPolicy::Keyword => Arc::new(KeywordClassifier),
        SeverityPolicy::Random => Arc::new(UniformRandomClassifier),
        SeverityPolicy::Fixed => {
            let severity = config
                .fixed_severity
                .as_deref()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(|| {
                    tracing::warn!(
                        fixed_severity = ?config.fixed_severity,
                        "Fixed severity policy without a valid level, using Medium"
                    );
                    Severity::Medium
                });
            Arc::new(FixedClassifier(severity))
        }
    }
}
