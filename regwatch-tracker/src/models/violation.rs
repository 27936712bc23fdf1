//! Structured violation records

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of protected data involved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Personally Identifiable Information
    #[serde(rename = "PII")]
    Pii,
    /// Protected Health Information
    #[serde(rename = "PHI")]
    Phi,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Pii => "PII",
            Category::Phi => "PHI",
        }
    }
}

/// Regulation a violation is reported against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rule {
    #[serde(rename = "GDPR")]
    Gdpr,
    #[serde(rename = "HIPAA")]
    Hipaa,
}

impl Rule {
    pub fn as_str(self) -> &'static str {
        match self {
            Rule::Gdpr => "GDPR",
            Rule::Hipaa => "HIPAA",
        }
    }
}

/// Violation severity, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Critical,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
            Severity::Critical => "Critical",
        }
    }
}

macro_rules! impl_display {
    ($($ty:ty),*) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }
        )*
    };
}

impl_display!(Category, Rule, Severity);

/// Unrecognized severity or category label
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseLabelError {
    pub kind: &'static str,
    pub value: String,
}

impl FromStr for Severity {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Severity::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseLabelError {
                kind: "severity",
                value: s.to_string(),
            })
    }
}

impl FromStr for Category {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pii" => Ok(Category::Pii),
            "phi" => Ok(Category::Phi),
            _ => Err(ParseLabelError {
                kind: "category",
                value: s.to_string(),
            }),
        }
    }
}

/// Where in the analyzed file a violation was found
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    /// Row number for tabular input
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row: Option<u32>,
    /// Column name for tabular input
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    /// `MM:SS` or `HH:MM:SS` offset for transcribed recordings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// A normalized violation; immutable once built
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// `<submission id>-<index in raw list>`
    pub id: String,
    /// Description exactly as returned by the analyzer
    pub raw_text: String,
    pub category: Category,
    pub rule: Rule,
    pub severity: Severity,
    /// Human-readable location hint
    pub context: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_location: Option<SourceLocation>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_parse_case_insensitive() {
        assert_eq!("critical".parse::<Severity>().unwrap(), Severity::Critical);
        assert_eq!(" HIGH ".parse::<Severity>().unwrap(), Severity::High);
        assert!("severe".parse::<Severity>().is_err());
    }

    #[test]
    fn test_category_parse() {
        assert_eq!("phi".parse::<Category>().unwrap(), Category::Phi);
        assert_eq!("PII".parse::<Category>().unwrap(), Category::Pii);
        let err = "pci".parse::<Category>().unwrap_err();
        assert_eq!(err.to_string(), "unknown category 'pci'");
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::Low < Severity::Medium);
    }

    #[test]
    fn test_serialized_labels() {
        assert_eq!(serde_json::to_string(&Category::Phi).unwrap(), "\"PHI\"");
        assert_eq!(serde_json::to_string(&Rule::Gdpr).unwrap(), "\"GDPR\"");
        assert_eq!(
            serde_json::to_string(&Severity::Medium).unwrap(),
            "\"Medium\""
        );
    }
}
