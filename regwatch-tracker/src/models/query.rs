//! Violation search/filter query

use super::violation::{Category, ParseLabelError, Severity};
use serde::{Deserialize, Serialize};

/// Label that disables a severity or category constraint
pub const ALL_LABEL: &str = "all";

/// Query over normalized violations; every set field must match
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationQuery {
    /// Case-insensitive substring of the raw text or rule label
    pub search_term: Option<String>,
    /// `None` means all severities
    pub severity: Option<Severity>,
    /// `None` means all categories
    pub category: Option<Category>,
}

impl ViolationQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search_term = Some(term.into());
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    /// Build from UI-style labels where `"all"` disables a constraint
    pub fn from_labels(
        search_term: Option<&str>,
        severity: &str,
        category: &str,
    ) -> Result<Self, ParseLabelError> {
        Ok(Self {
            search_term: search_term.map(str::to_string),
            severity: parse_optional(severity)?,
            category: parse_optional(category)?,
        })
    }

    /// True when no constraint is set
    pub fn is_unconstrained(&self) -> bool {
        self.search_term.as_deref().map_or(true, str::is_empty)
            && self.severity.is_none()
            && self.category.is_none()
    }
}

fn parse_optional<T>(label: &str) -> Result<Option<T>, ParseLabelError>
where
    T: std::str::FromStr<Err = ParseLabelError>,
{
    if label.trim().eq_ignore_ascii_case(ALL_LABEL) {
        Ok(None)
    } else {
        label.parse().map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_disables_constraints() {
        let query = ViolationQuery::from_labels(None, "all", "ALL").unwrap();
        assert!(query.is_unconstrained());
    }

    #[test]
    fn test_labels_parse() {
        let query = ViolationQuery::from_labels(Some("gdpr"), "critical", "phi").unwrap();
        assert_eq!(query.search_term.as_deref(), Some("gdpr"));
        assert_eq!(query.severity, Some(Severity::Critical));
        assert_eq!(query.category, Some(Category::Phi));
        assert!(!query.is_unconstrained());
    }

    #[test]
    fn test_bad_label_rejected() {
        assert!(ViolationQuery::from_labels(None, "urgent", "all").is_err());
    }

    #[test]
    fn test_empty_search_is_unconstrained() {
        assert!(ViolationQuery::new().with_search("").is_unconstrained());
    }
}
