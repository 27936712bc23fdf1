//! Raw violation text → structured `Violation` records
//!
//! Matching is case-insensitive:
//! - category is PHI when the text mentions "phi", otherwise PII
//! - rule is GDPR when the text mentions "gdpr", otherwise HIPAA
//! - `row <N>, column '<name>'` gives a row/column location and an
//!   "In column: <name>" context; without it the context is file-level
//! - `timestamp MM:SS` (or `HH:MM:SS`) is recorded as a timestamp location
//!
//! Output order always equals input order.

use crate::models::{Category, FileSubmission, Rule, SourceLocation, Violation};
use crate::services::severity_classifier::SeverityClassifier;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

/// Context used when no row/column location is present
pub const FILE_LEVEL_CONTEXT: &str = "File-level violation";

static ROW_COLUMN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\brow\s+(\d+),\s*column\s+'([^']*)'").expect("row/column pattern compiles")
});

static TIMESTAMP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\btimestamp\s+(\d{1,2}:\d{2}(?::\d{2})?)\b")
        .expect("timestamp pattern compiles")
});

/// Normalize `raw` for the submission identified by `submission_id`
///
/// Ids are `<submission_id>-<index>`, so they are unique within a submission
/// and stable for the same input order.
pub fn normalize<S: AsRef<str>>(
    raw: &[S],
    submission_id: &str,
    classifier: &dyn SeverityClassifier,
) -> Vec<Violation> {
    raw.iter()
        .enumerate()
        .map(|(index, text)| normalize_one(text.as_ref(), submission_id, index, classifier))
        .collect()
}

fn normalize_one(
    text: &str,
    submission_id: &str,
    index: usize,
    classifier: &dyn SeverityClassifier,
) -> Violation {
    let lowered = text.to_lowercase();

    let category = if lowered.contains("phi") {
        Category::Phi
    } else {
        Category::Pii
    };
    let rule = if lowered.contains("gdpr") {
        Rule::Gdpr
    } else {
        Rule::Hipaa
    };

    let mut location = SourceLocation::default();
    let mut context = FILE_LEVEL_CONTEXT.to_string();

    if let Some(caps) = ROW_COLUMN.captures(text) {
        // Rows too large for u32 are treated as unlocated
        if let Ok(row) = caps[1].parse::<u32>() {
            let column = caps[2].to_string();
            context = format!("In column: {}", column);
            location.row = Some(row);
            location.column = Some(column);
        }
    }

    if let Some(caps) = TIMESTAMP.captures(text) {
        location.timestamp = Some(caps[1].to_string());
    }

    let source_location = if location == SourceLocation::default() {
        None
    } else {
        Some(location)
    };

    Violation {
        id: format!("{}-{}", submission_id, index),
        raw_text: text.to_string(),
        category,
        rule,
        severity: classifier.classify(&lowered, category),
        context,
        source_location,
    }
}

/// Normalizer bound to a severity policy
#[derive(Clone)]
pub struct ViolationNormalizer {
    classifier: Arc<dyn SeverityClassifier>,
}

impl ViolationNormalizer {
    pub fn new(classifier: Arc<dyn SeverityClassifier>) -> Self {
        Self { classifier }
    }

    pub fn normalize<S: AsRef<str>>(&self, raw: &[S], submission_id: &str) -> Vec<Violation> {
        normalize(raw, submission_id, self.classifier.as_ref())
    }

    /// Normalize a submission's raw list; empty unless the submission completed
    pub fn normalize_submission(&self, submission: &FileSubmission) -> Vec<Violation> {
        self.normalize(&submission.violations, &submission.id.to_string())
    }
}
