//! Normalize → filter → summarize over realistic analyzer output

use regwatch_tracker::services::violation_normalizer::FILE_LEVEL_CONTEXT;
use regwatch_tracker::services::{
    filter, normalize, FixedClassifier, KeywordClassifier, ViolationNormalizer, ViolationSummary,
};
use regwatch_tracker::{Category, Severity, Violation, ViolationQuery};
use std::sync::Arc;

const RAW: &[&str] = &[
    "row 12, column 'email', GDPR violation: email address stored unencrypted",
    "phi leak detected",
    "row 4, column 'ssn', PHI social security number exposed",
    "row 9, column 'notes', minor GDPR concern",
    "Speaker disclosed PHI diagnosis at timestamp 02:15",
    "PHI credit card number in free text",
];

fn normalized() -> Vec<Violation> {
    normalize(RAW, "sub", &KeywordClassifier)
}

#[test]
fn test_normalize_preserves_order_and_text() {
    let violations = normalized();
    assert_eq!(violations.len(), RAW.len());
    for (index, (v, raw)) in violations.iter().zip(RAW).enumerate() {
        assert_eq!(v.id, format!("sub-{}", index));
        assert_eq!(v.raw_text, *raw);
    }
}

#[test]
fn test_normalize_locations() {
    let violations = normalized();

    let email = &violations[0];
    assert_eq!(email.context, "In column: email");
    assert_eq!(email.source_location.as_ref().unwrap().row, Some(12));

    let leak = &violations[1];
    assert_eq!(leak.context, FILE_LEVEL_CONTEXT);
    assert!(leak.source_location.is_none());

    let audio = &violations[4];
    assert_eq!(audio.context, FILE_LEVEL_CONTEXT);
    assert_eq!(
        audio.source_location.as_ref().unwrap().timestamp.as_deref(),
        Some("02:15")
    );
}

#[test]
fn test_search_filter_is_idempotent() {
    let violations = normalized();
    let query = ViolationQuery::new().with_search("GdPr");

    let once: Vec<Violation> = filter(&violations, &query).into_iter().cloned().collect();
    let twice: Vec<Violation> = filter(&once, &query).into_iter().cloned().collect();

    assert_eq!(once, twice);
    assert!(!once.is_empty());
    assert!(once.iter().all(|v| {
        v.raw_text.to_lowercase().contains("gdpr")
            || v.rule.as_str().to_lowercase().contains("gdpr")
    }));
}

#[test]
fn test_severity_and_category_combine() {
    let violations = normalized();
    let query = ViolationQuery::new()
        .with_severity(Severity::Critical)
        .with_category(Category::Phi);

    let matched = filter(&violations, &query);
    let ids: Vec<&str> = matched.iter().map(|v| v.id.as_str()).collect();
    assert_eq!(ids, vec!["sub-2", "sub-5"]);
    assert!(matched
        .iter()
        .all(|v| v.severity == Severity::Critical && v.category == Category::Phi));
}

#[test]
fn test_labels_query_matches_builder() {
    let from_labels = ViolationQuery::from_labels(Some("gdpr"), "all", "PII").unwrap();
    let built = ViolationQuery::new()
        .with_search("gdpr")
        .with_category(Category::Pii);
    assert_eq!(from_labels, built);

    assert!(ViolationQuery::from_labels(None, "urgent", "all").is_err());
}

#[test]
fn test_summary_over_normalized() {
    let violations = normalized();
    let summary = ViolationSummary::from_violations(&violations);

    assert_eq!(summary.total, 6);
    assert_eq!(summary.pii + summary.phi, 6);
    assert_eq!(summary.gdpr + summary.hipaa, 6);
    assert_eq!(
        Severity::ALL.iter().map(|s| summary.count(*s)).sum::<usize>(),
        6
    );
}

#[test]
fn test_pluggable_classifier() {
    let normalizer = ViolationNormalizer::new(Arc::new(FixedClassifier(Severity::Medium)));
    let violations = normalizer.normalize(RAW, "sub");
    assert!(violations.iter().all(|v| v.severity == Severity::Medium));

    let query = ViolationQuery::new().with_severity(Severity::Critical);
    let critical = filter(&violations, &query);
    assert!(critical.is_empty());
}
