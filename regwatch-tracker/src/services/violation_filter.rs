//! Search and filter over normalized violations
//!
//! A query is compiled into a list of predicates that are ANDed together.
//! Filtering is pure: it borrows the input and returns the matching records
//! in their original relative order.

use crate::models::{Category, Severity, Violation, ViolationQuery};

/// One compiled constraint
#[derive(Debug, Clone, PartialEq, Eq)]
enum Predicate {
    /// Lower-cased needle matched against raw text or rule label
    Search(String),
    Severity(Severity),
    Category(Category),
}

impl Predicate {
    fn matches(&self, violation: &Violation) -> bool {
        match self {
            Predicate::Search(needle) => {
                violation.raw_text.to_lowercase().contains(needle)
                    || violation.rule.as_str().to_lowercase().contains(needle)
            }
            Predicate::Severity(severity) => violation.severity == *severity,
            Predicate::Category(category) => violation.category == *category,
        }
    }
}

/// A query compiled for repeated use
#[derive(Debug, Clone, Default)]
pub struct ViolationFilter {
    predicates: Vec<Predicate>,
}

impl ViolationFilter {
    pub fn new(query: &ViolationQuery) -> Self {
        let mut predicates = Vec::new();

        if let Some(term) = query.search_term.as_deref() {
            if !term.is_empty() {
                predicates.push(Predicate::Search(term.to_lowercase()));
            }
        }
        if let Some(severity) = query.severity {
            predicates.push(Predicate::Severity(severity));
        }
        if let Some(category) = query.category {
            predicates.push(Predicate::Category(category));
        }

        Self { predicates }
    }

    pub fn matches(&self, violation: &Violation) -> bool {
        self.predicates.iter().all(|p| p.matches(violation))
    }

    pub fn apply<'a>(&self, violations: &'a [Violation]) -> Vec<&'a Violation> {
        violations.iter().filter(|v| self.matches(v)).collect()
    }
}

/// Records of `violations` matching every constraint of `query`, in order
pub fn filter<'a>(violations: &'a [Violation], query: &ViolationQuery) -> Vec<&'a Violation> {
    ViolationFilter::new(query).apply(violations)
}
