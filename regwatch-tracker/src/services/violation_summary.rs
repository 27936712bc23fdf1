//! Dashboard counters over violations and submissions

use crate::models::{Category, Rule, Severity, SubmissionStatus, Violation};
use crate::services::upload_tracker::SubmissionList;
use serde::Serialize;

/// Counts over a set of normalized violations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ViolationSummary {
    pub total: usize,
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub pii: usize,
    pub phi: usize,
    pub gdpr: usize,
    pub hipaa: usize,
}

impl ViolationSummary {
    pub fn from_violations<'a, I>(violations: I) -> Self
    where
        I: IntoIterator<Item = &'a Violation>,
    {
        let mut summary = Self::default();
        for v in violations {
            summary.total += 1;
            match v.severity {
                Severity::Critical => summary.critical += 1,
                Severity::High => summary.high += 1,
                Severity::Medium => summary.medium += 1,
                Severity::Low => summary.low += 1,
            }
            match v.category {
                Category::Pii => summary.pii += 1,
                Category::Phi => summary.phi += 1,
            }
            match v.rule {
                Rule::Gdpr => summary.gdpr += 1,
                Rule::Hipaa => summary.hipaa += 1,
            }
        }
        summary
    }

    pub fn count(&self, severity: Severity) -> usize {
        match severity {
            Severity::Critical => self.critical,
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
        }
    }
}

/// Counts over tracked submissions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SubmissionSummary {
    pub total: usize,
    pub pending: usize,
    pub analyzing: usize,
    pub complete: usize,
    pub failed: usize,
    /// Raw violations across completed submissions
    pub violations: usize,
    pub bytes: u64,
}

impl SubmissionSummary {
    pub fn from_list(list: &SubmissionList) -> Self {
        let mut summary = Self::default();
        for s in list.iter() {
            summary.total += 1;
            summary.bytes += s.size;
            summary.violations += s.violations.len();
            match s.status {
                SubmissionStatus::Pending => summary.pending += 1,
                SubmissionStatus::Analyzing => summary.analyzing += 1,
                SubmissionStatus::Complete => summary.complete += 1,
                SubmissionStatus::Failed => summary.failed += 1,
            }
        }
        summary
    }
}
