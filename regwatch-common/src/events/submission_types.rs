//! Submission lifecycle types shared between the tracker and event consumers

use serde::{Deserialize, Serialize};
use std::fmt;

/// File submission lifecycle state
///
/// `Pending → Analyzing → {Complete, Failed}`; the last two are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    /// Accepted, analysis not yet started
    Pending,
    /// Request to the analysis service in flight
    Analyzing,
    /// Analysis returned a violation list
    Complete,
    /// Analysis failed; see the submission's error message
    Failed,
}

impl SubmissionStatus {
    /// No transitions leave a terminal state
    pub fn is_terminal(self) -> bool {
        matches!(self, SubmissionStatus::Complete | SubmissionStatus::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "pending",
            SubmissionStatus::Analyzing => "analyzing",
            SubmissionStatus::Complete => "complete",
            SubmissionStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
