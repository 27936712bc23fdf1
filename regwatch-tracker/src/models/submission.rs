//! File submission record and its lifecycle state machine
//!
//! `Pending → Analyzing(10) → Analyzing(50) → {Complete(100), Failed(100)}`
//!
//! Every mutation goes through [`FileSubmission::apply`], which refuses any
//! step out of a terminal state and never lets progress move backwards.

use chrono::{DateTime, Utc};
use regwatch_common::SubmissionStatus;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Progress once the request has been handed to the analyzer
pub const PROGRESS_ANALYSIS_STARTED: u8 = 10;
/// Progress once the analyzer's response headers arrived
pub const PROGRESS_RESPONSE_STARTED: u8 = 50;
/// Progress of every terminal state
pub const PROGRESS_DONE: u8 = 100;

/// A file handed to the tracker for analysis
#[derive(Clone)]
pub struct UploadFile {
    pub name: String,
    pub mime_type: String,
    pub contents: Vec<u8>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, contents: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            contents,
        }
    }

    pub fn size(&self) -> u64 {
        self.contents.len() as u64
    }
}

impl fmt::Debug for UploadFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadFile")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("size", &self.contents.len())
            .finish()
    }
}

/// One tracked file's analysis lifecycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileSubmission {
    pub id: Uuid,
    pub name: String,
    pub size: u64,
    pub mime_type: String,
    pub status: SubmissionStatus,
    /// 0-100; only ever increases
    pub progress: u8,
    /// Raw violation descriptions, verbatim; empty until `Complete`
    pub violations: Vec<String>,
    /// Present only when `Failed`
    pub error_message: Option<String>,
    /// File name echoed back by the analysis service
    pub analyzed_filename: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Ticket generation that owns this record
    #[serde(skip)]
    pub(crate) generation: u64,
}

/// A single lifecycle step
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Request dispatched to the analyzer
    BeginAnalysis,
    /// Analyzer response headers received
    ResponseStarted,
    /// Analyzer returned a violation list
    Complete {
        violations: Vec<String>,
        filename: String,
    },
    /// Analyzer failed
    Fail { message: String },
}

impl Transition {
    pub fn name(&self) -> &'static str {
        match self {
            Transition::BeginAnalysis => "begin_analysis",
            Transition::ResponseStarted => "response_started",
            Transition::Complete { .. } => "complete",
            Transition::Fail { .. } => "fail",
        }
    }
}

/// Refused lifecycle step
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("submission is already {0} and cannot change")]
    Terminal(SubmissionStatus),

    #[error("cannot apply {transition} while {from}")]
    Invalid {
        from: SubmissionStatus,
        transition: &'static str,
    },
}

impl FileSubmission {
    /// New `Pending` record for `file`
    pub fn new(id: Uuid, file: &UploadFile) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: file.name.clone(),
            size: file.size(),
            mime_type: file.mime_type.clone(),
            status: SubmissionStatus::Pending,
            progress: 0,
            violations: Vec::new(),
            error_message: None,
            analyzed_filename: None,
            submitted_at: now,
            updated_at: now,
            generation: 0,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Apply one lifecycle step in place
    pub fn apply(&mut self, transition: Transition) -> Result<(), TransitionError> {
        if self.status.is_terminal() {
            return Err(TransitionError::Terminal(self.status));
        }

        let invalid = TransitionError::Invalid {
            from: self.status,
            transition: transition.name(),
        };

        match (self.status, transition) {
            (SubmissionStatus::Pending, Transition::BeginAnalysis) => {
                self.status = SubmissionStatus::Analyzing;
                self.advance(PROGRESS_ANALYSIS_STARTED);
            }
            (SubmissionStatus::Analyzing, Transition::ResponseStarted) => {
                self.advance(PROGRESS_RESPONSE_STARTED);
            }
            (SubmissionStatus::Analyzing, Transition::Complete { violations, filename }) => {
                self.status = SubmissionStatus::Complete;
                self.violations = violations;
                self.analyzed_filename = Some(filename);
                self.advance(PROGRESS_DONE);
            }
            (
                SubmissionStatus::Pending | SubmissionStatus::Analyzing,
                Transition::Fail { message },
            ) => {
                self.status = SubmissionStatus::Failed;
                self.error_message = Some(message);
                self.advance(PROGRESS_DONE);
            }
            _ => return Err(invalid),
        }

        self.updated_at = Utc::now();
        Ok(())
    }

    fn advance(&mut self, progress: u8) {
        self.progress = self.progress.max(progress.min(PROGRESS_DONE));
    }
}
