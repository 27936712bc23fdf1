//! Data models for submissions, violations and queries

pub mod query;
pub mod submission;
pub mod violation;

pub use query::ViolationQuery;
pub use regwatch_common::SubmissionStatus;
pub use submission::{FileSubmission, Transition, TransitionError, UploadFile};
pub use violation::{Category, ParseLabelError, Rule, Severity, SourceLocation, Violation};
