//! Error types for regwatch-tracker

use crate::models::ParseLabelError;
use crate::services::{AnalysisError, FileRejection, ReportError};
use thiserror::Error;

/// Crate-level error
#[derive(Debug, Error)]
pub enum Error {
    /// File refused before submission
    #[error("File rejected: {0}")]
    Rejected(#[from] FileRejection),

    /// Analysis client could not be built or a request failed
    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    /// Report generation failed
    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    /// Bad severity/category label
    #[error("Invalid filter: {0}")]
    Filter(#[from] ParseLabelError),

    /// regwatch-common error
    #[error("Common error: {0}")]
    Common(#[from] regwatch_common::Error),
}

/// Result type for regwatch-tracker operations
pub type Result<T> = std::result::Result<T, Error>;
