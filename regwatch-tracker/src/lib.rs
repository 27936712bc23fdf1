//! regwatch-tracker library interface
//!
//! Client-side pipeline for privacy-compliance analysis:
//! submit files to the remote analyzer, track each submission's lifecycle,
//! normalize returned violation descriptions into structured records and
//! filter them for display.

pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{Error, Result};
pub use crate::models::{
    Category, FileSubmission, Severity, SourceLocation, SubmissionStatus, UploadFile, Violation,
    ViolationQuery,
};
pub use crate::services::{
    AnalysisClient, AnalysisError, Analyzer, ReportClient, SubmissionList, UploadTracker,
};
