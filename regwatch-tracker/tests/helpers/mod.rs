//! Test Helper Utilities
//!
//! Shared utilities for testing regwatch-tracker

#![allow(dead_code)]

pub mod gated_analyzer;
pub mod mock_service;

pub use gated_analyzer::GatedAnalyzer;
pub use mock_service::{closed_port_url, spawn_service, MockService, RecordedUpload};

use regwatch_tracker::UploadFile;

pub const CSV_CONTENTS: &[u8] = b"name,email\nAda,ada@example.com\n";

/// Small CSV upload named `name`
pub fn csv_file(name: &str) -> UploadFile {
    UploadFile::new(name, "text/csv", CSV_CONTENTS.to_vec())
}
