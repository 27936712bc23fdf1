//! # Regwatch Common Library
//!
//! Shared code for the regwatch compliance tooling including:
//! - Error types
//! - TOML configuration loading and writing
//! - Event types (RegwatchEvent enum) and the EventBus
//! - User-facing notifications derived from events
//! - Formatting and UUID helpers

pub mod config;
pub mod error;
pub mod events;
pub mod human_size;
pub mod uuid_utils;

pub use error::{Error, Result};
pub use events::{EventBus, RegwatchEvent, SubmissionStatus};
pub use human_size::format_file_size;
