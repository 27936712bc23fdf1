//! Pre-submission file checks and loading
//!
//! Only tabular text and audio recordings are accepted. A rejected file never
//! becomes a submission.

use crate::models::UploadFile;
use chrono::Utc;
use regwatch_common::events::{EventBus, RegwatchEvent};
use std::path::Path;
use thiserror::Error;

/// MIME types the analysis service understands
pub const ACCEPTED_MIME_TYPES: &[&str] = &[
    "text/csv",
    "audio/wav",
    "audio/mp3",
    "audio/mpeg",
    "text/plain",
];

const OCTET_STREAM: &str = "application/octet-stream";

#[derive(Debug, Error)]
pub enum FileRejection {
    #[error("{name} has unsupported type {mime_type}")]
    UnsupportedType { name: String, mime_type: String },

    #[error("Failed to read {path}: {source}")]
    Unreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Whether a file with this name and MIME type may be submitted
///
/// Any `.csv` file name is accepted regardless of the reported type, since
/// browsers and OSes disagree on the MIME type of CSV files.
pub fn is_accepted(name: &str, mime_type: &str) -> bool {
    ACCEPTED_MIME_TYPES.contains(&mime_type) || name.to_ascii_lowercase().ends_with(".csv")
}

/// Check `file`, emitting `FileRejected` on `events` if it is refused
pub fn validate(file: &UploadFile, events: &EventBus) -> Result<(), FileRejection> {
    if is_accepted(&file.name, &file.mime_type) {
        return Ok(());
    }

    let rejection = FileRejection::UnsupportedType {
        name: file.name.clone(),
        mime_type: file.mime_type.clone(),
    };
    tracing::warn!(file_name = %file.name, mime_type = %file.mime_type, "File rejected");
    events.emit_lossy(RegwatchEvent::FileRejected {
        file_name: file.name.clone(),
        reason: rejection.to_string(),
        timestamp: Utc::now(),
    });
    Err(rejection)
}

/// MIME type by content sniffing, falling back to the file extension
pub fn detect_mime_type(name: &str, contents: &[u8]) -> String {
    if let Some(kind) = infer::get(contents) {
        return normalize_audio_mime(kind.mime_type()).to_string();
    }

    let extension = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    let mime = match extension.as_deref() {
        Some("csv") => "text/csv",
        Some("txt") => "text/plain",
        Some("wav") => "audio/wav",
        Some("mp3") => "audio/mpeg",
        Some("pdf") => "application/pdf",
        _ => OCTET_STREAM,
    };
    mime.to_string()
}

/// `infer` reports WAV as `audio/x-wav`; the service expects `audio/wav`
fn normalize_audio_mime(mime: &str) -> &str {
    match mime {
        "audio/x-wav" | "audio/vnd.wave" => "audio/wav",
        other => other,
    }
}

/// Read a file from disk into an `UploadFile`
pub async fn load_upload_file(path: &Path) -> Result<UploadFile, FileRejection> {
    let contents = tokio::fs::read(path)
        .await
        .map_err(|source| FileRejection::Unreadable {
            path: path.display().to_string(),
            source,
        })?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let mime_type = detect_mime_type(&name, &contents);

    Ok(UploadFile::new(name, mime_type, contents))
}

/// Load `path` and check it is submittable
pub async fn prepare_upload(path: &Path, events: &EventBus) -> crate::Result<UploadFile> {
    let file = load_upload_file(path).await?;
    validate(&file, events)?;
    Ok(file)
}
