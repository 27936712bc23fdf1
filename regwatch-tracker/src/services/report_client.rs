//! Compliance report download
//!
//! `POST {base}/api/generate-report` with the raw violation strings as a JSON
//! array; the service answers with a binary document. Failures are reported
//! on the event bus and returned, never retried.

use chrono::Utc;
use regwatch_common::events::{EventBus, RegwatchEvent};
use regwatch_common::uuid_utils;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

const REPORT_PATH: &str = "/api/generate-report";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Report service returned {0}")]
    Status(u16),

    #[error("Failed to write report {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Report generation client
pub struct ReportClient {
    http_client: reqwest::Client,
    endpoint: String,
    events: EventBus,
}

impl ReportClient {
    pub fn new(base_url: &str, timeout: Duration, events: EventBus) -> Result<Self, ReportError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ReportError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), REPORT_PATH),
            events,
        })
    }

    /// Request a report document for `violations`
    pub async fn generate(&self, violations: &[String]) -> Result<Vec<u8>, ReportError> {
        let result = self.request(violations).await;
        if let Err(e) = &result {
            self.fail(e);
        }
        result
    }

    async fn request(&self, violations: &[String]) -> Result<Vec<u8>, ReportError> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .json(violations)
            .send()
            .await
            .map_err(|e| ReportError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReportError::Status(status.as_u16()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ReportError::Network(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    /// Generate a report and write it to `path`
    pub async fn download_to(
        &self,
        violations: &[String],
        path: &Path,
    ) -> Result<usize, ReportError> {
        let document = self.generate(violations).await?;

        if let Err(source) = tokio::fs::write(path, &document).await {
            let err = ReportError::Write {
                path: path.display().to_string(),
                source,
            };
            self.fail(&err);
            return Err(err);
        }

        tracing::info!(path = %path.display(), bytes = document.len(), "Report saved");
        self.events.emit_lossy(RegwatchEvent::ReportGenerated {
            file_name: path.display().to_string(),
            bytes: document.len(),
            timestamp: Utc::now(),
        });
        Ok(document.len())
    }

    fn fail(&self, err: &ReportError) {
        tracing::error!(error = %err, "Report generation failed");
        self.events.emit_lossy(RegwatchEvent::ReportFailed {
            message: err.to_string(),
            timestamp: Utc::now(),
        });
    }
}

/// Default report file name for an analyzed file: `<stem>-report.pdf`
pub fn report_file_name(analyzed_file: &str) -> String {
    format!("{}-report.pdf", report_stem(analyzed_file))
}

/// Report path inside `dir` for an analyzed file
pub fn report_path(dir: &Path, analyzed_file: &str) -> PathBuf {
    dir.join(report_file_name(analyzed_file))
}

fn report_stem(analyzed_file: &str) -> String {
    Path::new(analyzed_file)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "violation".to_string())
}

/// Hands out report paths inside one directory, never the same one twice
///
/// The first report for a file name gets the default name. Later reports for
/// the same name carry the submission's short id: `<stem>-<id>-report.pdf`.
#[derive(Debug)]
pub struct ReportPaths {
    dir: PathBuf,
    taken: HashSet<PathBuf>,
}

impl ReportPaths {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            taken: HashSet::new(),
        }
    }

    /// Reserve a path for the report of `analyzed_file` (submission `id`)
    pub fn allocate(&mut self, analyzed_file: &str, id: &Uuid) -> PathBuf {
        let mut path = report_path(&self.dir, analyzed_file);
        if self.taken.contains(&path) {
            path = self.dir.join(format!(
                "{}-{}-report.pdf",
                report_stem(analyzed_file),
                uuid_utils::short(id)
            ));
        }
        self.taken.insert(path.clone());
        path
    }
}
