//! One batch analysis run over files on disk
//!
//! Every path is loaded and validated, accepted files are submitted together,
//! and once all submissions settle each one is normalized, filtered and
//! summarized. With a report directory, every completed file also gets its
//! own report document.

use crate::config::RuntimeSettings;
use crate::models::{FileSubmission, SubmissionStatus, Violation, ViolationQuery};
use crate::services::analysis_client::{AnalysisClient, Analyzer};
use crate::services::file_validator::prepare_upload;
use crate::services::report_client::{ReportClient, ReportPaths};
use crate::services::upload_tracker::UploadTracker;
use crate::services::violation_filter::ViolationFilter;
use crate::services::violation_normalizer::ViolationNormalizer;
use crate::services::violation_summary::{SubmissionSummary, ViolationSummary};
use regwatch_common::events::EventBus;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What to show and produce for a run
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    pub query: ViolationQuery,
    /// Download one report per completed file into this directory
    pub report_dir: Option<PathBuf>,
}

/// Results for one submitted file
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub submission: FileSubmission,
    /// Counts over all normalized violations, before filtering
    pub summary: ViolationSummary,
    /// Normalized violations matching the query
    pub violations: Vec<Violation>,
    /// Where the report document was written, if one was
    pub report: Option<PathBuf>,
}

/// A path that never became a submission
#[derive(Debug, Clone, Serialize)]
pub struct RejectedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of a whole run
#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeOutput {
    pub files: Vec<FileReport>,
    pub rejected: Vec<RejectedFile>,
    pub totals: SubmissionSummary,
}

impl AnalyzeOutput {
    /// True when no file was rejected and no analysis failed
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty() && self.totals.failed == 0
    }
}

/// Analyze `paths` against the service configured in `settings`
pub async fn analyze_paths(
    paths: &[PathBuf],
    settings: &RuntimeSettings,
    options: &SessionOptions,
    events: &EventBus,
) -> crate::Result<AnalyzeOutput> {
    let client = AnalysisClient::new(&settings.analyzer_url, settings.request_timeout)?;
    info!(endpoint = %client.endpoint(), files = paths.len(), "Starting analysis run");
    let analyzer: Arc<dyn Analyzer> = Arc::new(client);

    let tracker = match settings.max_concurrent {
        Some(limit) => UploadTracker::bounded(analyzer, events.clone(), limit),
        None => UploadTracker::new(analyzer, events.clone()),
    };

    let mut rejected = Vec::new();
    for path in paths {
        match prepare_upload(path, events).await {
            Ok(file) => {
                tracker.submit(file);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping file");
                rejected.push(RejectedFile {
                    path: path.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    let settled = tracker.wait_until_settled().await;
    debug!(
        submissions = settled.len(),
        subscribers = events.subscriber_count(),
        "All submissions settled"
    );

    let mut reports = match &options.report_dir {
        Some(dir) => {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(regwatch_common::Error::from)?;
            let client = ReportClient::new(
                &settings.analyzer_url,
                settings.request_timeout,
                events.clone(),
            )?;
            Some((client, ReportPaths::new(dir.clone())))
        }
        None => None,
    };

    let normalizer = ViolationNormalizer::new(Arc::clone(&settings.classifier));
    let filter = ViolationFilter::new(&options.query);
    let mut files = Vec::with_capacity(settled.len());

    for submission in settled.iter() {
        let violations = normalizer.normalize_submission(submission);

        let mut report = None;
        if let Some((client, report_paths)) = reports.as_mut() {
            if submission.status == SubmissionStatus::Complete {
                let path = report_paths.allocate(&submission.name, &submission.id);
                // Failures are logged and announced on the bus by the client
                if client.download_to(&submission.violations, &path).await.is_ok() {
                    report = Some(path);
                }
            }
        }

        files.push(FileReport {
            submission: submission.clone(),
            summary: ViolationSummary::from_violations(&violations),
            violations: filter.apply(&violations).into_iter().cloned().collect(),
            report,
        });
    }

    let output = AnalyzeOutput {
        totals: SubmissionSummary::from_list(&settled),
        files,
        rejected,
    };
    info!(
        complete = output.totals.complete,
        failed = output.totals.failed,
        rejected = output.rejected.len(),
        "Analysis run finished"
    );
    Ok(output)
}
