//! Services: analysis transport, tracking, normalization, filtering

pub mod analysis_client;
pub mod file_validator;
pub mod report_client;
pub mod session;
pub mod severity_classifier;
pub mod upload_tracker;
pub mod violation_filter;
pub mod violation_normalizer;
pub mod violation_summary;

pub use analysis_client::{AnalysisClient, AnalysisError, AnalysisResponse, Analyzer};
pub use file_validator::{load_upload_file, prepare_upload, validate, FileRejection};
pub use report_client::{ReportClient, ReportError, ReportPaths};
pub use session::{analyze_paths, AnalyzeOutput, FileReport, RejectedFile, SessionOptions};
pub use severity_classifier::{
    FixedClassifier, KeywordClassifier, SeverityClassifier, UniformRandomClassifier,
};
pub use upload_tracker::{SubmissionList, UploadTracker};
pub use violation_filter::{filter, ViolationFilter};
pub use violation_normalizer::{normalize, ViolationNormalizer};
pub use violation_summary::{SubmissionSummary, ViolationSummary};
