//! Remote analysis service client
//!
//! One multipart round trip per file to `POST {base}/api/analyze`, no retry.
//! The response contract is `{ "filename": str, "violations": [str] }` on
//! success and `{ "detail": str }` on error.

use crate::models::UploadFile;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const ANALYZE_PATH: &str = "/api/analyze";
const USER_AGENT: &str = concat!("regwatch/", env!("CARGO_PKG_VERSION"));

/// Message for failures the server gave no detail about
pub const GENERIC_FAILURE_MESSAGE: &str = "Analysis failed";
/// Message for network-level failures
pub const TRANSPORT_FAILURE_MESSAGE: &str = "Unable to reach the analysis service";
/// Message for success responses that could not be decoded
pub const MALFORMED_RESPONSE_MESSAGE: &str = "The analysis service returned an unreadable response";

/// Analysis client errors
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Network unreachable, timeout, connection dropped mid-body
    #[error("Network error: {0}")]
    Transport(String),

    /// Non-success status; `detail` carries the server's explanation if any
    #[error("Analysis service returned {status}: {}", .detail.as_deref().unwrap_or("no detail"))]
    Server {
        status: u16,
        detail: Option<String>,
    },

    /// Success status with an undecodable body
    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl AnalysisError {
    /// Most specific human-readable cause for display
    pub fn user_message(&self) -> String {
        match self {
            AnalysisError::Transport(_) => TRANSPORT_FAILURE_MESSAGE.to_string(),
            AnalysisError::Server {
                detail: Some(detail),
                ..
            } => detail.clone(),
            AnalysisError::Server { detail: None, .. } => GENERIC_FAILURE_MESSAGE.to_string(),
            AnalysisError::Malformed(_) => MALFORMED_RESPONSE_MESSAGE.to_string(),
        }
    }
}

/// Successful analysis result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    /// File name echoed by the service
    pub filename: String,
    /// Raw violation descriptions in service order
    pub violations: Vec<String>,
}

#[derive(Deserialize)]
struct WireResponse {
    #[serde(default)]
    filename: Option<String>,
    #[serde(default)]
    violations: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct WireErrorBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

/// Submits one file for analysis
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Analyze `file`
    ///
    /// `on_response` is invoked once, as soon as the response status and
    /// headers are available and before the body is read. Transports without
    /// that signal never call it.
    async fn analyze(
        &self,
        file: &UploadFile,
        on_response: &(dyn Fn() + Send + Sync),
    ) -> Result<AnalysisResponse, AnalysisError>;
}

/// HTTP analysis client
pub struct AnalysisClient {
    http_client: reqwest::Client,
    endpoint: String,
}

impl AnalysisClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AnalysisError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| AnalysisError::Transport(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), ANALYZE_PATH),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn file_part(file: &UploadFile) -> Part {
        let part = Part::bytes(file.contents.clone()).file_name(file.name.clone());
        match part.mime_str(&file.mime_type) {
            Ok(part) => part,
            Err(_) => {
                tracing::debug!(
                    mime_type = %file.mime_type,
                    "Unusable MIME type, sending without one"
                );
                Part::bytes(file.contents.clone()).file_name(file.name.clone())
            }
        }
    }
}

#[async_trait]
impl Analyzer for AnalysisClient {
    async fn analyze(
        &self,
        file: &UploadFile,
        on_response: &(dyn Fn() + Send + Sync),
    ) -> Result<AnalysisResponse, AnalysisError> {
        let form = Form::new().part("file", Self::file_part(file));

        tracing::debug!(
            endpoint = %self.endpoint,
            file_name = %file.name,
            size = file.size(),
            "Submitting file for analysis"
        );

        let response = self
            .http_client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AnalysisError::Transport(e.to_string()))?;

        on_response();

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| AnalysisError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(server_error(status, &body));
        }

        let wire: WireResponse = serde_json::from_slice(&body)
            .map_err(|e| AnalysisError::Malformed(e.to_string()))?;

        let result = AnalysisResponse {
            filename: wire.filename.unwrap_or_else(|| file.name.clone()),
            violations: wire.violations.unwrap_or_default(),
        };

        tracing::info!(
            file_name = %result.filename,
            violations = result.violations.len(),
            "Analysis response received"
        );

        Ok(result)
    }
}

/// Build the error for a non-success response, preferring the server's `detail`
fn server_error(status: StatusCode, body: &[u8]) -> AnalysisError {
    let detail = serde_json::from_slice::<WireErrorBody>(body)
        .ok()
        .and_then(|b| b.detail)
        .and_then(|d| match d {
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(s),
            _ => None,
        });

    tracing::warn!(
        status = status.as_u16(),
        detail = detail.as_deref().unwrap_or(""),
        "Analysis service returned an error"
    );

    AnalysisError::Server {
        status: status.as_u16(),
        detail,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_base_url() {
        let client = AnalysisClient::new("http://localhost:8000/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.endpoint(), "http://localhost:8000/api/analyze");
    }

    #[test]
    fn test_server_error_prefers_detail() {
        let err = server_error(
            StatusCode::BAD_REQUEST,
            br#"{"detail": "Invalid file type. Received text/html."}"#,
        );
        assert_eq!(err.user_message(), "Invalid file type. Received text/html.");
    }

    #[test]
    fn test_server_error_without_detail_is_generic() {
        let err = server_error(StatusCode::BAD_GATEWAY, b"<html>bad gateway</html>");
        assert!(matches!(err, AnalysisError::Server { status: 502, .. }));
        assert_eq!(err.user_message(), GENERIC_FAILURE_MESSAGE);
    }

    #[test]
    fn test_structured_detail_is_ignored() {
        let err = server_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            br#"{"detail": [{"loc": ["body", "file"], "msg": "field required"}]}"#,
        );
        assert_eq!(err.user_message(), GENERIC_FAILURE_MESSAGE);
    }

    #[test]
    fn test_transport_and_malformed_messages() {
        assert_eq!(
            AnalysisError::Transport("connection refused".into()).user_message(),
            TRANSPORT_FAILURE_MESSAGE
        );
        assert_eq!(
            AnalysisError::Malformed("expected value".into()).user_message(),
            MALFORMED_RESPONSE_MESSAGE
        );
    }
}
