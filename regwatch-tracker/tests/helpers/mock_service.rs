//! In-process stand-in for the remote analysis service
//!
//! Serves `/api/analyze` with a canned status and body, records what was
//! uploaded, and serves `/api/generate-report` with a small fake document.
//! Uploads whose file name starts with `broken` always get a 500.

use axum::body::Bytes;
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

const BROKEN_MARKER: &str = "filename=\"broken";
const BROKEN_BODY: &str = r#"{"detail":"Corrupted upload"}"#;

/// One request received on `/api/analyze`
#[derive(Debug, Clone)]
pub struct RecordedUpload {
    pub content_type: String,
    pub body: Vec<u8>,
}

impl RecordedUpload {
    pub fn body_contains(&self, needle: &str) -> bool {
        String::from_utf8_lossy(&self.body).contains(needle)
    }
}

pub struct MockService {
    pub base_url: String,
    uploads: Arc<Mutex<Vec<RecordedUpload>>>,
    reports: Arc<Mutex<Vec<Vec<String>>>>,
}

impl MockService {
    pub fn uploads(&self) -> Vec<RecordedUpload> {
        self.uploads.lock().unwrap().clone()
    }

    /// Violation lists posted to the report endpoint
    pub fn report_requests(&self) -> Vec<Vec<String>> {
        self.reports.lock().unwrap().clone()
    }
}

/// Start a service answering analyze requests with `status` and `body`,
/// and report requests with `report_status`
pub async fn spawn_service(
    status: StatusCode,
    body: &'static str,
    report_status: StatusCode,
) -> MockService {
    let uploads = Arc::new(Mutex::new(Vec::new()));
    let reports = Arc::new(Mutex::new(Vec::new()));

    let recorded = Arc::clone(&uploads);
    let analyze = post(move |headers: HeaderMap, payload: Bytes| {
        let recorded = Arc::clone(&recorded);
        async move {
            let content_type = headers
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            let upload = RecordedUpload {
                content_type,
                body: payload.to_vec(),
            };
            let broken = upload.body_contains(BROKEN_MARKER);
            recorded.lock().unwrap().push(upload);

            if broken {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    [(header::CONTENT_TYPE, "application/json")],
                    BROKEN_BODY,
                )
            } else {
                (status, [(header::CONTENT_TYPE, "application/json")], body)
            }
        }
    });

    let requested = Arc::clone(&reports);
    let report = post(move |Json(violations): Json<Vec<String>>| {
        let requested = Arc::clone(&requested);
        async move {
            let document = format!("%PDF-1.4 {} violations", violations.len()).into_bytes();
            requested.lock().unwrap().push(violations);
            if report_status.is_success() {
                (report_status, document)
            } else {
                (report_status, Vec::new())
            }
        }
    });

    let router = Router::new()
        .route("/api/analyze", analyze)
        .route("/api/generate-report", report);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    MockService {
        base_url: format!("http://{}", addr),
        uploads,
        reports,
    }
}

/// Base URL of a local port nothing listens on
pub async fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}
