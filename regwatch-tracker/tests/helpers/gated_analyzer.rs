//! Analyzer whose responses are released by the test
//!
//! Every call parks twice, keyed by file name: once before the response
//! "headers" arrive and once before the body. The test decides when each
//! gate opens and what the body resolves to, so interleavings are exact.

use async_trait::async_trait;
use regwatch_tracker::services::{AnalysisError, AnalysisResponse, Analyzer};
use regwatch_tracker::UploadFile;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::oneshot;

const GATE_TIMEOUT: Duration = Duration::from_secs(5);

type BodyResult = Result<AnalysisResponse, AnalysisError>;

enum Gate {
    Headers(oneshot::Sender<()>),
    Body(oneshot::Sender<BodyResult>),
}

#[derive(Default)]
pub struct GatedAnalyzer {
    gates: Mutex<HashMap<String, Gate>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls: AtomicUsize,
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl GatedAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of analyze calls started
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneously running calls
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    fn park(&self, name: &str, gate: Gate) {
        self.gates.lock().unwrap().insert(name.to_string(), gate);
    }

    async fn take(&self, name: &str) -> Gate {
        let wait = async {
            loop {
                if let Some(gate) = self.gates.lock().unwrap().remove(name) {
                    return gate;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        };
        tokio::time::timeout(GATE_TIMEOUT, wait)
            .await
            .unwrap_or_else(|_| panic!("analysis of {} never reached a gate", name))
    }

    /// Wait until the call for `name` has started
    pub async fn wait_started(&self, name: &str) {
        let wait = async {
            while !self.gates.lock().unwrap().contains_key(name) {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        };
        tokio::time::timeout(GATE_TIMEOUT, wait)
            .await
            .unwrap_or_else(|_| panic!("analysis of {} never started", name));
    }

    /// Wait until exactly `count` calls are parked at a gate
    pub async fn wait_parked(&self, count: usize) {
        let wait = async {
            while self.gates.lock().unwrap().len() != count {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        };
        tokio::time::timeout(GATE_TIMEOUT, wait)
            .await
            .unwrap_or_else(|_| panic!("{} analyses never parked together", count));
    }

    /// Name of some call currently parked at a gate
    pub async fn next_started(&self) -> String {
        let wait = async {
            loop {
                let parked = self.gates.lock().unwrap().keys().next().cloned();
                if let Some(name) = parked {
                    return name;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        };
        tokio::time::timeout(GATE_TIMEOUT, wait)
            .await
            .expect("no analysis started")
    }

    /// Let the response "headers" for `name` arrive, leaving the body pending
    pub async fn release_headers(&self, name: &str) {
        match self.take(name).await {
            Gate::Headers(tx) => {
                let _ = tx.send(());
            }
            Gate::Body(_) => panic!("{} is already past its headers", name),
        }
    }

    /// Resolve the call for `name` with violations
    pub async fn succeed(&self, name: &str, violations: &[&str]) {
        let response = AnalysisResponse {
            filename: name.to_string(),
            violations: violations.iter().map(|v| v.to_string()).collect(),
        };
        self.finish(name, Ok(response)).await;
    }

    /// Resolve the call for `name` with an error
    pub async fn fail(&self, name: &str, error: AnalysisError) {
        self.finish(name, Err(error)).await;
    }

    async fn finish(&self, name: &str, result: BodyResult) {
        loop {
            match self.take(name).await {
                Gate::Headers(tx) => {
                    let _ = tx.send(());
                }
                Gate::Body(tx) => {
                    let _ = tx.send(result);
                    return;
                }
            }
        }
    }
}

#[async_trait]
impl Analyzer for GatedAnalyzer {
    async fn analyze(
        &self,
        file: &UploadFile,
        on_response: &(dyn Fn() + Send + Sync),
    ) -> Result<AnalysisResponse, AnalysisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        let closed = || AnalysisError::Transport("gate dropped".to_string());

        let (headers_tx, headers_rx) = oneshot::channel();
        self.park(&file.name, Gate::Headers(headers_tx));
        headers_rx.await.map_err(|_| closed())?;
        on_response();

        let (body_tx, body_rx) = oneshot::channel();
        self.park(&file.name, Gate::Body(body_tx));
        body_rx.await.map_err(|_| closed())?
    }
}
