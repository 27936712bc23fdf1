//! Event types and the in-process event bus
//!
//! Components never talk to the user directly. They emit `RegwatchEvent`s on
//! an `EventBus` handed to them by the caller, and presentation layers (the
//! CLI, a notification center) subscribe.

mod notification;
mod submission_types;

pub use notification::{Notification, NotificationCenter, NotificationVariant};
pub use submission_types::SubmissionStatus;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Regwatch event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RegwatchEvent {
    /// A file was accepted and a submission created
    SubmissionAdded {
        submission_id: Uuid,
        file_name: String,
        size: u64,
        timestamp: DateTime<Utc>,
    },

    /// Submission status or progress changed
    SubmissionProgress {
        submission_id: Uuid,
        status: SubmissionStatus,
        progress: u8,
        timestamp: DateTime<Utc>,
    },

    /// Analysis finished with a violation list
    AnalysisCompleted {
        submission_id: Uuid,
        /// File name as echoed by the analysis service
        filename: String,
        violation_count: usize,
        timestamp: DateTime<Utc>,
    },

    /// Analysis failed
    AnalysisFailed {
        submission_id: Uuid,
        file_name: String,
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// An analysis resolved after its submission was removed; result dropped
    AnalysisDiscarded {
        submission_id: Uuid,
        timestamp: DateTime<Utc>,
    },

    /// Submission removed by the user
    SubmissionRemoved {
        submission_id: Uuid,
        timestamp: DateTime<Utc>,
    },

    /// File refused before submission (unsupported type)
    FileRejected {
        file_name: String,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    /// Report document downloaded
    ReportGenerated {
        file_name: String,
        bytes: usize,
        timestamp: DateTime<Utc>,
    },

    /// Report generation failed
    ReportFailed {
        message: String,
        timestamp: DateTime<Utc>,
    },
}

impl RegwatchEvent {
    /// Submission this event refers to, if any
    pub fn submission_id(&self) -> Option<Uuid> {
        match self {
            RegwatchEvent::SubmissionAdded { submission_id, .. }
            | RegwatchEvent::SubmissionProgress { submission_id, .. }
            | RegwatchEvent::AnalysisCompleted { submission_id, .. }
            | RegwatchEvent::AnalysisFailed { submission_id, .. }
            | RegwatchEvent::AnalysisDiscarded { submission_id, .. }
            | RegwatchEvent::SubmissionRemoved { submission_id, .. } => Some(*submission_id),
            RegwatchEvent::FileRejected { .. }
            | RegwatchEvent::ReportGenerated { .. }
            | RegwatchEvent::ReportFailed { .. } => None,
        }
    }
}

/// Broadcast event bus
///
/// Cloning is cheap and every clone publishes to the same subscribers.
/// Slow subscribers lose the oldest events once `capacity` is exceeded.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<RegwatchEvent>,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<RegwatchEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: RegwatchEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
