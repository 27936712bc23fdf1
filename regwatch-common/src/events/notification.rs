//! User-facing notifications derived from events
//!
//! A `NotificationCenter` is process-wide state with an explicit lifecycle:
//! the caller creates it, attaches it to a bus, and resets it when the view
//! it feeds is cleared. Nothing here is a global.

use super::{EventBus, RegwatchEvent};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Visual treatment of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationVariant {
    Default,
    Destructive,
}

/// A short message meant for the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub variant: NotificationVariant,
}

impl Notification {
    fn new(title: &str, description: String, variant: NotificationVariant) -> Self {
        Self {
            title: title.to_string(),
            description,
            variant,
        }
    }

    /// Notification for an event, if the event is user-visible
    pub fn from_event(event: &RegwatchEvent) -> Option<Self> {
        match event {
            RegwatchEvent::AnalysisCompleted {
                filename,
                violation_count,
                ..
            } => {
                let variant = if *violation_count > 0 {
                    NotificationVariant::Destructive
                } else {
                    NotificationVariant::Default
                };
                Some(Self::new(
                    "Analysis complete",
                    format!(
                        "Found {} potential violations in {}.",
                        violation_count, filename
                    ),
                    variant,
                ))
            }
            RegwatchEvent::AnalysisFailed { message, .. } => Some(Self::new(
                "An error occurred",
                message.clone(),
                NotificationVariant::Destructive,
            )),
            RegwatchEvent::FileRejected { file_name, .. } => Some(Self::new(
                "Invalid file type",
                format!(
                    "{} is not a supported file type. Please upload CSV or audio files.",
                    file_name
                ),
                NotificationVariant::Destructive,
            )),
            RegwatchEvent::ReportGenerated { file_name, .. } => Some(Self::new(
                "Report downloaded",
                format!("Saved {}.", file_name),
                NotificationVariant::Default,
            )),
            RegwatchEvent::ReportFailed { message, .. } => Some(Self::new(
                "Report generation failed",
                message.clone(),
                NotificationVariant::Destructive,
            )),
            RegwatchEvent::SubmissionAdded { .. }
            | RegwatchEvent::SubmissionProgress { .. }
            | RegwatchEvent::AnalysisDiscarded { .. }
            | RegwatchEvent::SubmissionRemoved { .. } => None,
        }
    }
}

/// Bounded history of notifications
pub struct NotificationCenter {
    history: Mutex<VecDeque<Notification>>,
    capacity: usize,
}

impl NotificationCenter {
    pub fn new(capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            history: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity: capacity.max(1),
        })
    }

    /// Record the notification for `event`, if any; oldest entries are evicted
    pub fn record(&self, event: &RegwatchEvent) -> Option<Notification> {
        let notification = Notification::from_event(event)?;

        match notification.variant {
            NotificationVariant::Default => {
                info!(title = %notification.title, "{}", notification.description)
            }
            NotificationVariant::Destructive => {
                warn!(title = %notification.title, "{}", notification.description)
            }
        }

        let mut history = self.history.lock().unwrap_or_else(|e| e.into_inner());
        if history.len() == self.capacity {
            history.pop_front();
        }
        history.push_back(notification.clone());
        Some(notification)
    }

    /// Spawn a collector that records every event from `bus`
    ///
    /// The task ends when all bus senders are dropped.
    pub fn listen(self: &Arc<Self>, bus: &EventBus) -> JoinHandle<()> {
        let center = Arc::clone(self);
        let mut rx = bus.subscribe();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => {
                        center.record(&event);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Notification center lagged behind event bus");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }

    /// Notifications recorded so far, oldest first
    pub fn recent(&self) -> Vec<Notification> {
        let history = self.history.lock().unwrap_or_else(|e| e.into_inner());
        history.iter().cloned().collect()
    }

    /// Clear all recorded notifications
    pub fn reset(&self) {
        let mut history = self.history.lock().unwrap_or_else(|e| e.into_inner());
        history.clear();
    }
}
