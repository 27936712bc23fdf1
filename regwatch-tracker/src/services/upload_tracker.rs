//! Per-file submission tracking
//!
//! Each `submit` creates one record and one background analysis task. The
//! tracked collection is an immutable, insertion-ordered list that is
//! replaced wholesale on every mutation and published through a tokio
//! `watch` channel, so readers always see a consistent snapshot and never
//! hold a lock across an await.
//!
//! Every record carries a generation number. A background task only holds a
//! [`Ticket`] (id + generation) and each of its updates is applied only if a
//! record with that exact ticket is still tracked. Removing a submission
//! therefore silently voids every later update from its task: the network
//! request is not aborted, its result is simply discarded.

use crate::models::{FileSubmission, Transition, TransitionError, UploadFile};
use crate::services::analysis_client::{
    AnalysisError, AnalysisResponse, Analyzer, GENERIC_FAILURE_MESSAGE,
};
use chrono::Utc;
use regwatch_common::events::{EventBus, RegwatchEvent};
use regwatch_common::uuid_utils;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{watch, Semaphore};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

// ============================================================================
// Snapshot
// ============================================================================

/// Read-only, insertion-ordered view of tracked submissions
///
/// Cloning is cheap. A list never changes after it is obtained; call
/// [`UploadTracker::list`] again to observe later mutations.
#[derive(Debug, Clone, Default)]
pub struct SubmissionList {
    entries: Arc<Vec<Arc<FileSubmission>>>,
}

impl SubmissionList {
    pub fn iter(&self) -> impl Iterator<Item = &FileSubmission> + '_ {
        self.entries.iter().map(|entry| entry.as_ref())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&FileSubmission> {
        self.iter().find(|s| s.id == id)
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.get(id).is_some()
    }

    /// True when no submission is pending or analyzing
    pub fn is_settled(&self) -> bool {
        self.iter().all(FileSubmission::is_terminal)
    }

    fn position(&self, ticket: Ticket) -> Option<usize> {
        self.entries
            .iter()
            .position(|s| s.id == ticket.id && s.generation == ticket.generation)
    }

    fn with_entries(entries: Vec<Arc<FileSubmission>>) -> Self {
        Self {
            entries: Arc::new(entries),
        }
    }
}

impl<'a> IntoIterator for &'a SubmissionList {
    type Item = &'a FileSubmission;
    type IntoIter = Box<dyn Iterator<Item = &'a FileSubmission> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

// ============================================================================
// Update plumbing
// ============================================================================

/// Identity of one record as seen by its background task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Ticket {
    id: Uuid,
    generation: u64,
}

/// Result of a guarded update
#[derive(Debug)]
enum UpdateOutcome {
    Applied(Arc<FileSubmission>),
    /// Ticket no longer tracked
    Discarded,
    Rejected(TransitionError),
}

struct Inner {
    analyzer: Arc<dyn Analyzer>,
    events: EventBus,
    state: watch::Sender<SubmissionList>,
    generations: AtomicU64,
    permits: Option<Arc<Semaphore>>,
}

impl Inner {
    fn insert(&self, record: FileSubmission) {
        let record = Arc::new(record);
        self.state.send_modify(|list| {
            let mut next = (*list.entries).clone();
            next.push(record);
            *list = SubmissionList::with_entries(next);
        });
    }

    /// Apply `transition` to the record owned by `ticket`, if still tracked
    fn update(&self, ticket: Ticket, transition: Transition) -> UpdateOutcome {
        let mut outcome = UpdateOutcome::Discarded;

        self.state.send_if_modified(|list| {
            let Some(pos) = list.position(ticket) else {
                return false;
            };

            let mut record = (*list.entries[pos]).clone();
            if let Err(e) = record.apply(transition) {
                outcome = UpdateOutcome::Rejected(e);
                return false;
            }

            let record = Arc::new(record);
            let mut next = (*list.entries).clone();
            next[pos] = Arc::clone(&record);
            *list = SubmissionList::with_entries(next);
            outcome = UpdateOutcome::Applied(record);
            true
        });

        match &outcome {
            UpdateOutcome::Applied(record) => {
                debug!(
                    submission_id = %record.id,
                    status = %record.status,
                    progress = record.progress,
                    "Submission updated"
                );
                self.events.emit_lossy(RegwatchEvent::SubmissionProgress {
                    submission_id: record.id,
                    status: record.status,
                    progress: record.progress,
                    timestamp: Utc::now(),
                });
            }
            UpdateOutcome::Discarded => {
                debug!(submission_id = %ticket.id, "Update for untracked submission discarded");
            }
            UpdateOutcome::Rejected(e) => {
                warn!(submission_id = %ticket.id, error = %e, "Submission update rejected");
            }
        }

        outcome
    }

    fn is_tracked(&self, ticket: Ticket) -> bool {
        self.state.borrow().position(ticket).is_some()
    }

    fn announce_discard(&self, ticket: Ticket) {
        info!(
            submission_id = %ticket.id,
            "Analysis resolved after submission was removed, result discarded"
        );
        self.events.emit_lossy(RegwatchEvent::AnalysisDiscarded {
            submission_id: ticket.id,
            timestamp: Utc::now(),
        });
    }

    /// Record the final outcome of an analysis
    fn settle(&self, ticket: Ticket, result: Result<AnalysisResponse, String>) {
        match result {
            Ok(response) => {
                let violation_count = response.violations.len();
                let filename = response.filename.clone();
                let transition = Transition::Complete {
                    violations: response.violations,
                    filename: response.filename,
                };
                match self.update(ticket, transition) {
                    UpdateOutcome::Applied(record) => {
                        info!(
                            submission_id = %record.id,
                            file_name = %record.name,
                            violations = violation_count,
                            "Analysis complete"
                        );
                        self.events.emit_lossy(RegwatchEvent::AnalysisCompleted {
                            submission_id: record.id,
                            filename,
                            violation_count,
                            timestamp: Utc::now(),
                        });
                    }
                    UpdateOutcome::Discarded => self.announce_discard(ticket),
                    UpdateOutcome::Rejected(_) => {}
                }
            }
            Err(message) => {
                let failed = Transition::Fail {
                    message: message.clone(),
                };
                match self.update(ticket, failed) {
                    UpdateOutcome::Applied(record) => {
                        warn!(
                            submission_id = %record.id,
                            file_name = %record.name,
                            error = %message,
                            "Analysis failed"
                        );
                        self.events.emit_lossy(RegwatchEvent::AnalysisFailed {
                            submission_id: record.id,
                            file_name: record.name.clone(),
                            message,
                            timestamp: Utc::now(),
                        });
                    }
                    UpdateOutcome::Discarded => self.announce_discard(ticket),
                    UpdateOutcome::Rejected(_) => {}
                }
            }
        }
    }

    async fn run_analysis(self: Arc<Self>, ticket: Ticket, file: UploadFile) {
        let _permit = match &self.permits {
            Some(permits) => match Arc::clone(permits).acquire_owned().await {
                Ok(permit) => Some(permit),
                Err(_) => None,
            },
            None => None,
        };

        if !self.is_tracked(ticket) {
            debug!(submission_id = %ticket.id, "Submission removed before dispatch");
            self.announce_discard(ticket);
            return;
        }

        let analyzer = Arc::clone(&self.analyzer);
        let progress_target = Arc::clone(&self);
        let on_response = move || {
            progress_target.update(ticket, Transition::ResponseStarted);
        };

        // Run the request in its own task so a panicking analyzer fails this
        // submission instead of leaving it stuck in Analyzing.
        let request = tokio::spawn(async move { analyzer.analyze(&file, &on_response).await });

        let result = match request.await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => {
                debug!(submission_id = %ticket.id, error = %e, "Analyzer returned an error");
                Err(e.user_message())
            }
            Err(join_error) => {
                error!(submission_id = %ticket.id, error = %join_error, "Analysis task aborted");
                Err(GENERIC_FAILURE_MESSAGE.to_string())
            }
        };

        self.settle(ticket, result);
    }
}

// ============================================================================
// Tracker
// ============================================================================

/// Owns the tracked submissions and drives their analyses
///
/// Cloning yields another handle to the same collection.
#[derive(Clone)]
pub struct UploadTracker {
    inner: Arc<Inner>,
}

impl UploadTracker {
    /// Tracker with no bound on concurrent analyses
    pub fn new(analyzer: Arc<dyn Analyzer>, events: EventBus) -> Self {
        Self::build(analyzer, events, None)
    }

    /// Tracker running at most `limit` analyses at once; the rest wait in
    /// `Analyzing` at 10%
    pub fn bounded(analyzer: Arc<dyn Analyzer>, events: EventBus, limit: usize) -> Self {
        let permits = Arc::new(Semaphore::new(limit.max(1)));
        Self::build(analyzer, events, Some(permits))
    }

    fn build(
        analyzer: Arc<dyn Analyzer>,
        events: EventBus,
        permits: Option<Arc<Semaphore>>,
    ) -> Self {
        let (state, _) = watch::channel(SubmissionList::default());
        Self {
            inner: Arc::new(Inner {
                analyzer,
                events,
                state,
                generations: AtomicU64::new(0),
                permits,
            }),
        }
    }

    /// Track `file` and start analyzing it in the background
    ///
    /// Returns immediately with the new submission id. The record is created
    /// `Pending` and moved to `Analyzing` at 10% before this returns. Without
    /// a tokio runtime the submission fails right away instead of panicking.
    pub fn submit(&self, file: UploadFile) -> Uuid {
        let ticket = Ticket {
            id: uuid_utils::generate(),
            generation: self.inner.generations.fetch_add(1, Ordering::Relaxed) + 1,
        };

        let mut record = FileSubmission::new(ticket.id, &file);
        record.generation = ticket.generation;

        info!(
            submission_id = %ticket.id,
            file_name = %file.name,
            size = file.size(),
            mime_type = %file.mime_type,
            "File submitted for analysis"
        );
        self.inner.events.emit_lossy(RegwatchEvent::SubmissionAdded {
            submission_id: ticket.id,
            file_name: file.name.clone(),
            size: file.size(),
            timestamp: Utc::now(),
        });
        self.inner.insert(record);
        self.inner.update(ticket, Transition::BeginAnalysis);

        match Handle::try_current() {
            Ok(handle) => {
                let inner = Arc::clone(&self.inner);
                handle.spawn(inner.run_analysis(ticket, file));
            }
            Err(e) => {
                error!(submission_id = %ticket.id, error = %e, "No async runtime for analysis");
                let failure = AnalysisError::Transport(e.to_string());
                self.inner.settle(ticket, Err(failure.user_message()));
            }
        }

        ticket.id
    }

    /// Stop tracking `id`; returns whether it was tracked
    ///
    /// An in-flight analysis keeps running but its result is discarded.
    pub fn remove(&self, id: Uuid) -> bool {
        let removed = self.inner.state.send_if_modified(|list| {
            if !list.contains(id) {
                return false;
            }
            let next = list
                .entries
                .iter()
                .filter(|s| s.id != id)
                .cloned()
                .collect();
            *list = SubmissionList::with_entries(next);
            true
        });

        if removed {
            info!(submission_id = %id, "Submission removed");
            self.inner.events.emit_lossy(RegwatchEvent::SubmissionRemoved {
                submission_id: id,
                timestamp: Utc::now(),
            });
        }
        removed
    }

    /// Current snapshot of all tracked submissions, in submission order
    pub fn list(&self) -> SubmissionList {
        self.inner.state.borrow().clone()
    }

    /// Current state of one submission
    pub fn get(&self, id: Uuid) -> Option<FileSubmission> {
        self.inner.state.borrow().get(id).cloned()
    }

    /// Receiver notified with a fresh snapshot after every mutation
    pub fn subscribe(&self) -> watch::Receiver<SubmissionList> {
        self.inner.state.subscribe()
    }

    /// Wait until `id` reaches a terminal state
    ///
    /// Returns `None` if `id` is not (or no longer) tracked.
    pub async fn wait_for(&self, id: Uuid) -> Option<FileSubmission> {
        let mut rx = self.subscribe();
        loop {
            {
                let list = rx.borrow_and_update();
                match list.get(id) {
                    None => return None,
                    Some(s) if s.is_terminal() => return Some(s.clone()),
                    Some(_) => {}
                }
            }
            if rx.changed().await.is_err() {
                return self.get(id);
            }
        }
    }

    /// Wait until every tracked submission is terminal
    pub async fn wait_until_settled(&self) -> SubmissionList {
        let mut rx = self.subscribe();
        loop {
            {
                let list = rx.borrow_and_update();
                if list.is_settled() {
                    return list.clone();
                }
            }
            if rx.changed().await.is_err() {
                return self.list();
            }
        }
    }
}
