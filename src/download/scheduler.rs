//! Retrieval scheduler: a fixed pool of workers draining curated entries.
//!
//! # Concurrency Model
//!
//! - All curated entries start in one shared pending set
//! - Each worker is its own Tokio task and loops on `PendingEntries::claim`,
//!   which removes one entry under a mutex, so every entry goes to exactly
//!   one worker
//! - A worker exits when the set is empty; surplus workers exit immediately
//! - Outcomes are appended to a shared log and mirrored onto the progress
//!   stream; ordering across workers is not defined
//!
//! # Failure Policy
//!
//! Under [`FailurePolicy::Isolate`] a failed entry becomes a failure outcome
//! and its worker moves on. Under [`FailurePolicy::FailFast`] the failing
//! worker raises a stop flag and returns the error. Other workers finish the
//! entry they hold, claim nothing further and exit, so no file is left half
//! written when the run returns.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

use super::client::{FetchResult, HttpClient};
use super::error::DownloadError;
use super::outcome::DownloadOutcome;
use super::path::{LocalPath, PathResolver};
use crate::config::{ArchiveEndpoints, FailurePolicy};
use crate::curate::CuratedEntry;
use crate::progress::{ProgressEvent, ProgressSender};

/// Errors that end a scheduling run early.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// An entry failed under the fail-fast policy.
    #[error("failed to retrieve {url} into {}: {source}", path.display())]
    EntryFailed {
        /// Original URL of the failed entry.
        url: String,
        /// Local path that was being written.
        path: PathBuf,
        /// The underlying failure.
        #[source]
        source: DownloadError,
    },

    /// A worker task panicked.
    #[error("retrieval worker panicked: {0}")]
    WorkerPanicked(String),
}

/// Shared set of entries not yet claimed by any worker.
#[derive(Debug, Default)]
pub(crate) struct PendingEntries {
    entries: Mutex<Vec<CuratedEntry>>,
}

impl PendingEntries {
    pub(crate) fn new(entries: Vec<CuratedEntry>) -> Self {
        Self {
            entries: Mutex::new(entries),
        }
    }

    /// Atomically removes and returns one remaining entry.
    pub(crate) fn claim(&self) -> Option<CuratedEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop()
    }
}

/// State shared by every worker of one run.
struct WorkerContext {
    pending: PendingEntries,
    outcomes: Mutex<Vec<DownloadOutcome>>,
    client: HttpClient,
    resolver: PathResolver,
    endpoints: ArchiveEndpoints,
    policy: FailurePolicy,
    progress: ProgressSender,
    stop: AtomicBool,
}

impl WorkerContext {
    fn next_entry(&self) -> Option<CuratedEntry> {
        if self.stop.load(Ordering::SeqCst) {
            return None;
        }
        self.pending.claim()
    }

    fn record(&self, outcome: DownloadOutcome) {
        self.outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(outcome.clone());
        self.progress.emit(ProgressEvent::Downloaded(outcome));
    }
}

/// Retrieves every curated entry exactly once with bounded concurrency.
#[derive(Debug, Clone)]
pub struct RetrievalScheduler {
    workers: usize,
    policy: FailurePolicy,
    client: HttpClient,
    resolver: PathResolver,
    endpoints: ArchiveEndpoints,
}

impl RetrievalScheduler {
    /// Creates a scheduler; `workers` below 1 is raised to 1.
    #[must_use]
    pub fn new(
        workers: usize,
        policy: FailurePolicy,
        client: HttpClient,
        resolver: PathResolver,
        endpoints: ArchiveEndpoints,
    ) -> Self {
        Self {
            workers: workers.max(1),
            policy,
            client,
            resolver,
            endpoints,
        }
    }

    /// Configured worker count.
    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Retrieves `entries` without reporting progress.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::EntryFailed`] for the first failed entry under
    /// [`FailurePolicy::FailFast`], and [`SchedulerError::WorkerPanicked`] if a
    /// worker panics. Either way, in-flight entries complete before returning.
    pub async fn retrieve_all(
        &self,
        entries: Vec<CuratedEntry>,
    ) -> Result<Vec<DownloadOutcome>, SchedulerError> {
        self.run(entries, &ProgressSender::disconnected()).await
    }

    /// Drains `entries` across the worker pool.
    ///
    /// Returns one outcome per entry, in completion order.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::EntryFailed`] for the first failed entry under
    /// [`FailurePolicy::FailFast`], and [`SchedulerError::WorkerPanicked`] if a
    /// worker panics. Either way, in-flight entries complete before returning.
    #[instrument(skip(self, entries, progress), fields(entries = entries.len(), workers = self.workers))]
    pub(crate) async fn run(
        &self,
        entries: Vec<CuratedEntry>,
        progress: &ProgressSender,
    ) -> Result<Vec<DownloadOutcome>, SchedulerError> {
        let total = entries.len();
        let context = Arc::new(WorkerContext {
            pending: PendingEntries::new(entries),
            outcomes: Mutex::new(Vec::with_capacity(total)),
            client: self.client.clone(),
            resolver: self.resolver.clone(),
            endpoints: self.endpoints.clone(),
            policy: self.policy,
            progress: progress.clone(),
            stop: AtomicBool::new(false),
        });

        info!("starting retrieval workers");

        let mut workers = JoinSet::new();
        for worker_id in 0..self.workers {
            workers.spawn(worker_loop(worker_id, Arc::clone(&context)));
        }

        let mut first_failure: Option<SchedulerError> = None;
        while let Some(joined) = workers.join_next().await {
            let failure = match joined {
                Ok(Ok(())) => continue,
                Ok(Err(error)) => error,
                Err(join_error) => SchedulerError::WorkerPanicked(join_error.to_string()),
            };
            context.stop.store(true, Ordering::SeqCst);
            if first_failure.is_none() {
                warn!(error = %failure, "stopping retrieval after in-flight entries finish");
                first_failure = Some(failure);
            }
        }
        if let Some(failure) = first_failure {
            return Err(failure);
        }

        let outcomes = std::mem::take(
            &mut *context
                .outcomes
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        let failed = outcomes.iter().filter(|o| !o.is_success()).count();
        info!(
            completed = outcomes.len() - failed,
            failed,
            total = outcomes.len(),
            "retrieval complete"
        );
        Ok(outcomes)
    }
}

async fn worker_loop(worker_id: usize, context: Arc<WorkerContext>) -> Result<(), SchedulerError> {
    while let Some(entry) = context.next_entry() {
        let local = context.resolver.resolve(&entry);
        let file_path = local.path();
        debug!(worker_id, url = %entry.source_url, path = %file_path.display(), "claimed entry");

        match retrieve_entry(&context, &entry, &local).await {
            Ok(fetched) => {
                debug!(worker_id, bytes = fetched.bytes_written, "entry retrieved");
                context.record(DownloadOutcome::success(
                    &entry.source_url,
                    &entry.timestamp,
                    file_path,
                    fetched.status_text,
                ));
            }
            Err(error) => {
                warn!(
                    worker_id,
                    url = %entry.source_url,
                    path = %file_path.display(),
                    error = %error,
                    "entry retrieval failed"
                );
                context.record(DownloadOutcome::failure(
                    &entry.source_url,
                    &entry.timestamp,
                    file_path.clone(),
                    error.to_string(),
                ));
                if context.policy == FailurePolicy::FailFast {
                    context.stop.store(true, Ordering::SeqCst);
                    return Err(SchedulerError::EntryFailed {
                        url: entry.source_url,
                        path: file_path,
                        source: error,
                    });
                }
            }
        }
    }

    debug!(worker_id, "pending set drained, worker exiting");
    Ok(())
}

async fn retrieve_entry(
    context: &WorkerContext,
    entry: &CuratedEntry,
    local: &LocalPath,
) -> Result<FetchResult, DownloadError> {
    tokio::fs::create_dir_all(&local.directory)
        .await
        .map_err(|e| DownloadError::io(&local.directory, e))?;

    let url = context
        .endpoints
        .raw_content_url(&entry.timestamp, &entry.source_url);
    context.client.fetch_to_file(&url, &local.path()).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;
    use std::thread;

    use super::*;
    use crate::curate::ResourcePath;

    fn entries(count: usize) -> Vec<CuratedEntry> {
        (0..count)
            .map(|i| {
                let url = format!("http://example.com/file{i}.html");
                CuratedEntry {
                    resource_path: ResourcePath::from_url(&url).unwrap(),
                    source_url: url,
                    timestamp: "20210101000000".to_string(),
                }
            })
            .collect()
    }

    #[test]
    fn test_claim_drains_then_returns_none() {
        let pending = PendingEntries::new(entries(2));
        assert!(pending.claim().is_some());
        assert!(pending.claim().is_some());
        assert!(pending.claim().is_none());
    }

    #[test]
    fn test_concurrent_claims_are_exclusive() {
        let pending = Arc::new(PendingEntries::new(entries(1000)));
        let mut handles = Vec::new();

        for _ in 0..8 {
            let pending = Arc::clone(&pending);
            handles.push(thread::spawn(move || {
                let mut claimed = Vec::new();
                while let Some(entry) = pending.claim() {
                    claimed.push(entry.source_url);
                }
                claimed
            }));
        }

        let mut all = Vec::new();
        for handle in handles {
            all.extend(handle.join().unwrap());
        }
        let unique: HashSet<_> = all.iter().cloned().collect();
        assert_eq!(all.len(), 1000, "every entry claimed");
        assert_eq!(unique.len(), 1000, "no entry claimed twice");
    }

    #[test]
    fn test_scheduler_worker_floor() {
        let scheduler = RetrievalScheduler::new(
            0,
            FailurePolicy::Isolate,
            HttpClient::new(None).unwrap(),
            PathResolver::new("/tmp/out", crate::curate::CurationMode::LatestOnly),
            ArchiveEndpoints::default(),
        );
        assert_eq!(scheduler.workers(), 1);
    }

    #[test]
    fn test_scheduler_error_display() {
        let error = SchedulerError::EntryFailed {
            url: "http://example.com/a.html".to_string(),
            path: PathBuf::from("/out/a.html"),
            source: DownloadError::http_status("http://archive/a", 500),
        };
        let msg = error.to_string();
        assert!(msg.contains("http://example.com/a.html"));
        assert!(msg.contains("/out/a.html"));
        assert!(msg.contains("500"));
    }
}
