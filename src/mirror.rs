//! Run orchestration: listing, curation and retrieval for one target site.
//!
//! # Overview
//!
//! A [`MirrorEngine`] owns one immutable [`EngineConfig`] and performs a
//! single run:
//!
//! 1. List every snapshot for the site through the snapshot index
//! 2. Curate them into one entry per resource path
//! 3. Retrieve the curated entries with the [`RetrievalScheduler`]
//!
//! Progress is observable through the [`ProgressStream`] returned by
//! [`MirrorEngine::start`].
//!
//! # Example
//!
//! ```no_run
//! use wayback_mirror_core::{EngineConfig, MirrorEngine};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = EngineConfig::builder("example.com").workers(4).build()?;
//! let (handle, mut progress) = MirrorEngine::new(config).start();
//! while let Some(event) = progress.next().await {
//!     println!("{event}");
//! }
//! let report = handle.wait().await?;
//! println!("{} succeeded, {} failed", report.succeeded(), report.failed());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tracing::{info, instrument};

use crate::config::{ConfigError, EngineConfig};
use crate::curate::{CuratedSet, CurationMode, Curator};
use crate::download::{
    DownloadError, DownloadOutcome, HttpClient, PathResolver, RetrievalScheduler, SchedulerError,
};
use crate::index::{CdxClient, IndexError, ListingOptions, SnapshotIndex, list_snapshots};
use crate::progress::{ProgressEvent, ProgressSender, ProgressStream};

/// Errors that end a run.
#[derive(Debug, thiserror::Error)]
pub enum MirrorError {
    /// The configuration was rejected.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Listing snapshots failed; nothing was retrieved.
    #[error("snapshot listing failed: {0}")]
    Index(#[from] IndexError),

    /// An entry failed under the fail-fast policy.
    #[error("failed to retrieve {url} into {}: {source}", path.display())]
    Retrieval {
        /// Original URL of the failed entry.
        url: String,
        /// Local path that was being written.
        path: PathBuf,
        /// The underlying failure.
        #[source]
        source: DownloadError,
    },

    /// The retrieval client could not be created.
    #[error("failed to create retrieval client: {0}")]
    Client(#[source] DownloadError),

    /// A worker or the run task panicked.
    #[error("run task failed: {0}")]
    WorkerPanicked(String),
}

impl From<SchedulerError> for MirrorError {
    fn from(error: SchedulerError) -> Self {
        match error {
            SchedulerError::EntryFailed { url, path, source } => {
                Self::Retrieval { url, path, source }
            }
            SchedulerError::WorkerPanicked(message) => Self::WorkerPanicked(message),
        }
    }
}

/// Summary of a completed run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// One outcome per curated entry, in completion order.
    pub outcomes: Vec<DownloadOutcome>,
    /// Time spent retrieving.
    pub elapsed: Duration,
    /// Number of curated entries.
    pub total: usize,
    /// Root directory the mirror was written under.
    pub output_root: PathBuf,
}

impl RunReport {
    /// Number of entries written.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    /// Number of entries that failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }
}

/// Handle to a run started with [`MirrorEngine::start`].
#[derive(Debug)]
pub struct RunHandle {
    task: JoinHandle<Result<RunReport, MirrorError>>,
}

impl RunHandle {
    /// Waits for the run to finish.
    ///
    /// # Errors
    ///
    /// Returns the run's [`MirrorError`], or [`MirrorError::WorkerPanicked`]
    /// if the run task itself panicked.
    pub async fn wait(self) -> Result<RunReport, MirrorError> {
        self.task
            .await
            .unwrap_or_else(|join_error| Err(MirrorError::WorkerPanicked(join_error.to_string())))
    }
}

/// Mirrors one site from the archive.
#[derive(Clone)]
pub struct MirrorEngine {
    config: EngineConfig,
    index: Option<Arc<dyn SnapshotIndex>>,
}

impl std::fmt::Debug for MirrorEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MirrorEngine")
            .field("config", &self.config)
            .field("custom_index", &self.index.is_some())
            .finish()
    }
}

impl MirrorEngine {
    /// Creates an engine for one run of `config`.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            index: None,
        }
    }

    /// Lists snapshots through `index` instead of the configured CDX endpoint.
    #[must_use]
    pub fn with_index(mut self, index: Arc<dyn SnapshotIndex>) -> Self {
        self.index = Some(index);
        self
    }

    /// The run configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Lists and curates snapshots without retrieving anything.
    ///
    /// # Errors
    ///
    /// Returns [`MirrorError::Index`] if any index query fails.
    pub async fn curate(&self) -> Result<CuratedSet, MirrorError> {
        self.curate_with(&ProgressSender::disconnected()).await
    }

    /// Starts the run on a background task.
    ///
    /// The returned stream ends once the run is over, whatever its result.
    #[must_use]
    pub fn start(self) -> (RunHandle, ProgressStream) {
        let (sender, stream) = ProgressSender::channel();
        let task = tokio::spawn(async move { self.execute(&sender).await });
        (RunHandle { task }, stream)
    }

    /// Runs to completion, discarding progress notices.
    ///
    /// # Errors
    ///
    /// Returns a [`MirrorError`] if listing fails, the retrieval client cannot
    /// be built, or an entry fails under [`crate::FailurePolicy::FailFast`].
    pub async fn run(self) -> Result<RunReport, MirrorError> {
        self.execute(&ProgressSender::disconnected()).await
    }

    #[instrument(skip(self, progress), fields(site = %self.config.target_site()))]
    async fn execute(&self, progress: &ProgressSender) -> Result<RunReport, MirrorError> {
        let curated = self.curate_with(progress).await?;
        let output_root = self.config.output_root().to_path_buf();
        let resolver = PathResolver::new(output_root.clone(), curated.mode());

        let entries = resolver.collapse_collisions(curated.into_entries());
        let total = entries.len();
        progress.emit(ProgressEvent::Curated { entries: total });
        info!(entries = total, "Found files to download");

        let client =
            HttpClient::new(self.config.retrieval_timeout()).map_err(MirrorError::Client)?;
        let scheduler = RetrievalScheduler::new(
            self.config.workers(),
            self.config.failure_policy(),
            client,
            resolver,
            self.config.endpoints().clone(),
        );

        let started = Instant::now();
        let outcomes = scheduler.run(entries, progress).await?;
        let elapsed = started.elapsed();

        progress.emit(ProgressEvent::Finished { total, elapsed });
        info!(
            "Download completed in {:.2}s, saved in {} ({} files)",
            elapsed.as_secs_f64(),
            output_root.display(),
            total
        );

        Ok(RunReport {
            outcomes,
            elapsed,
            total,
            output_root,
        })
    }

    async fn curate_with(&self, progress: &ProgressSender) -> Result<CuratedSet, MirrorError> {
        let index: Arc<dyn SnapshotIndex> = match &self.index {
            Some(index) => Arc::clone(index),
            None => Arc::new(CdxClient::from_config(&self.config)?),
        };

        let options = ListingOptions {
            exact_url: self.config.exact_url(),
            maximum_pages: self.config.maximum_pages(),
        };
        let records = list_snapshots(
            index.as_ref(),
            self.config.target_site(),
            options,
            |query, records| {
                progress.emit(ProgressEvent::IndexPage {
                    query: query.to_string(),
                    records,
                });
            },
        )
        .await?;

        let mode = if self.config.all_timestamps() {
            CurationMode::AllTimestamps
        } else {
            CurationMode::LatestOnly
        };
        Ok(Curator::new(self.config.filters().clone(), mode).curate(records))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::Path;

    use async_trait::async_trait;

    use super::*;
    use crate::download::OutcomeStatus;
    use crate::index::{IndexQuery, SnapshotRecord};

    /// Returns fixed records for the exact query and nothing for wildcard pages.
    struct FixedIndex(Vec<SnapshotRecord>);

    #[async_trait]
    impl SnapshotIndex for FixedIndex {
        async fn fetch(&self, query: &IndexQuery) -> Result<Vec<SnapshotRecord>, IndexError> {
            Ok(match query.page() {
                None => self.0.clone(),
                Some(_) => Vec::new(),
            })
        }
    }

    fn outcome(status: OutcomeStatus) -> DownloadOutcome {
        DownloadOutcome {
            source_url: "http://example.com/a.html".to_string(),
            timestamp: "20210101000000".to_string(),
            local_path: PathBuf::from("/out/a.html"),
            status,
            detail: String::new(),
        }
    }

    #[test]
    fn test_report_counts() {
        let report = RunReport {
            outcomes: vec![
                outcome(OutcomeStatus::Success),
                outcome(OutcomeStatus::Failure),
                outcome(OutcomeStatus::Success),
            ],
            elapsed: Duration::from_secs(1),
            total: 3,
            output_root: PathBuf::from("/out"),
        };
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 1);
    }

    #[test]
    fn test_scheduler_error_maps_to_retrieval() {
        let error: MirrorError = SchedulerError::EntryFailed {
            url: "http://example.com/a.html".to_string(),
            path: PathBuf::from("/out/a.html"),
            source: DownloadError::http_status("http://archive/a", 404),
        }
        .into();
        assert!(matches!(error, MirrorError::Retrieval { ref path, .. } if path == Path::new("/out/a.html")));
    }

    #[tokio::test]
    async fn test_curate_uses_injected_index() {
        let config = EngineConfig::builder("example.com").build().unwrap();
        let engine = MirrorEngine::new(config).with_index(Arc::new(FixedIndex(vec![
            SnapshotRecord::new("20200101000000", "http://example.com/a.html"),
            SnapshotRecord::new("20210101000000", "http://example.com/a.html"),
        ])));

        let curated = engine.curate().await.unwrap();
        assert_eq!(curated.len(), 1);
        assert_eq!(curated.get("a.html").unwrap().timestamp, "20210101000000");
    }

    #[tokio::test]
    async fn test_empty_listing_finishes_with_empty_report() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::builder("example.com")
            .output_dir(dir.path())
            .build()
            .unwrap();
        let engine = MirrorEngine::new(config).with_index(Arc::new(FixedIndex(Vec::new())));

        let (handle, mut stream) = engine.start();
        let mut events = Vec::new();
        while let Some(event) = stream.next().await {
            events.push(event);
        }
        let report = handle.wait().await.unwrap();

        assert_eq!(report.total, 0);
        assert!(report.outcomes.is_empty());
        assert!(matches!(events.last(), Some(ProgressEvent::Finished { total: 0, .. })));
        assert!(events.contains(&ProgressEvent::Curated { entries: 0 }));
    }
}
