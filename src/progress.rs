//! Progress notices emitted during a run.
//!
//! A run produces a finite, non-restartable sequence of [`ProgressEvent`]s.
//! The consumer holds the [`ProgressStream`]; the engine holds the sending
//! half and drops it when the run ends, which terminates the stream. Sending
//! never blocks and never fails the run, even if nobody is listening.

use std::fmt;
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::download::DownloadOutcome;

/// One observable step of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// One index query completed.
    IndexPage {
        /// Description of the query.
        query: String,
        /// Records it returned.
        records: usize,
    },
    /// Curation finished.
    Curated {
        /// Number of entries to retrieve.
        entries: usize,
    },
    /// One entry was retrieved (or failed).
    Downloaded(DownloadOutcome),
    /// Every worker has terminated.
    Finished {
        /// Entries processed.
        total: usize,
        /// Time spent retrieving.
        elapsed: Duration,
    },
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IndexPage { query, records } => write!(f, "Listed {records} snapshots ({query})"),
            Self::Curated { entries } => write!(f, "Found {entries} files to download"),
            Self::Downloaded(outcome) => fmt::Display::fmt(outcome, f),
            Self::Finished { total, elapsed } => write!(
                f,
                "Download completed in {:.2}s ({total} files)",
                elapsed.as_secs_f64()
            ),
        }
    }
}

/// Receiving half of a run's progress notices.
#[derive(Debug)]
pub struct ProgressStream {
    receiver: UnboundedReceiver<ProgressEvent>,
}

impl ProgressStream {
    /// Waits for the next event; `None` once the run is over and drained.
    pub async fn next(&mut self) -> Option<ProgressEvent> {
        self.receiver.recv().await
    }
}

/// Sending half shared by the engine and its workers.
#[derive(Debug, Clone, Default)]
pub(crate) struct ProgressSender {
    sender: Option<UnboundedSender<ProgressEvent>>,
}

impl ProgressSender {
    /// Creates a connected sender/stream pair.
    pub(crate) fn channel() -> (Self, ProgressStream) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self {
                sender: Some(sender),
            },
            ProgressStream { receiver },
        )
    }

    /// A sender that discards everything.
    pub(crate) fn disconnected() -> Self {
        Self::default()
    }

    pub(crate) fn emit(&self, event: ProgressEvent) {
        if let Some(sender) = &self.sender {
            // A dropped stream only means nobody is watching.
            let _ = sender.send(event);
        }
    }
}
