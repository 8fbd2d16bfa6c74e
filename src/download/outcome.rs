//! Per-entry download outcomes.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// Whether one retrieval attempt persisted its capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// Bytes were written in full to the local path.
    Success,
    /// Retrieval or persistence failed; see `detail`.
    Failure,
}

/// Record of one retrieval attempt. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadOutcome {
    /// Original URL of the capture.
    pub source_url: String,
    /// Archive timestamp of the capture.
    pub timestamp: String,
    /// Path written to (or attempted).
    pub local_path: PathBuf,
    /// Success or failure.
    pub status: OutcomeStatus,
    /// Response status text on success, error message on failure.
    pub detail: String,
}

impl DownloadOutcome {
    pub(crate) fn success(
        source_url: &str,
        timestamp: &str,
        local_path: PathBuf,
        response_status: impl Into<String>,
    ) -> Self {
        Self {
            source_url: source_url.to_string(),
            timestamp: timestamp.to_string(),
            local_path,
            status: OutcomeStatus::Success,
            detail: response_status.into(),
        }
    }

    pub(crate) fn failure(
        source_url: &str,
        timestamp: &str,
        local_path: PathBuf,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            source_url: source_url.to_string(),
            timestamp: timestamp.to_string(),
            local_path,
            status: OutcomeStatus::Failure,
            detail: detail.into(),
        }
    }

    /// Whether the capture was written.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }
}

/// Human-readable progress notice.
impl fmt::Display for DownloadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            OutcomeStatus::Success => write!(
                f,
                "Downloaded {} to {} - Response status: {}",
                self.source_url,
                self.local_path.display(),
                self.detail
            ),
            OutcomeStatus::Failure => write!(
                f,
                "Failed {} to {} - {}",
                self.source_url,
                self.local_path.display(),
                self.detail
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_notice() {
        let outcome = DownloadOutcome::success(
            "http://example.com/a.html",
            "20210101000000",
            PathBuf::from("websites/example.com/a.html"),
            "OK",
        );
        assert!(outcome.is_success());
        assert_eq!(
            outcome.to_string(),
            "Downloaded http://example.com/a.html to websites/example.com/a.html - Response status: OK"
        );
    }

    #[test]
    fn test_failure_notice() {
        let outcome = DownloadOutcome::failure(
            "http://example.com/b.html",
            "20210101000000",
            PathBuf::from("websites/example.com/b.html"),
            "HTTP 404 downloading http://archive/b",
        );
        assert!(!outcome.is_success());
        let notice = outcome.to_string();
        assert!(notice.starts_with("Failed http://example.com/b.html"));
        assert!(notice.contains("HTTP 404"));
    }
}
