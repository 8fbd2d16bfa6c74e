//! Run configuration for the mirror engine.
//!
//! An [`EngineConfig`] is built once per run through [`EngineConfig::builder`]
//! and is immutable afterwards. All validation (filter patterns, timestamps,
//! worker bounds, archive endpoints) happens in [`EngineConfigBuilder::build`],
//! so a run never touches the network with a configuration it cannot honor.

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::filter::FilterSet;

/// Minimum allowed worker count.
const MIN_WORKERS: usize = 1;

/// Maximum allowed worker count.
const MAX_WORKERS: usize = 100;

/// Archive-native timestamps have at most 14 digits (`YYYYMMDDhhmmss`).
const MAX_TIMESTAMP_DIGITS: usize = 14;

/// Default number of retrieval workers.
pub const DEFAULT_WORKERS: usize = 1;

/// Default upper bound on wildcard index pages scanned.
pub const DEFAULT_MAXIMUM_PAGES: u32 = 100;

/// Directory under which per-site mirrors are placed when no output root is given.
pub const DEFAULT_SITES_ROOT: &str = "websites";

/// Default snapshot index (CDX) endpoint.
pub const DEFAULT_INDEX_URL: &str = "https://web.archive.org/cdx/search/xd";

/// Default raw content endpoint; captures live at `<base>/<timestamp>id_/<url>`.
pub const DEFAULT_CONTENT_BASE_URL: &str = "https://web.archive.org/web";

/// Errors raised while validating a run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No target site was supplied.
    #[error("missing required target site")]
    MissingTargetSite,

    /// A filter pattern is not a valid regular expression.
    #[error("invalid {kind} filter '{pattern}': {source}")]
    InvalidFilter {
        /// Which filter failed (`only` or `exclude`).
        kind: &'static str,
        /// The pattern as supplied.
        pattern: String,
        /// The regex compilation error.
        #[source]
        source: regex::Error,
    },

    /// A time window bound is not an archive timestamp.
    #[error("invalid {field} timestamp '{value}': expected 1 to 14 digits (YYYYMMDDhhmmss)")]
    InvalidTimestamp {
        /// Which bound failed (`from` or `to`).
        field: &'static str,
        /// The value as supplied.
        value: String,
    },

    /// The lower time bound is after the upper one.
    #[error("invalid time window: from ({from}) is later than to ({to})")]
    InvalidTimeWindow {
        /// Lower bound.
        from: String,
        /// Upper bound.
        to: String,
    },

    /// Worker count outside the supported range.
    #[error("invalid worker count {value}: must be between {MIN_WORKERS} and {MAX_WORKERS}")]
    InvalidWorkerCount {
        /// The rejected value.
        value: usize,
    },

    /// Maximum page bound of zero.
    #[error("invalid maximum pages {value}: must be at least 1")]
    InvalidMaxPages {
        /// The rejected value.
        value: u32,
    },

    /// An archive endpoint is not an absolute URL.
    #[error("invalid archive endpoint '{url}'")]
    InvalidEndpoint {
        /// The rejected endpoint.
        url: String,
    },
}

/// What happens to the rest of the run when one entry fails to download.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Record a failure outcome for the entry and keep draining the queue.
    #[default]
    Isolate,
    /// Fail the run on the first failed entry.
    ///
    /// No new entries are claimed once an entry fails. Downloads already in
    /// flight on other workers run to completion, so every file present when
    /// the run returns is complete.
    FailFast,
}

/// Locations of the archive's index and raw content services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEndpoints {
    index_url: String,
    content_base_url: String,
}

impl Default for ArchiveEndpoints {
    fn default() -> Self {
        Self {
            index_url: DEFAULT_INDEX_URL.to_string(),
            content_base_url: DEFAULT_CONTENT_BASE_URL.to_string(),
        }
    }
}

impl ArchiveEndpoints {
    /// Creates endpoints pointing at custom index and content services.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEndpoint`] if either value is not an
    /// absolute URL.
    pub fn new(
        index_url: impl Into<String>,
        content_base_url: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let index_url = index_url.into();
        let content_base_url = content_base_url.into();
        for candidate in [&index_url, &content_base_url] {
            if Url::parse(candidate).is_err() {
                return Err(ConfigError::InvalidEndpoint {
                    url: candidate.clone(),
                });
            }
        }
        Ok(Self {
            index_url,
            content_base_url: content_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Points both services at one archive host, using the default paths.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEndpoint`] if `base` is not an absolute URL.
    pub fn for_host(base: &str) -> Result<Self, ConfigError> {
        let base = base.trim_end_matches('/');
        Self::new(format!("{base}/cdx/search/xd"), format!("{base}/web"))
    }

    /// The snapshot index (CDX) endpoint.
    #[must_use]
    pub fn index_url(&self) -> &str {
        &self.index_url
    }

    /// The raw content base, without trailing slash.
    #[must_use]
    pub fn content_base_url(&self) -> &str {
        &self.content_base_url
    }

    /// Address of a capture's original bytes, without the archive's UI wrapper.
    #[must_use]
    pub fn raw_content_url(&self, timestamp: &str, original_url: &str) -> String {
        format!("{}/{timestamp}id_/{original_url}", self.content_base_url)
    }
}

/// Immutable configuration for one mirror run.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    target_site: String,
    output_root: PathBuf,
    from_timestamp: Option<String>,
    to_timestamp: Option<String>,
    filters: FilterSet,
    include_all_statuses: bool,
    maximum_pages: u32,
    workers: usize,
    exact_url: bool,
    all_timestamps: bool,
    failure_policy: FailurePolicy,
    retrieval_timeout: Option<Duration>,
    index_timeout: Option<Duration>,
    endpoints: ArchiveEndpoints,
}

impl EngineConfig {
    /// Starts a builder for the given target site (bare host or full URL).
    #[must_use]
    pub fn builder(target_site: impl Into<String>) -> EngineConfigBuilder {
        EngineConfigBuilder::new(target_site)
    }

    /// The site as supplied, without trailing slash.
    #[must_use]
    pub fn target_site(&self) -> &str {
        &self.target_site
    }

    /// Root directory the mirror is written under.
    #[must_use]
    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Lower time bound, if any.
    #[must_use]
    pub fn from_timestamp(&self) -> Option<&str> {
        self.from_timestamp.as_deref()
    }

    /// Upper time bound, if any.
    #[must_use]
    pub fn to_timestamp(&self) -> Option<&str> {
        self.to_timestamp.as_deref()
    }

    /// Compiled only/exclude filters.
    #[must_use]
    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    /// Whether non-2xx captures are listed too.
    #[must_use]
    pub fn include_all_statuses(&self) -> bool {
        self.include_all_statuses
    }

    /// Upper bound on wildcard index pages.
    #[must_use]
    pub fn maximum_pages(&self) -> u32 {
        self.maximum_pages
    }

    /// Number of concurrent retrieval workers.
    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Whether only the exact target URL is listed.
    #[must_use]
    pub fn exact_url(&self) -> bool {
        self.exact_url
    }

    /// Whether every distinct capture is kept instead of the latest one.
    #[must_use]
    pub fn all_timestamps(&self) -> bool {
        self.all_timestamps
    }

    /// Behavior on a single failed entry.
    #[must_use]
    pub fn failure_policy(&self) -> FailurePolicy {
        self.failure_policy
    }

    /// Total timeout per content retrieval; `None` means unbounded.
    #[must_use]
    pub fn retrieval_timeout(&self) -> Option<Duration> {
        self.retrieval_timeout
    }

    /// Total timeout per index query; `None` means unbounded.
    #[must_use]
    pub fn index_timeout(&self) -> Option<Duration> {
        self.index_timeout
    }

    /// Archive service locations.
    #[must_use]
    pub fn endpoints(&self) -> &ArchiveEndpoints {
        &self.endpoints
    }
}

/// Builder for [`EngineConfig`].
#[derive(Debug, Clone)]
pub struct EngineConfigBuilder {
    target_site: String,
    output_dir: Option<PathBuf>,
    from_timestamp: Option<String>,
    to_timestamp: Option<String>,
    only_filter: Option<String>,
    exclude_filter: Option<String>,
    include_all_statuses: bool,
    maximum_pages: u32,
    workers: usize,
    exact_url: bool,
    all_timestamps: bool,
    failure_policy: FailurePolicy,
    retrieval_timeout: Option<Duration>,
    index_timeout: Option<Duration>,
    endpoints: ArchiveEndpoints,
}

impl EngineConfigBuilder {
    fn new(target_site: impl Into<String>) -> Self {
        Self {
            target_site: target_site.into(),
            output_dir: None,
            from_timestamp: None,
            to_timestamp: None,
            only_filter: None,
            exclude_filter: None,
            include_all_statuses: false,
            maximum_pages: DEFAULT_MAXIMUM_PAGES,
            workers: DEFAULT_WORKERS,
            exact_url: false,
            all_timestamps: false,
            failure_policy: FailurePolicy::default(),
            retrieval_timeout: None,
            index_timeout: None,
            endpoints: ArchiveEndpoints::default(),
        }
    }

    /// Explicit output root; defaults to `websites/<host>`.
    #[must_use]
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Lower time bound (archive timestamp, `0` or empty for unbounded).
    #[must_use]
    pub fn from_timestamp(mut self, value: impl Into<String>) -> Self {
        self.from_timestamp = Some(value.into());
        self
    }

    /// Upper time bound (archive timestamp, `0` or empty for unbounded).
    #[must_use]
    pub fn to_timestamp(mut self, value: impl Into<String>) -> Self {
        self.to_timestamp = Some(value.into());
        self
    }

    /// Keep only URLs matching this case-insensitive pattern.
    #[must_use]
    pub fn only_filter(mut self, pattern: impl Into<String>) -> Self {
        self.only_filter = Some(pattern.into());
        self
    }

    /// Drop URLs matching this case-insensitive pattern.
    #[must_use]
    pub fn exclude_filter(mut self, pattern: impl Into<String>) -> Self {
        self.exclude_filter = Some(pattern.into());
        self
    }

    /// List captures of every HTTP status, not just 200.
    #[must_use]
    pub fn include_all_statuses(mut self, value: bool) -> Self {
        self.include_all_statuses = value;
        self
    }

    /// Upper bound on wildcard index pages.
    #[must_use]
    pub fn maximum_pages(mut self, value: u32) -> Self {
        self.maximum_pages = value;
        self
    }

    /// Number of concurrent retrieval workers.
    #[must_use]
    pub fn workers(mut self, value: usize) -> Self {
        self.workers = value;
        self
    }

    /// Only list the exact target URL, skipping the wildcard scan.
    #[must_use]
    pub fn exact_url(mut self, value: bool) -> Self {
        self.exact_url = value;
        self
    }

    /// Keep every distinct capture, each under its own timestamp directory.
    #[must_use]
    pub fn all_timestamps(mut self, value: bool) -> Self {
        self.all_timestamps = value;
        self
    }

    /// Behavior on a single failed entry.
    #[must_use]
    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Total timeout per content retrieval.
    #[must_use]
    pub fn retrieval_timeout(mut self, timeout: Duration) -> Self {
        self.retrieval_timeout = Some(timeout);
        self
    }

    /// Total timeout per index query.
    #[must_use]
    pub fn index_timeout(mut self, timeout: Duration) -> Self {
        self.index_timeout = Some(timeout);
        self
    }

    /// Archive service locations.
    #[must_use]
    pub fn endpoints(mut self, endpoints: ArchiveEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Validates every setting and produces the run configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] describing the first invalid setting.
    pub fn build(self) -> Result<EngineConfig, ConfigError> {
        let target_site = self.target_site.trim().trim_end_matches('/').to_string();
        if target_site.is_empty() {
            return Err(ConfigError::MissingTargetSite);
        }

        if !(MIN_WORKERS..=MAX_WORKERS).contains(&self.workers) {
            return Err(ConfigError::InvalidWorkerCount {
                value: self.workers,
            });
        }
        if self.maximum_pages == 0 {
            return Err(ConfigError::InvalidMaxPages {
                value: self.maximum_pages,
            });
        }

        let from_timestamp = normalize_timestamp("from", self.from_timestamp.as_deref())?;
        let to_timestamp = normalize_timestamp("to", self.to_timestamp.as_deref())?;
        if let (Some(from), Some(to)) = (&from_timestamp, &to_timestamp)
            && padded(from) > padded(to)
        {
            return Err(ConfigError::InvalidTimeWindow {
                from: from.clone(),
                to: to.clone(),
            });
        }

        let filters = FilterSet::new(self.only_filter.as_deref(), self.exclude_filter.as_deref())?;

        let output_root = self
            .output_dir
            .unwrap_or_else(|| Path::new(DEFAULT_SITES_ROOT).join(backup_name(&target_site)));

        debug!(
            site = %target_site,
            output_root = %output_root.display(),
            workers = self.workers,
            maximum_pages = self.maximum_pages,
            "run configuration validated"
        );

        Ok(EngineConfig {
            target_site,
            output_root,
            from_timestamp,
            to_timestamp,
            filters,
            include_all_statuses: self.include_all_statuses,
            maximum_pages: self.maximum_pages,
            workers: self.workers,
            exact_url: self.exact_url,
            all_timestamps: self.all_timestamps,
            failure_policy: self.failure_policy,
            retrieval_timeout: self.retrieval_timeout,
            index_timeout: self.index_timeout,
            endpoints: self.endpoints,
        })
    }
}

/// Host portion of the target site, used to name the default output root.
///
/// `http://example.com/blog` and `example.com/blog` both yield `example.com`.
#[must_use]
pub fn backup_name(target_site: &str) -> &str {
    let without_scheme = match target_site.split_once("//") {
        Some((_, rest)) => rest,
        None => target_site,
    };
    without_scheme.split('/').next().unwrap_or(without_scheme)
}

fn normalize_timestamp(
    field: &'static str,
    value: Option<&str>,
) -> Result<Option<String>, ConfigError> {
    let Some(value) = value.map(str::trim) else {
        return Ok(None);
    };
    if value.is_empty() {
        return Ok(None);
    }
    if value.len() > MAX_TIMESTAMP_DIGITS || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ConfigError::InvalidTimestamp {
            field,
            value: value.to_string(),
        });
    }
    if value.bytes().all(|b| b == b'0') {
        return Ok(None);
    }
    Ok(Some(value.to_string()))
}

/// Right-pads a timestamp so prefixes of different precision compare correctly.
fn padded(timestamp: &str) -> String {
    format!("{timestamp:0<width$}", width = MAX_TIMESTAMP_DIGITS)
}
