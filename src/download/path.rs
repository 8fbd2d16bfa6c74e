//! Local path resolution for curated captures.
//!
//! A capture's original URL maps onto `<output_root>/<url directories>/<file>`.
//! The mapping only depends on the URL (minus query string and fragment), the
//! output root and, in all-timestamps mode, the capture's timestamp.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::curate::{CuratedEntry, CurationMode};

/// File name used when a URL path ends in `/` (or is the site root).
pub const INDEX_FILE_NAME: &str = "index.html";

/// Resolved location of one capture on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalPath {
    /// Directory that must exist before writing.
    pub directory: PathBuf,
    /// File name within `directory`.
    pub file_name: String,
}

impl LocalPath {
    /// Full file path.
    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.directory.join(&self.file_name)
    }
}

/// Maps curated entries to local paths under one output root.
#[derive(Debug, Clone)]
pub struct PathResolver {
    output_root: PathBuf,
    mode: CurationMode,
}

impl PathResolver {
    /// Creates a resolver for `output_root`.
    #[must_use]
    pub fn new(output_root: impl Into<PathBuf>, mode: CurationMode) -> Self {
        Self {
            output_root: output_root.into(),
            mode,
        }
    }

    /// Root every resolved path lives under.
    #[must_use]
    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Resolves an entry, nesting under its timestamp in all-timestamps mode.
    #[must_use]
    pub fn resolve(&self, entry: &CuratedEntry) -> LocalPath {
        match self.mode {
            CurationMode::LatestOnly => resolve_under(&self.output_root, &entry.source_url),
            CurationMode::AllTimestamps => {
                resolve_under(&self.output_root.join(&entry.timestamp), &entry.source_url)
            }
        }
    }

    /// Keeps one entry per local file.
    ///
    /// Distinct resource paths can resolve to the same file (`/` and
    /// `/index.html`, or URLs differing only by query string). Among entries
    /// sharing a file the latest timestamp wins; on equal timestamps the entry
    /// with the greater resource path wins. The result is sorted by resource
    /// path.
    #[must_use]
    pub fn collapse_collisions<I>(&self, entries: I) -> Vec<CuratedEntry>
    where
        I: IntoIterator<Item = CuratedEntry>,
    {
        let mut ordered: Vec<CuratedEntry> = entries.into_iter().collect();
        ordered.sort_by(|a, b| a.resource_path.cmp(&b.resource_path));

        let mut by_file: HashMap<PathBuf, CuratedEntry> = HashMap::with_capacity(ordered.len());
        for entry in ordered {
            let file = self.resolve(&entry).path();
            match by_file.get(&file) {
                Some(existing) if existing.timestamp > entry.timestamp => {
                    debug!(
                        dropped = %entry.source_url,
                        kept = %existing.source_url,
                        path = %file.display(),
                        "local path collision"
                    );
                }
                Some(existing) => {
                    debug!(
                        dropped = %existing.source_url,
                        kept = %entry.source_url,
                        path = %file.display(),
                        "local path collision"
                    );
                    by_file.insert(file, entry);
                }
                None => {
                    by_file.insert(file, entry);
                }
            }
        }

        let mut kept: Vec<CuratedEntry> = by_file.into_values().collect();
        kept.sort_by(|a, b| {
            a.resource_path
                .cmp(&b.resource_path)
                .then_with(|| a.timestamp.cmp(&b.timestamp))
        });
        kept
    }

    /// Resolves a bare source URL as in latest-only mode.
    #[must_use]
    pub fn resolve_url(&self, source_url: &str) -> LocalPath {
        resolve_under(&self.output_root, source_url)
    }
}

fn resolve_under(root: &Path, source_url: &str) -> LocalPath {
    let without_fragment = source_url.split('#').next().unwrap_or_default();
    let without_query = without_fragment.split('?').next().unwrap_or_default();
    let without_scheme = without_query
        .split_once("://")
        .map_or(without_query, |(_, rest)| rest);
    let url_path = without_scheme.split_once('/').map_or("", |(_, path)| path);

    let mut segments: Vec<&str> = url_path.split('/').collect();
    let last = segments.pop().unwrap_or_default();

    let directory = segments
        .into_iter()
        .filter(|segment| is_safe_segment(segment))
        .fold(root.to_path_buf(), |dir, segment| dir.join(segment));

    let file_name = if is_safe_segment(last) {
        last.to_string()
    } else {
        INDEX_FILE_NAME.to_string()
    };

    LocalPath {
        directory,
        file_name,
    }
}

/// Empty, `.` and `..` segments never become path components.
fn is_safe_segment(segment: &str) -> bool {
    !matches!(segment, "" | "." | "..")
}
