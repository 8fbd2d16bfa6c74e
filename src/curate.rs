//! Curation: one chosen capture per resource.
//!
//! The archive typically lists many captures of the same resource. The
//! [`Curator`] folds the whole listing into a [`CuratedSet`] holding, per
//! [`ResourcePath`], the most recent capture that passes the filters.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use tracing::{debug, info};

use crate::filter::FilterSet;
use crate::index::SnapshotRecord;

/// Scheme/host-stripped, percent-decoded identity of a resource within a site.
///
/// `http://example.com/a%20b.html` and `https://www.example.com/a b.html`
/// share the path `a b.html`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ResourcePath(String);

impl ResourcePath {
    /// Derives the resource path of an original URL.
    ///
    /// Returns `None` for an empty URL or one with no `/` at all. Undecodable
    /// percent sequences are kept verbatim.
    #[must_use]
    pub fn from_url(original_url: &str) -> Option<Self> {
        if original_url.is_empty() || !original_url.contains('/') {
            return None;
        }
        let without_scheme = original_url
            .split_once("://")
            .map_or(original_url, |(_, rest)| rest);
        let raw = without_scheme.split_once('/').map_or("", |(_, path)| path);
        let decoded = urlencoding::decode(raw).map_or_else(
            |e| {
                debug!(path = %raw, error = %e, "percent-decoding failed, using raw path");
                raw.to_string()
            },
            std::borrow::Cow::into_owned,
        );
        Some(Self(decoded))
    }

    /// The path as a string (no leading slash).
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The capture chosen for one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CuratedEntry {
    /// Resource identity.
    #[serde(rename = "file_id")]
    pub resource_path: ResourcePath,
    /// Original URL of the chosen capture.
    #[serde(rename = "file_url")]
    pub source_url: String,
    /// Archive timestamp of the chosen capture.
    pub timestamp: String,
}

/// How many captures of a resource survive curation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CurationMode {
    /// Keep only the most recent eligible capture per resource.
    #[default]
    LatestOnly,
    /// Keep every eligible capture, one per (timestamp, resource).
    AllTimestamps,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CurationKey {
    path: ResourcePath,
    timestamp: Option<String>,
}

/// Result of curation: one entry per key, order insignificant.
#[derive(Debug, Clone, Default)]
pub struct CuratedSet {
    mode: CurationMode,
    entries: HashMap<CurationKey, CuratedEntry>,
}

impl CuratedSet {
    /// Number of curated entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing survived curation.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Mode the set was curated with.
    #[must_use]
    pub fn mode(&self) -> CurationMode {
        self.mode
    }

    /// The latest-only entry for a resource path.
    ///
    /// Always `None` for sets curated with [`CurationMode::AllTimestamps`].
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&CuratedEntry> {
        self.entries.get(&CurationKey {
            path: ResourcePath(path.to_string()),
            timestamp: None,
        })
    }

    /// Iterates entries in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = &CuratedEntry> {
        self.entries.values()
    }

    /// Entries sorted by resource path then timestamp.
    #[must_use]
    pub fn sorted(&self) -> Vec<&CuratedEntry> {
        let mut entries: Vec<_> = self.entries.values().collect();
        entries.sort_by(|a, b| {
            a.resource_path
                .cmp(&b.resource_path)
                .then_with(|| a.timestamp.cmp(&b.timestamp))
        });
        entries
    }

    /// Consumes the set, yielding its entries in arbitrary order.
    #[must_use]
    pub fn into_entries(self) -> Vec<CuratedEntry> {
        self.entries.into_values().collect()
    }
}

/// Folds snapshot listings into a [`CuratedSet`].
#[derive(Debug, Clone, Default)]
pub struct Curator {
    filters: FilterSet,
    mode: CurationMode,
}

impl Curator {
    /// Creates a curator applying `filters` in the given mode.
    #[must_use]
    pub fn new(filters: FilterSet, mode: CurationMode) -> Self {
        Self { filters, mode }
    }

    /// Curates a full listing in one pass.
    ///
    /// Records with no path or failing a filter are skipped. Otherwise the
    /// record replaces the current entry when the entry's timestamp is less
    /// than or equal to the record's, so equal timestamps go to the record
    /// seen last.
    pub fn curate<I>(&self, records: I) -> CuratedSet
    where
        I: IntoIterator<Item = SnapshotRecord>,
    {
        let mut entries: HashMap<CurationKey, CuratedEntry> = HashMap::new();
        let mut considered = 0usize;
        let mut filtered = 0usize;

        for record in records {
            considered += 1;
            let Some(path) = ResourcePath::from_url(&record.original_url) else {
                debug!(url = %record.original_url, "skipping record without path");
                continue;
            };
            if self.filters.matches_exclude(&record.original_url)
                || !self.filters.matches_only(&record.original_url)
            {
                filtered += 1;
                continue;
            }

            let key = CurationKey {
                path: path.clone(),
                timestamp: match self.mode {
                    CurationMode::LatestOnly => None,
                    CurationMode::AllTimestamps => Some(record.timestamp.clone()),
                },
            };
            let replace = entries
                .get(&key)
                .is_none_or(|existing| existing.timestamp <= record.timestamp);
            if replace {
                entries.insert(
                    key,
                    CuratedEntry {
                        resource_path: path,
                        source_url: record.original_url,
                        timestamp: record.timestamp,
                    },
                );
            }
        }

        info!(
            considered,
            filtered,
            curated = entries.len(),
            "curated snapshot listing"
        );

        CuratedSet {
            mode: self.mode,
            entries,
        }
    }
}
