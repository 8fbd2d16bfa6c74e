//! Snapshot index listing.
//!
//! This module enumerates every capture the archive holds for a target site.
//!
//! # Architecture
//!
//! - [`SnapshotIndex`] - Async trait for one index query (one page)
//! - [`CdxClient`] - HTTP implementation against the archive's CDX endpoint
//! - [`list_snapshots`] - Exact query followed by wildcard pagination
//! - [`SnapshotRecord`] - One listed (timestamp, original URL) pair
//!
//! Listing is all-or-nothing: the first failing query aborts the whole listing
//! with an [`IndexError`] naming that query.

mod client;
mod error;
mod record;

pub use client::CdxClient;
pub use error::IndexError;
pub use record::SnapshotRecord;

use std::fmt;

use async_trait::async_trait;
use tracing::{debug, info, instrument};

/// Which slice of the index a query asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryScope {
    /// The exact target URL, unpaged.
    Exact,
    /// Everything under the target, one zero-based page.
    Wildcard {
        /// Page index.
        page: u32,
    },
}

/// One request against the snapshot index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexQuery {
    /// URL pattern sent to the index (`example.com` or `example.com/*`).
    pub url: String,
    /// Exact or wildcard page.
    pub scope: QueryScope,
}

impl IndexQuery {
    /// Query for the exact target URL.
    #[must_use]
    pub fn exact(target_site: &str) -> Self {
        Self {
            url: target_site.to_string(),
            scope: QueryScope::Exact,
        }
    }

    /// Query for one page of everything under the target.
    #[must_use]
    pub fn wildcard(target_site: &str, page: u32) -> Self {
        Self {
            url: format!("{}/*", target_site.trim_end_matches('/')),
            scope: QueryScope::Wildcard { page },
        }
    }

    /// Page index, for wildcard queries.
    #[must_use]
    pub fn page(&self) -> Option<u32> {
        match self.scope {
            QueryScope::Exact => None,
            QueryScope::Wildcard { page } => Some(page),
        }
    }
}

impl fmt::Display for IndexQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.scope {
            QueryScope::Exact => write!(f, "exact query for {}", self.url),
            QueryScope::Wildcard { page } => write!(f, "wildcard page {page} for {}", self.url),
        }
    }
}

/// A queryable snapshot catalog.
#[async_trait]
pub trait SnapshotIndex: Send + Sync {
    /// Runs one query, returning its records with any header row removed.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError`] on network, status, or decoding failure.
    async fn fetch(&self, query: &IndexQuery) -> Result<Vec<SnapshotRecord>, IndexError>;
}

/// Listing options taken from the run configuration.
#[derive(Debug, Clone, Copy)]
pub struct ListingOptions {
    /// Skip the wildcard scan.
    pub exact_url: bool,
    /// Upper bound on wildcard pages requested.
    pub maximum_pages: u32,
}

/// Lists every snapshot visible for `target_site`.
///
/// Issues the exact query, then (unless `exact_url`) wildcard pages from 0
/// until a page comes back empty or `maximum_pages` pages have been requested.
/// `on_page` is called after each successful query with its record count.
/// Duplicates across queries are kept.
///
/// # Errors
///
/// Returns the first [`IndexError`]; no partial listing is returned.
#[instrument(skip(index, on_page))]
pub async fn list_snapshots<F>(
    index: &dyn SnapshotIndex,
    target_site: &str,
    options: ListingOptions,
    mut on_page: F,
) -> Result<Vec<SnapshotRecord>, IndexError>
where
    F: FnMut(&IndexQuery, usize) + Send,
{
    let exact = IndexQuery::exact(target_site);
    let mut snapshots = index.fetch(&exact).await?;
    debug!(records = snapshots.len(), "exact query listed");
    on_page(&exact, snapshots.len());

    if !options.exact_url {
        for page in 0..options.maximum_pages {
            let query = IndexQuery::wildcard(target_site, page);
            let records = index.fetch(&query).await?;
            on_page(&query, records.len());
            if records.is_empty() {
                debug!(page, "empty page, stopping pagination");
                break;
            }
            debug!(page, records = records.len(), "wildcard page listed");
            snapshots.extend(records);
        }
    }

    info!(snapshots = snapshots.len(), "Found snapshots to consider");
    Ok(snapshots)
}
