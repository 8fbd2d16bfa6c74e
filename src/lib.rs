//! Wayback Mirror Core Library
//!
//! This library rebuilds a point-in-time mirror of a website from the
//! Internet Archive's snapshot index.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`config`] - Immutable run configuration and its validation
//! - [`filter`] - Only/exclude URL predicates
//! - [`index`] - Snapshot index client and page-by-page listing
//! - [`curate`] - Reduction of snapshots to one capture per resource
//! - [`download`] - Path resolution, raw capture retrieval and the worker pool
//! - [`progress`] - Progress notices emitted during a run
//! - [`mirror`] - Run orchestration tying the above together

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod curate;
pub mod download;
pub mod filter;
pub mod index;
pub mod mirror;
pub mod progress;

mod http_client;
mod user_agent;

// Re-export commonly used types
pub use config::{
    ArchiveEndpoints, ConfigError, DEFAULT_MAXIMUM_PAGES, DEFAULT_WORKERS, EngineConfig,
    EngineConfigBuilder, FailurePolicy,
};
pub use curate::{CuratedEntry, CuratedSet, CurationMode, Curator, ResourcePath};
pub use download::{DownloadError, DownloadOutcome, OutcomeStatus, PathResolver, RetrievalScheduler};
pub use filter::{FilterSet, UrlFilter};
pub use index::{CdxClient, IndexError, IndexQuery, SnapshotIndex, SnapshotRecord};
pub use mirror::{MirrorEngine, MirrorError, RunHandle, RunReport};
pub use progress::{ProgressEvent, ProgressStream};
