//! Retrieval of curated captures into the local mirror.
//!
//! # Components
//!
//! - [`HttpClient`] streams one raw capture to a file
//! - [`PathResolver`] maps an entry's original URL onto the output root
//! - [`RetrievalScheduler`] drains the curated set across a worker pool
//! - [`DownloadOutcome`] records what happened to each entry
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use wayback_mirror_core::download::HttpClient;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new(None)?;
//! let fetched = client
//!     .fetch_to_file(
//!         "https://web.archive.org/web/20210101000000id_/http://example.com/",
//!         Path::new("./index.html"),
//!     )
//!     .await?;
//! println!("wrote {} bytes", fetched.bytes_written);
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod outcome;
mod path;
mod scheduler;

pub use client::{FetchResult, HttpClient};
pub use error::DownloadError;
pub use outcome::{DownloadOutcome, OutcomeStatus};
pub use path::{INDEX_FILE_NAME, LocalPath, PathResolver};
pub use scheduler::{RetrievalScheduler, SchedulerError};
