//! HTTP client for raw capture retrieval.
//!
//! This module provides the `HttpClient` struct which streams one archived
//! capture's original bytes to a local file.

use std::path::Path;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, instrument};
use url::Url;

use super::error::DownloadError;
use crate::http_client::{build_http_client, with_timeout};
use crate::user_agent;

/// HTTP client for retrieving captures with streaming writes.
///
/// Created once per run and cloned into each worker so all retrievals share
/// one connection pool.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    timeout: Option<Duration>,
}

/// What a successful retrieval wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    /// Bytes written to disk.
    pub bytes_written: u64,
    /// Response status code.
    pub status: u16,
    /// Canonical reason phrase of the status (`OK`), or the code if unknown.
    pub status_text: String,
}

impl HttpClient {
    /// Creates a client; `timeout` bounds each whole retrieval when set.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Client`] if the HTTP client cannot be built.
    pub fn new(timeout: Option<Duration>) -> Result<Self, DownloadError> {
        let client = build_http_client(user_agent::default_retrieval_user_agent())
            .map_err(|source| DownloadError::Client { source })?;
        Ok(Self { client, timeout })
    }

    /// Retrieves `url` and writes the body to `file_path`, replacing any existing file.
    ///
    /// The parent directory must already exist. Nothing is written on a
    /// non-success status; a partially written file is removed if the body
    /// stream fails.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if:
    /// - The URL is invalid
    /// - The request fails (network error, timeout)
    /// - The server returns a non-success status
    /// - Writing to disk fails
    #[instrument(skip(self, file_path), fields(path = %file_path.display()))]
    pub async fn fetch_to_file(
        &self,
        url: &str,
        file_path: &Path,
    ) -> Result<FetchResult, DownloadError> {
        Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;

        let request = with_timeout(self.client.get(url), self.timeout);
        let response = request
            .send()
            .await
            .map_err(|e| DownloadError::network(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(url, status.as_u16()));
        }

        let mut file = File::create(file_path)
            .await
            .map_err(|e| DownloadError::io(file_path, e))?;

        let stream_result = stream_to_file(&mut file, response, url, file_path).await;
        drop(file);
        if stream_result.is_err() {
            debug!("cleaning up partial file after error");
            let _ = tokio::fs::remove_file(file_path).await;
        }
        let bytes_written = stream_result?;

        debug!(bytes = bytes_written, status = status.as_u16(), "capture written");

        Ok(FetchResult {
            bytes_written,
            status: status.as_u16(),
            status_text: status
                .canonical_reason()
                .map_or_else(|| status.as_u16().to_string(), str::to_string),
        })
    }
}

/// Streams response body to file, returning bytes written.
///
/// This is extracted to enable cleanup on error in the caller.
async fn stream_to_file(
    file: &mut File,
    response: reqwest::Response,
    url: &str,
    file_path: &Path,
) -> Result<u64, DownloadError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| DownloadError::network(url, e))?;

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::io(file_path, e))?;

        bytes_written += chunk.len() as u64;
    }

    // The capture only counts as durable once fully flushed.
    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(file_path, e))?;

    Ok(bytes_written)
}
