//! Error types for snapshot index queries.

use thiserror::Error;

/// Errors that can occur while listing snapshots from the archive index.
///
/// Every variant names the query that failed (`exact query for …` or
/// `wildcard page N for …`) so a failed listing can be traced to one request.
#[derive(Debug, Error)]
pub enum IndexError {
    /// The HTTP client could not be constructed.
    #[error("failed to build index HTTP client: {source}")]
    Client {
        /// The underlying builder error.
        #[source]
        source: reqwest::Error,
    },

    /// Network-level failure (DNS, connection refused, TLS, truncated body).
    #[error("network error on {query}: {source}")]
    Network {
        /// Description of the failed query.
        query: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// The query exceeded its configured timeout.
    #[error("timeout on {query}")]
    Timeout {
        /// Description of the failed query.
        query: String,
    },

    /// The index answered with a non-success status.
    #[error("HTTP {status} on {query}")]
    HttpStatus {
        /// Description of the failed query.
        query: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The response body is not the expected JSON array of rows.
    #[error("unparseable response on {query}: {detail}")]
    Parse {
        /// Description of the failed query.
        query: String,
        /// Parser message.
        detail: String,
    },

    /// A row does not carry the requested timestamp and original URL fields.
    #[error("unexpected row {row} on {query}: {detail}")]
    UnexpectedShape {
        /// Description of the failed query.
        query: String,
        /// Zero-based row index within the response.
        row: usize,
        /// What was wrong with the row.
        detail: String,
    },
}

impl IndexError {
    /// Creates a network error, promoting timeouts to [`IndexError::Timeout`].
    pub fn network(query: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout {
                query: query.into(),
            }
        } else {
            Self::Network {
                query: query.into(),
                source,
            }
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(query: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            query: query.into(),
            status,
        }
    }

    /// Creates a parse error.
    pub fn parse(query: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Parse {
            query: query.into(),
            detail: detail.into(),
        }
    }

    /// Creates a row shape error.
    pub fn unexpected_shape(query: impl Into<String>, row: usize, detail: impl Into<String>) -> Self {
        Self::UnexpectedShape {
            query: query.into(),
            row,
            detail: detail.into(),
        }
    }
}
