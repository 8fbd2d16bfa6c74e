//! HTTP client for the archive's CDX snapshot index.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

use super::record::parse_rows;
use super::{IndexError, IndexQuery, SnapshotIndex, SnapshotRecord};
use crate::config::EngineConfig;
use crate::http_client::{build_http_client, with_timeout};
use crate::user_agent;

/// Fields requested from the index, in row order.
const FIELDS: &str = "timestamp,original";

/// Status constraint applied unless all statuses are requested.
const SUCCESS_STATUS_FILTER: &str = "statuscode:200";

/// Snapshot index client speaking the CDX query protocol.
///
/// Every query asks for JSON output limited to timestamp and original URL,
/// with digest collapsing. The status filter and time bounds come from the
/// run configuration and apply to every query this client issues.
#[derive(Debug, Clone)]
pub struct CdxClient {
    client: Client,
    index_url: Url,
    include_all_statuses: bool,
    from_timestamp: Option<String>,
    to_timestamp: Option<String>,
    timeout: Option<Duration>,
}

impl CdxClient {
    /// Creates a client for the index endpoint and query options in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Client`] if the HTTP client cannot be built or
    /// the configured endpoint is not a URL.
    pub fn from_config(config: &EngineConfig) -> Result<Self, IndexError> {
        let client = build_http_client(user_agent::default_index_user_agent())
            .map_err(|source| IndexError::Client { source })?;
        let index_url = Url::parse(config.endpoints().index_url()).map_err(|e| {
            IndexError::parse(config.endpoints().index_url(), format!("invalid endpoint: {e}"))
        })?;
        Ok(Self {
            client,
            index_url,
            include_all_statuses: config.include_all_statuses(),
            from_timestamp: config.from_timestamp().map(str::to_string),
            to_timestamp: config.to_timestamp().map(str::to_string),
            timeout: config.index_timeout(),
        })
    }

    /// Full request URL for one query.
    pub(crate) fn request_url(&self, query: &IndexQuery) -> Url {
        let mut url = self.index_url.clone();
        url.query_pairs_mut()
            .extend_pairs(self.params(query).iter().map(|(k, v)| (*k, v.as_str())));
        url
    }

    /// Query-string parameters for one query.
    pub(crate) fn params(&self, query: &IndexQuery) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("output", "json".to_string()),
            ("url", query.url.clone()),
            ("fl", FIELDS.to_string()),
            ("collapse", "digest".to_string()),
            ("gzip", "false".to_string()),
        ];
        if !self.include_all_statuses {
            params.push(("filter", SUCCESS_STATUS_FILTER.to_string()));
        }
        if let Some(from) = &self.from_timestamp {
            params.push(("from", from.clone()));
        }
        if let Some(to) = &self.to_timestamp {
            params.push(("to", to.clone()));
        }
        if let Some(page) = query.page() {
            params.push(("page", page.to_string()));
        }
        params
    }
}

#[async_trait]
impl SnapshotIndex for CdxClient {
    #[instrument(skip(self, query), fields(query = %query))]
    async fn fetch(&self, query: &IndexQuery) -> Result<Vec<SnapshotRecord>, IndexError> {
        let description = query.to_string();
        let request = self.client.get(self.request_url(query));

        let response = with_timeout(request, self.timeout)
            .send()
            .await
            .map_err(|e| IndexError::network(description.as_str(), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(IndexError::http_status(description, status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| IndexError::network(description.as_str(), e))?;
        let records = parse_rows(&body, &description)?;
        debug!(records = records.len(), "index query complete");
        Ok(records)
    }
}
