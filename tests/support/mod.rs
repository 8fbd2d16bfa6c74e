//! Shared helpers for integration tests: a mock archive served by wiremock.

#![allow(dead_code)]

use std::path::Path;

use wayback_mirror_core::{ArchiveEndpoints, EngineConfig, EngineConfigBuilder};
use wiremock::matchers::{method, path, path_regex, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Path the mock archive serves the snapshot index on.
pub const INDEX_PATH: &str = "/cdx/search/xd";

/// Renders index rows the way the archive does, header row first.
pub fn cdx_body(rows: &[(&str, &str)]) -> String {
    let mut body = vec![vec!["timestamp".to_string(), "original".to_string()]];
    body.extend(
        rows.iter()
            .map(|(timestamp, url)| vec![(*timestamp).to_string(), (*url).to_string()]),
    );
    serde_json::to_string(&body).unwrap()
}

/// Serves `rows` for the exact (unpaged) query.
pub async fn mount_exact(server: &MockServer, rows: &[(&str, &str)]) {
    Mock::given(method("GET"))
        .and(path(INDEX_PATH))
        .and(query_param_is_missing("page"))
        .respond_with(ResponseTemplate::new(200).set_body_string(cdx_body(rows)))
        .expect(1)
        .mount(server)
        .await;
}

/// Serves `rows` for wildcard page `page`, expecting exactly one request for it.
pub async fn mount_page(server: &MockServer, page: u32, rows: &[(&str, &str)]) {
    let body = if rows.is_empty() {
        String::new()
    } else {
        cdx_body(rows)
    };
    Mock::given(method("GET"))
        .and(path(INDEX_PATH))
        .and(query_param("page", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(1)
        .mount(server)
        .await;
}

/// Serves every capture under `/web/` with a body naming its request path.
pub async fn mount_any_content(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path_regex(r"^/web/\d+id_/"))
        .respond_with(|request: &wiremock::Request| {
            ResponseTemplate::new(200).set_body_string(format!("content of {}", request.url.path()))
        })
        .mount(server)
        .await;
}

/// Request path of a capture's raw content on the mock archive.
pub fn content_path(timestamp: &str, original_url: &str) -> String {
    format!("/web/{timestamp}id_/{original_url}")
}

/// Builder pointed at the mock archive, writing under `output`.
pub fn config_builder(server: &MockServer, site: &str, output: &Path) -> EngineConfigBuilder {
    EngineConfig::builder(site)
        .endpoints(ArchiveEndpoints::for_host(&server.uri()).unwrap())
        .output_dir(output)
}
