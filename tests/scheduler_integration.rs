//! Tests for `RetrievalScheduler` driven directly, without listing or curation.

use std::time::Duration;

use tempfile::TempDir;
use wayback_mirror_core::download::{HttpClient, SchedulerError};
use wayback_mirror_core::{
    ArchiveEndpoints, CuratedEntry, CurationMode, FailurePolicy, PathResolver, ResourcePath,
    RetrievalScheduler,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod support;
use support::content_path;

const TIMESTAMP: &str = "20210101000000";

fn entry(url: &str) -> CuratedEntry {
    CuratedEntry {
        resource_path: ResourcePath::from_url(url).unwrap(),
        source_url: url.to_string(),
        timestamp: TIMESTAMP.to_string(),
    }
}

fn scheduler(
    server: &MockServer,
    out: &TempDir,
    workers: usize,
    policy: FailurePolicy,
) -> RetrievalScheduler {
    RetrievalScheduler::new(
        workers,
        policy,
        HttpClient::new(None).unwrap(),
        PathResolver::new(out.path(), CurationMode::LatestOnly),
        ArchiveEndpoints::for_host(&server.uri()).unwrap(),
    )
}

#[tokio::test]
async fn test_retrieve_all_writes_every_entry() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();
    support::mount_any_content(&server).await;

    let outcomes = scheduler(&server, &out, 2, FailurePolicy::Isolate)
        .retrieve_all(vec![
            entry("http://example.com/a.html"),
            entry("http://example.com/css/b.css"),
        ])
        .await
        .unwrap();

    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.iter().all(|o| o.is_success()));
    assert!(out.path().join("a.html").is_file());
    assert!(out.path().join("css/b.css").is_file());
}

#[tokio::test]
async fn test_fail_fast_lets_in_flight_download_finish() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();
    let body = "complete body ".repeat(1024);

    Mock::given(method("GET"))
        .and(path(content_path(TIMESTAMP, "http://example.com/bad.html")))
        .respond_with(ResponseTemplate::new(500).set_delay(Duration::from_millis(100)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(content_path(TIMESTAMP, "http://example.com/slow.html")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body.clone())
                .set_delay(Duration::from_millis(600)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = scheduler(&server, &out, 2, FailurePolicy::FailFast)
        .retrieve_all(vec![
            entry("http://example.com/slow.html"),
            entry("http://example.com/bad.html"),
        ])
        .await
        .unwrap_err();

    match err {
        SchedulerError::EntryFailed { url, .. } => assert_eq!(url, "http://example.com/bad.html"),
        other => panic!("expected EntryFailed, got {other:?}"),
    }
    // The slow entry was already claimed when the other failed.
    assert_eq!(
        std::fs::read_to_string(out.path().join("slow.html")).unwrap(),
        body
    );
    assert!(!out.path().join("bad.html").exists());
}

#[tokio::test]
async fn test_fail_fast_claims_nothing_after_failure() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path(content_path(TIMESTAMP, "http://example.com/bad.html")))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(content_path(TIMESTAMP, "http://example.com/later.html")))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    // Claims pop from the back, so a single worker takes bad.html first.
    let err = scheduler(&server, &out, 1, FailurePolicy::FailFast)
        .retrieve_all(vec![
            entry("http://example.com/later.html"),
            entry("http://example.com/bad.html"),
        ])
        .await
        .unwrap_err();

    assert!(matches!(err, SchedulerError::EntryFailed { .. }), "got {err:?}");
    assert!(!out.path().join("later.html").exists());
}
