//! End-to-end CLI tests for the wayback-mirror binary.
//!
//! None of these reach the network: each case fails or exits during argument
//! or configuration validation.

use assert_cmd::Command;
use predicates::prelude::*;

fn wayback_mirror() -> Command {
    Command::cargo_bin("wayback-mirror").unwrap()
}

/// Test that --help displays usage information and exits with code 0.
#[test]
fn test_binary_help_displays_usage() {
    wayback_mirror()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Download an entire website"))
        .stdout(predicate::str::contains("--all-timestamps"));
}

/// Test that --version displays version and exits with code 0.
#[test]
fn test_binary_version_displays_version() {
    wayback_mirror()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("wayback-mirror"));
}

/// Test that the target site is required.
#[test]
fn test_binary_missing_site_fails() {
    wayback_mirror()
        .assert()
        .failure()
        .stderr(predicate::str::contains("<SITE>"));
}

/// Test that a malformed filter is rejected before any request is made.
#[test]
fn test_binary_invalid_filter_fails() {
    wayback_mirror()
        .args(["example.com", "--only", "(unclosed", "--list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid only filter"));
}

/// Test that a malformed timestamp is rejected.
#[test]
fn test_binary_invalid_timestamp_fails() {
    wayback_mirror()
        .args(["example.com", "--from", "2020-01-01", "--list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid from timestamp"));
}

/// Test that an inverted time window is rejected.
#[test]
fn test_binary_inverted_window_fails() {
    wayback_mirror()
        .args(["example.com", "-f", "2021", "-t", "2020", "--list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid time window"));
}

/// Test that concurrency outside 1-100 is rejected by argument parsing.
#[test]
fn test_binary_concurrency_out_of_range_fails() {
    wayback_mirror()
        .args(["example.com", "-c", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

/// Test that invalid flags cause non-zero exit.
#[test]
fn test_binary_invalid_flag_returns_error() {
    wayback_mirror()
        .args(["example.com", "--invalid-flag"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}
