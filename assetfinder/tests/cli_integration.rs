// assetfinder/tests/cli_integration.rs

//! CLI tests that never reach the network

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::{tempdir, NamedTempFile};

fn assetfinder() -> Command {
    let mut cmd = Command::cargo_bin("assetfinder").unwrap();
    // Keep the developer's own config and env out of the tests
    cmd.env_remove("AF_CONFIG")
        .env_remove("AF_SOURCES")
        .env_remove("AF_LOG_FILE")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_lists_flags() {
    assetfinder()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--subs-only"))
        .stdout(predicate::str::contains("--sources"))
        .stdout(predicate::str::contains("--log-file"))
        .stdout(predicate::str::contains("--rate-limit"));
}

#[test]
fn test_list_sources() {
    assetfinder()
        .arg("--list-sources")
        .assert()
        .success()
        .stdout(predicate::str::contains("crtsh"))
        .stdout(predicate::str::contains("certspotter"))
        .stdout(predicate::str::contains("wayback"))
        .stdout(predicate::str::contains("VT_API_KEY"));
}

#[test]
fn test_unknown_source_is_rejected() {
    assetfinder()
        .args(["--sources", "crtsh,shodan", "example.com"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Error:"))
        .stderr(predicate::str::contains("shodan"));
}

#[test]
fn test_invalid_concurrency() {
    assetfinder()
        .args(["-c", "0", "example.com"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Concurrency must be between 1 and 100"));
}

#[test]
fn test_stream_and_json_conflict() {
    assetfinder()
        .args(["--stream", "--json", "example.com"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--stream"));
}

#[test]
fn test_missing_domains_file() {
    assetfinder()
        .args(["--file", "/no/such/domains.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("File not found"));
}

#[test]
fn test_comment_only_domains_file() {
    let file = NamedTempFile::new().unwrap();
    fs::write(file.path(), "# nothing here\n\n").unwrap();

    assetfinder()
        .args(["--file", file.path().to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No valid domains"));
}

#[test]
fn test_empty_stdin_prints_nothing() {
    assetfinder()
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_empty_stdin_json_is_empty_array() {
    assetfinder()
        .arg("--json")
        .write_stdin("\n# just a comment\n")
        .assert()
        .success()
        .stdout(predicate::str::diff("[]\n"));
}

#[test]
fn test_bad_config_file() {
    let file = NamedTempFile::new().unwrap();
    fs::write(file.path(), "[defaults]\nconcurrency = 500\n").unwrap();

    assetfinder()
        .args(["--config", file.path().to_str().unwrap()])
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load config file"));
}

#[test]
fn test_unusable_log_file_fails_before_discovery() {
    let blocker = NamedTempFile::new().unwrap();
    let log_path = blocker.path().join("assetfinder.log");

    assetfinder()
        .arg(format!("--log-file={}", log_path.display()))
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Setup error"));
}

#[test]
fn test_log_file_is_created() {
    let dir = tempdir().unwrap();
    let log_path = dir.path().join("logs").join("run.log");

    assetfinder()
        .arg(format!("--log-file={}", log_path.display()))
        .write_stdin("")
        .assert()
        .success();

    assert!(log_path.exists());
}
