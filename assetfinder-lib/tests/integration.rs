// assetfinder-lib/tests/integration.rs

//! Integration tests for the discovery engine, run against in-memory sources

use assetfinder_lib::{
    is_in_scope, DiscoveryConfig, DiscoveryEngine, SourceCredentials, SourceError, SourceQuery,
};
use async_trait::async_trait;
use futures_util::StreamExt;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::{tempdir, NamedTempFile};
use tokio_test::{assert_err, assert_ok};

/// A source answering from a fixed table and recording every call
struct TableSource {
    name: &'static str,
    table: HashMap<String, Vec<String>>,
    calls: Mutex<Vec<String>>,
}

impl TableSource {
    fn new(name: &'static str, table: Vec<(&str, Vec<&str>)>) -> Arc<Self> {
        Arc::new(Self {
            name,
            table: table
                .into_iter()
                .map(|(domain, hosts)| {
                    (
                        domain.to_string(),
                        hosts.iter().map(|h| h.to_string()).collect(),
                    )
                })
                .collect(),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<String> {
        let mut calls = self.calls.lock().unwrap().clone();
        calls.sort();
        calls
    }
}

#[async_trait]
impl SourceQuery for TableSource {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn query(&self, domain: &str) -> Result<Vec<String>, SourceError> {
        self.calls.lock().unwrap().push(domain.to_string());
        Ok(self.table.get(domain).cloned().unwrap_or_default())
    }
}

/// A source that always fails
struct FailingSource {
    calls: AtomicUsize,
}

#[async_trait]
impl SourceQuery for FailingSource {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn query(&self, _domain: &str) -> Result<Vec<String>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(SourceError::network("connection refused"))
    }
}

/// A source that never answers within a reasonable time
struct HangingSource;

#[async_trait]
impl SourceQuery for HangingSource {
    fn name(&self) -> &'static str {
        "hanging"
    }

    async fn query(&self, _domain: &str) -> Result<Vec<String>, SourceError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(vec!["never.example.com".to_string()])
    }
}

/// A source that holds its call open for a while on one domain
struct StallingSource {
    domain: &'static str,
    stall: Duration,
}

#[async_trait]
impl SourceQuery for StallingSource {
    fn name(&self) -> &'static str {
        "stalling"
    }

    async fn query(&self, domain: &str) -> Result<Vec<String>, SourceError> {
        if domain == self.domain {
            tokio::time::sleep(self.stall).await;
        }
        Ok(Vec::new())
    }
}

/// A source recording when each call actually started
#[derive(Default)]
struct TimedSource {
    started: Mutex<Vec<tokio::time::Instant>>,
}

#[async_trait]
impl SourceQuery for TimedSource {
    fn name(&self) -> &'static str {
        "timed"
    }

    async fn query(&self, _domain: &str) -> Result<Vec<String>, SourceError> {
        self.started.lock().unwrap().push(tokio::time::Instant::now());
        Ok(Vec::new())
    }
}

fn fast_config() -> DiscoveryConfig {
    DiscoveryConfig::default()
        .with_rate_limit(Duration::from_millis(1))
        .with_credentials(SourceCredentials::default())
}

fn as_set(hosts: Vec<String>) -> HashSet<String> {
    hosts.into_iter().collect()
}

fn domains(list: &[&str]) -> Vec<String> {
    list.iter().map(|d| d.to_string()).collect()
}

#[tokio::test]
async fn test_two_domains_two_sources() {
    let first = TableSource::new("first", vec![("a.com", vec!["x.a.com"]), ("b.com", vec![])]);
    let second = TableSource::new(
        "second",
        vec![("a.com", vec!["*.y.a.com"]), ("b.com", vec![])],
    );
    let engine = DiscoveryEngine::with_sources(fast_config(), vec![first, second]);

    let hosts = assert_ok!(engine.discover(&domains(&["a.com", "b.com"])).await);

    assert_eq!(as_set(hosts), as_set(domains(&["x.a.com", "y.a.com"])));
}

#[tokio::test]
async fn test_failing_source_does_not_abort_discovery() {
    let failing = Arc::new(FailingSource {
        calls: AtomicUsize::new(0),
    });
    let table = TableSource::new("table", vec![("example.com", vec!["www.example.com"])]);
    let engine = DiscoveryEngine::with_sources(fast_config(), vec![failing.clone(), table]);

    let hosts = assert_ok!(engine.discover(&["example.com"]).await);

    assert_eq!(hosts, vec!["www.example.com"]);
    assert_eq!(failing.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_every_source_queried_once_per_domain() {
    let first = TableSource::new("first", vec![]);
    let second = TableSource::new("second", vec![]);
    let engine = DiscoveryEngine::with_sources(fast_config(), vec![first.clone(), second.clone()]);

    assert_ok!(engine.discover(&["One.com", "two.com", "three.com"]).await);

    let expected = domains(&["one.com", "three.com", "two.com"]);
    assert_eq!(first.calls(), expected);
    assert_eq!(second.calls(), expected);
}

#[tokio::test]
async fn test_empty_domain_list_queries_nothing() {
    let source = TableSource::new("table", vec![]);
    let engine = DiscoveryEngine::with_sources(fast_config(), vec![source.clone()]);

    let hosts = assert_ok!(engine.discover(&Vec::<String>::new()).await);

    assert!(hosts.is_empty());
    assert!(source.calls().is_empty());
}

#[tokio::test]
async fn test_result_has_no_duplicates() {
    let first = TableSource::new(
        "first",
        vec![("example.com", vec!["www.example.com", "WWW.EXAMPLE.COM", "api.example.com"])],
    );
    let second = TableSource::new(
        "second",
        vec![("example.com", vec!["*.www.example.com", "%api.example.com", ".mail.example.com"])],
    );
    let engine = DiscoveryEngine::with_sources(fast_config(), vec![first, second]);

    let hosts = assert_ok!(engine.discover(&["example.com"]).await);

    let unique = as_set(hosts.clone());
    assert_eq!(hosts.len(), unique.len());
    assert_eq!(
        unique,
        as_set(domains(&["www.example.com", "api.example.com", "mail.example.com"]))
    );
}

#[tokio::test]
async fn test_subs_only_keeps_only_in_scope_hosts() {
    let source = TableSource::new(
        "table",
        vec![
            (
                "example.com",
                vec![
                    "example.com",
                    "a.example.com",
                    "*.b.example.com",
                    "badexample.com",
                    "example.com.attacker.net",
                    "cdn.other.org",
                ],
            ),
            ("other.org", vec!["cdn.other.org", "example.com"]),
        ],
    );
    let engine = DiscoveryEngine::with_sources(fast_config().with_subs_only(true), vec![source]);

    let hosts = assert_ok!(engine.discover(&["example.com", "other.org"]).await);

    for host in &hosts {
        assert!(
            is_in_scope(host, "example.com") || is_in_scope(host, "other.org"),
            "{} is out of scope",
            host
        );
    }
    assert_eq!(
        as_set(hosts),
        as_set(domains(&[
            "example.com",
            "a.example.com",
            "b.example.com",
            "cdn.other.org"
        ]))
    );
}

#[tokio::test]
async fn test_subs_only_disabled_keeps_everything() {
    let source = TableSource::new("table", vec![("example.com", vec!["cdn.other.org"])]);
    let engine = DiscoveryEngine::with_sources(fast_config(), vec![source]);

    let hosts = assert_ok!(engine.discover(&["example.com"]).await);

    assert_eq!(hosts, vec!["cdn.other.org"]);
}

#[tokio::test]
async fn test_stream_yields_unique_hosts() {
    let first = TableSource::new(
        "first",
        vec![("example.com", vec!["a.example.com", "b.example.com"])],
    );
    let second = TableSource::new("second", vec![("example.com", vec!["*.a.example.com"])]);
    let engine = DiscoveryEngine::with_sources(fast_config(), vec![first, second]);

    let stream = assert_ok!(engine.discover_stream(&["example.com"]));
    let hosts: Vec<String> = stream.collect().await;

    assert_eq!(hosts.len(), 2);
    assert_eq!(
        as_set(hosts),
        as_set(domains(&["a.example.com", "b.example.com"]))
    );
}

#[tokio::test(start_paused = true)]
async fn test_source_timeout_is_opt_in_and_isolated() {
    let table = TableSource::new("table", vec![("example.com", vec!["www.example.com"])]);
    let config = fast_config().with_source_timeout(Duration::from_secs(10));
    let engine = DiscoveryEngine::with_sources(config, vec![Arc::new(HangingSource), table]);

    let hosts = assert_ok!(engine.discover(&["example.com"]).await);

    assert_eq!(hosts, vec!["www.example.com"]);
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_is_shared_across_domains() {
    let source = TableSource::new("table", vec![]);
    let config = fast_config().with_rate_limit(Duration::from_secs(1));
    let engine = DiscoveryEngine::with_sources(config, vec![source.clone()]);
    let started = tokio::time::Instant::now();

    assert_ok!(engine.discover(&["a.com", "b.com", "c.com"]).await);

    // Three calls to one source: released at 0s, 1s and 2s.
    assert!(started.elapsed() >= Duration::from_secs(2));
    assert_eq!(source.calls().len(), 3);
}

#[tokio::test]
async fn test_in_flight_cap_completes() {
    let sources: Vec<Arc<dyn SourceQuery>> = (0..5)
        .map(|_| -> Arc<dyn SourceQuery> {
            TableSource::new("table", vec![("example.com", vec!["www.example.com"])])
        })
        .collect();
    let engine = DiscoveryEngine::with_sources(fast_config().with_max_in_flight(2), sources);

    let hosts = assert_ok!(engine.discover(&["example.com"]).await);

    assert_eq!(hosts, vec!["www.example.com"]);
}

#[tokio::test(start_paused = true)]
async fn test_in_flight_cap_keeps_same_source_calls_spaced() {
    let stalling = Arc::new(StallingSource {
        domain: "a.com",
        stall: Duration::from_secs(5),
    });
    let timed = Arc::new(TimedSource::default());
    let config = fast_config()
        .with_rate_limit(Duration::from_secs(1))
        .with_max_in_flight(1);
    let sources: Vec<Arc<dyn SourceQuery>> = vec![stalling, timed.clone()];
    let engine = DiscoveryEngine::with_sources(config, sources);

    assert_ok!(engine.discover(&["a.com", "b.com"]).await);

    let started = timed.started.lock().unwrap().clone();
    assert_eq!(started.len(), 2);
    let gap = started[1].duration_since(started[0]);
    assert!(gap >= Duration::from_secs(1), "calls were {:?} apart", gap);
}

#[tokio::test]
async fn test_log_file_records_source_failures() {
    let dir = tempdir().unwrap();
    let log_path = dir.path().join("logs").join("assetfinder.log");
    let failing = Arc::new(FailingSource {
        calls: AtomicUsize::new(0),
    });
    let config = fast_config().with_log_file(&log_path);
    let engine = DiscoveryEngine::with_sources(config, vec![failing]);

    let hosts = assert_ok!(engine.discover(&["example.com"]).await);
    assert!(hosts.is_empty());

    let written = fs::read_to_string(&log_path).unwrap();
    assert!(written.contains("source query failed"));
    assert!(written.contains("failing"));
    assert!(written.contains("example.com"));
    assert!(written.contains("connection refused"));
    assert!(written.contains("retryable=true"));
}

#[tokio::test]
async fn test_unusable_log_file_is_a_setup_error() {
    let blocker = NamedTempFile::new().unwrap();
    let source = TableSource::new("table", vec![("example.com", vec!["www.example.com"])]);
    let config = fast_config().with_log_file(blocker.path().join("assetfinder.log"));
    let engine = DiscoveryEngine::with_sources(config, vec![source.clone()]);

    let err = assert_err!(engine.discover(&["example.com"]).await);

    assert!(err.is_setup());
    assert!(source.calls().is_empty());
    assert!(engine.discover_stream(&["example.com"]).is_err());
}
