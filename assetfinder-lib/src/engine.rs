//! Main discovery engine implementation.
//!
//! This module provides the `DiscoveryEngine`, which runs a `DomainWorker`
//! for every input domain at once, merges their output into a single stream
//! and removes duplicates.

use crate::concurrent::{receiver_stream, RateLimiter};
use crate::error::AssetFinderError;
use crate::logging::LogSink;
use crate::sources::{build_http_client, SourceQuery};
use crate::types::{DiscoveryConfig, HostnameStream};
use crate::utils::dedup_preserving_order;
use crate::worker::DomainWorker;
use futures_util::future;
use futures_util::StreamExt;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio::time::Instant;
use tracing::instrument::WithSubscriber;
use tracing::{debug, info, Dispatch};

/// Discovers hostnames related to a set of domains.
///
/// The engine owns the registered sources and the run configuration. Every
/// call to [`DiscoveryEngine::discover`] starts with a fresh rate limiter
/// that all domains of that call share, so each source is called at most
/// once per interval no matter how many domains are being searched.
///
/// # Example
///
/// ```rust,no_run
/// use assetfinder_lib::{DiscoveryConfig, DiscoveryEngine};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = DiscoveryConfig::default().with_subs_only(true);
///     let engine = DiscoveryEngine::with_config(config)?;
///
///     for host in engine.discover(&["example.com"]).await? {
///         println!("{}", host);
///     }
///     Ok(())
/// }
/// ```
pub struct DiscoveryEngine {
    /// Configuration settings for this engine instance
    config: DiscoveryConfig,
    /// Registered sources, shared with every worker
    sources: Arc<[Arc<dyn SourceQuery>]>,
}

impl DiscoveryEngine {
    /// Create an engine with the default configuration and built-in sources.
    ///
    /// # Errors
    ///
    /// Returns `AssetFinderError::Setup` if the HTTP client cannot be built.
    pub fn new() -> Result<Self, AssetFinderError> {
        Self::with_config(DiscoveryConfig::default())
    }

    /// Create an engine querying the built-in sources listed in `config`.
    ///
    /// All sources share one HTTP client.
    pub fn with_config(config: DiscoveryConfig) -> Result<Self, AssetFinderError> {
        let client = build_http_client(config.http_timeout)?;
        let sources = config
            .sources
            .iter()
            .map(|source| source.build(&client, &config.credentials))
            .collect::<Vec<_>>();

        Ok(Self::with_sources(config, sources))
    }

    /// Create an engine over custom source implementations.
    ///
    /// `config.sources` and `config.http_timeout` are ignored; everything
    /// else applies as usual.
    pub fn with_sources(config: DiscoveryConfig, sources: Vec<Arc<dyn SourceQuery>>) -> Self {
        Self {
            config,
            sources: sources.into(),
        }
    }

    /// The configuration this engine runs with.
    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// The registered sources, in registration order.
    pub fn sources(&self) -> &[Arc<dyn SourceQuery>] {
        &self.sources
    }

    /// Names of the registered sources.
    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|source| source.name()).collect()
    }

    /// Discover every hostname related to `domains`.
    ///
    /// All domains are searched concurrently and all sources are queried
    /// concurrently for each domain. The returned list holds no duplicates;
    /// its order is the order hostnames arrived in and carries no meaning.
    ///
    /// A failing source is logged and skipped; it never fails the call. An
    /// empty `domains` slice returns an empty list without querying anything.
    ///
    /// # Errors
    ///
    /// Returns `AssetFinderError::Setup` if the configured log file cannot
    /// be prepared. Nothing is queried in that case. Without
    /// `config.log_file` records go to the ambient subscriber and this call
    /// cannot fail.
    pub async fn discover<S: AsRef<str>>(
        &self,
        domains: &[S],
    ) -> Result<Vec<String>, AssetFinderError> {
        let dispatch = self.log_dispatch()?;

        if domains.is_empty() {
            return Ok(Vec::new());
        }

        let started = Instant::now();
        let hosts: Vec<String> = self
            .merge(domains, &dispatch)
            .collect()
            .with_subscriber(dispatch.clone())
            .await;
        let hosts = dedup_preserving_order(hosts);

        tracing::dispatcher::with_default(&dispatch, || {
            info!(
                domains = domains.len(),
                sources = self.sources.len(),
                hostnames = hosts.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "discovery finished"
            );
        });

        Ok(hosts)
    }

    /// Like [`DiscoveryEngine::discover`], but yield hostnames as they arrive.
    ///
    /// Duplicates are dropped on the fly. Lookups start immediately, before
    /// the stream is first polled.
    ///
    /// # Errors
    ///
    /// Returns `AssetFinderError::Setup` if the configured log file cannot
    /// be prepared. Only possible when `config.log_file` is set.
    pub fn discover_stream<S: AsRef<str>>(
        &self,
        domains: &[S],
    ) -> Result<HostnameStream, AssetFinderError> {
        let dispatch = self.log_dispatch()?;

        let mut seen = HashSet::new();
        let unique = self
            .merge(domains, &dispatch)
            .filter(move |host| future::ready(seen.insert(host.clone())));

        Ok(Box::pin(unique))
    }

    fn log_dispatch(&self) -> Result<Dispatch, AssetFinderError> {
        LogSink::from_path(self.config.log_file.as_deref()).init()
    }

    /// Start one worker per domain and fan their streams into one.
    fn merge<S: AsRef<str>>(&self, domains: &[S], dispatch: &Dispatch) -> HostnameStream {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = self.worker(dispatch);

        for domain in domains {
            let domain = domain.as_ref();
            let mut hosts = worker.discover(domain);
            let tx = tx.clone();

            tracing::dispatcher::with_default(dispatch, || {
                debug!(domain = %domain, sources = worker.source_count(), "domain lookup started");
            });

            let forward = async move {
                while let Some(host) = hosts.next().await {
                    if tx.send(host).is_err() {
                        break;
                    }
                }
            };
            tokio::spawn(forward.with_subscriber(dispatch.clone()));
        }

        drop(tx);
        receiver_stream(rx)
    }

    /// A worker sharing a fresh rate limiter and in-flight cap.
    fn worker(&self, dispatch: &Dispatch) -> DomainWorker {
        let limiter = Arc::new(RateLimiter::new(self.config.rate_limit_interval));
        let mut worker = DomainWorker::new(Arc::clone(&self.sources), limiter, self.config.subs_only)
            .with_dispatch(dispatch.clone());

        if let Some(max_in_flight) = self.config.max_in_flight {
            worker = worker.with_in_flight(Arc::new(Semaphore::new(max_in_flight)));
        }
        if let Some(timeout) = self.config.source_timeout {
            worker = worker.with_source_timeout(timeout);
        }

        worker
    }
}
