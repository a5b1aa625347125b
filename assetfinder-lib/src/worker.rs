//! Per-domain discovery.
//!
//! A `DomainWorker` queries every registered source for one domain at the
//! same time and streams back the cleaned hostnames. Failing sources are
//! logged and skipped; the stream ends once the last source has answered.

use crate::concurrent::{receiver_stream, RateLimiter};
use crate::error::SourceError;
use crate::sources::SourceQuery;
use crate::types::HostnameStream;
use crate::utils::{clean_hostname, is_in_scope};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::sync::Semaphore;
use tracing::instrument::WithSubscriber;
use tracing::{debug, error, Dispatch};

/// Discovers hostnames for one domain across all registered sources.
///
/// Workers are cheap to clone; clones share the sources, the rate limiter
/// and the in-flight cap, which is how one limiter ends up governing every
/// domain of a run.
#[derive(Clone)]
pub struct DomainWorker {
    sources: Arc<[Arc<dyn SourceQuery>]>,
    limiter: Arc<RateLimiter>,
    subs_only: bool,
    in_flight: Option<Arc<Semaphore>>,
    source_timeout: Option<Duration>,
    dispatch: Dispatch,
}

impl DomainWorker {
    /// Create a worker over `sources`, rate limited by the shared `limiter`.
    ///
    /// Log records go to the subscriber that is current at construction time
    /// unless replaced with [`DomainWorker::with_dispatch`].
    pub fn new(
        sources: Arc<[Arc<dyn SourceQuery>]>,
        limiter: Arc<RateLimiter>,
        subs_only: bool,
    ) -> Self {
        Self {
            sources,
            limiter,
            subs_only,
            in_flight: None,
            source_timeout: None,
            dispatch: tracing::dispatcher::get_default(Dispatch::clone),
        }
    }

    /// Share a cap on concurrent source calls.
    pub fn with_in_flight(mut self, in_flight: Arc<Semaphore>) -> Self {
        self.in_flight = Some(in_flight);
        self
    }

    /// Give every source call a deadline.
    pub fn with_source_timeout(mut self, timeout: Duration) -> Self {
        self.source_timeout = Some(timeout);
        self
    }

    /// Log through `dispatch` in every task the worker spawns.
    pub fn with_dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = dispatch;
        self
    }

    /// Number of registered sources.
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Start querying every source for `domain` and stream the results.
    ///
    /// The domain is lowercased first. One task per source is spawned right
    /// away, so this must be called from inside a Tokio runtime. Hostnames
    /// arrive in completion order and may repeat across sources.
    pub fn discover(&self, domain: &str) -> HostnameStream {
        let domain = domain.to_lowercase();
        let (tx, rx) = mpsc::unbounded_channel();

        for source in self.sources.iter() {
            let task = self
                .clone()
                .run_source(Arc::clone(source), domain.clone(), tx.clone());
            tokio::spawn(task.with_subscriber(self.dispatch.clone()));
        }

        // The stream closes when the last source task drops its sender.
        drop(tx);
        receiver_stream(rx)
    }

    async fn run_source(
        self,
        source: Arc<dyn SourceQuery>,
        domain: String,
        tx: UnboundedSender<String>,
    ) {
        // The slot is reserved only once a permit is held, so nothing but the
        // limiter sits between a slot and its call.
        let _permit = match &self.in_flight {
            Some(in_flight) => in_flight.acquire().await.ok(),
            None => None,
        };
        self.limiter.block(source.name()).await;

        let names = match self.call(source.as_ref(), &domain).await {
            Ok(names) => names,
            Err(e) => {
                error!(
                    source = source.name(),
                    domain = %domain,
                    error = %e,
                    retryable = e.is_retryable(),
                    "source query failed"
                );
                return;
            }
        };

        debug!(source = source.name(), domain = %domain, count = names.len(), "source answered");

        for raw in names {
            let host = clean_hostname(&raw);
            if self.subs_only && !is_in_scope(&host, &domain) {
                continue;
            }
            if tx.send(host).is_err() {
                // Nobody is listening any more.
                return;
            }
        }
    }

    /// Run one source call under the optional deadline.
    async fn call(
        &self,
        source: &dyn SourceQuery,
        domain: &str,
    ) -> Result<Vec<String>, SourceError> {
        match self.source_timeout {
            Some(limit) => tokio::time::timeout(limit, source.query(domain))
                .await
                .map_err(|_| SourceError::timeout(limit))?,
            None => source.query(domain).await,
        }
    }
}
