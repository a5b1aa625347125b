//! Concurrent processing utilities for discovery.
//!
//! This module provides the per-source rate limiter shared by every lookup
//! task of a discovery run, and the channel-to-stream adapter used at each
//! fan-in point.

use crate::types::HostnameStream;
use futures_util::stream;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::Instant;

/// Enforces a minimum interval between calls that share a key.
///
/// For every key the limiter remembers the earliest time the next caller may
/// go. A caller reserves that slot under the lock, pushes the stored time one
/// interval further, releases the lock and only then sleeps until its slot.
/// Two callers therefore never share a window, they are released in arrival
/// order, and callers with different keys never wait on each other.
///
/// # Example
///
/// ```rust
/// use assetfinder_lib::RateLimiter;
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let limiter = RateLimiter::new(Duration::from_millis(10));
/// limiter.block("crtsh").await; // returns immediately
/// limiter.block("crtsh").await; // returns 10ms after the first call
/// limiter.block("urlscan").await; // unaffected by "crtsh"
/// # }
/// ```
pub struct RateLimiter<K = &'static str> {
    interval: Duration,
    /// Key -> earliest time the next caller with that key may be released
    next_slot: Mutex<HashMap<K, Instant>>,
}

impl<K> RateLimiter<K>
where
    K: Eq + Hash,
{
    /// Create a limiter that allows one call per `interval` for each key.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_slot: Mutex::new(HashMap::new()),
        }
    }

    /// Suspend until `interval` has passed since the last same-key caller returned.
    ///
    /// The first call for a key returns immediately.
    pub async fn block(&self, key: K) {
        let slot = self.reserve(key);
        tokio::time::sleep_until(slot).await;
    }

    /// Claim the next free slot for `key`. The lock is never held across an await.
    fn reserve(&self, key: K) -> Instant {
        let now = Instant::now();
        let mut next_slot = self.next_slot.lock().unwrap_or_else(PoisonError::into_inner);

        let next = next_slot.entry(key).or_insert(now);
        let slot = (*next).max(now);
        *next = slot + self.interval;
        slot
    }
}

/// Turn the receiving half of a fan-in channel into a boxed stream.
///
/// The stream ends once every sender has been dropped.
pub(crate) fn receiver_stream(mut receiver: UnboundedReceiver<String>) -> HostnameStream {
    Box::pin(stream::poll_fn(move |cx| receiver.poll_recv(cx)))
}
