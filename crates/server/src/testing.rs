//! Shared test doubles for the feed source seam.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use listafeed_feed::transport::{FeedEntry, FeedSource, TransportError};

/// Feed source that serves one fixed document, counting calls and
/// optionally simulating upstream latency.
pub(crate) struct StaticSource {
    name: String,
    body: String,
    delay: Duration,
    calls: AtomicUsize,
}

impl StaticSource {
    pub(crate) fn new(name: &str, body: &str) -> Self {
        Self { name: name.to_owned(), body: body.to_owned(), delay: Duration::ZERO, calls: AtomicUsize::new(0) }
    }

    pub(crate) fn json(body: &str) -> Self {
        Self::new("listings.json", body)
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FeedSource for StaticSource {
    async fn fetch_latest(&self) -> Result<(FeedEntry, Bytes), TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let entry = FeedEntry { name: self.name.clone(), modified_at: Utc::now(), size: None };
        Ok((entry, Bytes::from(self.body.clone())))
    }
}

/// Feed source that always fails with the configured error.
pub(crate) struct FailingSource {
    error: TransportError,
}

impl FailingSource {
    pub(crate) fn timeout() -> Self {
        Self { error: TransportError::Timeout }
    }

    pub(crate) fn empty_listing() -> Self {
        Self { error: TransportError::NoFeedsAvailable }
    }
}

#[async_trait]
impl FeedSource for FailingSource {
    async fn fetch_latest(&self) -> Result<(FeedEntry, Bytes), TransportError> {
        Err(self.error.clone())
    }
}
