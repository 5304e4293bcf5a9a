#![allow(dead_code)]

pub mod fixtures;

use async_trait::async_trait;
use navtree::{FetchError, InMemorySubtreeFetcher, PanelEvent, SubtreeFetcher};
use navtree::traits::SharedPayload;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Collects every event the bridge has emitted so far.
pub fn drain(rx: &async_channel::Receiver<PanelEvent>) -> Vec<PanelEvent> {
    std::iter::from_fn(|| rx.try_recv().ok()).collect()
}

/// In-memory fetcher that yields to the scheduler before answering, so that
/// expansions issued together are genuinely in flight at the same time.
#[derive(Debug, Default)]
pub struct YieldingFetcher {
    pub inner: InMemorySubtreeFetcher,
}

#[async_trait]
impl SubtreeFetcher for YieldingFetcher {
    async fn fetch(&self, token: &str) -> Result<SharedPayload, FetchError> {
        tokio::task::yield_now().await;
        self.inner.fetch(token).await
    }

    fn name(&self) -> &'static str {
        "YieldingFetcher"
    }
}

/// A fetcher whose requests never complete.
#[derive(Debug, Default)]
pub struct StalledFetcher;

#[async_trait]
impl SubtreeFetcher for StalledFetcher {
    async fn fetch(&self, _token: &str) -> Result<SharedPayload, FetchError> {
        std::future::pending().await
    }

    fn name(&self) -> &'static str {
        "StalledFetcher"
    }
}
