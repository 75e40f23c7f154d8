//! Rate-limited provider wrapper.
//!
//! Wraps any Capability Provider with a `governor` quota shared by search
//! and content calls.

use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;

use crate::traits::provider::{CapabilityProvider, FetchedContent, SearchHit};

type DefaultRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// A provider wrapper that enforces a request quota.
///
/// Clones share one limiter, so every row of a batch draws from the same
/// quota.
#[derive(Clone)]
pub struct RateLimitedProvider<P: CapabilityProvider> {
    inner: P,
    limiter: Arc<DefaultRateLimiter>,
}

impl<P: CapabilityProvider> RateLimitedProvider<P> {
    /// Allow `requests_per_second` calls; zero is treated as one.
    pub fn new(provider: P, requests_per_second: u32) -> Self {
        Self::with_quota(provider, Quota::per_second(non_zero(requests_per_second)))
    }

    /// Sustained rate plus a burst allowance.
    pub fn with_burst(provider: P, requests_per_second: u32, burst: u32) -> Self {
        let quota = Quota::per_second(non_zero(requests_per_second)).allow_burst(non_zero(burst));
        Self::with_quota(provider, quota)
    }

    pub fn with_quota(provider: P, quota: Quota) -> Self {
        Self {
            inner: provider,
            limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    async fn wait_for_permit(&self) {
        self.limiter.until_ready().await;
    }
}

fn non_zero(n: u32) -> NonZeroU32 {
    NonZeroU32::new(n).unwrap_or(NonZeroU32::MIN)
}

#[async_trait]
impl<P: CapabilityProvider> CapabilityProvider for RateLimitedProvider<P> {
    async fn search(&self, query: &str, target: Option<&str>, limit: usize) -> Vec<SearchHit> {
        self.wait_for_permit().await;
        self.inner.search(query, target, limit).await
    }

    async fn fetch_content(&self, url: &str, target: &str) -> FetchedContent {
        self.wait_for_permit().await;
        self.inner.fetch_content(url, target).await
    }
}

/// Extension for wrapping providers fluently.
pub trait ProviderExt: CapabilityProvider + Sized {
    /// Wrap with a per-second quota.
    fn rate_limited(self, requests_per_second: u32) -> RateLimitedProvider<Self> {
        RateLimitedProvider::new(self, requests_per_second)
    }
}

impl<P: CapabilityProvider> ProviderExt for P {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockProvider, MockProviderCall};

    #[tokio::test]
    async fn test_calls_pass_through() {
        let mock = MockProvider::new()
            .with_search("acme", vec![SearchHit::new("https://acme.com", "Acme", "Acme builds robots")])
            .with_content("https://acme.com", "Acme Robotics");
        let provider = Arc::new(mock);
        let limited = Arc::clone(&provider).rate_limited(100);

        let hits = limited.search("acme", None, 5).await;
        let page = limited.fetch_content("https://acme.com", "company name").await;

        assert_eq!(hits.len(), 1);
        assert_eq!(page.usable_text(), Some("Acme Robotics"));
        assert_eq!(provider.calls().len(), 2);
        assert!(matches!(provider.calls()[0], MockProviderCall::Search { .. }));
    }

    #[tokio::test]
    async fn test_zero_rate_still_admits() {
        let limited = RateLimitedProvider::with_burst(MockProvider::new(), 0, 0);
        assert!(limited.search("anything", None, 5).await.is_empty());
    }
}
