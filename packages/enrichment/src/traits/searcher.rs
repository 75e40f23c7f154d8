//! Backend traits composed into a Capability Provider.
//!
//! A [`WebSearcher`] finds pages and a [`PageScraper`] reads them. Unlike
//! [`CapabilityProvider`](super::provider::CapabilityProvider), both report
//! failures as [`ProviderError`](crate::error::ProviderError); the composed
//! provider decides how a failure degrades.

use async_trait::async_trait;

use crate::error::ProviderResult;
use crate::traits::provider::{FetchedContent, SearchHit};

/// Open-web search backend.
///
/// # Implementations
///
/// - `TavilySearch` - Tavily API
#[async_trait]
pub trait WebSearcher: Send + Sync {
    /// Search the web, returning at most `limit` hits.
    async fn search(&self, query: &str, limit: usize) -> ProviderResult<Vec<SearchHit>>;

    /// Backend name for logs.
    fn name(&self) -> &'static str;
}

/// Page content backend.
///
/// # Implementations
///
/// - `FirecrawlScraper` - Firecrawl API (feature `firecrawl`)
#[async_trait]
pub trait PageScraper: Send + Sync {
    /// Read a page as text (markdown where the backend supports it).
    async fn scrape(&self, url: &str) -> ProviderResult<FetchedContent>;

    /// Backend name for logs.
    fn name(&self) -> &'static str;
}
