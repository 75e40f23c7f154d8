//! Composed web Capability Provider.

use async_trait::async_trait;
use tracing::{debug, warn};
use url::Url;

use crate::error::ProviderError;
use crate::traits::provider::{CapabilityProvider, FetchedContent, SearchHit};
use crate::traits::searcher::{PageScraper, WebSearcher};

/// A [`WebSearcher`] and a [`PageScraper`] behind the Capability Provider
/// interface.
///
/// Backend failures are logged and degrade to `[]` for search and
/// `text: None` for content, so phases never see them.
///
/// # Example
///
/// ```rust,ignore
/// use enrichment::providers::{FirecrawlScraper, TavilySearch, WebCapabilityProvider};
///
/// let provider = WebCapabilityProvider::new(TavilySearch::from_env()?, FirecrawlScraper::from_env()?);
/// let hits = provider.search("\"Wiz\" company", None, 5).await;
/// ```
pub struct WebCapabilityProvider<S: WebSearcher, F: PageScraper> {
    searcher: S,
    scraper: F,
}

impl<S: WebSearcher, F: PageScraper> WebCapabilityProvider<S, F> {
    pub fn new(searcher: S, scraper: F) -> Self {
        Self { searcher, scraper }
    }

    pub fn searcher(&self) -> &S {
        &self.searcher
    }

    pub fn scraper(&self) -> &F {
        &self.scraper
    }
}

#[async_trait]
impl<S: WebSearcher, F: PageScraper> CapabilityProvider for WebCapabilityProvider<S, F> {
    async fn search(&self, query: &str, target: Option<&str>, limit: usize) -> Vec<SearchHit> {
        if query.trim().is_empty() || limit == 0 {
            return Vec::new();
        }

        match self.searcher.search(query, limit).await {
            Ok(hits) => {
                let total = hits.len();
                let mut hits: Vec<SearchHit> = hits.into_iter().filter(SearchHit::has_valid_url).collect();
                hits.truncate(limit);
                debug!(
                    searcher = self.searcher.name(),
                    query,
                    target = target.unwrap_or(""),
                    hits = hits.len(),
                    dropped = total.saturating_sub(hits.len()),
                    "search complete"
                );
                hits
            }
            Err(e) => {
                warn!(searcher = self.searcher.name(), query, error = %e, "search failed, returning no results");
                Vec::new()
            }
        }
    }

    async fn fetch_content(&self, url: &str, target: &str) -> FetchedContent {
        let normalized = match normalize_url(url) {
            Ok(normalized) => normalized,
            Err(e) => {
                warn!(url, error = %e, "refusing to fetch");
                return FetchedContent::unavailable(url);
            }
        };

        match self.scraper.scrape(&normalized).await {
            Ok(content) => {
                debug!(
                    scraper = self.scraper.name(),
                    url = %normalized,
                    target,
                    found = content.usable_text().is_some(),
                    "fetch complete"
                );
                content
            }
            Err(e) => {
                warn!(scraper = self.scraper.name(), url = %normalized, error = %e, "fetch failed");
                FetchedContent::unavailable(normalized)
            }
        }
    }
}

/// Absolute http(s) form of `url`; bare domains get `https://`.
fn normalize_url(url: &str) -> Result<String, ProviderError> {
    let trimmed = url.trim();
    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let parsed = Url::parse(&candidate).map_err(|_| ProviderError::InvalidUrl { url: url.to_string() })?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(ProviderError::InvalidUrl { url: url.to_string() });
    }
    Ok(parsed.to_string())
}
