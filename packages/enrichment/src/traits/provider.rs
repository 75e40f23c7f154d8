//! Capability Provider trait - search and content acquisition.
//!
//! Phases never talk to a search API or a scraper directly. They go through
//! a `CapabilityProvider`, which may be backed by a real search/scrape
//! service, an LLM with browsing, or a mock.
//!
//! # Contract
//!
//! Neither operation fails from the caller's point of view:
//! - `search` returns `[]` when the backend is unavailable
//! - `fetch_content` returns `text: None` when the page cannot be read
//!
//! Adapters log their own failures.
//!
//! ```rust,ignore
//! let hits = provider.search("wiz.io official website", None, 5).await;
//! let page = provider.fetch_content("https://wiz.io", "company name, website, and description").await;
//! if let Some(text) = page.text {
//!     // validate and extract
//! }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A ranked search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Absolute URL
    pub url: String,

    pub title: String,

    /// One to three sentences from the page
    pub snippet: String,
}

impl SearchHit {
    pub fn new(url: impl Into<String>, title: impl Into<String>, snippet: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            snippet: snippet.into(),
        }
    }

    /// Text block fed to the extraction engine.
    pub fn to_block(&self) -> String {
        format!("URL: {}\nTitle: {}\nContent: {}", self.url, self.title, self.snippet)
    }

    /// Whether the URL parses as an absolute http(s) URL.
    pub fn has_valid_url(&self) -> bool {
        url::Url::parse(&self.url)
            .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
            .unwrap_or(false)
    }
}

/// Metadata returned alongside fetched content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentMetadata {
    pub title: Option<String>,

    /// URL or label the content came from
    pub source: String,
}

/// Result of a content acquisition call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchedContent {
    /// Page text, or `None` when the page could not be read
    pub text: Option<String>,

    pub metadata: ContentMetadata,
}

impl FetchedContent {
    /// Successfully fetched content.
    pub fn found(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            metadata: ContentMetadata {
                title: None,
                source: source.into(),
            },
        }
    }

    /// A failed or inaccessible fetch.
    pub fn unavailable(source: impl Into<String>) -> Self {
        Self {
            text: None,
            metadata: ContentMetadata {
                title: None,
                source: source.into(),
            },
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.metadata.title = Some(title.into());
        self
    }

    /// Non-empty text, if any.
    pub fn usable_text(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.trim().is_empty())
    }
}

/// Search and content acquisition capability.
///
/// # Implementations
///
/// - `WebCapabilityProvider` - Tavily search + Firecrawl scrape
/// - `RateLimitedProvider` - quota wrapper around any provider
/// - `MockProvider` - canned responses for tests
#[async_trait]
pub trait CapabilityProvider: Send + Sync {
    /// Search for pages relevant to the query. Never fails; returns `[]` instead.
    async fn search(&self, query: &str, target: Option<&str>, limit: usize) -> Vec<SearchHit>;

    /// Read a URL, focusing on what the target description asks for.
    /// Never fails; returns `text: None` instead.
    async fn fetch_content(&self, url: &str, target: &str) -> FetchedContent;
}

#[async_trait]
impl<T: CapabilityProvider + ?Sized> CapabilityProvider for std::sync::Arc<T> {
    async fn search(&self, query: &str, target: Option<&str>, limit: usize) -> Vec<SearchHit> {
        (**self).search(query, target, limit).await
    }

    async fn fetch_content(&self, url: &str, target: &str) -> FetchedContent {
        (**self).fetch_content(url, target).await
    }
}
