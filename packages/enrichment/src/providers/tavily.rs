//! Tavily web search.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::error::{EnrichmentError, ProviderError, ProviderResult, Result};
use crate::security::SecretString;
use crate::traits::provider::SearchHit;
use crate::traits::searcher::WebSearcher;

const TAVILY_API_URL: &str = "https://api.tavily.com";

/// Web search over the Tavily API.
///
/// # Example
///
/// ```rust,ignore
/// use enrichment::providers::TavilySearch;
///
/// let searcher = TavilySearch::new(std::env::var("TAVILY_API_KEY")?)?;
/// let hits = searcher.search("\"Wiz\" company", 5).await?;
/// ```
pub struct TavilySearch {
    api_key: SecretString,
    client: Client,
    base_url: String,
    search_depth: &'static str,
}

#[derive(Serialize)]
struct TavilyRequest<'a> {
    query: &'a str,
    search_depth: &'a str,
    max_results: usize,
    include_answer: bool,
}

#[derive(Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Deserialize)]
struct TavilyResult {
    url: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
}

impl TavilySearch {
    /// Create a searcher with the given API key.
    pub fn new(api_key: impl Into<SecretString>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| EnrichmentError::Config(Box::new(e)))?;

        Ok(Self {
            api_key: api_key.into(),
            client,
            base_url: TAVILY_API_URL.to_string(),
            search_depth: "basic",
        })
    }

    /// Create from environment variable `TAVILY_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("TAVILY_API_KEY")
            .map_err(|_| EnrichmentError::Config("TAVILY_API_KEY not set".into()))?;
        Self::new(api_key)
    }

    /// Use Tavily's slower, deeper search.
    pub fn advanced(mut self) -> Self {
        self.search_depth = "advanced";
        self
    }

    /// Set a custom base URL (proxies, test servers).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

#[async_trait]
impl WebSearcher for TavilySearch {
    async fn search(&self, query: &str, limit: usize) -> ProviderResult<Vec<SearchHit>> {
        let request = TavilyRequest {
            query,
            search_depth: self.search_depth,
            max_results: limit,
            include_answer: false,
        };

        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key.expose()))
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::Http(Box::new(e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                service: "tavily",
                status: status.as_u16(),
                body,
            });
        }

        let parsed: TavilyResponse = response.json().await.map_err(|e| ProviderError::Malformed {
            service: "tavily",
            reason: e.to_string(),
        })?;

        let hits = into_hits(parsed, limit);
        debug!(query, hits = hits.len(), "tavily search complete");
        Ok(hits)
    }

    fn name(&self) -> &'static str {
        "tavily"
    }
}

fn into_hits(response: TavilyResponse, limit: usize) -> Vec<SearchHit> {
    response
        .results
        .into_iter()
        .map(|r| SearchHit::new(r.url, r.title, r.content))
        .filter(SearchHit::has_valid_url)
        .take(limit)
        .collect()
}
