//! Firecrawl page scraper.
//!
//! Renders JavaScript-heavy pages and returns them as markdown.
//!
//! Requires the `firecrawl` feature to be enabled.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::error::{EnrichmentError, ProviderError, ProviderResult, Result};
use crate::security::SecretString;
use crate::traits::provider::FetchedContent;
use crate::traits::searcher::PageScraper;

const FIRECRAWL_API_URL: &str = "https://api.firecrawl.dev/v1";

/// Single-page scraper over the Firecrawl API.
///
/// # Example
///
/// ```rust,ignore
/// use enrichment::providers::FirecrawlScraper;
///
/// let scraper = FirecrawlScraper::from_env()?;
/// let page = scraper.scrape("https://wiz.io").await?;
/// ```
pub struct FirecrawlScraper {
    client: Client,
    api_key: SecretString,
    base_url: String,
}

#[derive(Serialize)]
struct ScrapeRequest<'a> {
    url: &'a str,
    formats: [&'static str; 1],
    #[serde(rename = "onlyMainContent")]
    only_main_content: bool,
}

#[derive(Deserialize)]
struct ScrapeResponse {
    success: bool,
    data: Option<ScrapeData>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct ScrapeData {
    markdown: Option<String>,
    metadata: Option<PageMetadata>,
}

#[derive(Deserialize)]
struct PageMetadata {
    title: Option<String>,
    #[serde(rename = "sourceURL")]
    source_url: Option<String>,
}

impl FirecrawlScraper {
    /// Create a scraper with the given API key.
    pub fn new(api_key: impl Into<SecretString>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| EnrichmentError::Config(Box::new(e)))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: FIRECRAWL_API_URL.to_string(),
        })
    }

    /// Create from environment variable `FIRECRAWL_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("FIRECRAWL_API_KEY")
            .map_err(|_| EnrichmentError::Config("FIRECRAWL_API_KEY not set".into()))?;
        Self::new(api_key)
    }

    /// Set a custom base URL (self-hosted Firecrawl).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    async fn post<T: Serialize + ?Sized, R: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &str,
        body: &T,
    ) -> ProviderResult<R> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, endpoint))
            .header("Authorization", format!("Bearer {}", self.api_key.expose()))
            .json(body)
            .send()
            .await
            .map_err(|e| ProviderError::Http(Box::new(e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                service: "firecrawl",
                status: status.as_u16(),
                body,
            });
        }

        response.json().await.map_err(|e| ProviderError::Malformed {
            service: "firecrawl",
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl PageScraper for FirecrawlScraper {
    async fn scrape(&self, url: &str) -> ProviderResult<FetchedContent> {
        let request = ScrapeRequest {
            url,
            formats: ["markdown"],
            only_main_content: true,
        };
        let response: ScrapeResponse = self.post("/scrape", &request).await?;
        let content = into_content(url, response)?;

        debug!(
            url,
            chars = content.text.as_deref().map(str::len).unwrap_or(0),
            "firecrawl scrape complete"
        );
        Ok(content)
    }

    fn name(&self) -> &'static str {
        "firecrawl"
    }
}

fn into_content(url: &str, response: ScrapeResponse) -> ProviderResult<FetchedContent> {
    if !response.success {
        return Err(ProviderError::Malformed {
            service: "firecrawl",
            reason: response.error.unwrap_or_else(|| "scrape unsuccessful".to_string()),
        });
    }
    let Some(data) = response.data else {
        return Ok(FetchedContent::unavailable(url));
    };

    let (title, source) = match data.metadata {
        Some(meta) => (meta.title, meta.source_url.unwrap_or_else(|| url.to_string())),
        None => (None, url.to_string()),
    };

    let mut content = match data.markdown {
        Some(markdown) => FetchedContent::found(source, markdown),
        None => FetchedContent::unavailable(source),
    };
    if let Some(title) = title.filter(|t| !t.trim().is_empty()) {
        content = content.with_title(title);
    }
    Ok(content)
}
