//! Evidence gathering - bounded, timeout-guarded provider calls.
//!
//! Every provider call made by a phase goes through [`Gatherer`], which
//! enforces the per-call time budget and the per-phase in-flight limit. A
//! call that times out counts as empty; it never aborts the phase.

use std::collections::HashSet;

use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use crate::traits::provider::{CapabilityProvider, FetchedContent, SearchHit};
use crate::types::config::EnrichmentConfig;

/// Provider access for one phase.
pub struct Gatherer<'a> {
    provider: &'a dyn CapabilityProvider,
    config: &'a EnrichmentConfig,
}

impl<'a> Gatherer<'a> {
    pub fn new(provider: &'a dyn CapabilityProvider, config: &'a EnrichmentConfig) -> Self {
        Self { provider, config }
    }

    /// One search, bounded by the provider timeout.
    ///
    /// Results with malformed URLs are dropped.
    pub async fn search(&self, query: &str, target: Option<&str>) -> Vec<SearchHit> {
        let timeout = self.config.provider_timeout();
        let call = self.provider.search(query, target, self.config.search_limit);
        match tokio::time::timeout(timeout, call).await {
            Ok(hits) => {
                let before = hits.len();
                let hits: Vec<SearchHit> = hits.into_iter().filter(SearchHit::has_valid_url).collect();
                debug!(query = %query, hits = hits.len(), dropped = before - hits.len(), "search complete");
                hits
            }
            Err(_) => {
                warn!(query = %query, secs = timeout.as_secs(), "search timed out");
                Vec::new()
            }
        }
    }

    /// Run independent searches concurrently, at most `max_in_flight` at a time.
    ///
    /// Results keep query order and are deduplicated by URL.
    pub async fn search_all(&self, queries: &[String], target: Option<&str>) -> Vec<SearchHit> {
        let mut batches: Vec<(usize, Vec<SearchHit>)> = stream::iter(queries.iter().enumerate())
            .map(|(idx, query)| async move { (idx, self.search(query, target).await) })
            .buffer_unordered(self.config.max_in_flight.max(1))
            .collect()
            .await;
        batches.sort_by_key(|(idx, _)| *idx);

        dedupe_by_url(batches.into_iter().flat_map(|(_, hits)| hits))
    }

    /// Run searches one at a time until `target_count` accepted results are gathered.
    ///
    /// `accept` filters individual hits before they count.
    pub async fn search_until<F>(
        &self,
        queries: &[String],
        target: Option<&str>,
        target_count: usize,
        accept: F,
    ) -> Vec<SearchHit>
    where
        F: Fn(&SearchHit) -> bool,
    {
        let mut seen = HashSet::new();
        let mut gathered = Vec::new();
        for query in queries {
            if gathered.len() >= target_count {
                break;
            }
            for hit in self.search(query, target).await {
                if accept(&hit) && seen.insert(hit.url.clone()) {
                    gathered.push(hit);
                }
            }
        }
        gathered
    }

    /// Read one URL, bounded by the provider timeout.
    pub async fn fetch(&self, url: &str, target: &str) -> FetchedContent {
        let timeout = self.config.provider_timeout();
        match tokio::time::timeout(timeout, self.provider.fetch_content(url, target)).await {
            Ok(content) => {
                debug!(url = %url, found = content.usable_text().is_some(), "fetch complete");
                content
            }
            Err(_) => {
                warn!(url = %url, secs = timeout.as_secs(), "fetch timed out");
                FetchedContent::unavailable(url)
            }
        }
    }

    /// Try URLs in order and return the first with usable text.
    pub async fn fetch_first(&self, urls: &[String], target: &str) -> Option<(String, String)> {
        for url in urls {
            let content = self.fetch(url, target).await;
            if let Some(text) = content.usable_text() {
                return Some((url.clone(), text.to_string()));
            }
        }
        None
    }
}

/// Drop repeated URLs, keeping the first occurrence.
pub fn dedupe_by_url(hits: impl IntoIterator<Item = SearchHit>) -> Vec<SearchHit> {
    let mut seen = HashSet::new();
    hits.into_iter()
        .filter(|hit| seen.insert(normalize_url(&hit.url)))
        .collect()
}

fn normalize_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_lowercase()
}

/// `{url, title, snippet}` text blocks for the extractor.
pub fn content_blocks(hits: &[SearchHit]) -> Vec<String> {
    hits.iter().map(SearchHit::to_block).collect()
}
