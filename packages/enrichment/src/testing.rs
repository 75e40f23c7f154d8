//! Testing utilities including mock implementations.
//!
//! These are useful for testing enrichment flows without making real search,
//! scrape or LLM calls.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::error::{EnrichmentError, Result};
use crate::traits::{
    ai::ChatModel,
    extractor::FieldExtractor,
    provider::{CapabilityProvider, FetchedContent, SearchHit},
};
use crate::types::{
    context::ExtractionContext,
    field::EnrichmentField,
    progress::{ProgressSink, Severity},
    result::{EnrichmentResult, FieldResults},
};

/// A mock Capability Provider for testing.
///
/// Searches match an exact query first, then the first registered fragment
/// contained in the query. Unknown queries return no hits; unknown URLs
/// return unavailable content.
#[derive(Default)]
pub struct MockProvider {
    /// Predefined hits by exact query
    searches: Arc<RwLock<HashMap<String, Vec<SearchHit>>>>,

    /// Predefined hits by query fragment, in registration order
    fragments: Arc<RwLock<Vec<(String, Vec<SearchHit>)>>>,

    /// Predefined pages by URL
    pages: Arc<RwLock<HashMap<String, FetchedContent>>>,

    /// Artificial latency applied to every call
    delay: Option<Duration>,

    /// Call tracking for assertions
    calls: Arc<RwLock<Vec<MockProviderCall>>>,
}

/// Record of a call made to the mock provider.
#[derive(Debug, Clone, PartialEq)]
pub enum MockProviderCall {
    Search { query: String, target: Option<String> },
    Fetch { url: String, target: String },
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add hits for an exact query.
    pub fn with_search(self, query: impl Into<String>, hits: Vec<SearchHit>) -> Self {
        self.searches.write().unwrap().insert(query.into(), hits);
        self
    }

    /// Add hits for any query containing `fragment`.
    pub fn with_search_containing(self, fragment: impl Into<String>, hits: Vec<SearchHit>) -> Self {
        self.fragments.write().unwrap().push((fragment.into(), hits));
        self
    }

    /// Add a readable page.
    pub fn with_content(self, url: impl Into<String>, text: impl Into<String>) -> Self {
        let url = url.into();
        let content = FetchedContent::found(url.clone(), text);
        self.pages.write().unwrap().insert(url, content);
        self
    }

    /// Add a page with full metadata.
    pub fn with_page(self, url: impl Into<String>, content: FetchedContent) -> Self {
        self.pages.write().unwrap().insert(url.into(), content);
        self
    }

    /// Delay every call, for timeout tests.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Get all calls made to this mock.
    pub fn calls(&self) -> Vec<MockProviderCall> {
        self.calls.read().unwrap().clone()
    }

    /// Queries searched, in call order.
    pub fn search_queries(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                MockProviderCall::Search { query, .. } => Some(query),
                MockProviderCall::Fetch { .. } => None,
            })
            .collect()
    }

    /// URLs fetched, in call order.
    pub fn fetched_urls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                MockProviderCall::Fetch { url, .. } => Some(url),
                MockProviderCall::Search { .. } => None,
            })
            .collect()
    }

    /// Clear call history.
    pub fn clear_calls(&self) {
        self.calls.write().unwrap().clear();
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl CapabilityProvider for MockProvider {
    async fn search(&self, query: &str, target: Option<&str>, limit: usize) -> Vec<SearchHit> {
        self.calls.write().unwrap().push(MockProviderCall::Search {
            query: query.to_string(),
            target: target.map(str::to_string),
        });
        self.pause().await;

        let exact = self.searches.read().unwrap().get(query).cloned();
        let hits = exact.or_else(|| {
            self.fragments
                .read()
                .unwrap()
                .iter()
                .find(|(fragment, _)| query.contains(fragment.as_str()))
                .map(|(_, hits)| hits.clone())
        });
        hits.unwrap_or_default().into_iter().take(limit).collect()
    }

    async fn fetch_content(&self, url: &str, target: &str) -> FetchedContent {
        self.calls.write().unwrap().push(MockProviderCall::Fetch {
            url: url.to_string(),
            target: target.to_string(),
        });
        self.pause().await;

        self.pages
            .read()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or_else(|| FetchedContent::unavailable(url))
    }
}

/// A mock extraction engine for testing.
///
/// Returns every configured result on each call, regardless of which fields
/// were requested; filtering is the caller's job. Conditional results are
/// only returned when the content contains a given fragment.
#[derive(Default)]
pub struct MockExtractor {
    /// Results returned on every call
    results: Arc<RwLock<Vec<EnrichmentResult>>>,

    /// Results returned when the content contains the fragment
    conditional: Arc<RwLock<Vec<(String, EnrichmentResult)>>>,

    /// Whether every call fails
    failing: bool,

    /// Call tracking for assertions
    calls: Arc<RwLock<Vec<MockExtractorCall>>>,
}

/// Record of a call made to the mock extractor.
#[derive(Debug, Clone)]
pub struct MockExtractorCall {
    pub fields: Vec<String>,
    pub content: String,
    pub context: ExtractionContext,
}

impl MockExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a result returned on every call.
    pub fn with_result(self, result: EnrichmentResult) -> Self {
        self.results.write().unwrap().push(result);
        self
    }

    /// Add a result returned only when the content contains `fragment`.
    pub fn with_result_when(self, fragment: impl Into<String>, result: EnrichmentResult) -> Self {
        self.conditional.write().unwrap().push((fragment.into(), result));
        self
    }

    /// Make every call fail with a parse error.
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    /// Get all calls made to this mock.
    pub fn calls(&self) -> Vec<MockExtractorCall> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl FieldExtractor for MockExtractor {
    async fn extract(
        &self,
        content: &str,
        fields: &[EnrichmentField],
        context: &ExtractionContext,
    ) -> Result<FieldResults> {
        self.calls.write().unwrap().push(MockExtractorCall {
            fields: fields.iter().map(|f| f.name.clone()).collect(),
            content: content.to_string(),
            context: context.clone(),
        });

        if self.failing {
            return Err(EnrichmentError::ExtractionParse {
                reason: "mock failure".to_string(),
            });
        }

        let mut results = FieldResults::new();
        for result in self.results.read().unwrap().iter() {
            results.insert(result.field.clone(), result.clone());
        }
        for (fragment, result) in self.conditional.read().unwrap().iter() {
            if content.contains(fragment.as_str()) {
                results.entry(result.field.clone()).or_insert_with(|| result.clone());
            }
        }
        Ok(results)
    }
}

/// A mock chat model for testing the LLM extractor.
///
/// Replies with the configured responses in order, repeating the last one.
/// Clones share responses and call history.
#[derive(Clone, Default)]
pub struct MockChatModel {
    responses: Arc<RwLock<Vec<String>>>,
    failing: bool,
    calls: Arc<RwLock<Vec<MockChatCall>>>,
}

/// Record of a call made to the mock chat model.
#[derive(Debug, Clone)]
pub struct MockChatCall {
    pub system: String,
    pub user: String,
}

impl MockChatModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response.
    pub fn with_response(self, response: impl Into<String>) -> Self {
        self.responses.write().unwrap().push(response.into());
        self
    }

    /// Make every call fail.
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    /// Get all calls made to this mock.
    pub fn calls(&self) -> Vec<MockChatCall> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for MockChatModel {
    async fn complete_json(&self, system: &str, user: &str) -> Result<String> {
        let index = {
            let mut calls = self.calls.write().unwrap();
            calls.push(MockChatCall {
                system: system.to_string(),
                user: user.to_string(),
            });
            calls.len() - 1
        };

        if self.failing {
            return Err(EnrichmentError::AI("mock chat failure".into()));
        }

        let responses = self.responses.read().unwrap();
        Ok(responses
            .get(index)
            .or_else(|| responses.last())
            .cloned()
            .unwrap_or_else(|| "{}".to_string()))
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}

/// A progress sink that records everything it receives.
#[derive(Debug, Default)]
pub struct RecordingProgress {
    messages: RwLock<Vec<(String, Severity)>>,
    fields: RwLock<Vec<(String, EnrichmentResult)>>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Phase messages, in order.
    pub fn messages(&self) -> Vec<(String, Severity)> {
        self.messages.read().unwrap().clone()
    }

    /// Names of fields reported, in order.
    pub fn fields(&self) -> Vec<String> {
        self.fields.read().unwrap().iter().map(|(f, _)| f.clone()).collect()
    }

    /// Reported result for a field.
    pub fn field_result(&self, field: &str) -> Option<EnrichmentResult> {
        self.fields
            .read()
            .unwrap()
            .iter()
            .find(|(f, _)| f == field)
            .map(|(_, r)| r.clone())
    }
}

impl ProgressSink for RecordingProgress {
    fn on_phase_progress(&self, message: &str, severity: Severity) {
        self.messages.write().unwrap().push((message.to_string(), severity));
    }

    fn on_field_progress(&self, field: &str, result: &EnrichmentResult) {
        self.fields
            .write()
            .unwrap()
            .push((field.to_string(), result.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::field::FieldValue;

    #[tokio::test]
    async fn test_mock_provider_exact_then_fragment() {
        let provider = MockProvider::new()
            .with_search("exact query", vec![SearchHit::new("https://exact.com", "E", "e")])
            .with_search_containing("funding", vec![SearchHit::new("https://f.com", "F", "f")]);

        let hits = provider.search("exact query", None, 5).await;
        assert_eq!(hits[0].url, "https://exact.com");

        let hits = provider.search("\"Wiz\" funding raised", None, 5).await;
        assert_eq!(hits[0].url, "https://f.com");

        assert!(provider.search("unknown", None, 5).await.is_empty());
        assert_eq!(provider.search_queries().len(), 3);
    }

    #[tokio::test]
    async fn test_mock_provider_fetch() {
        let provider = MockProvider::new().with_content("https://a.com", "About A");

        let page = provider.fetch_content("https://a.com", "anything").await;
        assert_eq!(page.usable_text(), Some("About A"));

        let missing = provider.fetch_content("https://missing.com", "anything").await;
        assert!(missing.text.is_none());
        assert_eq!(provider.fetched_urls(), vec!["https://a.com", "https://missing.com"]);
    }

    #[tokio::test]
    async fn test_mock_extractor_conditional_results() {
        let extractor = MockExtractor::new()
            .with_result(EnrichmentResult::new("industry", FieldValue::Text("Security".into()), 0.9))
            .with_result_when(
                "founded",
                EnrichmentResult::new("yearFounded", FieldValue::Number(2020.0), 0.9),
            );

        let fields = [EnrichmentField::text("industry", "")];
        let plain = extractor.extract("text", &fields, &ExtractionContext::new()).await.unwrap();
        assert_eq!(plain.len(), 1);

        let rich = extractor
            .extract("it was founded in 2020", &fields, &ExtractionContext::new())
            .await
            .unwrap();
        assert_eq!(rich.len(), 2);
        assert_eq!(extractor.calls().len(), 2);
    }

    #[test]
    fn test_recording_progress() {
        let progress = RecordingProgress::new();
        progress.on_phase_progress("started", Severity::Info);
        progress.on_field_progress(
            "industry",
            &EnrichmentResult::new("industry", FieldValue::Text("Security".into()), 0.9),
        );

        assert_eq!(progress.messages(), vec![("started".to_string(), Severity::Info)]);
        assert_eq!(progress.fields(), vec!["industry"]);
        assert!(progress.field_result("industry").is_some());
    }
}
