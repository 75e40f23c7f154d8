//! Enrichment output types - per-field results and per-row outcomes.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::field::FieldValue;
use super::phase::Phase;

/// Maximum evidence quotes kept per field.
pub const MAX_SOURCE_CONTEXTS: usize = 5;

/// Field name → result. Insertion order follows phase order.
///
/// A field with no qualifying evidence is absent from the map; there is no
/// null placeholder. `EnrichmentResult::value` is never null by construction.
pub type FieldResults = IndexMap<String, EnrichmentResult>;

/// A piece of evidence backing a field value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceContext {
    /// Where the evidence was found
    pub url: String,

    /// Verbatim quote from that source
    pub snippet: String,
}

impl SourceContext {
    pub fn new(url: impl Into<String>, snippet: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            snippet: snippet.into(),
        }
    }
}

/// The resolved value of one requested field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentResult {
    /// Field name this result answers
    pub field: String,

    /// Resolved value
    pub value: FieldValue,

    /// Confidence in [0, 1]
    pub confidence: f64,

    /// Comma-joined source URLs, or a label such as "domain inference"
    pub source: String,

    /// Evidence quotes, at most [`MAX_SOURCE_CONTEXTS`]
    #[serde(default)]
    pub source_context: Vec<SourceContext>,

    /// Set for exploratory values derived without supporting evidence.
    ///
    /// Inferred values bypass the minimum-confidence filter but always carry
    /// a low confidence so they are distinguishable from verified data.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub inferred: bool,
}

impl EnrichmentResult {
    /// Create a result. Confidence is clamped to [0, 1]; NaN becomes 0.
    pub fn new(field: impl Into<String>, value: FieldValue, confidence: f64) -> Self {
        Self {
            field: field.into(),
            value,
            confidence: clamp_confidence(confidence),
            source: String::new(),
            source_context: Vec::new(),
            inferred: false,
        }
    }

    /// Set the source label.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Set evidence quotes and derive `source` from their URLs.
    pub fn with_source_context(mut self, contexts: Vec<SourceContext>) -> Self {
        self.set_source_context(contexts);
        self
    }

    /// Tag as an inference.
    pub fn inferred(mut self) -> Self {
        self.inferred = true;
        self
    }

    /// Replace evidence quotes, dedupe, truncate, and refresh `source`.
    pub fn set_source_context(&mut self, contexts: Vec<SourceContext>) {
        let mut seen = std::collections::HashSet::new();
        self.source_context = contexts
            .into_iter()
            .filter(|c| !c.url.is_empty() && seen.insert((c.url.clone(), c.snippet.clone())))
            .take(MAX_SOURCE_CONTEXTS)
            .collect();
        if !self.source_context.is_empty() {
            self.source = self.source_urls().join(", ");
        }
    }

    /// Distinct URLs cited in `source_context`, in order.
    pub fn source_urls(&self) -> Vec<String> {
        let mut urls: Vec<String> = Vec::new();
        for context in &self.source_context {
            if !urls.contains(&context.url) {
                urls.push(context.url.clone());
            }
        }
        urls
    }

    /// Set confidence, clamped to [0, 1].
    pub fn set_confidence(&mut self, confidence: f64) {
        self.confidence = clamp_confidence(confidence);
    }

    /// Whether the result is good enough to include in a row's output.
    pub fn passes_threshold(&self, min_confidence: f64) -> bool {
        self.inferred || self.confidence >= min_confidence
    }
}

fn clamp_confidence(confidence: f64) -> f64 {
    if confidence.is_nan() {
        0.0
    } else {
        confidence.clamp(0.0, 1.0)
    }
}

/// Terminal status of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowStatus {
    Completed,
    Error,
    Skipped,
}

/// Final outcome of enriching one row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowEnrichmentResult {
    pub row_index: usize,

    pub original_data: IndexMap<String, String>,

    pub enrichments: FieldResults,

    pub status: RowStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Mean confidence over the included fields (0 when empty)
    pub overall_confidence: f64,

    /// Wall-clock processing time
    pub elapsed_ms: u64,

    /// Set when cancellation stopped the pipeline between phases
    #[serde(default)]
    pub incomplete: bool,

    /// Phases that executed, in order
    #[serde(default)]
    pub phases_run: Vec<Phase>,
}

impl RowEnrichmentResult {
    /// A completed row.
    pub fn completed(
        row_index: usize,
        original_data: IndexMap<String, String>,
        enrichments: FieldResults,
    ) -> Self {
        let overall_confidence = overall_confidence(&enrichments);
        Self {
            row_index,
            original_data,
            enrichments,
            status: RowStatus::Completed,
            error: None,
            overall_confidence,
            elapsed_ms: 0,
            incomplete: false,
            phases_run: Vec::new(),
        }
    }

    /// A row that was not processed.
    pub fn skipped(
        row_index: usize,
        original_data: IndexMap<String, String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            status: RowStatus::Skipped,
            error: Some(reason.into()),
            ..Self::completed(row_index, original_data, FieldResults::new())
        }
    }

    /// A row that failed. Keeps whatever was gathered before the failure.
    pub fn failed(
        row_index: usize,
        original_data: IndexMap<String, String>,
        enrichments: FieldResults,
        error: impl Into<String>,
    ) -> Self {
        Self {
            status: RowStatus::Error,
            error: Some(error.into()),
            ..Self::completed(row_index, original_data, enrichments)
        }
    }

    pub fn with_elapsed_ms(mut self, elapsed_ms: u64) -> Self {
        self.elapsed_ms = elapsed_ms;
        self
    }

    pub fn with_phases_run(mut self, phases: Vec<Phase>) -> Self {
        self.phases_run = phases;
        self
    }

    pub fn mark_incomplete(mut self) -> Self {
        self.incomplete = true;
        self
    }
}

/// Mean confidence over a result map.
pub fn overall_confidence(results: &FieldResults) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    results.values().map(|r| r.confidence).sum::<f64>() / results.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> FieldValue {
        FieldValue::Text(s.to_string())
    }

    #[test]
    fn test_confidence_is_clamped() {
        assert_eq!(EnrichmentResult::new("a", text("x"), 1.7).confidence, 1.0);
        assert_eq!(EnrichmentResult::new("a", text("x"), -0.2).confidence, 0.0);
        assert_eq!(EnrichmentResult::new("a", text("x"), f64::NAN).confidence, 0.0);
    }

    #[test]
    fn test_source_context_dedupes_and_truncates() {
        let contexts: Vec<_> = (0..8)
            .map(|i| SourceContext::new(format!("https://s{}.com", i % 6), format!("q{}", i % 6)))
            .collect();
        let result = EnrichmentResult::new("f", text("v"), 0.9).with_source_context(contexts);

        assert_eq!(result.source_context.len(), MAX_SOURCE_CONTEXTS);
        assert!(result.source.starts_with("https://s0.com, https://s1.com"));
    }

    #[test]
    fn test_threshold_lets_inferred_through() {
        let weak = EnrichmentResult::new("f", text("v"), 0.2);
        assert!(!weak.passes_threshold(0.3));
        assert!(weak.clone().inferred().passes_threshold(0.3));
    }

    #[test]
    fn test_row_result_serializes_camel_case() {
        let mut enrichments = FieldResults::new();
        enrichments.insert("industry".into(), EnrichmentResult::new("industry", text("Security"), 0.8));
        let row = RowEnrichmentResult::completed(3, IndexMap::new(), enrichments);
        let json = serde_json::to_value(&row).unwrap();

        assert_eq!(json["rowIndex"], 3);
        assert_eq!(json["status"], "completed");
        assert_eq!(json["enrichments"]["industry"]["value"], "Security");
        assert!(json.get("error").is_none());
        assert!((row.overall_confidence - 0.8).abs() < 1e-9);
    }
}
