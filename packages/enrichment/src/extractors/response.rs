//! Parsing and verification of extraction responses.
//!
//! Model output is untrusted. Quotes must occur in the content that was sent,
//! URLs must be ones the content names, and confidence is capped by how much
//! verified evidence backs the value.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{EnrichmentError, Result};
use crate::pipeline::budget::CHUNK_SEPARATOR;
use crate::types::result::SourceContext;

/// Confidence assumed when the model does not report one.
pub const DEFAULT_MODEL_CONFIDENCE: f64 = 0.7;

/// Cap for a value backed by a single verified source.
pub const SINGLE_SOURCE_CAP: f64 = 0.8;

/// Cap for a value backed by two or more distinct sources.
pub const CORROBORATED_CAP: f64 = 0.95;

/// Cap for a single-pass value whose quotes could not be verified.
pub const UNVERIFIED_CAP: f64 = 0.5;

/// Quotes shorter than this never count as evidence.
const MIN_QUOTE_CHARS: usize = 3;

/// One field as answered by the model.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawFieldAnswer {
    #[serde(default)]
    pub value: Value,

    #[serde(default)]
    pub confidence: Option<f64>,

    #[serde(default, alias = "evidence")]
    pub sources: Vec<RawSource>,
}

/// An evidence passage as answered by the model.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSource {
    #[serde(default)]
    pub url: String,

    #[serde(default, alias = "snippet", alias = "text")]
    pub quote: String,
}

/// Extract JSON from a response that may be wrapped in markdown or prose.
pub fn extract_json(response: &str) -> &str {
    let trimmed = response.trim();

    if let Some(start) = trimmed.find("```") {
        let after_fence = start + 3;
        let body_start = trimmed[after_fence..]
            .find('\n')
            .map(|i| after_fence + i + 1)
            .unwrap_or(after_fence);
        if let Some(end) = trimmed[body_start..].find("```") {
            return trimmed[body_start..body_start + end].trim();
        }
    }

    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if end > start => &trimmed[start..=end],
        _ => trimmed,
    }
}

/// Parse a model response into per-field answers.
///
/// Accepts `{"fields": {...}}` or a bare object of fields. A field given as
/// a plain value instead of an answer object is read as an answer without
/// confidence or sources.
pub fn parse_response(response: &str) -> Result<IndexMap<String, RawFieldAnswer>> {
    let json = extract_json(response);
    let parsed: Value = serde_json::from_str(json).map_err(|e| EnrichmentError::ExtractionParse {
        reason: e.to_string(),
    })?;

    let fields = match parsed {
        Value::Object(mut map) => match map.remove("fields") {
            Some(Value::Object(fields)) => fields,
            Some(_) => {
                return Err(EnrichmentError::ExtractionParse {
                    reason: "\"fields\" is not an object".to_string(),
                })
            }
            None => map,
        },
        _ => {
            return Err(EnrichmentError::ExtractionParse {
                reason: "response is not a JSON object".to_string(),
            })
        }
    };

    Ok(fields
        .into_iter()
        .map(|(name, raw)| {
            let answer = if raw.get("value").is_some() {
                serde_json::from_value(raw).unwrap_or_default()
            } else {
                RawFieldAnswer {
                    value: raw,
                    ..RawFieldAnswer::default()
                }
            };
            (name, answer)
        })
        .collect())
}

/// Keep only passages whose quote occurs in `content`.
///
/// A verified quote cited under a URL the content never mentions is
/// re-attributed to the URL of the content block it was found in, or
/// dropped if that block has none.
pub fn verify_sources(sources: &[RawSource], content: &str) -> Vec<SourceContext> {
    let normalized_content = normalize(content);
    sources
        .iter()
        .filter_map(|source| {
            let quote = clean_quote(&source.quote);
            if quote.chars().filter(|c| !c.is_whitespace()).count() < MIN_QUOTE_CHARS {
                return None;
            }
            if !normalized_content.contains(&normalize(&quote)) {
                return None;
            }
            let url = source.url.trim();
            let url = if !url.is_empty() && content.contains(url) {
                url.to_string()
            } else {
                url_for_quote(content, &quote)?
            };
            Some(SourceContext::new(url, quote))
        })
        .collect()
}

/// Confidence for a value given its verified evidence.
///
/// Corroborated answers without verified evidence are rejected (`None`).
/// Single-pass answers without verified evidence are kept at a low cap.
pub fn score(model_confidence: Option<f64>, verified: &[SourceContext], corroborated: bool) -> Option<f64> {
    let reported = model_confidence
        .filter(|c| c.is_finite())
        .unwrap_or(DEFAULT_MODEL_CONFIDENCE)
        .clamp(0.0, 1.0);

    let mut urls: Vec<&str> = verified.iter().map(|s| s.url.as_str()).collect();
    urls.sort_unstable();
    urls.dedup();

    match urls.len() {
        0 if corroborated => None,
        0 => Some(reported.min(UNVERIFIED_CAP)),
        1 => Some(reported.min(SINGLE_SOURCE_CAP)),
        n => Some((reported + 0.05 * (n - 1) as f64).min(CORROBORATED_CAP)),
    }
}

/// URL of the content block containing `quote`.
fn url_for_quote(content: &str, quote: &str) -> Option<String> {
    let needle = normalize(quote);
    content
        .split(CHUNK_SEPARATOR)
        .find(|block| normalize(block).contains(&needle))
        .and_then(|block| {
            block.lines().find_map(|line| {
                line.trim()
                    .strip_prefix("URL:")
                    .map(|url| url.trim().to_string())
                    .filter(|url| !url.is_empty())
            })
        })
}

fn clean_quote(quote: &str) -> String {
    quote
        .trim()
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '…')
        .trim_end_matches("...")
        .trim_start_matches("...")
        .trim()
        .to_string()
}

fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
