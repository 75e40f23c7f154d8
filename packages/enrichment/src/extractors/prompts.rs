//! LLM prompts for field extraction.
//!
//! Both prompts ask for the same JSON shape; the corroborated prompt demands
//! several independent evidence passages per value.

use crate::types::context::ExtractionContext;
use crate::types::field::{EnrichmentField, FieldSchema};

/// System prompt for single-pass extraction.
pub const EXTRACT_SYSTEM_PROMPT: &str = r#"You extract structured company data from web content.

Rules:
1. Only report values that are EXPLICITLY stated in the content
2. If a value is not stated, leave the field out entirely - never guess
3. Each value must come with the exact quote it was taken from and that quote's URL
4. Use the context to tell the target company apart from companies with similar names
5. Confidence is 0.0 to 1.0: how clearly the content states the value

Respond with JSON only."#;

/// System prompt for corroborated extraction.
pub const CORROBORATE_SYSTEM_PROMPT: &str = r#"You extract structured company data from web content, backed by evidence.

Rules:
1. Only report values that are EXPLICITLY stated in the content
2. For every value, list up to {max_evidence} evidence passages, each an exact quote copied verbatim from the content together with the URL it appears under
3. Prefer evidence from different sources; passages that repeat one source count once
4. If no passage supports a value, leave the field out entirely - never guess
5. If sources disagree, report the value best supported by evidence and lower the confidence
6. Use the context to tell the target company apart from companies with similar names

Respond with JSON only."#;

/// User prompt template.
pub const EXTRACT_USER_PROMPT: &str = r#"Extract these fields:
{fields}

Context:
{context}

Output JSON:
{
    "fields": {
        "<field name>": {
            "value": <{shape}>,
            "confidence": 0.0 to 1.0,
            "sources": [
                {"url": "https://...", "quote": "exact text from the content"}
            ]
        }
    }
}

Content:
{content}"#;

/// System prompt for the requested mode.
pub fn system_prompt(corroborate: bool, max_evidence: usize) -> String {
    if corroborate {
        CORROBORATE_SYSTEM_PROMPT.replace("{max_evidence}", &max_evidence.to_string())
    } else {
        EXTRACT_SYSTEM_PROMPT.to_string()
    }
}

/// Format the user prompt.
pub fn format_extract_prompt(
    fields: &[EnrichmentField],
    context: &ExtractionContext,
    content: &str,
) -> String {
    let field_lines = fields
        .iter()
        .map(|f| {
            if f.description.trim().is_empty() {
                format!("- {} ({})", f.name, f.kind.json_type())
            } else {
                format!("- {} ({}): {}", f.name, f.kind.json_type(), f.description.trim())
            }
        })
        .collect::<Vec<_>>()
        .join("\n");

    let context_lines = if context.is_empty() {
        "none".to_string()
    } else {
        context
            .iter()
            .map(|(key, value)| format!("- {}: {}", key, value))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let shape = FieldSchema::from_fields(fields).to_json_shape().to_string();

    EXTRACT_USER_PROMPT
        .replace("{fields}", &field_lines)
        .replace("{context}", &context_lines)
        .replace("{shape}", &format!("value matching {}", shape))
        .replace("{content}", content)
}
