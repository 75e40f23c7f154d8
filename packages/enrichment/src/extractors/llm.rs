//! LLM-backed Extraction Engine.

use async_trait::async_trait;
use tracing::{debug, warn};

use super::prompts::{format_extract_prompt, system_prompt};
use super::response::{parse_response, score, verify_sources};
use crate::error::Result;
use crate::traits::ai::ChatModel;
use crate::traits::extractor::FieldExtractor;
use crate::types::context::ExtractionContext;
use crate::types::field::{EnrichmentField, FieldSchema};
use crate::types::result::{EnrichmentResult, FieldResults, MAX_SOURCE_CONTEXTS};

/// Extraction Engine over any [`ChatModel`].
///
/// # Example
///
/// ```rust,ignore
/// use enrichment::ai::OpenAI;
/// use enrichment::extractors::LlmExtractor;
///
/// let extractor = LlmExtractor::new(OpenAI::from_env()?);
/// let results = extractor.extract_corroborated(&content, &fields, &context).await?;
/// ```
pub struct LlmExtractor<M: ChatModel> {
    model: M,
    max_evidence: usize,
}

impl<M: ChatModel> LlmExtractor<M> {
    pub fn new(model: M) -> Self {
        Self {
            model,
            max_evidence: MAX_SOURCE_CONTEXTS,
        }
    }

    /// Evidence passages requested per field in corroborated mode.
    pub fn with_max_evidence(mut self, max: usize) -> Self {
        self.max_evidence = max.clamp(1, MAX_SOURCE_CONTEXTS);
        self
    }

    async fn run(
        &self,
        content: &str,
        fields: &[EnrichmentField],
        context: &ExtractionContext,
        corroborate: bool,
    ) -> Result<FieldResults> {
        let schema = FieldSchema::from_fields(fields);
        let system = system_prompt(corroborate, self.max_evidence);
        let user = format_extract_prompt(fields, context, content);

        let response = self.model.complete_json(&system, &user).await?;
        let answers = parse_response(&response)?;

        let mut results = FieldResults::new();
        for (name, answer) in answers {
            if !schema.contains(&name) {
                debug!(field = %name, "ignoring unrequested field");
                continue;
            }
            let Some(value) = schema.coerce(&name, &answer.value) else {
                continue;
            };

            let verified = verify_sources(&answer.sources, content);
            if verified.len() < answer.sources.len() {
                warn!(
                    field = %name,
                    claimed = answer.sources.len(),
                    verified = verified.len(),
                    "dropped evidence not found in content"
                );
            }
            let Some(confidence) = score(answer.confidence, &verified, corroborate) else {
                debug!(field = %name, "no verified evidence, rejecting value");
                continue;
            };

            let result = EnrichmentResult::new(name.clone(), value, confidence).with_source_context(verified);
            results.insert(name, result);
        }

        debug!(
            model = self.model.model_name(),
            corroborate,
            requested = fields.len(),
            found = results.len(),
            "extraction complete"
        );
        Ok(results)
    }
}

#[async_trait]
impl<M: ChatModel> FieldExtractor for LlmExtractor<M> {
    async fn extract(
        &self,
        content: &str,
        fields: &[EnrichmentField],
        context: &ExtractionContext,
    ) -> Result<FieldResults> {
        self.run(content, fields, context, false).await
    }

    async fn extract_corroborated(
        &self,
        content: &str,
        fields: &[EnrichmentField],
        context: &ExtractionContext,
    ) -> Result<FieldResults> {
        self.run(content, fields, context, true).await
    }
}
