//! Phase runners.
//!
//! Each phase turns its share of the requested fields into results:
//! build queries → gather evidence → extract → post-process citations.
//! Phases read the row context but never write it; the orchestrator merges
//! their output once they return.
//!
//! Phases never fail. Provider failures and unusable extractor output
//! degrade to an empty map.

pub mod company_search;
pub mod discovery;
pub mod funding;
pub mod general;
pub mod metrics;
pub mod profile;
pub mod tech_stack;

use tracing::{debug, warn};

use crate::pipeline::budget::join_within_budget;
use crate::pipeline::gather::Gatherer;
use crate::traits::extractor::FieldExtractor;
use crate::traits::provider::CapabilityProvider;
use crate::types::config::EnrichmentConfig;
use crate::types::context::{ExtractionContext, OrchestrationContext};
use crate::types::field::EnrichmentField;
use crate::types::phase::Phase;
use crate::types::progress::{Progress, ProgressSink};
use crate::types::result::FieldResults;

/// Dependencies shared by every phase of a row.
pub struct PhaseToolkit<'a> {
    pub provider: &'a dyn CapabilityProvider,
    pub extractor: &'a dyn FieldExtractor,
    pub config: &'a EnrichmentConfig,
    pub progress: &'a dyn ProgressSink,
}

impl<'a> PhaseToolkit<'a> {
    pub fn new(
        provider: &'a dyn CapabilityProvider,
        extractor: &'a dyn FieldExtractor,
        config: &'a EnrichmentConfig,
        progress: &'a dyn ProgressSink,
    ) -> Self {
        Self {
            provider,
            extractor,
            config,
            progress,
        }
    }

    pub fn gatherer(&self) -> Gatherer<'a> {
        Gatherer::new(self.provider, self.config)
    }

    pub(crate) fn progress(&self) -> Progress<'a> {
        Progress::new(self.progress)
    }

    /// Join content chunks under the configured cap.
    pub fn budget(&self, chunks: &[String]) -> String {
        join_within_budget(chunks, self.config.content_cap, self.config.chunk_floor)
    }

    /// Run the extractor and keep only qualifying results for `fields`.
    ///
    /// Corroborated extraction is tried first when enabled; single-pass
    /// extraction is the fallback. Unusable output yields an empty map.
    pub async fn extract(
        &self,
        content: &str,
        fields: &[EnrichmentField],
        context: &ExtractionContext,
    ) -> FieldResults {
        if content.trim().is_empty() || fields.is_empty() {
            return FieldResults::new();
        }

        let raw = if self.config.corroborate {
            match self.extractor.extract_corroborated(content, fields, context).await {
                Ok(results) => Ok(results),
                Err(e) => {
                    debug!(error = %e, "corroborated extraction failed, using single pass");
                    self.extractor.extract(content, fields, context).await
                }
            }
        } else {
            self.extractor.extract(content, fields, context).await
        };

        match raw {
            Ok(results) => self.qualify(results, fields),
            Err(e) => {
                warn!(error = %e, fields = fields.len(), "extraction failed, treating as empty");
                FieldResults::new()
            }
        }
    }

    /// Drop results for unrequested fields or below the confidence floor.
    pub fn qualify(&self, results: FieldResults, fields: &[EnrichmentField]) -> FieldResults {
        results
            .into_iter()
            .filter(|(name, result)| {
                fields.iter().any(|f| &f.name == name)
                    && result.passes_threshold(self.config.min_confidence)
            })
            .map(|(name, mut result)| {
                result.field = name.clone();
                (name, result)
            })
            .collect()
    }
}

/// Run one phase.
pub async fn run_phase(
    phase: Phase,
    fields: &[EnrichmentField],
    ctx: &OrchestrationContext,
    kit: &PhaseToolkit<'_>,
) -> FieldResults {
    if fields.is_empty() {
        return FieldResults::new();
    }
    let results = match phase {
        Phase::Discovery => discovery::run(fields, ctx, kit).await,
        Phase::Profile => profile::run(fields, ctx, kit).await,
        Phase::Metrics => metrics::run(fields, ctx, kit).await,
        Phase::Funding => funding::run(fields, ctx, kit).await,
        Phase::TechStack => tech_stack::run(fields, ctx, kit).await,
        Phase::General => general::run(fields, ctx, kit).await,
    };
    // Company-type fields route to General, so the enum applies here.
    profile::restrict_company_types(results, fields)
}

/// "employeeCount" → "employee count", "year_founded" → "year founded",
/// "CEOName" → "ceo name".
pub fn humanize_field_name(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &ch) in chars.iter().enumerate() {
        if ch == '_' || ch == '-' || ch.is_whitespace() {
            if !out.ends_with(' ') && !out.is_empty() {
                out.push(' ');
            }
            continue;
        }
        if ch.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            // An acronym run ends before the capital that starts the next word.
            let next_lower = chars.get(i + 1).is_some_and(|c| c.is_lowercase());
            let boundary =
                prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_lower);
            if boundary && !out.ends_with(' ') {
                out.push(' ');
            }
        }
        out.extend(ch.to_lowercase());
    }
    out.trim().to_string()
}

/// Quote a company name for search queries.
pub(crate) fn quoted(name: &str) -> String {
    format!("\"{}\"", name.replace('"', ""))
}
