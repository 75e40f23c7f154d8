//! Shared search → extract flow for the company-topic phases.
//!
//! Profile, Metrics and Funding each issue one domain-qualified query for the
//! resolved company, extract from the result snippets, then clean up the
//! citations. They differ only in keywords and field validation.

use tracing::{debug, info};

use super::{quoted, PhaseToolkit};
use crate::pipeline::citations::{attach_snippet_citations, strip_social_sources};
use crate::pipeline::gather::content_blocks;
use crate::traits::provider::SearchHit;
use crate::types::context::OrchestrationContext;
use crate::types::field::EnrichmentField;
use crate::types::phase::Phase;
use crate::types::result::FieldResults;

/// Output of a company search.
#[derive(Debug, Default)]
pub struct CompanySearch {
    pub results: FieldResults,

    /// Hits the results were extracted from; empty when no search ran or
    /// the search found nothing
    pub hits: Vec<SearchHit>,
}

/// The query for a topic: quoted company name, domain, then keywords.
pub fn build_query(company_name: &str, domain: Option<&str>, keywords: &str) -> String {
    let mut parts = vec![quoted(company_name)];
    if let Some(domain) = domain {
        parts.push(domain.to_string());
    }
    parts.push(keywords.to_string());
    parts.join(" ")
}

/// Search for a topic and extract `fields` from the snippets.
///
/// A no-op when the row has no resolvable company name.
pub async fn search_company_topic(
    phase: Phase,
    keywords: &str,
    fields: &[EnrichmentField],
    ctx: &OrchestrationContext,
    kit: &PhaseToolkit<'_>,
) -> CompanySearch {
    let progress = kit.progress();
    let Some(company_name) = ctx.resolve_company_name() else {
        debug!(phase = %phase, "no company name resolved, skipping search");
        progress.warning(format!("{}: no company name available, skipping", phase.label()));
        return CompanySearch::default();
    };

    let query = build_query(&company_name, ctx.target_domain(), keywords);
    progress.agent(format!("{}: searching for {}", phase.label(), company_name));

    let hits = kit.gatherer().search(&query, Some(keywords)).await;
    if hits.is_empty() {
        info!(phase = %phase, company = %company_name, "no search results");
        progress.warning(format!("{}: no search results", phase.label()));
        return CompanySearch::default();
    }

    let content = kit.budget(&content_blocks(&hits));
    let mut results = kit.extract(&content, fields, &ctx.extraction_context()).await;

    strip_social_sources(&mut results, &kit.config.heuristics);
    attach_snippet_citations(&mut results, &hits, &kit.config.heuristics);

    info!(
        phase = %phase,
        company = %company_name,
        hits = hits.len(),
        found = results.len(),
        "company topic search complete"
    );

    CompanySearch { results, hits }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_is_domain_qualified() {
        assert_eq!(
            build_query("Wiz", Some("wiz.io"), "funding raised"),
            "\"Wiz\" wiz.io funding raised"
        );
        assert_eq!(build_query("Acme \"Co\"", None, "x"), "\"Acme Co\" x");
    }
}
