//! Discovery phase - company name, website and description.
//!
//! Everything later depends on the identity resolved here, so discovery
//! tries three strategies in order and stops at the first that yields:
//!
//! 1. the company's own website, validated against parking/placeholder pages
//! 2. web search about the domain, filtered for parked-domain noise
//! 3. inference from the domain alone, at deliberately low confidence
//!
//! When the website answers only some fields, search fills the rest.

use tracing::{debug, info};

use super::PhaseToolkit;
use crate::pipeline::citations::{attach_snippet_citations, excerpt_containing, strip_social_sources};
use crate::pipeline::fallback::FallbackChain;
use crate::pipeline::gather::content_blocks;
use crate::pipeline::website::{extract_company_name, extract_description, validate_site};
use crate::traits::provider::SearchHit;
use crate::types::config::HeuristicLists;
use crate::types::context::{is_company_name_field, OrchestrationContext};
use crate::types::email::capitalize_domain;
use crate::types::field::{EnrichmentField, FieldValue};
use crate::types::phase::Phase;
use crate::types::result::{EnrichmentResult, FieldResults, SourceContext};

pub const SITE_TARGET: &str = "company name, website, and description";

pub const INFERRED_NAME_CONFIDENCE: f64 = 0.3;
pub const INFERRED_WEBSITE_CONFIDENCE: f64 = 0.7;
pub const INFERRED_DESCRIPTION_CONFIDENCE: f64 = 0.2;

const VERIFIED_WEBSITE_CONFIDENCE: f64 = 0.95;
const SITE_DESCRIPTION_CONFIDENCE: f64 = 0.8;
const INFERENCE_SOURCE: &str = "domain inference";

/// What a discovery field asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryRole {
    Name,
    Website,
    Description,
}

impl DiscoveryRole {
    pub fn of(field: &EnrichmentField) -> Self {
        let name = field.name_lower();
        if is_company_name_field(&field.name) {
            Self::Name
        } else if name.contains("website") || name.contains("url") || name.contains("domain") {
            Self::Website
        } else if name.contains("description") || field.description_lower().contains("company description") {
            Self::Description
        } else {
            Self::Name
        }
    }
}

pub async fn run(
    fields: &[EnrichmentField],
    ctx: &OrchestrationContext,
    kit: &PhaseToolkit<'_>,
) -> FieldResults {
    let progress = kit.progress();
    if ctx.target_domain().is_none() && ctx.email_context.company_name_guess.is_none() {
        debug!(email = %ctx.email, "personal email without a company guess, skipping discovery");
        progress.warning("Company discovery: personal email address, nothing to discover");
        return FieldResults::new();
    }

    let outcome = FallbackChain::new()
        .then("website", move || Box::pin(from_website(fields, ctx, kit)))
        .then("search", move || Box::pin(from_search(fields, ctx, kit)))
        .then("domain inference", move || {
            Box::pin(async move { infer_from_domain(fields, ctx, &kit.config.heuristics) })
        })
        .run()
        .await;

    let Some(outcome) = outcome else {
        progress.warning("Company discovery: no company information found");
        return FieldResults::new();
    };
    let mut results = outcome.value;

    if outcome.strategy == "website" {
        let missing: Vec<EnrichmentField> = fields
            .iter()
            .filter(|f| !results.contains_key(&f.name))
            .cloned()
            .collect();
        if !missing.is_empty() {
            debug!(missing = missing.len(), "website left fields unresolved, searching");
            if let Some(extra) = from_search(&missing, ctx, kit).await {
                for (name, result) in extra {
                    results.entry(name).or_insert(result);
                }
            }
        }
    }

    if outcome.strategy == "domain inference" {
        progress.warning("Company discovery: nothing found, falling back to domain inference");
    } else {
        progress.success(format!(
            "Company discovery: found {} field(s) via {}",
            results.len(),
            outcome.strategy
        ));
    }
    info!(strategy = outcome.strategy, found = results.len(), "discovery complete");
    kit.qualify(results, fields)
}

/// Read and validate the company website, then fill fields heuristically.
async fn from_website(
    fields: &[EnrichmentField],
    ctx: &OrchestrationContext,
    kit: &PhaseToolkit<'_>,
) -> Option<FieldResults> {
    let domain = ctx.target_domain()?;
    let url = format!("https://{}", domain);
    kit.progress().agent(format!("Company discovery: reading {}", url));

    let content = kit.gatherer().fetch(&url, SITE_TARGET).await;
    let text = content.usable_text()?;

    let validation = validate_site(text, &kit.config.heuristics, kit.config.min_website_len);
    if !validation.is_valid() {
        info!(url = %url, ?validation, "website rejected");
        return None;
    }

    let title = content.metadata.title.as_deref();
    let mut results = FieldResults::new();
    for field in fields {
        let result = match DiscoveryRole::of(field) {
            DiscoveryRole::Name => {
                let (name, source) = extract_company_name(text, title, domain, &kit.config.heuristics);
                let quote = excerpt_containing(text, &name).unwrap_or_else(|| opening(text));
                EnrichmentResult::new(field.name.clone(), FieldValue::Text(name), source.confidence())
                    .with_source_context(vec![SourceContext::new(url.clone(), quote)])
            }
            DiscoveryRole::Website => EnrichmentResult::new(
                field.name.clone(),
                FieldValue::Text(url.clone()),
                VERIFIED_WEBSITE_CONFIDENCE,
            )
            .with_source_context(vec![SourceContext::new(url.clone(), opening(text))]),
            DiscoveryRole::Description => match extract_description(text) {
                Some(description) => EnrichmentResult::new(
                    field.name.clone(),
                    FieldValue::Text(description.clone()),
                    SITE_DESCRIPTION_CONFIDENCE,
                )
                .with_source_context(vec![SourceContext::new(url.clone(), description)]),
                None => continue,
            },
        };
        results.insert(field.name.clone(), result);
    }
    Some(results)
}

/// Ordered discovery queries for the row.
pub fn search_queries(ctx: &OrchestrationContext) -> Vec<String> {
    let mut queries = Vec::new();
    if let Some(domain) = ctx.target_domain() {
        queries.push(format!("\"{}\" official website", domain));
        queries.push(format!("site:{} about", domain));
    }
    if let Some(guess) = &ctx.email_context.company_name_guess {
        queries.push(format!("\"{}\" company", guess));
    }
    if let Some(domain) = ctx.target_domain() {
        queries.push(format!("{} company", ctx.email_context.domain_stem()));
        queries.push(format!("email domain {} company information", domain));
    }
    queries
}

/// Whether a search hit is worth keeping.
pub fn is_usable_hit(hit: &SearchHit, lists: &HeuristicLists, min_snippet_len: usize) -> bool {
    hit.snippet.trim().chars().count() >= min_snippet_len
        && lists
            .parking_phrase_in(&format!("{} {}", hit.title, hit.snippet))
            .is_none()
}

/// Search about the domain and extract from the snippets.
///
/// `None` when no usable hits remain after filtering.
async fn from_search(
    fields: &[EnrichmentField],
    ctx: &OrchestrationContext,
    kit: &PhaseToolkit<'_>,
) -> Option<FieldResults> {
    let queries = search_queries(ctx);
    if queries.is_empty() {
        return None;
    }
    kit.progress().agent("Company discovery: searching the web");

    let lists = &kit.config.heuristics;
    let min_len = kit.config.min_snippet_len;
    let hits = kit
        .gatherer()
        .search_until(
            &queries,
            Some(SITE_TARGET),
            kit.config.discovery_target_results,
            |hit| is_usable_hit(hit, lists, min_len),
        )
        .await;
    if hits.is_empty() {
        info!(queries = queries.len(), "discovery search found nothing usable");
        return None;
    }

    let mut context = ctx.extraction_context();
    let subject = ctx
        .target_domain()
        .map(|d| format!("the company that owns the domain {}", d))
        .or_else(|| ctx.email_context.company_name_guess.as_ref().map(|g| format!("the company {}", g)))
        .unwrap_or_else(|| "the target company".to_string());
    context.insert(
        "instructions".to_string(),
        format!("Only extract information about {}. Ignore other companies with similar names.", subject),
    );

    let content = kit.budget(&content_blocks(&hits));
    let mut results = kit.extract(&content, fields, &context).await;
    strip_social_sources(&mut results, lists);
    attach_snippet_citations(&mut results, &hits, lists);
    Some(results)
}

/// Last resort: derive identity from the domain alone.
///
/// Every value is tagged as inferred and scored below verified data.
pub fn infer_from_domain(
    fields: &[EnrichmentField],
    ctx: &OrchestrationContext,
    lists: &HeuristicLists,
) -> Option<FieldResults> {
    let domain = ctx.target_domain()?;
    let mut results = FieldResults::new();
    for field in fields {
        let (value, confidence) = match DiscoveryRole::of(field) {
            DiscoveryRole::Name => (capitalize_domain(domain, lists), INFERRED_NAME_CONFIDENCE),
            DiscoveryRole::Website => (format!("https://{}", domain), INFERRED_WEBSITE_CONFIDENCE),
            DiscoveryRole::Description => (
                format!("Company operating the {} domain", domain),
                INFERRED_DESCRIPTION_CONFIDENCE,
            ),
        };
        results.insert(
            field.name.clone(),
            EnrichmentResult::new(field.name.clone(), FieldValue::Text(value), confidence)
                .with_source(INFERENCE_SOURCE)
                .inferred(),
        );
    }
    debug!(phase = %Phase::Discovery, domain = %domain, "inferred identity from domain");
    Some(results)
}

/// First 200 characters of page text, for citations.
fn opening(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    match collapsed.char_indices().nth(200) {
        Some((idx, _)) => collapsed[..idx].to_string(),
        None => collapsed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::email::parse_email;

    fn ctx(email: &str) -> OrchestrationContext {
        OrchestrationContext::new(parse_email(email, &HeuristicLists::default()).unwrap())
    }

    #[test]
    fn test_roles() {
        assert_eq!(DiscoveryRole::of(&EnrichmentField::text("companyName", "")), DiscoveryRole::Name);
        assert_eq!(DiscoveryRole::of(&EnrichmentField::text("website", "")), DiscoveryRole::Website);
        assert_eq!(
            DiscoveryRole::of(&EnrichmentField::text("companyDescription", "")),
            DiscoveryRole::Description
        );
        assert_eq!(
            DiscoveryRole::of(&EnrichmentField::text("brand", "the company name")),
            DiscoveryRole::Name
        );
    }

    #[test]
    fn test_query_order() {
        let queries = search_queries(&ctx("info@acme-robotics.com"));
        assert_eq!(
            queries,
            vec![
                "\"acme-robotics.com\" official website",
                "site:acme-robotics.com about",
                "\"Acme Robotics\" company",
                "acme-robotics company",
                "email domain acme-robotics.com company information",
            ]
        );
        assert!(search_queries(&ctx("test@gmail.com")).is_empty());
    }

    #[test]
    fn test_usable_hit_filter() {
        let lists = HeuristicLists::default();
        let good =
            SearchHit::new("https://a.com", "Acme", "Acme Robotics builds picking robots for retailers.");
        let short = SearchHit::new("https://a.com", "Acme", "Acme");
        let parked = SearchHit::new(
            "https://a.com",
            "acme.com is for sale",
            "This domain is for sale. Buy this domain now!",
        );
        assert!(is_usable_hit(&good, &lists, 30));
        assert!(!is_usable_hit(&short, &lists, 30));
        assert!(!is_usable_hit(&parked, &lists, 30));
    }

    #[test]
    fn test_domain_inference_is_marked() {
        let fields = vec![
            EnrichmentField::text("companyName", ""),
            EnrichmentField::text("website", ""),
            EnrichmentField::text("companyDescription", ""),
        ];
        let row = ctx("someone@nonexistent-domain-xyz123.com");
        let results = infer_from_domain(&fields, &row, &HeuristicLists::default()).unwrap();

        let name = &results["companyName"];
        assert!(name.inferred);
        assert!(name.confidence < 0.5);
        assert_eq!(name.value, FieldValue::Text("Nonexistent Domain Xyz123".into()));

        let website = &results["website"];
        assert!(website.confidence < 1.0);
        assert_eq!(website.value, FieldValue::Text("https://nonexistent-domain-xyz123.com".into()));
        assert!(results.values().all(|r| r.source == "domain inference"));
    }

    #[test]
    fn test_no_inference_without_domain() {
        let fields = vec![EnrichmentField::text("companyName", "")];
        assert!(infer_from_domain(&fields, &ctx("test@gmail.com"), &HeuristicLists::default()).is_none());
    }
}
