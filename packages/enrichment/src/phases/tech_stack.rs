//! TechStack phase - technologies, languages, frameworks, GitHub presence.
//!
//! Evidence comes from three independent sources gathered concurrently:
//! a GitHub-scoped search, a technology summary of the company website, and
//! a search for explicit "built with" mentions. Any GitHub link cited in the
//! output must be one the GitHub search actually returned.

use std::collections::HashSet;

use tracing::{debug, info};

use super::{quoted, PhaseToolkit};
use crate::pipeline::citations::{
    attach_snippet_citations, enforce_github_integrity, is_github_url, strip_social_sources,
};
use crate::pipeline::gather::content_blocks;
use crate::traits::provider::SearchHit;
use crate::types::config::HeuristicLists;
use crate::types::context::OrchestrationContext;
use crate::types::field::{EnrichmentField, FieldValue};
use crate::types::phase::Phase;
use crate::types::result::FieldResults;

pub const WEBSITE_TARGET: &str = "technologies used";

const MENTION_KEYWORDS: &str = "\"built with\" OR \"powered by\" OR \"tech stack\"";

pub async fn run(
    fields: &[EnrichmentField],
    ctx: &OrchestrationContext,
    kit: &PhaseToolkit<'_>,
) -> FieldResults {
    let progress = kit.progress();
    let domain = ctx.target_domain();
    let subject = ctx
        .resolve_company_name()
        .or_else(|| domain.map(|_| ctx.email_context.domain_stem().to_string()));
    let Some(subject) = subject else {
        debug!("no company name or domain, skipping tech stack");
        progress.warning("Tech stack: no company name or domain available, skipping");
        return FieldResults::new();
    };

    progress.agent(format!("Tech stack: checking GitHub, website and mentions for {}", subject));

    let gatherer = kit.gatherer();
    let github_query = format!("site:github.com {}", quoted(&subject));
    let mention_query = format!("{} {}", quoted(&subject), MENTION_KEYWORDS);
    let site_url = domain.map(|d| format!("https://{}", d));

    let (github_hits, mention_hits, site_text) = tokio::join!(
        gatherer.search(&github_query, Some("GitHub repositories and organization")),
        gatherer.search(&mention_query, Some("technology stack mentions")),
        async {
            match &site_url {
                Some(url) => gatherer
                    .fetch(url, WEBSITE_TARGET)
                    .await
                    .usable_text()
                    .map(str::to_string),
                None => None,
            }
        }
    );

    let github_hits: Vec<SearchHit> = github_hits.into_iter().filter(|h| is_github_url(&h.url)).collect();
    let valid_github: HashSet<String> = github_hits.iter().map(|h| h.url.clone()).collect();

    let mut chunks = Vec::new();
    if let (Some(url), Some(text)) = (&site_url, &site_text) {
        chunks.push(format!("Company website technology summary ({}):\n{}", url, text));
    }
    chunks.extend(content_blocks(&github_hits));
    chunks.extend(content_blocks(&mention_hits));

    if chunks.is_empty() {
        info!(subject = %subject, "no tech stack evidence found");
        progress.warning("Tech stack: no evidence found");
        return FieldResults::new();
    }

    let mut context = ctx.extraction_context();
    context.insert(
        "validGithubUrls".to_string(),
        if valid_github.is_empty() {
            "none".to_string()
        } else {
            let mut urls: Vec<&str> = valid_github.iter().map(String::as_str).collect();
            urls.sort_unstable();
            urls.join(", ")
        },
    );
    context.insert(
        "instructions".to_string(),
        "Only cite GitHub URLs from validGithubUrls; any other GitHub link is invalid.".to_string(),
    );

    let content = kit.budget(&chunks);
    let results = kit.extract(&content, fields, &context).await;

    let mut evidence = github_hits;
    evidence.extend(mention_hits);
    let results = post_process(results, &evidence, &valid_github, &kit.config.heuristics);

    info!(subject = %subject, found = results.len(), github = valid_github.len(), "tech stack complete");
    results
}

/// Citation cleanup, GitHub integrity and list filtering.
pub fn post_process(
    mut results: FieldResults,
    evidence: &[SearchHit],
    valid_github: &HashSet<String>,
    lists: &HeuristicLists,
) -> FieldResults {
    strip_social_sources(&mut results, lists);
    attach_snippet_citations(&mut results, evidence, lists);
    enforce_github_integrity(&mut results, valid_github);

    results
        .into_iter()
        .filter_map(|(name, mut result)| {
            if let FieldValue::List(items) = &result.value {
                let kept = filter_technologies(items, lists);
                if kept.is_empty() {
                    return None;
                }
                result.value = FieldValue::List(kept);
            }
            if let FieldValue::Text(url) = &result.value {
                if is_github_url(url) && !valid_github.contains(url.trim()) {
                    return None;
                }
            }
            Some((name, result))
        })
        .collect()
}

/// Drop generic terms, single characters and duplicates.
pub fn filter_technologies(items: &[String], lists: &HeuristicLists) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .iter()
        .map(|item| item.trim())
        .filter(|item| item.chars().count() > 1 && !lists.is_generic_tech(item))
        .filter(|item| seen.insert(item.to_lowercase()))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::result::{EnrichmentResult, SourceContext};

    #[test]
    fn test_generic_terms_and_single_chars_removed() {
        let items: Vec<String> = ["Rust", "web", "C", "Platform", "Kubernetes", "rust", "R2"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(
            filter_technologies(&items, &HeuristicLists::default()),
            vec!["Rust", "Kubernetes", "R2"]
        );
    }

    #[test]
    fn test_post_process_drops_invented_github_links() {
        let valid: HashSet<String> = ["https://github.com/acme/api".to_string()].into();
        let mut results = FieldResults::new();
        results.insert(
            "techStack".into(),
            EnrichmentResult::new(
                "techStack",
                FieldValue::List(vec!["Go".into(), "software".into()]),
                0.8,
            )
            .with_source_context(vec![
                SourceContext::new("https://github.com/acme/api", "written in Go"),
                SourceContext::new("https://github.com/made-up/repo", "Go"),
            ]),
        );
        results.insert(
            "githubUrl".into(),
            EnrichmentResult::new("githubUrl", FieldValue::Text("https://github.com/fake".into()), 0.9),
        );

        let out = post_process(results, &[], &valid, &HeuristicLists::default());

        assert!(!out.contains_key("githubUrl"));
        let tech = &out["techStack"];
        assert_eq!(tech.value, FieldValue::List(vec!["Go".into()]));
        assert!(tech
            .source_context
            .iter()
            .all(|c| !is_github_url(&c.url) || valid.contains(&c.url)));
    }

    #[test]
    fn test_list_of_only_generic_terms_is_dropped() {
        let mut results = FieldResults::new();
        results.insert(
            "technologies".into(),
            EnrichmentResult::new("technologies", FieldValue::List(vec!["website".into()]), 0.8),
        );
        let out = post_process(results, &[], &HashSet::new(), &HeuristicLists::default());
        assert!(out.is_empty());
    }
}
