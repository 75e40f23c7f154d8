//! General phase - executives and arbitrary caller-defined fields.
//!
//! Fields naming a leadership title (CEO, founder, director, ...) are looked
//! up together with a leadership query, plus a fetch of the company's own
//! team pages. Every other field gets a query built from its own name and
//! the salient words of its description.

use tracing::{debug, info};

use super::{humanize_field_name, quoted, PhaseToolkit};
use crate::pipeline::budget::cap_content;
use crate::pipeline::citations::{attach_snippet_citations, strip_social_sources};
use crate::pipeline::gather::{content_blocks, dedupe_by_url};
use crate::traits::provider::SearchHit;
use crate::types::config::{ExecutiveTitle, HeuristicLists};
use crate::types::context::OrchestrationContext;
use crate::types::field::EnrichmentField;
use crate::types::result::FieldResults;

/// Most description keywords added to a custom field's query.
const MAX_DESCRIPTION_KEYWORDS: usize = 3;

/// Characters kept from a fetched team page.
const TEAM_PAGE_CHARS: usize = 20_000;

const STOPWORDS: &[&str] = &[
    "this", "that", "with", "from", "have", "what", "which", "their", "there", "they", "them",
    "were", "will", "would", "should", "could", "about", "into", "than", "then", "when", "where",
    "does", "each", "such", "other", "some", "company", "companys", "field", "value", "name",
    "list", "provide", "include", "including", "whether", "also", "more", "most", "very",
];

/// Leadership titles mentioned in `text`, strongest first.
///
/// Matching is on whole words, so "director" does not match "cto".
pub fn executive_titles_in<'a>(text: &str, lists: &'a HeuristicLists) -> Vec<&'a ExecutiveTitle> {
    let words = tokenize(text);
    let mut found: Vec<&ExecutiveTitle> = lists
        .executive_titles
        .iter()
        .filter(|title| {
            let keyword: Vec<&str> = title.keyword.split_whitespace().collect();
            !keyword.is_empty() && words.windows(keyword.len()).any(|w| w == keyword.as_slice())
        })
        .collect();
    found.sort_by_key(|t| t.seniority);
    found
}

/// Whether a field asks for a leadership role.
pub fn is_executive_field(field: &EnrichmentField, lists: &HeuristicLists) -> bool {
    let text = format!("{} {}", field.name, field.description);
    !executive_titles_in(&text, lists).is_empty()
}

/// Lowercase words, splitting camelCase and punctuation.
fn tokenize(text: &str) -> Vec<String> {
    humanize_field_name(text)
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// Up to three salient words from a field description.
pub fn description_keywords(description: &str) -> Vec<String> {
    let mut keywords: Vec<String> = Vec::new();
    for word in description
        .split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
    {
        if word.chars().count() > 3 && !STOPWORDS.contains(&word.as_str()) && !keywords.contains(&word) {
            keywords.push(word);
        }
        if keywords.len() == MAX_DESCRIPTION_KEYWORDS {
            break;
        }
    }
    keywords
}

/// Queries for executive fields.
pub fn executive_queries(company: &str, domain: Option<&str>, titles: &[&ExecutiveTitle]) -> Vec<String> {
    let mut title_names: Vec<&str> = Vec::new();
    for title in titles {
        if !title_names.contains(&title.title.as_str()) {
            title_names.push(&title.title);
        }
    }

    let mut queries = vec![format!(
        "{} leadership team executives {}",
        quoted(company),
        title_names.join(" ")
    )
    .trim()
    .to_string()];
    if let Some(domain) = domain {
        queries.push(format!("site:{} team leadership about", domain));
    }
    queries
}

/// Query for a custom field.
pub fn custom_field_query(company: &str, field: &EnrichmentField) -> String {
    let mut parts = vec![quoted(company), humanize_field_name(&field.name)];
    parts.extend(description_keywords(&field.description));
    parts.join(" ")
}

pub async fn run(
    fields: &[EnrichmentField],
    ctx: &OrchestrationContext,
    kit: &PhaseToolkit<'_>,
) -> FieldResults {
    let progress = kit.progress();
    let lists = &kit.config.heuristics;
    let Some(company) = ctx.resolve_company_name() else {
        debug!("no company name resolved, skipping general fields");
        progress.warning("Additional fields: no company name available, skipping");
        return FieldResults::new();
    };
    let domain = ctx.target_domain();

    let (executive, other): (Vec<&EnrichmentField>, Vec<&EnrichmentField>) =
        fields.iter().partition(|f| is_executive_field(f, lists));

    let mut queries = Vec::new();
    if !executive.is_empty() {
        let mut titles: Vec<&ExecutiveTitle> = executive
            .iter()
            .flat_map(|f| executive_titles_in(&format!("{} {}", f.name, f.description), lists))
            .collect();
        titles.sort_by_key(|t| t.seniority);
        queries.extend(executive_queries(&company, domain, &titles));
    }
    queries.extend(other.iter().map(|f| custom_field_query(&company, f)));

    progress.agent(format!(
        "Additional fields: {} executive, {} custom for {}",
        executive.len(),
        other.len(),
        company
    ));

    let gatherer = kit.gatherer();
    let mut hits = gatherer.search_all(&queries, None).await;

    if !executive.is_empty() {
        if let Some(domain) = domain {
            let urls: Vec<String> = lists
                .leadership_paths
                .iter()
                .map(|path| format!("https://{}{}", domain, path))
                .collect();
            let target = "leadership team names and titles";
            if let Some((url, text)) = gatherer.fetch_first(&urls, target).await {
                debug!(url = %url, "leadership page found");
                let snippet = cap_content(&text, TEAM_PAGE_CHARS);
                hits.push(SearchHit::new(url, "Company team page", snippet));
            }
        }
    }

    let hits = dedupe_by_url(hits);
    if hits.is_empty() {
        info!(company = %company, "no results for general fields");
        progress.warning("Additional fields: no search results");
        return FieldResults::new();
    }

    let mut context = ctx.extraction_context();
    context.insert(
        "instructions".to_string(),
        "For executive roles, only report a person whose stated title matches the requested role exactly. \
         For all other fields, only report values explicitly stated in the content."
            .to_string(),
    );

    let content = kit.budget(&content_blocks(&hits));
    let mut results = kit.extract(&content, fields, &context).await;
    strip_social_sources(&mut results, lists);
    attach_snippet_citations(&mut results, &hits, lists);

    info!(company = %company, hits = hits.len(), found = results.len(), "general fields complete");
    results
}
