//! Citation post-processing applied to extractor output.
//!
//! - social network URLs are stripped from sources
//! - fields without evidence get a best-effort citation from search snippets
//! - GitHub citations must come from the GitHub search that ran for the row

use std::collections::HashSet;

use crate::traits::provider::SearchHit;
use crate::types::config::HeuristicLists;
use crate::types::result::{EnrichmentResult, FieldResults, SourceContext};

const MAX_EXCERPT_CHARS: usize = 300;

/// Remove social network URLs from every result's sources.
pub fn strip_social_sources(results: &mut FieldResults, lists: &HeuristicLists) {
    for result in results.values_mut() {
        retain_sources(result, |url| !lists.is_social_url(url));
    }
}

/// Give every result without evidence a citation drawn from the hits.
///
/// Prefers the sentence of a snippet that mentions the value; falls back to
/// the first usable snippet verbatim. Social hits are never cited.
pub fn attach_snippet_citations(results: &mut FieldResults, hits: &[SearchHit], lists: &HeuristicLists) {
    let candidates: Vec<&SearchHit> = hits
        .iter()
        .filter(|hit| !lists.is_social_url(&hit.url) && !hit.snippet.trim().is_empty())
        .collect();
    if candidates.is_empty() {
        return;
    }

    for result in results.values_mut() {
        if !result.source_context.is_empty() {
            continue;
        }
        let needles = value_needles(result);
        let matched = candidates.iter().find_map(|hit| {
            needles
                .iter()
                .find_map(|needle| excerpt_containing(&hit.snippet, needle))
                .map(|excerpt| SourceContext::new(hit.url.clone(), excerpt))
        });

        let citation = matched.unwrap_or_else(|| {
            let hit = candidates[0];
            SourceContext::new(hit.url.clone(), truncate(&hit.snippet))
        });
        result.set_source_context(vec![citation]);
    }
}

/// Drop GitHub citations that did not come from the row's GitHub search.
pub fn enforce_github_integrity(results: &mut FieldResults, valid_urls: &HashSet<String>) {
    for result in results.values_mut() {
        retain_sources(result, |url| !is_github_url(url) || valid_urls.contains(url));
    }
}

pub fn is_github_url(url: &str) -> bool {
    url.to_lowercase().contains("github.com")
}

/// Keep only sources whose URL passes `keep`, in both `source_context` and `source`.
fn retain_sources<F>(result: &mut EnrichmentResult, keep: F)
where
    F: Fn(&str) -> bool,
{
    let contexts: Vec<SourceContext> = result
        .source_context
        .iter()
        .filter(|c| keep(c.url.as_str()))
        .cloned()
        .collect();
    let source = result
        .source
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty() && (!part.contains("://") || keep(*part)))
        .collect::<Vec<_>>()
        .join(", ");

    result.source_context.clear();
    result.source = source;
    result.set_source_context(contexts);
}

fn value_needles(result: &EnrichmentResult) -> Vec<String> {
    let mut needles = match result.value.as_list() {
        Some(items) => items.to_vec(),
        None => vec![result.value.display_string()],
    };
    needles.retain(|n| n.trim().chars().count() >= 2);
    needles
}

/// The sentence of `text` mentioning `needle`, case-insensitively.
pub(crate) fn excerpt_containing(text: &str, needle: &str) -> Option<String> {
    let needle = needle.trim().to_lowercase();
    if !text.to_lowercase().contains(&needle) {
        return None;
    }
    let sentence = split_sentences(text)
        .into_iter()
        .find(|s| s.to_lowercase().contains(&needle))
        .unwrap_or(text);
    Some(truncate(sentence.trim()))
}

fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    for (idx, ch) in text.char_indices() {
        if matches!(ch, '.' | '!' | '?' | '\n') {
            let next = idx + ch.len_utf8();
            let at_boundary = text[next..].chars().next().map_or(true, char::is_whitespace);
            if at_boundary {
                sentences.push(&text[start..next]);
                start = next;
            }
        }
    }
    if start < text.len() {
        sentences.push(&text[start..]);
    }
    sentences.into_iter().filter(|s| !s.trim().is_empty()).collect()
}

fn truncate(text: &str) -> String {
    match text.char_indices().nth(MAX_EXCERPT_CHARS) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::field::FieldValue;

    fn text_result(field: &str, value: &str) -> EnrichmentResult {
        EnrichmentResult::new(field, FieldValue::Text(value.to_string()), 0.8)
    }

    #[test]
    fn test_social_sources_removed() {
        let mut results = FieldResults::new();
        results.insert(
            "industry".into(),
            text_result("industry", "Security").with_source_context(vec![
                SourceContext::new("https://www.linkedin.com/company/wiz", "Wiz | Security"),
                SourceContext::new("https://wiz.io/about", "Wiz is a cloud security company."),
            ]),
        );

        strip_social_sources(&mut results, &HeuristicLists::default());

        let result = &results["industry"];
        assert_eq!(result.source_context.len(), 1);
        assert_eq!(result.source, "https://wiz.io/about");
    }

    #[test]
    fn test_snippet_citation_prefers_matching_sentence() {
        let hits = vec![
            SearchHit::new("https://news.com/a", "A", "Unrelated opening. Something else entirely."),
            SearchHit::new(
                "https://news.com/b",
                "B",
                "Wiz was founded in 2020. It is headquartered in New York.",
            ),
        ];
        let mut results = FieldResults::new();
        results.insert("headquarters".into(), text_result("headquarters", "New York"));

        attach_snippet_citations(&mut results, &hits, &HeuristicLists::default());

        let ctx = &results["headquarters"].source_context;
        assert_eq!(ctx.len(), 1);
        assert_eq!(ctx[0].url, "https://news.com/b");
        assert_eq!(ctx[0].snippet, "It is headquartered in New York.");
    }

    #[test]
    fn test_snippet_citation_falls_back_to_raw_snippet() {
        let hits = vec![SearchHit::new("https://news.com/a", "A", "General company news.")];
        let mut results = FieldResults::new();
        results.insert("industry".into(), text_result("industry", "Fintech"));

        attach_snippet_citations(&mut results, &hits, &HeuristicLists::default());

        assert_eq!(results["industry"].source_context[0].snippet, "General company news.");
        assert_eq!(results["industry"].source, "https://news.com/a");
    }

    #[test]
    fn test_existing_citations_are_kept() {
        let hits = vec![SearchHit::new("https://news.com/a", "A", "Fintech news.")];
        let mut results = FieldResults::new();
        results.insert(
            "industry".into(),
            text_result("industry", "Fintech")
                .with_source_context(vec![SourceContext::new("https://x.com/y", "q")]),
        );
        attach_snippet_citations(&mut results, &hits, &HeuristicLists::default());
        assert_eq!(results["industry"].source_context[0].url, "https://x.com/y");
    }

    #[test]
    fn test_github_integrity_drops_unknown_links() {
        let valid: HashSet<String> = ["https://github.com/wiz-sec/tool".to_string()].into();
        let mut results = FieldResults::new();
        results.insert(
            "techStack".into(),
            EnrichmentResult::new("techStack", FieldValue::List(vec!["Go".into()]), 0.8)
                .with_source_context(vec![
                    SourceContext::new("https://github.com/wiz-sec/tool", "written in Go"),
                    SourceContext::new("https://github.com/invented/repo", "Go service"),
                    SourceContext::new("https://wiz.io/blog", "our Go backend"),
                ]),
        );

        enforce_github_integrity(&mut results, &valid);

        let urls = results["techStack"].source_urls();
        assert_eq!(urls, vec!["https://github.com/wiz-sec/tool", "https://wiz.io/blog"]);
        assert!(!results["techStack"].source.contains("invented"));
    }
}
