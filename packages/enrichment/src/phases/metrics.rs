//! Metrics phase - headcount and revenue.

use chrono::Datelike;

use super::company_search::search_company_topic;
use super::PhaseToolkit;
use crate::types::context::OrchestrationContext;
use crate::types::field::{EnrichmentField, FieldValue};
use crate::types::phase::Phase;
use crate::types::result::FieldResults;

pub const BASE_KEYWORDS: &str = "employees team size revenue annual revenue ARR MRR";

/// Metric keywords pinned to the current and prior year.
pub fn keywords(current_year: i32) -> String {
    format!("{} {} {}", BASE_KEYWORDS, current_year, current_year - 1)
}

pub async fn run(
    fields: &[EnrichmentField],
    ctx: &OrchestrationContext,
    kit: &PhaseToolkit<'_>,
) -> FieldResults {
    let keywords = keywords(chrono::Utc::now().year());
    let search = search_company_topic(Phase::Metrics, &keywords, fields, ctx, kit).await;
    drop_negative_numbers(search.results)
}

/// Headcounts and revenues are never negative.
fn drop_negative_numbers(results: FieldResults) -> FieldResults {
    results
        .into_iter()
        .filter(|(_, result)| !matches!(result.value, FieldValue::Number(n) if n < 0.0))
        .collect()
}
