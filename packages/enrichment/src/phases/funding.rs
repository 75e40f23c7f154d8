//! Funding phase - stage, amounts, investors, valuation.
//!
//! Stage fields are normalized to [`FundingStage`]. When the search returned
//! evidence and no round could be identified in it, the stage resolves to
//! `Bootstrapped`. An empty or failed search leaves the stage out.

use super::company_search::search_company_topic;
use super::PhaseToolkit;
use crate::types::context::OrchestrationContext;
use crate::types::field::{EnrichmentField, FieldValue};
use crate::types::phase::Phase;
use crate::types::result::{EnrichmentResult, FieldResults};

pub const KEYWORDS: &str = "funding raised series investment total funding valuation investors";

/// Confidence attached to a `Bootstrapped` stage that was not stated anywhere.
pub const NO_ROUND_CONFIDENCE: f64 = 0.3;

/// Funding stages, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FundingStage {
    PreSeed,
    Seed,
    SeriesA,
    SeriesB,
    SeriesC,
    SeriesD,
    SeriesEPlus,
    Ipo,
    Acquired,
    Bootstrapped,
    Unknown,
}

impl FundingStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PreSeed => "Pre-seed",
            Self::Seed => "Seed",
            Self::SeriesA => "Series A",
            Self::SeriesB => "Series B",
            Self::SeriesC => "Series C",
            Self::SeriesD => "Series D",
            Self::SeriesEPlus => "Series E+",
            Self::Ipo => "IPO",
            Self::Acquired => "Acquired",
            Self::Bootstrapped => "Bootstrapped",
            Self::Unknown => "Unknown",
        }
    }

    /// Map free text onto a stage. Later-stage signals win.
    ///
    /// A pre-IPO round is a late private round, not an IPO.
    pub fn parse(text: &str) -> Option<Self> {
        let lower = text.to_lowercase().replace(['-', '_'], " ");
        let pre_ipo = lower.contains("pre ipo") || lower.contains("preipo");
        let lower = lower.replace("pre ipo", " ").replace("preipo", " ");
        let lower = lower.trim();

        if lower.contains("acquired") || lower.contains("acquisition") {
            return Some(Self::Acquired);
        }
        let is_ipo = lower.split(|c: char| !c.is_alphanumeric()).any(|word| word == "ipo");
        if is_ipo || lower.contains("publicly traded") || lower == "public" {
            return Some(Self::Ipo);
        }
        if let Some(rest) = lower.split("series ").nth(1) {
            return match rest.chars().next() {
                Some('a') => Some(Self::SeriesA),
                Some('b') => Some(Self::SeriesB),
                Some('c') => Some(Self::SeriesC),
                Some('d') => Some(Self::SeriesD),
                Some(c) if c.is_ascii_alphabetic() => Some(Self::SeriesEPlus),
                _ => None,
            };
        }
        if pre_ipo {
            return Some(Self::SeriesEPlus);
        }
        if lower.contains("pre seed") || lower.contains("preseed") {
            return Some(Self::PreSeed);
        }
        if lower.contains("seed") {
            return Some(Self::Seed);
        }
        if lower.contains("bootstrap") || lower.contains("self funded") {
            return Some(Self::Bootstrapped);
        }
        if lower == "unknown" {
            return Some(Self::Unknown);
        }
        None
    }
}

/// Whether a field asks for the funding stage.
pub fn is_stage_field(field: &EnrichmentField) -> bool {
    let lower = field.name_lower();
    lower.contains("stage") || lower.contains("round")
}

pub async fn run(
    fields: &[EnrichmentField],
    ctx: &OrchestrationContext,
    kit: &PhaseToolkit<'_>,
) -> FieldResults {
    let search = search_company_topic(Phase::Funding, KEYWORDS, fields, ctx, kit).await;
    if search.hits.is_empty() {
        return search.results;
    }
    normalize_stages(search.results, fields)
}

/// Normalize stage values and fill missing stages with `Bootstrapped`.
pub fn normalize_stages(mut results: FieldResults, fields: &[EnrichmentField]) -> FieldResults {
    for field in fields.iter().filter(|f| is_stage_field(f)) {
        let stage = results
            .get(&field.name)
            .and_then(|r| FundingStage::parse(&r.value.display_string()))
            .filter(|stage| *stage != FundingStage::Unknown);

        match stage {
            Some(stage) => {
                if let Some(result) = results.get_mut(&field.name) {
                    result.value = FieldValue::Text(stage.as_str().to_string());
                }
            }
            None => {
                let fallback = EnrichmentResult::new(
                    field.name.clone(),
                    FieldValue::Text(FundingStage::Bootstrapped.as_str().to_string()),
                    NO_ROUND_CONFIDENCE,
                )
                .with_source("no funding rounds found")
                .inferred();
                results.insert(field.name.clone(), fallback);
            }
        }
    }
    results
}
