//! Profile phase - industry, headquarters, founding year, company type.

use chrono::Datelike;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use super::company_search::search_company_topic;
use super::PhaseToolkit;
use crate::types::context::OrchestrationContext;
use crate::types::field::{EnrichmentField, FieldKind, FieldValue};
use crate::types::phase::Phase;
use crate::types::result::FieldResults;

pub const KEYWORDS: &str = "headquarters industry founded year founded location based in about";

/// Earliest plausible founding year.
pub const MIN_FOUNDED_YEAR: i32 = 1800;

lazy_static! {
    static ref YEAR: Regex = Regex::new(r"\b(\d{4})\b").unwrap();
}

/// Legal/ownership form of a company.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompanyType {
    Public,
    Private,
    Subsidiary,
    NonProfit,
    Unknown,
}

impl CompanyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "Public",
            Self::Private => "Private",
            Self::Subsidiary => "Subsidiary",
            Self::NonProfit => "Non-profit",
            Self::Unknown => "Unknown",
        }
    }

    /// Map free text onto the enum.
    pub fn parse(text: &str) -> Option<Self> {
        let lower = text.to_lowercase();
        if lower.contains("non-profit") || lower.contains("nonprofit") || lower.contains("not-for-profit") {
            Some(Self::NonProfit)
        } else if lower.contains("subsidiary") || lower.contains("owned by") {
            Some(Self::Subsidiary)
        } else if ["public", "listed", "nasdaq", "nyse"].iter().any(|w| lower.contains(w)) {
            Some(Self::Public)
        } else if lower.contains("private") {
            Some(Self::Private)
        } else if lower.trim() == "unknown" {
            Some(Self::Unknown)
        } else {
            None
        }
    }
}

pub async fn run(
    fields: &[EnrichmentField],
    ctx: &OrchestrationContext,
    kit: &PhaseToolkit<'_>,
) -> FieldResults {
    let search = search_company_topic(Phase::Profile, KEYWORDS, fields, ctx, kit).await;
    validate(search.results, fields, chrono::Utc::now().year())
}

/// Enforce the founding-year range and the company type enum.
///
/// Values that fail validation are dropped. An `Unknown` company type is
/// also dropped since it carries no information.
pub fn validate(results: FieldResults, fields: &[EnrichmentField], current_year: i32) -> FieldResults {
    results
        .into_iter()
        .filter_map(|(name, mut result)| {
            let field = fields.iter().find(|f| f.name == name)?;
            let lower = field.name_lower();

            if lower.contains("founded") || lower.contains("year") {
                let year = founded_year(&result.value, current_year);
                debug!(field = %name, ?year, "validated founding year");
                result.value = match (year?, field.kind) {
                    (year, FieldKind::Number) => FieldValue::Number(year as f64),
                    (year, _) => FieldValue::Text(year.to_string()),
                };
            } else if lower.contains("type") {
                result.value = normalize_company_type(&result.value)?;
            }
            Some((name, result))
        })
        .collect()
}

/// Whether a field asks for a company's legal or ownership form.
pub fn is_company_type_field(field: &EnrichmentField) -> bool {
    let name = field.name_lower();
    (name.contains("company") && name.contains("type")) || name.contains("ownership")
}

/// Hold company-type answers to the enum, whichever phase produced them.
pub fn restrict_company_types(results: FieldResults, fields: &[EnrichmentField]) -> FieldResults {
    results
        .into_iter()
        .filter_map(|(name, mut result)| {
            if fields.iter().any(|f| f.name == name && is_company_type_field(f)) {
                let normalized = normalize_company_type(&result.value);
                debug!(field = %name, kept = normalized.is_some(), "validated company type");
                result.value = normalized?;
            }
            Some((name, result))
        })
        .collect()
}

fn normalize_company_type(value: &FieldValue) -> Option<FieldValue> {
    match value.as_text().and_then(CompanyType::parse)? {
        CompanyType::Unknown => None,
        kind => Some(FieldValue::Text(kind.as_str().to_string())),
    }
}

fn founded_year(value: &FieldValue, current_year: i32) -> Option<i32> {
    let year = match value {
        FieldValue::Number(n) if n.fract() == 0.0 => *n as i32,
        other => YEAR
            .captures(&other.display_string())
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())?,
    };
    (MIN_FOUNDED_YEAR..=current_year).contains(&year).then_some(year)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::result::EnrichmentResult;

    fn results(pairs: &[(&str, FieldValue)]) -> FieldResults {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), EnrichmentResult::new(*name, value.clone(), 0.8)))
            .collect()
    }

    #[test]
    fn test_year_founded_range() {
        let fields = vec![
            EnrichmentField::new("yearFounded", "", FieldKind::Number),
            EnrichmentField::text("foundedIn", ""),
        ];
        let validated = validate(
            results(&[
                ("yearFounded", FieldValue::Number(2020.0)),
                ("foundedIn", FieldValue::Text("Founded in 1795 by".into())),
            ]),
            &fields,
            2026,
        );
        assert_eq!(validated["yearFounded"].value, FieldValue::Number(2020.0));
        assert!(!validated.contains_key("foundedIn"));

        let future = validate(results(&[("yearFounded", FieldValue::Number(2031.0))]), &fields, 2026);
        assert!(future.is_empty());
    }

    #[test]
    fn test_year_from_text_for_string_field() {
        let fields = vec![EnrichmentField::text("yearFounded", "")];
        let validated = validate(
            results(&[("yearFounded", FieldValue::Text("Established 2020 in Tel Aviv".into()))]),
            &fields,
            2026,
        );
        assert_eq!(validated["yearFounded"].value, FieldValue::Text("2020".into()));
    }

    #[test]
    fn test_company_type_enum() {
        let fields = vec![EnrichmentField::text("companyType", "")];
        let validated = validate(
            results(&[("companyType", FieldValue::Text("privately held".into()))]),
            &fields,
            2026,
        );
        assert_eq!(validated["companyType"].value, FieldValue::Text("Private".into()));

        let junk = validate(
            results(&[("companyType", FieldValue::Text("cloud security".into()))]),
            &fields,
            2026,
        );
        assert!(junk.is_empty());
    }

    #[test]
    fn test_company_type_restricted_outside_profile() {
        let fields = vec![
            EnrichmentField::text("companyType", ""),
            EnrichmentField::text("ownershipStructure", ""),
            EnrichmentField::text("productType", ""),
        ];
        let restricted = restrict_company_types(
            results(&[
                ("companyType", FieldValue::Text("cloud security vendor".into())),
                ("ownershipStructure", FieldValue::Text("a wholly owned subsidiary".into())),
                ("productType", FieldValue::Text("SaaS".into())),
            ]),
            &fields,
        );
        assert!(!restricted.contains_key("companyType"));
        assert_eq!(restricted["ownershipStructure"].value, FieldValue::Text("Subsidiary".into()));
        assert_eq!(restricted["productType"].value, FieldValue::Text("SaaS".into()));
    }

    #[test]
    fn test_other_fields_untouched() {
        let fields = vec![EnrichmentField::text("industry", "")];
        let validated = validate(
            results(&[("industry", FieldValue::Text("Cybersecurity".into()))]),
            &fields,
            2026,
        );
        assert_eq!(validated["industry"].value, FieldValue::Text("Cybersecurity".into()));
    }
}
