//! Per-row shared state threaded between phases.

use indexmap::IndexMap;

use super::email::EmailContext;
use super::field::FieldValue;
use super::result::{EnrichmentResult, FieldResults};

/// Key/value hints handed to the extraction engine (`companyName`, `targetDomain`, ...).
pub type ExtractionContext = IndexMap<String, String>;

/// Mutable context for one row.
///
/// Owned by the orchestrator for the lifetime of a single row. Phases read it
/// through a shared reference; only the orchestrator merges results into it.
#[derive(Debug, Clone)]
pub struct OrchestrationContext {
    pub email: String,

    pub email_context: EmailContext,

    /// Results accumulated from completed phases
    pub discovered_data: FieldResults,

    /// Company name promoted from a discovered company-name field
    pub company_name: Option<String>,
}

impl OrchestrationContext {
    pub fn new(email_context: EmailContext) -> Self {
        Self {
            email: email_context.email.clone(),
            email_context,
            discovered_data: FieldResults::new(),
            company_name: None,
        }
    }

    /// Company name for search queries.
    ///
    /// Resolution order: promoted name, then any verified company-name
    /// field, then the email-derived guess.
    pub fn resolve_company_name(&self) -> Option<String> {
        self.company_name
            .clone()
            .or_else(|| {
                self.discovered_data
                    .iter()
                    .find(|(name, result)| is_company_name_field(name) && !result.inferred)
                    .and_then(|(_, result)| result.value.as_text().map(str::to_string))
            })
            .or_else(|| self.email_context.company_name_guess.clone())
            .filter(|name| !name.trim().is_empty())
    }

    /// Domain the company is known to operate, if any.
    pub fn target_domain(&self) -> Option<&str> {
        self.email_context.company_domain.as_deref()
    }

    /// Fold a phase's output into the context.
    ///
    /// Existing entries are kept; phases never overwrite each other's fields.
    /// The first verified company-name-like text value becomes the promoted
    /// name. Domain inferences are stored but never promoted.
    pub fn merge(&mut self, results: &FieldResults) {
        for (name, result) in results {
            if self.discovered_data.contains_key(name) {
                continue;
            }
            if self.company_name.is_none() && is_company_name_field(name) && !result.inferred {
                if let FieldValue::Text(value) = &result.value {
                    self.company_name = Some(value.clone());
                }
            }
            self.discovered_data.insert(name.clone(), result.clone());
        }
    }

    /// A previously discovered result.
    pub fn discovered(&self, field: &str) -> Option<&EnrichmentResult> {
        self.discovered_data.get(field)
    }

    /// Key/value context handed to the extraction engine.
    pub fn extraction_context(&self) -> ExtractionContext {
        let mut context = ExtractionContext::new();
        if let Some(name) = self.resolve_company_name() {
            context.insert("companyName".to_string(), name);
        }
        if let Some(domain) = self.target_domain() {
            context.insert("targetDomain".to_string(), domain.to_string());
        }
        context
    }
}

/// Whether a field name denotes the company name.
pub fn is_company_name_field(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.contains("company") && lower.contains("name")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::config::HeuristicLists;
    use crate::types::email::parse_email;

    fn context(email: &str) -> OrchestrationContext {
        OrchestrationContext::new(parse_email(email, &HeuristicLists::default()).unwrap())
    }

    fn result(field: &str, value: &str) -> EnrichmentResult {
        EnrichmentResult::new(field, FieldValue::Text(value.to_string()), 0.9)
    }

    #[test]
    fn test_resolution_falls_back_to_email_guess() {
        let ctx = context("info@wiz.io");
        assert_eq!(ctx.resolve_company_name().as_deref(), Some("Wiz"));
    }

    #[test]
    fn test_no_resolvable_name() {
        let ctx = context("test@gmail.com");
        assert_eq!(ctx.resolve_company_name(), None);
        assert_eq!(ctx.target_domain(), None);
    }

    #[test]
    fn test_merge_promotes_company_name_and_keeps_first() {
        let mut ctx = context("info@wiz.io");

        let mut first = FieldResults::new();
        first.insert("companyName".into(), result("companyName", "Wiz, Inc."));
        ctx.merge(&first);

        let mut second = FieldResults::new();
        second.insert("companyName".into(), result("companyName", "Other"));
        ctx.merge(&second);

        assert_eq!(ctx.company_name.as_deref(), Some("Wiz, Inc."));
        assert_eq!(
            ctx.discovered("companyName").and_then(|r| r.value.as_text()),
            Some("Wiz, Inc.")
        );
    }

    #[test]
    fn test_inferred_name_is_not_promoted() {
        let mut ctx = context("someone@nonexistent-domain-xyz123.com");
        let mut inferred = FieldResults::new();
        inferred.insert(
            "companyName".into(),
            result("companyName", "Nonexistent Domain Xyz123").inferred(),
        );
        ctx.merge(&inferred);

        assert_eq!(ctx.company_name, None);
        assert_eq!(ctx.resolve_company_name(), None);
        assert!(ctx.discovered("companyName").is_some());
    }

    #[test]
    fn test_extraction_context_keys() {
        let ctx = context("info@wiz.io");
        let kv = ctx.extraction_context();
        assert_eq!(kv.get("companyName").map(String::as_str), Some("Wiz"));
        assert_eq!(kv.get("targetDomain").map(String::as_str), Some("wiz.io"));
    }
}
