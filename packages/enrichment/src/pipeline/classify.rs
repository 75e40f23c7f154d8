//! Field classifier - routes requested fields to phases.
//!
//! Routing is an ordered rule table evaluated top to bottom; the first
//! matching rule wins and anything unmatched falls through to `General`.
//! Matching is case-insensitive substring matching over the field name and
//! description.

use crate::types::field::EnrichmentField;
use crate::types::phase::Phase;

/// Lowercased views of a field used by the rules.
struct FieldText {
    name: String,
    description: String,
}

impl FieldText {
    fn new(field: &EnrichmentField) -> Self {
        Self {
            name: field.name_lower(),
            description: field.description_lower(),
        }
    }

    fn name_has(&self, needle: &str) -> bool {
        self.name.contains(needle)
    }

    fn name_has_any(&self, needles: &[&str]) -> bool {
        needles.iter().any(|n| self.name.contains(n))
    }

    fn description_has_any(&self, needles: &[&str]) -> bool {
        needles.iter().any(|n| self.description.contains(n))
    }
}

/// One routing rule.
struct Rule {
    phase: Phase,
    matches: fn(&FieldText) -> bool,
}

/// Routing rules in priority order.
const RULES: &[Rule] = &[
    Rule {
        phase: Phase::Discovery,
        matches: |f| {
            (f.name_has("company") && f.name_has("name"))
                || f.name_has("website")
                || (f.name_has("description") && f.name_has("company"))
                || f.description_has_any(&["company name", "company description"])
        },
    },
    Rule {
        phase: Phase::Profile,
        matches: |f| f.name_has_any(&["industry", "location", "headquarter", "founded"]),
    },
    Rule {
        phase: Phase::Metrics,
        matches: |f| f.name_has_any(&["employee", "revenue", "size"]),
    },
    Rule {
        phase: Phase::Funding,
        matches: |f| f.name_has_any(&["fund", "invest", "valuation"]),
    },
    Rule {
        phase: Phase::TechStack,
        matches: |f| {
            (f.name_has("tech") && f.name_has("stack"))
                || f.name_has_any(&["technolog", "framework", "language", "github"])
                || f.description_has_any(&["tech stack", "programming", "technology"])
        },
    },
];

/// Phase a single field routes to.
pub fn phase_for(field: &EnrichmentField) -> Phase {
    let text = FieldText::new(field);
    RULES
        .iter()
        .find(|rule| (rule.matches)(&text))
        .map(|rule| rule.phase)
        .unwrap_or(Phase::General)
}

/// Requested fields partitioned by phase.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassifiedFields {
    pub discovery: Vec<EnrichmentField>,
    pub profile: Vec<EnrichmentField>,
    pub metrics: Vec<EnrichmentField>,
    pub funding: Vec<EnrichmentField>,
    pub tech_stack: Vec<EnrichmentField>,
    pub other: Vec<EnrichmentField>,
}

impl ClassifiedFields {
    /// Fields routed to a phase.
    pub fn fields_for(&self, phase: Phase) -> &[EnrichmentField] {
        match phase {
            Phase::Discovery => &self.discovery,
            Phase::Profile => &self.profile,
            Phase::Metrics => &self.metrics,
            Phase::Funding => &self.funding,
            Phase::TechStack => &self.tech_stack,
            Phase::General => &self.other,
        }
    }

    fn bucket_mut(&mut self, phase: Phase) -> &mut Vec<EnrichmentField> {
        match phase {
            Phase::Discovery => &mut self.discovery,
            Phase::Profile => &mut self.profile,
            Phase::Metrics => &mut self.metrics,
            Phase::Funding => &mut self.funding,
            Phase::TechStack => &mut self.tech_stack,
            Phase::General => &mut self.other,
        }
    }

    /// Phases with at least one field, in execution order.
    pub fn active_phases(&self) -> Vec<Phase> {
        Phase::ALL
            .into_iter()
            .filter(|phase| !self.fields_for(*phase).is_empty())
            .collect()
    }

    /// Total number of classified fields.
    pub fn len(&self) -> usize {
        Phase::ALL.iter().map(|p| self.fields_for(*p).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Partition fields into phase buckets. Pure and deterministic.
pub fn classify(fields: &[EnrichmentField]) -> ClassifiedFields {
    let mut classified = ClassifiedFields::default();
    for field in fields {
        classified.bucket_mut(phase_for(field)).push(field.clone());
    }
    classified
}
