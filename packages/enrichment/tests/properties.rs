//! Property-based tests for classification, confidence and content budgeting.

use proptest::prelude::*;

use enrichment::extractors::response::{score, CORROBORATED_CAP};
use enrichment::pipeline::{
    classify, join_within_budget, phase_for, trim_proportionally, CHUNK_SEPARATOR,
};
use enrichment::{EnrichmentField, EnrichmentResult, FieldValue, Phase, SourceContext};

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn arb_field() -> impl Strategy<Value = EnrichmentField> {
    ("[a-zA-Z_ ]{1,24}", "[a-z ]{0,40}")
        .prop_map(|(name, description)| EnrichmentField::text(name, description))
}

fn arb_sources() -> impl Strategy<Value = Vec<SourceContext>> {
    prop::collection::vec((0usize..4, "[a-z ]{3,20}"), 0..6).prop_map(|pairs| {
        pairs
            .into_iter()
            .map(|(i, quote)| SourceContext::new(format!("https://source{}.com", i), quote))
            .collect()
    })
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn every_field_lands_in_exactly_one_phase(fields in prop::collection::vec(arb_field(), 0..20)) {
        let classified = classify(&fields);
        prop_assert_eq!(classified.len(), fields.len());

        for field in &fields {
            let expected = phase_for(field);
            for phase in Phase::ALL {
                let count = classified.fields_for(phase).iter().filter(|f| *f == field).count();
                let wanted = fields.iter().filter(|f| *f == field).count();
                if phase == expected {
                    prop_assert_eq!(count, wanted);
                } else {
                    prop_assert_eq!(count, 0);
                }
            }
        }
    }

    #[test]
    fn classification_is_idempotent(fields in prop::collection::vec(arb_field(), 0..20)) {
        let classified = classify(&fields);
        for phase in Phase::ALL {
            let again = classify(classified.fields_for(phase));
            prop_assert_eq!(again.fields_for(phase), classified.fields_for(phase));
            prop_assert_eq!(again.len(), classified.fields_for(phase).len());
        }
    }

    #[test]
    fn confidence_always_within_unit_range(raw in prop::num::f64::ANY) {
        let result = EnrichmentResult::new("x", FieldValue::Text("y".into()), raw);
        prop_assert!((0.0..=1.0).contains(&result.confidence));
    }

    #[test]
    fn scored_confidence_respects_caps(
        model in prop::option::of(prop::num::f64::ANY),
        sources in arb_sources(),
        corroborated in any::<bool>(),
    ) {
        match score(model, &sources, corroborated) {
            None => prop_assert!(corroborated && sources.is_empty()),
            Some(confidence) => {
                prop_assert!(confidence >= 0.0);
                prop_assert!(confidence <= CORROBORATED_CAP);
            }
        }
    }

    #[test]
    fn trimmed_content_fits_cap_and_keeps_floors(
        lengths in prop::collection::vec(0usize..5_000, 1..16),
        cap in 100usize..40_000,
        floor in 0usize..1_000,
    ) {
        let chunks: Vec<String> = lengths.iter().map(|len| "a".repeat(*len)).collect();
        let trimmed = trim_proportionally(&chunks, cap, floor);

        prop_assert_eq!(trimmed.len(), chunks.len());
        let total: usize = trimmed.iter().map(|c| c.len()).sum();
        prop_assert!(total <= cap);
        let original: usize = lengths.iter().sum();

        if original > cap && chunks.len() * floor < cap {
            for (chunk, len) in trimmed.iter().zip(&lengths) {
                prop_assert!(chunk.len() >= (*len).min(floor));
            }
        }
        for (chunk, original) in trimmed.iter().zip(&chunks) {
            prop_assert!(original.starts_with(chunk.as_str()));
        }
    }

    #[test]
    fn joined_content_never_exceeds_small_caps(
        lengths in prop::collection::vec(1usize..300, 1..40),
        cap in 0usize..200,
        floor in 0usize..50,
    ) {
        let chunks: Vec<String> = lengths.iter().map(|len| "a".repeat(*len)).collect();
        let joined = join_within_budget(&chunks, cap, floor);

        prop_assert!(joined.chars().count() <= cap);
        if cap > 0 {
            let first = joined.split(CHUNK_SEPARATOR).next().unwrap_or("");
            prop_assert!(!first.is_empty());
            prop_assert!(chunks[0].starts_with(first));
        }
    }
}
