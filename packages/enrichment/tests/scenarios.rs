//! End-to-end row enrichment against mock backends.

use std::sync::Arc;

use enrichment::pipeline::{join_within_budget, trim_proportionally};
use enrichment::testing::{
    MockChatModel, MockExtractor, MockProvider, MockProviderCall, RecordingProgress,
};
use enrichment::{
    parse_email, EnrichmentConfig, EnrichmentField, EnrichmentResult, FieldKind, FieldValue,
    HeuristicLists, LlmExtractor, NoopProgress, Phase, ProgressSink, RowData, RowOrchestrator,
    RowStatus, SearchHit, Severity, SourceContext,
};

fn row(email: &str) -> RowData {
    [("email".to_string(), email.to_string())].into_iter().collect()
}

const WIZ_SITE: &str = "Wiz | Cloud Security Platform\n\nWiz secures everything you build and run in the cloud. \
    Our platform helps security teams find critical risks across multi-cloud environments. \
    Learn how customers use Wiz to protect their business, request a demo, and read about \
    our team and company mission. Contact us for pricing and solutions.";

fn wiz_hits() -> Vec<SearchHit> {
    vec![
        SearchHit::new(
            "https://news.com/wiz",
            "Wiz profile",
            "Wiz is a cloud security company headquartered in New York with 1,800 employees.",
        ),
        SearchHit::new(
            "https://techcrunch.com/wiz",
            "Wiz raises again",
            "The cloud security company Wiz now counts roughly 1,800 employees worldwide.",
        ),
    ]
}

const WIZ_ANSWER: &str = r#"```json
{"fields": {
  "industry": {"value": "Cloud security", "confidence": 0.9, "sources": [
    {"url": "https://news.com/wiz", "quote": "a cloud security company"},
    {"url": "https://techcrunch.com/wiz", "quote": "The cloud security company Wiz"}
  ]},
  "employeeCount": {"value": "1,800", "confidence": 0.85, "sources": [
    {"url": "https://news.com/wiz", "quote": "with 1,800 employees"},
    {"url": "https://techcrunch.com/wiz", "quote": "roughly 1,800 employees"}
  ]}
}}
```"#;

#[tokio::test]
async fn known_company_resolves_identity_then_profile_and_metrics() {
    let provider = MockProvider::new()
        .with_content("https://wiz.io", WIZ_SITE)
        .with_search_containing("\"Wiz\"", wiz_hits());
    let model = MockChatModel::new().with_response(WIZ_ANSWER);
    let orchestrator = RowOrchestrator::new(provider, LlmExtractor::new(model.clone()));
    let fields = vec![
        EnrichmentField::text("companyName", "Company name").required(),
        EnrichmentField::text("industry", "Primary industry"),
        EnrichmentField::new("employeeCount", "Number of employees", FieldKind::Number),
    ];
    let progress = RecordingProgress::new();

    let result = orchestrator.enrich_row(0, row("info@wiz.io"), &fields, "email", &progress).await;

    assert_eq!(result.status, RowStatus::Completed);
    assert_eq!(result.phases_run, vec![Phase::Discovery, Phase::Profile, Phase::Metrics]);

    let name = &result.enrichments["companyName"];
    assert_eq!(name.value, FieldValue::Text("Wiz".into()));
    assert!(name.confidence >= 0.85);
    assert!(name.source.contains("wiz.io"));

    let industry = &result.enrichments["industry"];
    assert_eq!(industry.value, FieldValue::Text("Cloud security".into()));
    assert!(industry.confidence > 0.9);
    assert!(industry.source_context.len() >= 2);

    assert_eq!(result.enrichments["employeeCount"].value, FieldValue::Number(1800.0));

    // One extraction per search phase; the website answered discovery.
    let calls = model.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(|c| c.user.contains("- companyName: Wiz")));
    assert!(progress
        .messages()
        .iter()
        .any(|(msg, severity)| *severity == Severity::Success && msg.contains("Enriched 3 of 3")));
}

#[tokio::test]
async fn unresolvable_domain_leaves_profile_fields_empty() {
    let provider = std::sync::Arc::new(MockProvider::new());
    let orchestrator = RowOrchestrator::new(std::sync::Arc::clone(&provider), MockExtractor::new());

    let result = orchestrator
        .enrich_row(
            0,
            row("someone@nonexistent-domain-xyz123.com"),
            &[EnrichmentField::text("industry", "")],
            "email",
            &NoopProgress,
        )
        .await;

    assert_eq!(result.status, RowStatus::Completed);
    assert!(result.enrichments.is_empty());
    assert_eq!(result.phases_run, vec![Phase::Profile]);
    assert!(provider.search_queries().is_empty());
}

#[tokio::test]
async fn unresolvable_domain_falls_back_to_inference_for_identity_only() {
    let provider = std::sync::Arc::new(MockProvider::new());
    let orchestrator = RowOrchestrator::new(std::sync::Arc::clone(&provider), MockExtractor::new());
    let fields = vec![
        EnrichmentField::text("companyName", "Company name"),
        EnrichmentField::text("industry", ""),
    ];

    let result = orchestrator
        .enrich_row(0, row("someone@nonexistent-domain-xyz123.com"), &fields, "email", &NoopProgress)
        .await;

    let name = &result.enrichments["companyName"];
    assert!(name.inferred);
    assert!(name.confidence <= 0.3);
    assert_eq!(name.value, FieldValue::Text("Nonexistent Domain Xyz123".into()));
    assert!(!result.enrichments.contains_key("industry"));

    // The website was tried before search; nothing after discovery searched.
    assert_eq!(provider.fetched_urls(), vec!["https://nonexistent-domain-xyz123.com"]);
    assert!(provider
        .search_queries()
        .iter()
        .all(|q| q.contains("nonexistent-domain-xyz123")));
}

#[tokio::test]
async fn personal_email_degrades_without_provider_calls() {
    let lists = HeuristicLists::default();
    let ctx = parse_email("test@gmail.com", &lists).unwrap();
    assert!(ctx.is_personal_email);
    assert_eq!(ctx.company_domain, None);

    let provider = std::sync::Arc::new(MockProvider::new());
    let orchestrator = RowOrchestrator::new(std::sync::Arc::clone(&provider), MockExtractor::new());
    let fields = vec![
        EnrichmentField::text("companyName", "Company name"),
        EnrichmentField::text("industry", ""),
        EnrichmentField::text("fundingStage", ""),
    ];

    let result = orchestrator.enrich_row(0, row("test@gmail.com"), &fields, "email", &NoopProgress).await;

    assert_eq!(result.status, RowStatus::Completed);
    assert!(result.enrichments.is_empty());
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn funding_stage_without_a_round_is_bootstrapped() {
    let provider = MockProvider::new().with_search_containing(
        "\"Acme Robotics\"",
        vec![SearchHit::new(
            "https://news.com/acme",
            "Acme Robotics",
            "Acme Robotics is growing fast and hiring engineers in Denver.",
        )],
    );
    let model = MockChatModel::new().with_response(
        r#"{"fields": {"fundingStage": {"value": "growing", "confidence": 0.6,
            "sources": [{"url": "https://news.com/acme", "quote": "Acme Robotics is growing fast"}]}}}"#,
    );
    let orchestrator = RowOrchestrator::new(provider, LlmExtractor::new(model));

    let result = orchestrator
        .enrich_row(
            0,
            row("jane@acme-robotics.com"),
            &[EnrichmentField::text("fundingStage", "Latest funding stage")],
            "email",
            &NoopProgress,
        )
        .await;

    let stage = &result.enrichments["fundingStage"];
    assert_eq!(stage.value, FieldValue::Text("Bootstrapped".into()));
    assert!(stage.inferred);
}

#[tokio::test]
async fn funding_stage_stated_in_evidence_is_normalized() {
    let provider = MockProvider::new().with_search_containing(
        "\"Acme Robotics\"",
        vec![SearchHit::new(
            "https://news.com/acme",
            "Acme Robotics raises",
            "Acme Robotics closed a $20M series-b round led by Example Ventures.",
        )],
    );
    let extractor = MockExtractor::new().with_result(
        EnrichmentResult::new("fundingStage", FieldValue::Text("series-b".into()), 0.8)
            .with_source("https://news.com/acme"),
    );
    let orchestrator = RowOrchestrator::new(provider, extractor);
    let fields = [EnrichmentField::text("fundingStage", "")];

    let result = orchestrator
        .enrich_row(0, row("jane@acme-robotics.com"), &fields, "email", &NoopProgress)
        .await;

    let stage = &result.enrichments["fundingStage"];
    assert_eq!(stage.value, FieldValue::Text("Series B".into()));
    assert!(!stage.inferred);
}

#[test]
fn oversized_chunks_are_trimmed_proportionally() {
    let chunks: Vec<String> = (0..10).map(|i| format!("{}", i).repeat(50_000)).collect();
    let trimmed = trim_proportionally(&chunks, 250_000, 500);

    assert_eq!(trimmed.len(), 10);
    assert!(trimmed.iter().map(|c| c.chars().count()).sum::<usize>() <= 250_000);
    assert!(trimmed.iter().all(|c| c.chars().count() >= 500));
}

#[tokio::test]
async fn oversized_search_content_reaches_extractor_within_cap() {
    let hits: Vec<SearchHit> = (0..10)
        .map(|i| SearchHit::new(format!("https://source{}.com/wiz", i), "Wiz", "w".repeat(50_000)))
        .collect();
    let provider = MockProvider::new()
        .with_content("https://wiz.io", WIZ_SITE)
        .with_search_containing("\"Wiz\"", hits);
    let extractor = std::sync::Arc::new(MockExtractor::new());
    let config = EnrichmentConfig::default().with_search_limit(10);
    let orchestrator = RowOrchestrator::with_config(provider, std::sync::Arc::clone(&extractor), config);

    orchestrator
        .enrich_row(0, row("info@wiz.io"), &[EnrichmentField::text("industry", "")], "email", &NoopProgress)
        .await;

    let calls = extractor.calls();
    assert!(!calls.is_empty());
    let content = &calls[0].content;
    assert!(content.chars().count() <= 250_000);
    for i in 0..10 {
        assert!(content.contains(&format!("URL: https://source{}.com/wiz", i)));
    }
    assert_eq!(join_within_budget(&[], 10, 1), "");
}

#[tokio::test]
async fn funding_stage_is_left_out_when_search_finds_nothing() {
    let provider = Arc::new(MockProvider::new());
    let extractor = Arc::new(MockExtractor::new());
    let orchestrator = RowOrchestrator::new(Arc::clone(&provider), Arc::clone(&extractor));
    let fields = [EnrichmentField::text("fundingStage", "")];

    let result = orchestrator
        .enrich_row(0, row("jane@acme-robotics.com"), &fields, "email", &NoopProgress)
        .await;

    assert_eq!(result.status, RowStatus::Completed);
    assert_eq!(provider.search_queries().len(), 1);
    assert!(extractor.calls().is_empty());
    assert!(result.enrichments.is_empty());
}

fn acme_hit(url: &str, snippet: &str) -> SearchHit {
    SearchHit::new(url, "Acme Robotics", snippet)
}

#[tokio::test]
async fn company_type_outside_the_enum_is_dropped() {
    let provider = MockProvider::new().with_search_containing(
        "\"Acme Robotics\"",
        vec![acme_hit(
            "https://news.com/acme",
            "Acme Robotics is a cloud security vendor based in Denver.",
        )],
    );
    let extractor = MockExtractor::new().with_result(EnrichmentResult::new(
        "companyType",
        FieldValue::Text("cloud security vendor".into()),
        0.8,
    ));
    let orchestrator = RowOrchestrator::new(provider, extractor);
    let fields = [EnrichmentField::text("companyType", "Public, private, ...")];

    let result = orchestrator
        .enrich_row(0, row("jane@acme-robotics.com"), &fields, "email", &NoopProgress)
        .await;

    assert_eq!(result.phases_run, vec![Phase::General]);
    assert!(!result.enrichments.contains_key("companyType"));
}

#[tokio::test]
async fn company_type_is_normalized_whichever_phase_answers() {
    let provider = MockProvider::new().with_search_containing(
        "\"Acme Robotics\"",
        vec![acme_hit(
            "https://news.com/acme",
            "Acme Robotics has been publicly traded on the NASDAQ since 2019.",
        )],
    );
    let extractor = MockExtractor::new().with_result(EnrichmentResult::new(
        "companyType",
        FieldValue::Text("publicly traded on the NASDAQ".into()),
        0.8,
    ));
    let orchestrator = RowOrchestrator::new(provider, extractor);
    let fields = [EnrichmentField::text("companyType", "")];

    let result = orchestrator
        .enrich_row(0, row("jane@acme-robotics.com"), &fields, "email", &NoopProgress)
        .await;

    assert_eq!(result.enrichments["companyType"].value, FieldValue::Text("Public".into()));
}

struct ExplodingSink;

impl ProgressSink for ExplodingSink {
    fn on_phase_progress(&self, _message: &str, _severity: Severity) {
        panic!("progress sink failure");
    }

    fn on_field_progress(&self, _field: &str, _result: &EnrichmentResult) {
        panic!("progress sink failure");
    }
}

#[tokio::test]
async fn panicking_progress_sink_does_not_fail_the_row() {
    let provider = MockProvider::new().with_content("https://wiz.io", WIZ_SITE);
    let orchestrator = RowOrchestrator::new(provider, MockExtractor::new());
    let fields = [EnrichmentField::text("companyName", "Company name")];

    let result = orchestrator
        .enrich_row(0, row("info@wiz.io"), &fields, "email", &ExplodingSink)
        .await;

    assert_eq!(result.status, RowStatus::Completed);
    assert_eq!(result.error, None);
    assert_eq!(result.enrichments["companyName"].value, FieldValue::Text("Wiz".into()));
}

const ACME_GITHUB: &str = "https://github.com/acme-robotics/planner";

#[tokio::test]
async fn tech_stack_keeps_only_github_links_the_search_returned() {
    let provider = Arc::new(
        MockProvider::new()
            .with_search_containing(
                "site:github.com",
                vec![
                    acme_hit(ACME_GITHUB, "Motion planning service for Acme Robotics, in Rust."),
                    acme_hit("https://gitlab.com/acme/mirror", "Mirror of the Acme planner."),
                ],
            )
            .with_search_containing(
                "built with",
                vec![acme_hit(
                    "https://stackshare.io/acme-robotics",
                    "Acme Robotics is built with Kubernetes and PostgreSQL.",
                )],
            )
            .with_content(
                "https://acme-robotics.com",
                "Acme Robotics uses React on the frontend and Rust services.",
            ),
    );
    let extractor = Arc::new(
        MockExtractor::new()
            .with_result(
                EnrichmentResult::new(
                    "techStack",
                    FieldValue::List(
                        ["Rust", "Kubernetes", "software", "React"]
                            .iter()
                            .map(|s| s.to_string())
                            .collect(),
                    ),
                    0.8,
                )
                .with_source_context(vec![
                    SourceContext::new(ACME_GITHUB, "Motion planning service"),
                    SourceContext::new("https://github.com/acme-robotics/invented", "Rust"),
                ]),
            )
            .with_result(EnrichmentResult::new(
                "githubUrl",
                FieldValue::Text("https://github.com/acme-robotics/invented".into()),
                0.9,
            )),
    );
    let orchestrator = RowOrchestrator::new(Arc::clone(&provider), Arc::clone(&extractor));
    let fields = [
        EnrichmentField::new("techStack", "Technologies used", FieldKind::Array),
        EnrichmentField::text("githubUrl", "GitHub organization"),
    ];

    let result = orchestrator
        .enrich_row(0, row("jane@acme-robotics.com"), &fields, "email", &NoopProgress)
        .await;

    assert_eq!(result.phases_run, vec![Phase::TechStack]);
    let tech = &result.enrichments["techStack"];
    assert_eq!(
        tech.value,
        FieldValue::List(vec!["Rust".into(), "Kubernetes".into(), "React".into()])
    );
    assert!(tech
        .source_context
        .iter()
        .all(|c| !c.url.contains("github.com") || c.url == ACME_GITHUB));
    assert!(!result.enrichments.contains_key("githubUrl"));

    let calls = extractor.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].context["validGithubUrls"], ACME_GITHUB);
    assert!(calls[0]
        .content
        .starts_with("Company website technology summary (https://acme-robotics.com)"));
    assert!(!calls[0].content.contains("gitlab.com"));
    assert!(calls[0].content.contains("URL: https://stackshare.io/acme-robotics"));

    assert!(provider.calls().contains(&MockProviderCall::Fetch {
        url: "https://acme-robotics.com".into(),
        target: "technologies used".into(),
    }));
}

#[tokio::test]
async fn tech_stack_without_evidence_skips_extraction() {
    let provider = Arc::new(MockProvider::new().with_search_containing(
        "site:github.com",
        vec![acme_hit("https://gitlab.com/acme/mirror", "Mirror of the Acme planner.")],
    ));
    let extractor = Arc::new(MockExtractor::new().with_result(EnrichmentResult::new(
        "techStack",
        FieldValue::List(vec!["Rust".into()]),
        0.9,
    )));
    let orchestrator = RowOrchestrator::new(Arc::clone(&provider), Arc::clone(&extractor));
    let fields = [EnrichmentField::new("techStack", "", FieldKind::Array)];

    let result = orchestrator
        .enrich_row(0, row("jane@acme-robotics.com"), &fields, "email", &NoopProgress)
        .await;

    assert_eq!(result.status, RowStatus::Completed);
    assert!(result.enrichments.is_empty());
    assert!(extractor.calls().is_empty());
    assert_eq!(provider.search_queries().len(), 2);
    assert_eq!(provider.fetched_urls(), vec!["https://acme-robotics.com"]);
}

#[tokio::test]
async fn executive_lookup_reads_team_pages_until_one_answers() {
    let leadership = "https://news.com/acme-leadership";
    let provider = Arc::new(
        MockProvider::new()
            .with_search_containing(
                "leadership team executives",
                vec![acme_hit(leadership, "Jane Doe is the CEO of Acme Robotics since 2019.")],
            )
            .with_search_containing(
                "site:acme-robotics.com",
                vec![acme_hit(
                    &format!("{}/", leadership),
                    "Jane Doe is the CEO of Acme Robotics since 2019.",
                )],
            )
            .with_content(
                "https://acme-robotics.com/team",
                "Our team: Jane Doe, CEO and co-founder. Raj Patel, CTO.",
            ),
    );
    let extractor = Arc::new(MockExtractor::new().with_result(EnrichmentResult::new(
        "CEOName",
        FieldValue::Text("Jane Doe".into()),
        0.9,
    )));
    let orchestrator = RowOrchestrator::new(Arc::clone(&provider), Arc::clone(&extractor));
    let fields = [EnrichmentField::text("CEOName", "")];

    let result = orchestrator
        .enrich_row(0, row("jane@acme-robotics.com"), &fields, "email", &NoopProgress)
        .await;

    assert_eq!(result.phases_run, vec![Phase::General]);
    let ceo = &result.enrichments["CEOName"];
    assert_eq!(ceo.value, FieldValue::Text("Jane Doe".into()));
    assert_eq!(ceo.source_context[0].url, leadership);

    // Team pages are tried in order until one has content.
    assert_eq!(
        provider.fetched_urls(),
        vec!["https://acme-robotics.com/about", "https://acme-robotics.com/team"]
    );
    let queries = provider.search_queries();
    assert!(queries.iter().any(|q| q.contains("leadership team executives CEO")));

    let content = &extractor.calls()[0].content;
    assert_eq!(content.matches("URL: https://news.com/acme-leadership").count(), 1);
    assert!(content.contains("URL: https://acme-robotics.com/team\nTitle: Company team page"));
}

#[tokio::test]
async fn general_fields_wait_for_a_company_name() {
    let provider = Arc::new(MockProvider::new());
    let orchestrator = RowOrchestrator::new(Arc::clone(&provider), MockExtractor::new());
    let fields = [
        EnrichmentField::text("CEOName", ""),
        EnrichmentField::text("complianceCerts", "Security certifications held"),
    ];

    let unknown = row("someone@nonexistent-domain-xyz123.com");
    let result = orchestrator.enrich_row(0, unknown, &fields, "email", &NoopProgress).await;

    assert_eq!(result.status, RowStatus::Completed);
    assert_eq!(result.phases_run, vec![Phase::General]);
    assert!(result.enrichments.is_empty());
    assert!(provider.calls().is_empty());
}
