//! Progressive Multi-Phase Company Enrichment
//!
//! Takes rows keyed by an email address and fills caller-defined fields
//! (company name, industry, headcount, funding, tech stack, executives, ...)
//! by searching the web and extracting values from what it finds.
//!
//! # Design Philosophy
//!
//! - Fields are routed to phases by a fixed rule table, then phases run in
//!   dependency order: identity first, everything else leans on it
//! - Every value carries its source URL and the passage it was taken from
//! - Guesses are labelled: an inferred value is tagged `inferred` and scored
//!   below verified ones, and a field with no evidence is left out
//! - Library handles mechanics, the caller supplies search, scrape and LLM
//!   backends through traits
//!
//! # Usage
//!
//! ```rust,ignore
//! use enrichment::{EnrichmentField, FieldKind, NoopProgress, RowOrchestrator};
//! use enrichment::ai::OpenAI;
//! use enrichment::extractors::LlmExtractor;
//! use enrichment::providers::{FirecrawlScraper, TavilySearch, WebCapabilityProvider};
//!
//! let search = TavilySearch::from_env()?;
//! let provider = WebCapabilityProvider::new(search, FirecrawlScraper::from_env()?);
//! let extractor = LlmExtractor::new(OpenAI::from_env()?);
//! let orchestrator = RowOrchestrator::new(provider, extractor);
//!
//! let fields = vec![
//!     EnrichmentField::text("companyName", "Company name"),
//!     EnrichmentField::new("employeeCount", "Number of employees", FieldKind::Number),
//! ];
//! let row = [("email".to_string(), "jane@wiz.io".to_string())].into_iter().collect();
//! let result = orchestrator.enrich_row(0, row, &fields, "email", &NoopProgress).await;
//! ```
//!
//! # Modules
//!
//! - [`types`] - Fields, results, email context, config, progress events
//! - [`traits`] - Capability Provider, Extraction Engine, chat model seams
//! - [`pipeline`] - Classification, budgeting, fallback chains, gathering, citations
//! - [`phases`] - The six enrichment phases
//! - [`orchestrator`] - Per-row state machine and batch processing
//! - [`extractors`] - LLM-backed extraction with evidence verification
//! - [`providers`] - Tavily, Firecrawl, composed and rate-limited providers
//! - [`security`] - Credential handling
//! - [`testing`] - Mock implementations for testing

pub mod error;
pub mod extractors;
pub mod orchestrator;
pub mod phases;
pub mod pipeline;
pub mod providers;
pub mod security;
pub mod testing;
pub mod traits;
pub mod types;

#[cfg(feature = "openai")]
pub mod ai;

// Re-export core types at crate root
pub use error::{EnrichmentError, ProviderError, ProviderResult, Result};
pub use extractors::LlmExtractor;
pub use orchestrator::{BatchEnricher, RowData, RowOrchestrator};
pub use security::SecretString;
pub use traits::{
    ai::ChatModel,
    extractor::FieldExtractor,
    provider::{CapabilityProvider, ContentMetadata, FetchedContent, SearchHit},
    searcher::{PageScraper, WebSearcher},
};
pub use types::{
    config::{EnrichmentConfig, ExecutiveTitle, HeuristicLists, Seniority},
    context::{ExtractionContext, OrchestrationContext},
    email::{parse_email, EmailContext},
    field::{EnrichmentField, FieldKind, FieldValue},
    phase::Phase,
    progress::{ChannelProgress, NoopProgress, ProgressEvent, ProgressSink, Severity},
    result::{EnrichmentResult, FieldResults, RowEnrichmentResult, RowStatus, SourceContext},
};

// Re-export provider implementations
pub use providers::{RateLimitedProvider, TavilySearch, WebCapabilityProvider};

#[cfg(feature = "firecrawl")]
pub use providers::FirecrawlScraper;
