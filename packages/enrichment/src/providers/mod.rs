//! Capability Provider implementations.
//!
//! - [`TavilySearch`] - open-web search
//! - [`FirecrawlScraper`] - page content (feature `firecrawl`)
//! - [`WebCapabilityProvider`] - composes a searcher and a scraper
//! - [`RateLimitedProvider`] - quota wrapper around any provider

#[cfg(feature = "firecrawl")]
pub mod firecrawl;
pub mod rate_limited;
pub mod tavily;
pub mod web;

#[cfg(feature = "firecrawl")]
pub use firecrawl::FirecrawlScraper;
pub use rate_limited::{ProviderExt, RateLimitedProvider};
pub use tavily::TavilySearch;
pub use web::WebCapabilityProvider;
