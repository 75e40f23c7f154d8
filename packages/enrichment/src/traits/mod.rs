//! Trait seams for the enrichment library.
//!
//! Applications plug in search/scrape backends and LLMs through these.

pub mod ai;
pub mod extractor;
pub mod provider;
pub mod searcher;
