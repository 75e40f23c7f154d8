//! Extraction Engine implementations.
//!
//! - [`LlmExtractor`] - prompts a [`ChatModel`](crate::traits::ai::ChatModel)
//!   and verifies every quoted passage against the content it was given

pub mod llm;
pub mod prompts;
pub mod response;

pub use llm::LlmExtractor;
pub use response::{extract_json, parse_response, score, verify_sources, RawFieldAnswer, RawSource};
