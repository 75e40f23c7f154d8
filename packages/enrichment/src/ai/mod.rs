//! Chat model implementations.
//!
//! Requires the `openai` feature to be enabled.

mod openai;

pub use openai::OpenAI;
