//! Chat model trait backing the LLM extractor.

use async_trait::async_trait;

use crate::error::Result;

/// A chat completion model that answers with a JSON object.
///
/// Implementations handle transport and authentication only; prompting and
/// response parsing belong to the extractor.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Run one system + user exchange and return the raw response text.
    async fn complete_json(&self, system: &str, user: &str) -> Result<String>;

    /// Model identifier for logs.
    fn model_name(&self) -> &str {
        "unknown"
    }
}

#[async_trait]
impl<T: ChatModel + ?Sized> ChatModel for std::sync::Arc<T> {
    async fn complete_json(&self, system: &str, user: &str) -> Result<String> {
        (**self).complete_json(system, user).await
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}
