//! OpenAI implementation of the [`ChatModel`] trait.
//!
//! # Example
//!
//! ```rust,ignore
//! use enrichment::ai::OpenAI;
//! use enrichment::extractors::LlmExtractor;
//!
//! let model = OpenAI::from_env()?.with_model("gpt-4o-mini");
//! let extractor = LlmExtractor::new(model);
//! ```

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EnrichmentError, Result};
use crate::security::SecretString;
use crate::traits::ai::ChatModel;

const DEFAULT_MODEL: &str = "gpt-4o";

/// OpenAI chat completions in JSON mode.
#[derive(Clone)]
pub struct OpenAI {
    client: Client,
    api_key: SecretString,
    model: String,
    base_url: String,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

impl OpenAI {
    /// Create a new OpenAI client with the given API key.
    pub fn new(api_key: impl Into<SecretString>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            max_tokens: 4096,
        }
    }

    /// Create from environment variable `OPENAI_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| EnrichmentError::Config("OPENAI_API_KEY not set".into()))?;
        Ok(Self::new(api_key))
    }

    /// Set the chat model (default: gpt-4o).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set a custom base URL (for Azure, proxies, etc.).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Get the current model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn request<'a>(&'a self, system: &'a str, user: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: 0.0,
            max_tokens: self.max_tokens,
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        }
    }
}

#[async_trait]
impl ChatModel for OpenAI {
    async fn complete_json(&self, system: &str, user: &str) -> Result<String> {
        let request = self.request(system, user);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key.expose()))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| EnrichmentError::AI(e.to_string().into()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(EnrichmentError::AI(
                format!("OpenAI API error ({}): {}", status, error_text).into(),
            ));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| EnrichmentError::AI(e.to_string().into()))?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| EnrichmentError::AI("No response from OpenAI".into()))?;

        debug!(model = %self.model, chars = content.len(), "chat completion received");
        Ok(content)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
