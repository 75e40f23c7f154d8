//! Typed errors for the enrichment library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.
//!
//! Most failures inside a phase never reach the caller: provider failures
//! degrade to empty results and malformed extractor output degrades to an
//! empty field map. Only row-level failures surface, and the orchestrator
//! turns those into `RowStatus::Error`.

use thiserror::Error;

/// Errors that can occur while enriching a row.
#[derive(Debug, Error)]
pub enum EnrichmentError {
    /// The row has no value in the designated email column.
    #[error("row has no email in column '{column}'")]
    NoEmail { column: String },

    /// The email value could not be parsed into a local part and a domain.
    #[error("invalid email address: {email}")]
    InvalidEmail { email: String },

    /// A Capability Provider call failed.
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The extraction backend returned output that could not be parsed.
    #[error("extraction output could not be parsed: {reason}")]
    ExtractionParse { reason: String },

    /// AI service unavailable or failed
    #[error("AI service error: {0}")]
    AI(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A requested field definition is unusable.
    #[error("invalid field '{name}': {reason}")]
    InvalidField { name: String, reason: String },

    /// Operation was cancelled
    #[error("operation cancelled")]
    Cancelled,

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Configuration error
    #[error("config error: {0}")]
    Config(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors raised by Capability Provider adapters (search and content acquisition).
///
/// Adapters return these internally; the composed provider converts them into
/// empty results so phases never see a provider failure as an error.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Backend answered with a non-success status.
    #[error("{service} returned {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    /// Call exceeded its time budget.
    #[error("timeout after {secs}s: {target}")]
    Timeout { target: String, secs: u64 },

    /// Invalid URL format
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    /// Rate limit exceeded
    #[error("rate limit exceeded")]
    RateLimitExceeded,

    /// Backend response body did not match the expected shape.
    #[error("malformed response from {service}: {reason}")]
    Malformed {
        service: &'static str,
        reason: String,
    },
}

/// Result type alias for enrichment operations.
pub type Result<T> = std::result::Result<T, EnrichmentError>;

/// Result type alias for provider operations.
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;
