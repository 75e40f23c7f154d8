//! Extraction Engine trait.
//!
//! Turns combined text content into typed field results. Implementations
//! must not fabricate: a field whose value is not stated in the content is
//! left out of the returned map.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::context::ExtractionContext;
use crate::types::field::EnrichmentField;
use crate::types::result::FieldResults;

/// Structured field extraction over text.
#[async_trait]
pub trait FieldExtractor: Send + Sync {
    /// Single-pass extraction.
    ///
    /// `context` carries disambiguation hints such as `companyName` and
    /// `targetDomain`. Errors mean the backend output was unusable; callers
    /// treat them as "nothing found".
    async fn extract(
        &self,
        content: &str,
        fields: &[EnrichmentField],
        context: &ExtractionContext,
    ) -> Result<FieldResults>;

    /// Extraction that requires evidence passages for every value.
    ///
    /// Defaults to single-pass extraction for engines without corroboration.
    async fn extract_corroborated(
        &self,
        content: &str,
        fields: &[EnrichmentField],
        context: &ExtractionContext,
    ) -> Result<FieldResults> {
        self.extract(content, fields, context).await
    }
}

#[async_trait]
impl<T: FieldExtractor + ?Sized> FieldExtractor for std::sync::Arc<T> {
    async fn extract(
        &self,
        content: &str,
        fields: &[EnrichmentField],
        context: &ExtractionContext,
    ) -> Result<FieldResults> {
        (**self).extract(content, fields, context).await
    }

    async fn extract_corroborated(
        &self,
        content: &str,
        fields: &[EnrichmentField],
        context: &ExtractionContext,
    ) -> Result<FieldResults> {
        (**self).extract_corroborated(content, fields, context).await
    }
}
