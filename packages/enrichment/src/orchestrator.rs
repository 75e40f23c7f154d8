//! Row orchestration - the per-row state machine and batch processing.
//!
//! A row moves through
//! `parse email → classify → Discovery → Profile → Metrics → Funding → TechStack → General → format`.
//! Phases with no fields are skipped outright. Phases run strictly in order
//! because every later phase leans on the identity Discovery resolved.
//!
//! # Usage
//!
//! ```rust,ignore
//! use enrichment::{RowOrchestrator, EnrichmentField};
//! use enrichment::testing::{MockExtractor, MockProvider};
//!
//! let orchestrator = RowOrchestrator::new(MockProvider::new(), MockExtractor::new());
//! let row = [("email".to_string(), "info@wiz.io".to_string())].into_iter().collect();
//! let fields = vec![EnrichmentField::text("companyName", "Company name")];
//!
//! let result = orchestrator.enrich_row(0, row, &fields, "email", &NoopProgress).await;
//! ```

use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};
use futures::FutureExt;
use indexmap::IndexMap;
use tokio::sync::Mutex;
use tokio::time::{interval, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::error::{EnrichmentError, Result};
use crate::phases::{run_phase, PhaseToolkit};
use crate::pipeline::classify::classify;
use crate::traits::extractor::FieldExtractor;
use crate::traits::provider::CapabilityProvider;
use crate::types::config::EnrichmentConfig;
use crate::types::context::OrchestrationContext;
use crate::types::email::parse_email;
use crate::types::field::EnrichmentField;
use crate::types::phase::Phase;
use crate::types::progress::{ChannelProgress, NoopProgress, Progress, ProgressSink};
use crate::types::result::{FieldResults, RowEnrichmentResult};

/// One input row: column name → cell value.
pub type RowData = IndexMap<String, String>;

/// Default pause between row starts in a batch.
pub const DEFAULT_ROW_DELAY: Duration = Duration::from_secs(1);

/// Default number of rows processed at once.
pub const DEFAULT_ROW_CONCURRENCY: usize = 3;

/// Enriches single rows.
///
/// Holds the Capability Provider and Extraction Engine by value; wrap them in
/// `Arc` to share one client between orchestrators.
pub struct RowOrchestrator<P: CapabilityProvider, E: FieldExtractor> {
    provider: P,
    extractor: E,
    config: EnrichmentConfig,
}

/// What the pipeline produced before formatting.
struct PipelineOutcome {
    context: OrchestrationContext,
    phases_run: Vec<Phase>,
    incomplete: bool,
}

impl<P: CapabilityProvider, E: FieldExtractor> RowOrchestrator<P, E> {
    /// Create an orchestrator with default configuration.
    pub fn new(provider: P, extractor: E) -> Self {
        Self {
            provider,
            extractor,
            config: EnrichmentConfig::default(),
        }
    }

    /// Create with custom configuration.
    pub fn with_config(provider: P, extractor: E, config: EnrichmentConfig) -> Self {
        Self {
            provider,
            extractor,
            config,
        }
    }

    pub fn config(&self) -> &EnrichmentConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut EnrichmentConfig {
        &mut self.config
    }

    /// Enrich one row.
    pub async fn enrich_row(
        &self,
        row_index: usize,
        row: RowData,
        fields: &[EnrichmentField],
        email_column: &str,
        progress: &dyn ProgressSink,
    ) -> RowEnrichmentResult {
        let cancel = CancellationToken::new();
        self.enrich_row_with_cancel(row_index, row, fields, email_column, progress, &cancel)
            .await
    }

    /// Enrich one row, stopping between phases once `cancel` fires.
    ///
    /// Never fails: problems with the row itself become `RowStatus::Error`,
    /// a missing email becomes `RowStatus::Skipped`. A cancelled row keeps
    /// what it found so far and is flagged `incomplete`.
    pub async fn enrich_row_with_cancel(
        &self,
        row_index: usize,
        row: RowData,
        fields: &[EnrichmentField],
        email_column: &str,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> RowEnrichmentResult {
        let started = Instant::now();
        let email = row
            .get(email_column)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
            .map(str::to_string);

        let Some(email) = email else {
            let err = EnrichmentError::NoEmail {
                column: email_column.to_string(),
            };
            debug!(row_index, error = %err, "skipping row");
            Progress::new(progress).warning(format!("Row {}: no email, skipped", row_index));
            return RowEnrichmentResult::skipped(row_index, row, err.to_string());
        };

        let span = info_span!("enrich_row", row_index, email = %email);
        let pipeline = AssertUnwindSafe(self.run_pipeline(&email, fields, progress, cancel))
            .catch_unwind()
            .instrument(span);

        let elapsed_ms = || started.elapsed().as_millis() as u64;
        let outcome = match pipeline.await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => {
                warn!(row_index, email = %email, error = %e, "row failed");
                Progress::new(progress).warning(format!("Row {}: {}", row_index, e));
                return RowEnrichmentResult::failed(row_index, row, FieldResults::new(), e.to_string())
                    .with_elapsed_ms(elapsed_ms());
            }
            Err(_) => {
                error!(row_index, email = %email, "row processing panicked");
                return RowEnrichmentResult::failed(
                    row_index,
                    row,
                    FieldResults::new(),
                    "row processing panicked",
                )
                .with_elapsed_ms(elapsed_ms());
            }
        };

        let enrichments = format_enrichments(outcome.context.discovered_data, fields);

        let result = RowEnrichmentResult::completed(row_index, row, enrichments)
            .with_phases_run(outcome.phases_run)
            .with_elapsed_ms(elapsed_ms());

        info!(
            row_index,
            email = %email,
            found = result.enrichments.len(),
            requested = fields.len(),
            confidence = result.overall_confidence,
            elapsed_ms = result.elapsed_ms,
            incomplete = outcome.incomplete,
            "row enriched"
        );

        if outcome.incomplete {
            result.mark_incomplete()
        } else {
            result
        }
    }

    async fn run_pipeline(
        &self,
        email: &str,
        fields: &[EnrichmentField],
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<PipelineOutcome> {
        validate_fields(fields)?;
        let email_context = parse_email(email, &self.config.heuristics)?;
        let mut ctx = OrchestrationContext::new(email_context);

        let classified = classify(fields);
        let phases = classified.active_phases();
        let reporter = Progress::new(progress);
        debug!(phases = ?phases, fields = classified.len(), "fields classified");

        let kit = PhaseToolkit::new(&self.provider, &self.extractor, &self.config, progress);
        let mut phases_run = Vec::with_capacity(phases.len());
        let mut incomplete = false;

        for phase in phases {
            if cancel.is_cancelled() {
                info!(phase = %phase, "cancelled before phase");
                reporter.warning(format!("{}: cancelled", phase.label()));
                incomplete = true;
                break;
            }

            let phase_fields = classified.fields_for(phase);
            reporter.info(format!("{}: {} field(s)", phase.label(), phase_fields.len()));

            let phase_started = Instant::now();
            let results = run_phase(phase, phase_fields, &ctx, &kit).await;
            debug!(
                phase = %phase,
                found = results.len(),
                elapsed_ms = phase_started.elapsed().as_millis() as u64,
                "phase finished"
            );

            for (name, result) in &results {
                reporter.field(name, result);
            }
            ctx.merge(&results);
            phases_run.push(phase);
        }

        let missing: Vec<&str> = fields
            .iter()
            .filter(|f| f.required && !ctx.discovered_data.contains_key(&f.name))
            .map(|f| f.label())
            .collect();
        if !missing.is_empty() && !incomplete {
            reporter.warning(format!("Required field(s) not found: {}", missing.join(", ")));
        }
        reporter.success(format!(
            "Enriched {} of {} field(s)",
            ctx.discovered_data.len(),
            fields.len()
        ));

        Ok(PipelineOutcome {
            context: ctx,
            phases_run,
            incomplete,
        })
    }
}

/// Reject unusable or duplicate field definitions.
fn validate_fields(fields: &[EnrichmentField]) -> Result<()> {
    let mut seen = HashSet::new();
    for field in fields {
        field.validate()?;
        if !seen.insert(field.name.as_str()) {
            return Err(EnrichmentError::InvalidField {
                name: field.name.clone(),
                reason: "duplicate field name".to_string(),
            });
        }
    }
    Ok(())
}

/// Order results as the fields were requested, dropping anything unrequested.
fn format_enrichments(mut discovered: FieldResults, fields: &[EnrichmentField]) -> FieldResults {
    fields
        .iter()
        .filter_map(|field| discovered.swap_remove(&field.name).map(|r| (field.name.clone(), r)))
        .collect()
}

/// Enriches many rows with bounded concurrency.
///
/// Row starts are spaced by a fixed admission delay so downstream rate
/// limits see a steady trickle instead of a burst.
pub struct BatchEnricher<P: CapabilityProvider, E: FieldExtractor> {
    orchestrator: Arc<RowOrchestrator<P, E>>,
    concurrency: usize,
    row_delay: Duration,
}

impl<P: CapabilityProvider, E: FieldExtractor> BatchEnricher<P, E> {
    pub fn new(orchestrator: Arc<RowOrchestrator<P, E>>) -> Self {
        Self {
            orchestrator,
            concurrency: DEFAULT_ROW_CONCURRENCY,
            row_delay: DEFAULT_ROW_DELAY,
        }
    }

    /// Rows processed at once. Clamped to at least 1.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Pause between row starts. Zero disables admission control.
    pub fn with_row_delay(mut self, delay: Duration) -> Self {
        self.row_delay = delay;
        self
    }

    /// Enrich every row. Results come back in row order.
    ///
    /// Progress events are tagged with each row's index. Cancelling `cancel`
    /// stops every row at its next phase boundary.
    pub async fn enrich_rows(
        &self,
        rows: Vec<RowData>,
        fields: &[EnrichmentField],
        email_column: &str,
        progress: Option<&ChannelProgress>,
        cancel: &CancellationToken,
    ) -> Vec<RowEnrichmentResult> {
        let total = rows.len();
        info!(
            rows = total,
            concurrency = self.concurrency,
            delay_ms = self.row_delay.as_millis() as u64,
            "starting batch"
        );

        let admission = self.admission();
        let admission = &admission;

        let futures: Vec<_> = rows
            .into_iter()
            .enumerate()
            .map(|(row_index, row)| {
                let orchestrator = Arc::clone(&self.orchestrator);
                let row_cancel = cancel.child_token();
                let sink = progress.map(|p| p.for_row(row_index));
                async move {
                    if let Some(ticker) = admission {
                        ticker.lock().await.tick().await;
                    }
                    let sink: &dyn ProgressSink = match &sink {
                        Some(sink) => sink,
                        None => &NoopProgress,
                    };
                    orchestrator
                        .enrich_row_with_cancel(row_index, row, fields, email_column, sink, &row_cancel)
                        .await
                }
            })
            .collect();

        let mut results: Vec<RowEnrichmentResult> = stream::iter(futures)
            .buffer_unordered(self.concurrency)
            .collect()
            .await;
        results.sort_by_key(|r| r.row_index);

        let failed = results.iter().filter(|r| r.error.is_some()).count();
        info!(rows = total, failed, "batch complete");
        results
    }

    fn admission(&self) -> Option<Mutex<Interval>> {
        if self.row_delay.is_zero() {
            return None;
        }
        let mut ticker = interval(self.row_delay);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Some(Mutex::new(ticker))
    }
}
