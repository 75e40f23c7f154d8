//! Progress hooks for streaming row enrichment to a caller.
//!
//! Hooks are informational only. A sink that panics or drops events never
//! changes what the pipeline does.

use std::panic::{self, AssertUnwindSafe};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::result::EnrichmentResult;

/// Severity tag for phase progress messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Agent,
}

/// A progress event, as delivered through [`ChannelProgress`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ProgressEvent {
    Phase {
        row_index: usize,
        message: String,
        severity: Severity,
    },
    Field {
        row_index: usize,
        field: String,
        result: EnrichmentResult,
    },
}

/// Receives progress for one row.
pub trait ProgressSink: Send + Sync {
    /// Human-readable progress from a phase.
    fn on_phase_progress(&self, _message: &str, _severity: Severity) {}

    /// A field resolved. Fired once per field, as soon as its phase finishes.
    fn on_field_progress(&self, _field: &str, _result: &EnrichmentResult) {}
}

/// Sink that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl ProgressSink for NoopProgress {}

/// Sink that forwards events into an unbounded channel.
///
/// The receiving half can relay events over any transport. Send errors (a
/// dropped receiver) are ignored.
#[derive(Debug, Clone)]
pub struct ChannelProgress {
    row_index: usize,
    tx: mpsc::UnboundedSender<ProgressEvent>,
}

impl ChannelProgress {
    pub fn new(row_index: usize, tx: mpsc::UnboundedSender<ProgressEvent>) -> Self {
        Self { row_index, tx }
    }

    /// A sink and the receiver for its events.
    pub fn channel(row_index: usize) -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(row_index, tx), rx)
    }

    /// Same channel, different row.
    pub fn for_row(&self, row_index: usize) -> Self {
        Self {
            row_index,
            tx: self.tx.clone(),
        }
    }
}

impl ProgressSink for ChannelProgress {
    fn on_phase_progress(&self, message: &str, severity: Severity) {
        let _ = self.tx.send(ProgressEvent::Phase {
            row_index: self.row_index,
            message: message.to_string(),
            severity,
        });
    }

    fn on_field_progress(&self, field: &str, result: &EnrichmentResult) {
        let _ = self.tx.send(ProgressEvent::Field {
            row_index: self.row_index,
            field: field.to_string(),
            result: result.clone(),
        });
    }
}

/// Wraps a sink so every phase message is also logged.
pub(crate) struct Progress<'a> {
    sink: &'a dyn ProgressSink,
}

impl<'a> Progress<'a> {
    pub(crate) fn new(sink: &'a dyn ProgressSink) -> Self {
        Self { sink }
    }

    pub(crate) fn phase(&self, message: impl AsRef<str>, severity: Severity) {
        let message = message.as_ref();
        tracing::debug!(severity = ?severity, "{}", message);
        isolate("phase", || self.sink.on_phase_progress(message, severity));
    }

    pub(crate) fn info(&self, message: impl AsRef<str>) {
        self.phase(message, Severity::Info);
    }

    pub(crate) fn success(&self, message: impl AsRef<str>) {
        self.phase(message, Severity::Success);
    }

    pub(crate) fn warning(&self, message: impl AsRef<str>) {
        self.phase(message, Severity::Warning);
    }

    pub(crate) fn agent(&self, message: impl AsRef<str>) {
        self.phase(message, Severity::Agent);
    }

    pub(crate) fn field(&self, field: &str, result: &EnrichmentResult) {
        isolate("field", || self.sink.on_field_progress(field, result));
    }
}

/// Run a sink callback; a panic loses the event and nothing else.
fn isolate(hook: &'static str, call: impl FnOnce()) {
    if panic::catch_unwind(AssertUnwindSafe(call)).is_err() {
        tracing::warn!(hook, "progress sink panicked, event dropped");
    }
}
