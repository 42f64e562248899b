//! Structured progress reporting.
//!
//! The pipeline emits typed events rather than printing text, so any
//! renderer (console, log file, metrics exporter) can consume them.

/// Events published while a document moves through the pipeline.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// A document entered the pipeline after segmentation.
    DocumentStarted {
        /// Document identifier.
        id: String,
        /// Number of chunks the document was split into.
        chunks: usize,
    },
    /// A chunk summary call is about to be issued.
    ChunkStarted {
        /// Zero-based chunk index.
        index: usize,
        /// Chunk count for the document.
        total: usize,
    },
    /// A chunk summary call succeeded.
    ChunkCompleted {
        /// Zero-based chunk index.
        index: usize,
        /// Chunk count for the document.
        total: usize,
    },
    /// A chunk summary call failed after exhausting retries.
    ChunkFailed {
        /// Zero-based chunk index.
        index: usize,
        /// Chunk count for the document.
        total: usize,
        /// Rendered failure reason.
        error: String,
    },
    /// One reduction round of the combiner finished.
    CombineRound {
        /// Round number, starting at 1.
        round: usize,
        /// Sequence length entering the round.
        input: usize,
        /// Sequence length leaving the round.
        output: usize,
    },
    /// A document produced a summary record.
    DocumentCompleted {
        /// Document identifier.
        id: String,
        /// Whether the record carries no gap diagnostics.
        complete: bool,
    },
    /// A document failed before a record could be produced.
    DocumentFailed {
        /// Document identifier.
        id: String,
        /// Rendered failure reason.
        error: String,
    },
}

/// Consumer of pipeline progress events.
pub trait ProgressSink: Send + Sync {
    /// Receive one event. Implementations must not block.
    fn publish(&self, event: &ProgressEvent);
}

/// Renders progress events through the tracing subscriber.
pub struct ConsoleSink;

impl ProgressSink for ConsoleSink {
    fn publish(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::DocumentStarted { id, chunks } => {
                tracing::info!(document = %id, chunks = *chunks, "Processing document");
            }
            ProgressEvent::ChunkStarted { index, total } => {
                tracing::info!(chunk = index + 1, total = *total, "Summarizing chunk");
            }
            ProgressEvent::ChunkCompleted { index, total } => {
                tracing::debug!(chunk = index + 1, total = *total, "Chunk summarized");
            }
            ProgressEvent::ChunkFailed {
                index,
                total,
                error,
            } => {
                tracing::warn!(chunk = index + 1, total = *total, error = %error, "Chunk failed");
            }
            ProgressEvent::CombineRound {
                round,
                input,
                output,
            } => {
                tracing::info!(
                    round = *round,
                    input = *input,
                    output = *output,
                    "Combined partial summaries"
                );
            }
            ProgressEvent::DocumentCompleted { id, complete } => {
                tracing::info!(document = %id, complete = *complete, "Document summarized");
            }
            ProgressEvent::DocumentFailed { id, error } => {
                tracing::warn!(document = %id, error = %error, "Document failed");
            }
        }
    }
}

/// Discards every event; useful for tests and library callers that bring
/// their own reporting.
pub struct NullSink;

impl ProgressSink for NullSink {
    fn publish(&self, _event: &ProgressEvent) {}
}
