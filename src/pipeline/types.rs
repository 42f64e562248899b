//! Core data types and error definitions for the summarization pipeline.

use crate::generation::GenerationError;
use serde::Serialize;
use thiserror::Error;

/// A transcript loaded into memory, immutable for the duration of a run.
#[derive(Debug, Clone)]
pub struct Document {
    /// Identifier derived from the source filename (the file stem).
    pub id: String,
    /// Full transcript text.
    pub text: String,
    /// Metadata carried into the final record.
    pub meta: DocumentMeta,
}

/// Source metadata attached to every summary record.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentMeta {
    /// Original filename, including extension.
    pub filename: String,
    /// Title parsed from the filename convention, or the stem itself.
    pub title: String,
    /// Date parsed from the filename convention, or `"unknown"`.
    pub date: String,
    /// Whitespace-delimited word count of the transcript.
    pub word_count: usize,
    /// Byte length of the transcript.
    pub char_count: usize,
    /// Hex-encoded SHA-256 of the transcript contents.
    pub checksum: String,
}

/// A contiguous, bounded-size span of a document, possibly overlapping its
/// predecessor.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Zero-based position within the document's chunk sequence.
    pub index: usize,
    /// Byte offset of the span's start within the document text.
    pub start: usize,
    /// Byte offset one past the span's end.
    pub end: usize,
    /// The span itself.
    pub text: String,
    /// Bytes shared with the preceding chunk.
    pub overlap: usize,
}

/// Generated summary for a single chunk; scoped to one document's run.
#[derive(Debug, Clone)]
pub struct ChunkSummary {
    /// Index of the chunk this summary was generated from.
    pub chunk_index: usize,
    /// Generated summary text.
    pub text: String,
}

/// The terminal structured output for one document.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryRecord {
    /// Meeting title, extracted or fallen back to the filename-derived title.
    pub title: String,
    /// Meeting date, extracted or fallen back to the filename-derived date.
    pub date: String,
    /// Participant names, deduplicated case-insensitively in first-seen order.
    pub participants: Vec<String>,
    /// Main discussion topics in extraction order.
    pub topics: Vec<String>,
    /// Decisions captured from the narrative.
    pub decisions: Vec<String>,
    /// Tasks and follow-ups captured from the narrative.
    pub action_items: Vec<String>,
    /// Keyword tags, deduplicated in first-seen order.
    pub tags: Vec<String>,
    /// Final narrative summary; always preserved verbatim.
    pub summary: String,
    /// Source metadata block.
    pub metadata: DocumentMeta,
    /// False when any non-fatal error left the record incomplete.
    pub complete: bool,
    /// One note per non-fatal error encountered while producing the record.
    pub diagnostics: Vec<String>,
}

impl SummaryRecord {
    /// Build a record carrying only the narrative and source metadata.
    ///
    /// Used when structured extraction is unavailable: the narrative is never
    /// discarded, the structured fields stay empty.
    pub fn from_narrative(narrative: &str, meta: &DocumentMeta) -> Self {
        Self {
            title: meta.title.clone(),
            date: meta.date.clone(),
            participants: Vec::new(),
            topics: Vec::new(),
            decisions: Vec::new(),
            action_items: Vec::new(),
            tags: Vec::new(),
            summary: narrative.to_string(),
            metadata: meta.clone(),
            complete: true,
            diagnostics: Vec::new(),
        }
    }
}

/// Errors produced while splitting a document into chunks.
#[derive(Debug, Error)]
pub enum SegmentError {
    /// Chunk window budget of zero bytes.
    #[error("chunk size must be greater than zero")]
    ZeroChunkSize,
    /// Overlap of zero would drop context at every cut.
    #[error("overlap must be greater than zero")]
    ZeroOverlap,
    /// Overlap at or above the window size cannot make progress.
    #[error("overlap {overlap} must be smaller than chunk size {chunk_size}")]
    OverlapTooLarge {
        /// Configured chunk window budget.
        chunk_size: usize,
        /// Configured overlap.
        overlap: usize,
    },
}

/// Errors produced while reducing chunk summaries to one narrative.
#[derive(Debug, Error)]
pub enum CombineError {
    /// A merge generation call failed after exhausting retries.
    #[error("merge call failed during round {round}: {source}")]
    Merge {
        /// Reduction round in which the call failed, starting at 1.
        round: usize,
        /// Underlying generation failure.
        #[source]
        source: GenerationError,
    },
    /// The final merged summary still exceeds the size target after a
    /// condense attempt.
    #[error("combined summary of {len} bytes exceeds the {target} byte target and cannot be reduced further")]
    Irreducible {
        /// Byte length of the irreducible summary.
        len: usize,
        /// Configured size target.
        target: usize,
    },
}

/// Errors emitted by the per-document summarization pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Segmentation parameters were invalid despite upfront validation.
    #[error("failed to segment document: {0}")]
    Segment(#[from] SegmentError),
    /// Document contained no summarizable text.
    #[error("document is empty after trimming whitespace")]
    EmptyDocument,
    /// Every chunk failed to summarize, leaving nothing to combine.
    #[error("all {total} chunks failed to summarize; last error: {source}")]
    AllChunksFailed {
        /// Number of chunks the document was split into.
        total: usize,
        /// Error from the final failed chunk.
        #[source]
        source: GenerationError,
    },
    /// Combining chunk summaries failed; the partial summaries survive for
    /// reporting.
    #[error("failed to combine {} chunk summaries: {source}", .partials.len())]
    Combine {
        /// Underlying combine failure.
        #[source]
        source: CombineError,
        /// Chunk summaries that had been generated before the failure.
        partials: Vec<String>,
    },
}
