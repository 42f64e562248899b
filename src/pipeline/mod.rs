//! Summarization pipeline: segmentation, chunk summaries, combination, and
//! structured extraction.

mod combine;
mod extract;
mod segment;
mod service;
mod summarize;
/// Pipeline data types and error definitions.
pub mod types;

pub use service::SummaryService;
pub use types::{
    Chunk, ChunkSummary, CombineError, Document, DocumentMeta, PipelineError, SegmentError,
    SummaryRecord,
};
