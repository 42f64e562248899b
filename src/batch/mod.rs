//! Batch orchestration over a directory of transcripts.
//!
//! Documents are processed strictly sequentially: the local model server is
//! a single-concurrent-request resource, and in-order progress keeps memory
//! bounded. A document failure is recorded and the batch moves on.

mod discover;
mod output;

pub use discover::{discover_transcripts, load_document};
pub use output::{record_path, write_record};

use crate::pipeline::{PipelineError, SummaryRecord, SummaryService};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors emitted by batch discovery and persistence.
#[derive(Debug, Error)]
pub enum BatchError {
    /// File could not be read or written.
    #[error("failed to access {path}: {source}")]
    Io {
        /// Path of the file involved.
        path: PathBuf,
        /// Underlying filesystem error.
        #[source]
        source: std::io::Error,
    },
    /// Input directory could not be traversed.
    #[error("failed to walk {dir}: {source}")]
    Walk {
        /// Directory being traversed.
        dir: PathBuf,
        /// Underlying traversal error.
        #[source]
        source: walkdir::Error,
    },
    /// Record could not be serialized.
    #[error("failed to encode {path}: {source}")]
    Encode {
        /// Destination path of the artifact.
        path: PathBuf,
        /// Underlying serialization error.
        #[source]
        source: serde_json::Error,
    },
}

/// A document that failed to produce a record, with whatever chunk
/// summaries survived.
#[derive(Debug, Clone, Serialize)]
pub struct FailedDocument {
    /// Source filename.
    pub filename: String,
    /// Rendered failure reason.
    pub error: String,
    /// Chunk summaries generated before the failure, preserved for
    /// inspection.
    pub partial_summaries: Vec<String>,
}

/// Outcome of one batch run.
#[derive(Debug)]
pub struct BatchReport {
    /// Number of transcripts discovered.
    pub total_files: usize,
    /// Records produced, in processing order.
    pub records: Vec<SummaryRecord>,
    /// Documents that failed, in processing order.
    pub failed: Vec<FailedDocument>,
    /// Filenames skipped because an up-to-date summary already existed.
    pub skipped: Vec<String>,
}

/// Drives the pipeline across every transcript under an input directory.
pub struct BatchRunner {
    service: SummaryService,
    output_dir: PathBuf,
    skip_unchanged: bool,
}

impl BatchRunner {
    /// Build a runner writing artifacts into `output_dir`.
    ///
    /// With `skip_unchanged` set, a transcript whose existing record carries
    /// the same content checksum is not re-summarized.
    pub fn new(service: SummaryService, output_dir: PathBuf, skip_unchanged: bool) -> Self {
        Self {
            service,
            output_dir,
            skip_unchanged,
        }
    }

    /// Process every transcript under `input_dir` and write the artifacts.
    pub async fn run(&self, input_dir: &Path) -> Result<BatchReport, BatchError> {
        std::fs::create_dir_all(&self.output_dir).map_err(|source| BatchError::Io {
            path: self.output_dir.clone(),
            source,
        })?;

        let paths = discover_transcripts(input_dir)?;
        let mut report = BatchReport {
            total_files: paths.len(),
            records: Vec::new(),
            failed: Vec::new(),
            skipped: Vec::new(),
        };
        if paths.is_empty() {
            tracing::warn!(dir = %input_dir.display(), "No .txt transcripts found");
            return Ok(report);
        }
        tracing::info!(count = paths.len(), "Discovered transcripts");

        for (position, path) in paths.iter().enumerate() {
            tracing::info!(
                file = %path.display(),
                position = position + 1,
                total = paths.len(),
                "Starting document"
            );
            let document = match load_document(path) {
                Ok(document) => document,
                Err(error) => {
                    tracing::warn!(error = %error, "Skipping unreadable transcript");
                    report.failed.push(FailedDocument {
                        filename: filename_of(path),
                        error: error.to_string(),
                        partial_summaries: Vec::new(),
                    });
                    continue;
                }
            };

            if self.skip_unchanged
                && output::existing_checksum(&self.output_dir, &document.id).as_deref()
                    == Some(document.meta.checksum.as_str())
            {
                tracing::info!(document = %document.id, "Summary up to date; skipping");
                report.skipped.push(document.meta.filename.clone());
                continue;
            }

            match self.service.summarize_document(&document).await {
                Ok(record) => {
                    output::write_record(&self.output_dir, &document.id, &record)?;
                    report.records.push(record);
                }
                Err(error) => {
                    let partial_summaries = match &error {
                        PipelineError::Combine { partials, .. } => partials.clone(),
                        _ => Vec::new(),
                    };
                    report.failed.push(FailedDocument {
                        filename: document.meta.filename.clone(),
                        error: error.to_string(),
                        partial_summaries,
                    });
                }
            }
        }

        output::write_index(&self.output_dir, &report)?;
        output::write_markdown(&self.output_dir, &report)?;

        let metrics = self.service.metrics_snapshot();
        tracing::info!(
            successful = report.records.len(),
            failed = report.failed.len(),
            skipped = report.skipped.len(),
            chunks = metrics.chunks_summarized,
            gaps = metrics.chunk_gaps,
            "Batch complete"
        );
        Ok(report)
    }
}

fn filename_of(path: &Path) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default()
        .to_string()
}
