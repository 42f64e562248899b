//! Per-document orchestration of the summarization pipeline.

use super::combine::combine;
use super::extract::extract;
use super::segment::segment;
use super::summarize::summarize_chunk;
use super::types::{Document, PipelineError, SummaryRecord};
use crate::config::{ConfigError, PipelineConfig};
use crate::generation::GenerationClient;
use crate::metrics::{MetricsSnapshot, SummaryMetrics};
use crate::progress::{ProgressEvent, ProgressSink};
use std::sync::Arc;

/// Coordinates segmentation, chunk summarization, combination, and
/// extraction for one document at a time.
///
/// The service owns the generation client, the pipeline settings, and the
/// progress sink; the batch runner constructs it once and feeds it documents
/// sequentially. Construction validates the pipeline geometry, so an
/// impossible configuration fails before any document is touched.
pub struct SummaryService {
    client: Box<dyn GenerationClient>,
    config: PipelineConfig,
    metrics: Arc<SummaryMetrics>,
    sink: Box<dyn ProgressSink>,
}

impl SummaryService {
    /// Build a service around a generation client and validated settings.
    pub fn new(
        client: Box<dyn GenerationClient>,
        config: PipelineConfig,
        sink: Box<dyn ProgressSink>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            client,
            config,
            metrics: Arc::new(SummaryMetrics::new()),
            sink,
        })
    }

    /// Return the current metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Run one document through the full pipeline.
    ///
    /// Chunk failures leave gaps and an incomplete record; combine failures
    /// and documents with no summarizable text abort with an error. An
    /// unreachable provider at the extraction step degrades to a
    /// narrative-only record rather than failing.
    pub async fn summarize_document(
        &self,
        document: &Document,
    ) -> Result<SummaryRecord, PipelineError> {
        let chunks = segment(&document.text, self.config.chunk_size, self.config.overlap)?;
        if chunks.is_empty() {
            self.metrics.record_failure();
            return Err(PipelineError::EmptyDocument);
        }
        let total = chunks.len();
        self.sink.publish(&ProgressEvent::DocumentStarted {
            id: document.id.clone(),
            chunks: total,
        });

        let mut summaries = Vec::with_capacity(total);
        let mut diagnostics = Vec::new();
        let mut last_error = None;
        for chunk in &chunks {
            self.sink.publish(&ProgressEvent::ChunkStarted {
                index: chunk.index,
                total,
            });
            match summarize_chunk(
                self.client.as_ref(),
                &self.config.model,
                chunk,
                total,
                self.config.chunk_budget,
                self.config.retry,
            )
            .await
            {
                Ok(summary) => {
                    self.metrics.record_chunk();
                    self.sink.publish(&ProgressEvent::ChunkCompleted {
                        index: chunk.index,
                        total,
                    });
                    summaries.push(summary);
                }
                Err(error) => {
                    tracing::warn!(
                        chunk = chunk.index,
                        error = %error,
                        "Chunk summarization failed; continuing without it"
                    );
                    self.metrics.record_gap();
                    self.sink.publish(&ProgressEvent::ChunkFailed {
                        index: chunk.index,
                        total,
                        error: error.to_string(),
                    });
                    diagnostics.push(format!(
                        "chunk {} of {} omitted after retries: {}",
                        chunk.index + 1,
                        total,
                        error
                    ));
                    last_error = Some(error);
                }
            }
        }

        if summaries.is_empty() {
            self.metrics.record_failure();
            let error = PipelineError::AllChunksFailed {
                total,
                source: last_error
                    .expect("no summaries and no errors from a non-empty chunk sequence"),
            };
            self.sink.publish(&ProgressEvent::DocumentFailed {
                id: document.id.clone(),
                error: error.to_string(),
            });
            return Err(error);
        }

        let narrative = if total == 1 {
            // The document fit one window; its summary is already final.
            summaries[0].text.clone()
        } else {
            let texts: Vec<String> = summaries.into_iter().map(|s| s.text).collect();
            match combine(
                self.client.as_ref(),
                &self.config.model,
                &texts,
                self.config.target_size,
                self.config.retry,
                self.sink.as_ref(),
            )
            .await
            {
                Ok(narrative) => narrative,
                Err(source) => {
                    self.metrics.record_failure();
                    let error = PipelineError::Combine {
                        source,
                        partials: texts,
                    };
                    self.sink.publish(&ProgressEvent::DocumentFailed {
                        id: document.id.clone(),
                        error: error.to_string(),
                    });
                    return Err(error);
                }
            }
        };

        let mut record = match extract(
            self.client.as_ref(),
            &self.config.model,
            &narrative,
            &document.meta,
            self.config.target_size,
            self.config.retry,
        )
        .await
        {
            Ok(record) => record,
            Err(error) => {
                tracing::warn!(
                    error = %error,
                    "Structured extraction unavailable; emitting narrative-only record"
                );
                diagnostics.push(format!("structured extraction unavailable: {error}"));
                SummaryRecord::from_narrative(&narrative, &document.meta)
            }
        };

        record.diagnostics.extend(diagnostics);
        record.complete = record.diagnostics.is_empty();
        self.metrics.record_document();
        self.sink.publish(&ProgressEvent::DocumentCompleted {
            id: document.id.clone(),
            complete: record.complete,
        });
        Ok(record)
    }
}
