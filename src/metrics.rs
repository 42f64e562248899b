use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing summarization activity.
#[derive(Default)]
pub struct SummaryMetrics {
    documents_summarized: AtomicU64,
    documents_failed: AtomicU64,
    chunks_summarized: AtomicU64,
    chunk_gaps: AtomicU64,
}

impl SummaryMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a document that produced a summary record.
    pub fn record_document(&self) {
        self.documents_summarized.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a document that failed before a record could be produced.
    pub fn record_failure(&self) {
        self.documents_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successfully summarized chunk.
    pub fn record_chunk(&self) {
        self.chunks_summarized.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a chunk omitted after its retries were exhausted.
    pub fn record_gap(&self) {
        self.chunk_gaps.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            documents_summarized: self.documents_summarized.load(Ordering::Relaxed),
            documents_failed: self.documents_failed.load(Ordering::Relaxed),
            chunks_summarized: self.chunks_summarized.load(Ordering::Relaxed),
            chunk_gaps: self.chunk_gaps.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of summarization counters used for reporting.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Number of documents that produced a summary record.
    pub documents_summarized: u64,
    /// Number of documents that failed outright.
    pub documents_failed: u64,
    /// Total chunk summaries generated across all documents.
    pub chunks_summarized: u64,
    /// Chunks omitted after exhausting their retries.
    pub chunk_gaps: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_documents_and_chunks() {
        let metrics = SummaryMetrics::new();
        metrics.record_document();
        metrics.record_chunk();
        metrics.record_chunk();
        metrics.record_gap();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.documents_summarized, 1);
        assert_eq!(snapshot.chunks_summarized, 2);
        assert_eq!(snapshot.chunk_gaps, 1);
    }

    #[test]
    fn snapshot_starts_empty() {
        let metrics = SummaryMetrics::new();
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.documents_summarized, 0);
        assert_eq!(snapshot.documents_failed, 0);
    }
}
