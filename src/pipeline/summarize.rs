//! Per-chunk prompt construction and bounded chunk summarization.

use super::types::{Chunk, ChunkSummary};
use crate::generation::{
    GenerationClient, GenerationError, GenerationRequest, RetryPolicy, with_retries,
};

/// Position of a chunk within its document, carried into the prompt.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ChunkPosition {
    pub(crate) index: usize,
    pub(crate) total: usize,
}

impl ChunkPosition {
    fn is_first(self) -> bool {
        self.index == 0
    }

    fn is_last(self) -> bool {
        self.index + 1 == self.total
    }
}

/// Build the summarization prompt for one chunk.
///
/// A document that fits a single chunk gets the whole-transcript variant;
/// otherwise the prompt names the chunk's position so the model knows
/// whether it is reading the opening, middle, or close of the meeting.
pub(crate) fn build_chunk_prompt(
    chunk_text: &str,
    position: ChunkPosition,
    budget: usize,
) -> String {
    let mut prompt = String::new();
    if position.total == 1 {
        prompt.push_str("Summarize this meeting transcript. Focus on:\n");
        prompt.push_str("- Key topics discussed\n");
        prompt.push_str("- Decisions made\n");
        prompt.push_str("- Action items\n");
        prompt.push_str("- Important insights or concerns\n\n");
        prompt.push_str(&format!("Transcript:\n{chunk_text}\n\n"));
        prompt.push_str("Provide a well-organized summary");
    } else {
        prompt.push_str(&format!(
            "Summarize this portion (part {} of {}) of a meeting transcript. \
             Focus on key points, decisions, and action items",
            position.index + 1,
            position.total
        ));
        if position.is_first() {
            prompt.push_str(". This portion opens the meeting");
        } else if position.is_last() {
            prompt.push_str(". This portion closes the meeting");
        }
        prompt.push_str(&format!(":\n\n{chunk_text}\n\n"));
        prompt.push_str("Provide a concise summary covering the main topics discussed");
    }
    prompt.push_str(&format!(
        ". Keep participant names, dates, decisions, and action items exactly as \
         stated. Respond in at most {budget} characters."
    ));
    prompt
}

/// Summarize one chunk, retrying transient generation failures.
pub(crate) async fn summarize_chunk(
    client: &dyn GenerationClient,
    model: &str,
    chunk: &Chunk,
    total: usize,
    budget: usize,
    retry: RetryPolicy,
) -> Result<ChunkSummary, GenerationError> {
    let position = ChunkPosition {
        index: chunk.index,
        total,
    };
    let prompt = build_chunk_prompt(chunk.text.trim(), position, budget);
    tracing::debug!(
        chunk = chunk.index,
        bytes = chunk.text.len(),
        "Summarizing chunk"
    );
    let text = with_retries(
        client,
        GenerationRequest {
            model: model.to_string(),
            prompt,
            max_response_bytes: budget,
        },
        retry,
    )
    .await?;
    Ok(ChunkSummary {
        chunk_index: chunk.index,
        text: text.trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_document_prompt_omits_position() {
        let prompt = build_chunk_prompt("text", ChunkPosition { index: 0, total: 1 }, 500);
        assert!(prompt.contains("Summarize this meeting transcript"));
        assert!(!prompt.contains("portion"));
        assert!(prompt.contains("at most 500 characters"));
    }

    #[test]
    fn partial_prompt_names_position() {
        let prompt = build_chunk_prompt("text", ChunkPosition { index: 1, total: 4 }, 500);
        assert!(prompt.contains("part 2 of 4"));
        assert!(!prompt.contains("opens the meeting"));
    }

    #[test]
    fn edge_chunks_are_flagged() {
        let first = build_chunk_prompt("text", ChunkPosition { index: 0, total: 3 }, 500);
        assert!(first.contains("opens the meeting"));
        let last = build_chunk_prompt("text", ChunkPosition { index: 2, total: 3 }, 500);
        assert!(last.contains("closes the meeting"));
    }
}
