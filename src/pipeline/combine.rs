//! Iterative batch-merge reduction of chunk summaries.
//!
//! Consecutive summaries are grouped into batches whose concatenated length
//! stays under the size target, each batch is merged with one generation
//! call, and the loop repeats on the shorter sequence. Every batch holds at
//! least two members whenever two or more summaries remain, so each round
//! strictly shrinks the sequence and the loop terminates in logarithmically
//! many rounds.

use super::types::CombineError;
use crate::generation::{GenerationClient, GenerationRequest, RetryPolicy, with_retries};
use crate::progress::{ProgressEvent, ProgressSink};
use std::ops::Range;

const BATCH_SEPARATOR: &str = "\n\n---\n\n";

/// Reduce chunk summaries to a single narrative within `target_size` bytes.
///
/// A length-1 input is returned unchanged. An element the model cannot
/// shrink under the target, even after one extra condense call, surfaces as
/// [`CombineError::Irreducible`].
pub(crate) async fn combine(
    client: &dyn GenerationClient,
    model: &str,
    summaries: &[String],
    target_size: usize,
    retry: RetryPolicy,
    sink: &dyn ProgressSink,
) -> Result<String, CombineError> {
    debug_assert!(!summaries.is_empty());
    if summaries.len() == 1 {
        return Ok(summaries[0].clone());
    }

    let mut current = summaries.to_vec();
    let mut round = 0usize;
    while current.len() > 1 {
        round += 1;
        let spans = batch_spans(&current, target_size);
        let mut next = Vec::with_capacity(spans.len());
        for span in spans {
            let batch = &current[span];
            if batch.len() == 1 {
                // Leftover tail; it rides along to the next round.
                next.push(batch[0].clone());
                continue;
            }
            let request = GenerationRequest {
                model: model.to_string(),
                prompt: build_merge_prompt(batch, target_size),
                max_response_bytes: target_size,
            };
            match with_retries(client, request, retry).await {
                Ok(text) => next.push(text.trim().to_string()),
                Err(source) => return Err(CombineError::Merge { round, source }),
            }
        }
        debug_assert!(next.len() < current.len());
        sink.publish(&ProgressEvent::CombineRound {
            round,
            input: current.len(),
            output: next.len(),
        });
        current = next;
    }

    let mut result = current
        .pop()
        .expect("reduction loop ended with an empty sequence");

    if result.len() > target_size {
        tracing::debug!(
            len = result.len(),
            target = target_size,
            "Condensing oversized summary"
        );
        let request = GenerationRequest {
            model: model.to_string(),
            prompt: build_condense_prompt(&result, target_size),
            max_response_bytes: target_size,
        };
        match with_retries(client, request, retry).await {
            Ok(text) => result = text.trim().to_string(),
            Err(source) => {
                return Err(CombineError::Merge {
                    round: round + 1,
                    source,
                });
            }
        }
        if result.len() > target_size {
            return Err(CombineError::Irreducible {
                len: result.len(),
                target: target_size,
            });
        }
    }

    Ok(result)
}

/// Group consecutive summaries into merge batches under the size target.
///
/// Greedy: extend the batch while the joined text fits. A batch that would
/// hold a single element is force-paired with its successor whenever one
/// exists, so a round over two or more summaries always shortens the
/// sequence; only the very last batch may be a singleton.
fn batch_spans(items: &[String], target_size: usize) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut i = 0;
    while i < items.len() {
        let mut j = i + 1;
        let mut size = items[i].len();
        while j < items.len() && size + BATCH_SEPARATOR.len() + items[j].len() <= target_size {
            size += BATCH_SEPARATOR.len() + items[j].len();
            j += 1;
        }
        if j == i + 1 && j < items.len() {
            j += 1;
        }
        spans.push(i..j);
        i = j;
    }
    spans
}

fn build_merge_prompt(batch: &[String], target_size: usize) -> String {
    let joined = batch.join(BATCH_SEPARATOR);
    let mut prompt = String::new();
    prompt.push_str(
        "The following are summaries of different parts of the same meeting transcript.\n",
    );
    prompt.push_str("Combine them into a single, coherent summary that:\n");
    prompt.push_str("- Eliminates redundancy\n");
    prompt.push_str("- Organizes information logically\n");
    prompt.push_str(
        "- Keeps every participant name, decision, and action item mentioned in any part\n",
    );
    prompt.push_str("- Maintains chronological flow where relevant\n\n");
    prompt.push_str(&format!("Partial summaries:\n{joined}\n\n"));
    prompt.push_str(&format!(
        "Provide the final combined summary in at most {target_size} characters."
    ));
    prompt
}

fn build_condense_prompt(summary: &str, target_size: usize) -> String {
    format!(
        "Shorten the following meeting summary to at most {target_size} characters \
         without dropping any participant name, decision, or action item:\n\n{summary}"
    )
}
