//! Windowed segmentation with sentence-aware cut points.
//!
//! A fixed-width window advances across the document. For every window that
//! does not reach the end of the text, the last fifth of the window is
//! searched backward for a natural boundary: a terminal punctuation mark
//! followed by whitespace, then a newline, then any whitespace. The next
//! window re-reads `overlap` bytes before the cut so context survives the
//! boundary. Budgets are byte counts; cuts always land on `char` boundaries.

use super::types::{Chunk, SegmentError};

// Fraction of the window searched backward for a natural cut point.
const LOOKBACK_DIVISOR: usize = 5;

/// Split `text` into ordered, overlapping chunks.
///
/// Pure and deterministic: the same `(text, chunk_size, overlap)` always
/// yields the same sequence. Returns an empty sequence for all-whitespace
/// input and a single chunk when the text fits one window.
pub(crate) fn segment(
    text: &str,
    chunk_size: usize,
    overlap: usize,
) -> Result<Vec<Chunk>, SegmentError> {
    if chunk_size == 0 {
        return Err(SegmentError::ZeroChunkSize);
    }
    if overlap == 0 {
        return Err(SegmentError::ZeroOverlap);
    }
    if overlap >= chunk_size {
        return Err(SegmentError::OverlapTooLarge {
            chunk_size,
            overlap,
        });
    }
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let len = text.len();
    if len <= chunk_size {
        return Ok(vec![Chunk {
            index: 0,
            start: 0,
            end: len,
            text: text.to_string(),
            overlap: 0,
        }]);
    }

    let mut chunks = Vec::new();
    let mut start = 0usize;
    let mut prev_end = 0usize;

    loop {
        let mut hard_end = floor_boundary(text, (start + chunk_size).min(len));
        if hard_end <= start {
            // A window smaller than one multi-byte character: take that
            // character whole rather than stall.
            hard_end = next_boundary(text, start);
        }
        let end = if hard_end < len {
            choose_cut(text, start, hard_end)
        } else {
            len
        };
        chunks.push(Chunk {
            index: chunks.len(),
            start,
            end,
            text: text[start..end].to_string(),
            overlap: prev_end.saturating_sub(start),
        });
        if end >= len {
            break;
        }
        // Step back by the overlap, but never to or before the current
        // start: progress must stay monotonic even when the overlap exceeds
        // what this window advanced.
        let mut next = floor_boundary(text, end.saturating_sub(overlap));
        if next <= start {
            next = end;
        }
        prev_end = end;
        start = next;
    }

    Ok(chunks)
}

/// Pick the cut point for a window that does not end the text.
///
/// Searches the trailing fifth of the window for, in order of preference, a
/// sentence end, a newline, or any whitespace; falls back to the hard edge.
fn choose_cut(text: &str, start: usize, hard_end: usize) -> usize {
    let window = &text[start..hard_end];
    let lookback = window.len() / LOOKBACK_DIVISOR;
    if lookback == 0 {
        return hard_end;
    }
    let region_start = floor_boundary(window, window.len() - lookback);
    let region = &window[region_start..];

    if let Some(cut) = last_sentence_end(text, start + region_start, region) {
        return cut;
    }
    if let Some(pos) = region.rfind('\n') {
        return start + region_start + pos + 1;
    }
    if let Some((pos, c)) = region
        .char_indices()
        .filter(|(_, c)| c.is_whitespace())
        .last()
    {
        return start + region_start + pos + c.len_utf8();
    }
    hard_end
}

/// Absolute offset just past the last terminal-punctuation-plus-whitespace
/// boundary within the region, if any.
///
/// The character following a region-final punctuation mark lies outside the
/// window, so the successor is read from the full text.
fn last_sentence_end(text: &str, region_abs_start: usize, region: &str) -> Option<usize> {
    let mut cut = None;
    for (pos, c) in region.char_indices() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        let after = region_abs_start + pos + c.len_utf8();
        if text[after..].chars().next().is_some_and(char::is_whitespace) {
            cut = Some(after);
        }
    }
    cut
}

fn floor_boundary(text: &str, mut index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn next_boundary(text: &str, start: usize) -> usize {
    text[start..]
        .chars()
        .next()
        .map(|c| start + c.len_utf8())
        .unwrap_or(text.len())
}
