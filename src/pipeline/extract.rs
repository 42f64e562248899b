//! Structured extraction from the final narrative summary.
//!
//! One generation call asks for a JSON object; whatever comes back is
//! repaired rather than trusted. Missing or oddly shaped fields default,
//! names are deduplicated, and the narrative itself is never at risk: a
//! garbage response still yields a record carrying the full summary.

use super::types::{DocumentMeta, SummaryRecord};
use crate::generation::{
    GenerationClient, GenerationError, GenerationRequest, RetryPolicy, with_retries,
};
use serde_json::Value;
use std::collections::HashSet;

/// Derive the fixed-schema record from a narrative summary.
///
/// Fails only when the generation capability stays unreachable through the
/// retry budget; the caller degrades to a narrative-only record in that
/// case. A reachable provider returning malformed output is repaired here.
pub(crate) async fn extract(
    client: &dyn GenerationClient,
    model: &str,
    narrative: &str,
    meta: &DocumentMeta,
    response_budget: usize,
    retry: RetryPolicy,
) -> Result<SummaryRecord, GenerationError> {
    let request = GenerationRequest {
        model: model.to_string(),
        prompt: build_extraction_prompt(narrative, meta),
        max_response_bytes: response_budget,
    };
    let response = with_retries(client, request, retry).await?;
    Ok(assemble_record(&response, narrative, meta))
}

/// Build the prompt requesting the structured fields as JSON.
pub(crate) fn build_extraction_prompt(narrative: &str, meta: &DocumentMeta) -> String {
    let mut prompt = String::new();
    prompt.push_str("From this meeting summary, extract:\n");
    prompt.push_str("1. Meeting Title/Subject\n");
    prompt.push_str(&format!(
        "2. Date (if mentioned in the content; the file is dated {})\n",
        meta.date
    ));
    prompt.push_str("3. Participants (list names if mentioned)\n");
    prompt.push_str("4. Key Topics (list main discussion points)\n");
    prompt.push_str("5. Decisions Made (list any decisions)\n");
    prompt.push_str("6. Action Items (list any tasks or follow-ups)\n");
    prompt.push_str("7. Tags (3-5 relevant keywords)\n\n");
    prompt.push_str(&format!("Meeting Summary:\n{narrative}\n\n"));
    prompt.push_str(
        "Respond with a single JSON object with these fields: title, date, \
         participants, topics, decisions, action_items, tags",
    );
    prompt
}

/// Turn a free-form model response into a complete record.
///
/// Starts from a narrative-only record and overlays whatever fields survive
/// validation, so no response shape can lose the summary text.
pub(crate) fn assemble_record(
    response: &str,
    narrative: &str,
    meta: &DocumentMeta,
) -> SummaryRecord {
    let mut record = SummaryRecord::from_narrative(narrative, meta);
    let Some(value) = locate_json_object(response) else {
        tracing::warn!("Structured response held no parsable JSON object");
        record
            .diagnostics
            .push("structured response was not valid JSON; structured fields defaulted".into());
        return record;
    };

    if let Some(title) = string_field(value.get("title")) {
        record.title = title;
    }
    if let Some(date) = string_field(value.get("date")) {
        record.date = date;
    }
    record.participants = dedupe_preserving_order(string_list(value.get("participants")));
    record.topics = string_list(value.get("topics"));
    record.decisions = string_list(value.get("decisions"));
    record.action_items = string_list(field_any(&value, &["action_items", "actionItems"]));
    record.tags = dedupe_preserving_order(string_list(value.get("tags")));
    record
}

/// Locate and parse the outermost JSON object within a response.
///
/// Models wrap JSON in prose or code fences; slicing from the first `{` to
/// the last `}` strips both.
fn locate_json_object(response: &str) -> Option<Value> {
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    if end < start {
        return None;
    }
    serde_json::from_str(&response[start..=end]).ok()
}

fn field_any<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| value.get(key))
}

/// Coerce a field into a list of strings.
///
/// Accepts an array of scalars, or a bare scalar treated as a one-element
/// list; anything else is dropped.
fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(scalar_string).collect(),
        Some(other) => scalar_string(other).into_iter().collect(),
        None => Vec::new(),
    }
}

fn string_field(value: Option<&Value>) -> Option<String> {
    value.and_then(scalar_string)
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

/// Drop case-insensitive duplicates while keeping first-seen casing and
/// order. Idempotent: a second pass changes nothing.
pub(crate) fn dedupe_preserving_order(values: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut unique = Vec::new();
    for value in values {
        let key = value.trim().to_lowercase();
        if key.is_empty() {
            continue;
        }
        if seen.insert(key) {
            unique.push(value.trim().to_string());
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta() -> DocumentMeta {
        DocumentMeta {
            filename: "2024-10-14_11-01-16 -- roadmap review.txt".into(),
            title: "roadmap review".into(),
            date: "2024-10-14".into(),
            word_count: 1200,
            char_count: 7000,
            checksum: "abc123".into(),
        }
    }

    #[test]
    fn assembles_record_from_clean_json() {
        let response = r#"{"title": "Roadmap Review", "date": "2024-10-14",
            "participants": ["Alice", "Bob"], "topics": ["roadmap"],
            "decisions": ["ship in Q4"], "action_items": ["Bob drafts plan"],
            "tags": ["roadmap", "planning"]}"#;
        let record = assemble_record(response, "the narrative", &meta());
        assert_eq!(record.title, "Roadmap Review");
        assert_eq!(record.participants, vec!["Alice", "Bob"]);
        assert_eq!(record.summary, "the narrative");
        assert!(record.diagnostics.is_empty());
    }

    #[test]
    fn strips_code_fences_and_prose() {
        let response = "Here is the extraction:\n```json\n{\"title\": \"Sync\"}\n```\nDone.";
        let record = assemble_record(response, "n", &meta());
        assert_eq!(record.title, "Sync");
    }

    #[test]
    fn missing_tags_default_to_empty() {
        let response = r#"{"title": "Sync", "participants": ["Alice"]}"#;
        let record = assemble_record(response, "the narrative", &meta());
        assert!(record.tags.is_empty());
        assert_eq!(record.summary, "the narrative");
        assert!(record.diagnostics.is_empty());
    }

    #[test]
    fn scalar_where_list_expected_becomes_singleton() {
        let response = r#"{"participants": "Alice", "topics": ["a", 3]}"#;
        let record = assemble_record(response, "n", &meta());
        assert_eq!(record.participants, vec!["Alice"]);
        assert_eq!(record.topics, vec!["a", "3"]);
    }

    #[test]
    fn garbage_response_keeps_narrative_and_notes_it() {
        let record = assemble_record("no json here at all", "the narrative", &meta());
        assert_eq!(record.summary, "the narrative");
        assert_eq!(record.title, "roadmap review");
        assert_eq!(record.date, "2024-10-14");
        assert_eq!(record.diagnostics.len(), 1);
    }

    #[test]
    fn title_and_date_fall_back_to_metadata() {
        let response = r#"{"participants": []}"#;
        let record = assemble_record(response, "n", &meta());
        assert_eq!(record.title, "roadmap review");
        assert_eq!(record.date, "2024-10-14");
    }

    #[test]
    fn participant_dedup_is_case_insensitive_and_idempotent() {
        let once = dedupe_preserving_order(vec![
            "Alice".into(),
            "bob".into(),
            "ALICE".into(),
            " Bob ".into(),
        ]);
        assert_eq!(once, vec!["Alice", "bob"]);
        let twice = dedupe_preserving_order(once.clone());
        assert_eq!(twice, once);
    }
}
