//! End-to-end pipeline scenarios driven by a deterministic scripted client.

use async_trait::async_trait;
use minutes::batch::BatchRunner;
use minutes::config::PipelineConfig;
use minutes::generation::{GenerationClient, GenerationError, GenerationRequest, RetryPolicy};
use minutes::pipeline::{Document, DocumentMeta, PipelineError, SummaryService};
use minutes::progress::{ProgressEvent, ProgressSink};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const MERGED_PREFIX: &str = "merged:";

/// Deterministic stand-in for the generation capability.
///
/// Classifies each prompt by its fixed markers and answers accordingly;
/// prompts containing `fail_marker` fail as unreachable. The full call log
/// is retained for assertions.
#[derive(Clone)]
struct ScriptedClient {
    calls: Arc<Mutex<Vec<String>>>,
    fail_marker: Option<String>,
    extraction_json: String,
    fail_extraction: bool,
}

impl ScriptedClient {
    fn new(extraction_json: &str) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_marker: None,
            extraction_json: extraction_json.to_string(),
            fail_extraction: false,
        }
    }

    fn failing_on(mut self, marker: &str) -> Self {
        self.fail_marker = Some(marker.to_string());
        self
    }

    fn with_unreachable_extraction(mut self) -> Self {
        self.fail_extraction = true;
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationClient for ScriptedClient {
    async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationError> {
        self.calls.lock().unwrap().push(request.prompt.clone());
        if let Some(marker) = &self.fail_marker {
            if request.prompt.contains(marker) {
                return Err(GenerationError::Unavailable("scripted outage".into()));
            }
        }
        if request.prompt.contains("Respond with a single JSON object") {
            if self.fail_extraction {
                return Err(GenerationError::Unavailable("extraction outage".into()));
            }
            return Ok(self.extraction_json.clone());
        }
        if request.prompt.contains("Partial summaries:") {
            let merged: Vec<String> = (1..=9)
                .filter(|i| request.prompt.contains(&format!("summary-part-{i}")))
                .map(|i| i.to_string())
                .collect();
            return Ok(format!("{MERGED_PREFIX}{}", merged.join("+")));
        }
        if let Some(part) = parse_part_number(&request.prompt) {
            return Ok(format!("summary-part-{part}"));
        }
        Ok("whole-document summary".into())
    }
}

fn parse_part_number(prompt: &str) -> Option<usize> {
    let rest = prompt.split("portion (part ").nth(1)?;
    rest.split(" of ").next()?.trim().parse().ok()
}

struct RecordingSink(Arc<Mutex<Vec<ProgressEvent>>>);

impl ProgressSink for RecordingSink {
    fn publish(&self, event: &ProgressEvent) {
        self.0.lock().unwrap().push(event.clone());
    }
}

fn pipeline_config() -> PipelineConfig {
    PipelineConfig {
        model: "fake-model".into(),
        chunk_size: 6000,
        overlap: 500,
        target_size: 4000,
        chunk_budget: 500,
        retry: RetryPolicy {
            attempts: 2,
            base_delay: Duration::ZERO,
        },
    }
}

fn service_with(
    client: &ScriptedClient,
) -> (SummaryService, Arc<Mutex<Vec<ProgressEvent>>>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let service = SummaryService::new(
        Box::new(client.clone()),
        pipeline_config(),
        Box::new(RecordingSink(events.clone())),
    )
    .unwrap();
    (service, events)
}

fn document(id: &str, text: String) -> Document {
    let meta = DocumentMeta {
        filename: format!("{id}.txt"),
        title: id.to_string(),
        date: "2024-10-14".into(),
        word_count: text.split_whitespace().count(),
        char_count: text.len(),
        checksum: "deadbeef".into(),
    };
    Document {
        id: id.to_string(),
        text,
        meta,
    }
}

fn sentences(count: usize) -> String {
    (0..count)
        .map(|i| format!("This is sentence number {i} of the meeting. "))
        .collect()
}

const EXTRACTION_JSON: &str = r#"{
    "title": "Quarterly Sync",
    "date": "2024-10-14",
    "participants": ["Alice", "Bob", "ALICE"],
    "topics": ["roadmap"],
    "decisions": ["Ship in Q4"],
    "action_items": ["Bob drafts the plan"],
    "tags": ["roadmap", "planning"]
}"#;

#[tokio::test]
async fn long_transcript_runs_three_chunks_and_one_combine_round() {
    let client = ScriptedClient::new(EXTRACTION_JSON);
    let (service, events) = service_with(&client);
    let text = sentences(345);
    assert!(text.len() >= 15000 && text.len() <= 15200);

    let record = service
        .summarize_document(&document("quarterly", text))
        .await
        .unwrap();

    let events = events.lock().unwrap();
    let chunk_count = events
        .iter()
        .find_map(|event| match event {
            ProgressEvent::DocumentStarted { chunks, .. } => Some(*chunks),
            _ => None,
        })
        .unwrap();
    assert_eq!(chunk_count, 3);
    let combine_rounds: Vec<_> = events
        .iter()
        .filter_map(|event| match event {
            ProgressEvent::CombineRound { round, input, output } => {
                Some((*round, *input, *output))
            }
            _ => None,
        })
        .collect();
    assert_eq!(combine_rounds, vec![(1, 3, 1)]);

    assert_eq!(record.summary, format!("{MERGED_PREFIX}1+2+3"));
    assert_eq!(record.title, "Quarterly Sync");
    assert_eq!(record.participants, vec!["Alice", "Bob"]);
    assert_eq!(record.decisions, vec!["Ship in Q4"]);
    assert!(record.complete);
    // 3 chunk calls, 1 merge call, 1 extraction call.
    assert_eq!(client.calls().len(), 5);
}

#[tokio::test]
async fn short_transcript_bypasses_combine() {
    let client = ScriptedClient::new(EXTRACTION_JSON);
    let (service, events) = service_with(&client);
    let text = "Alice said hello. Bob agreed on the plan. They adjourned.".to_string();

    let record = service
        .summarize_document(&document("standup", text))
        .await
        .unwrap();

    assert!(
        events
            .lock()
            .unwrap()
            .iter()
            .all(|event| !matches!(event, ProgressEvent::CombineRound { .. }))
    );
    let calls = client.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[0].contains("Summarize this meeting transcript"));
    assert!(!calls[0].contains("portion"));
    assert_eq!(record.summary, "whole-document summary");
    assert_eq!(record.title, "Quarterly Sync");
    assert!(record.complete);
}

#[tokio::test]
async fn failed_chunk_leaves_a_gap_not_a_failure() {
    let client = ScriptedClient::new(EXTRACTION_JSON).failing_on("FAILME");
    let (service, events) = service_with(&client);
    let text: String = (0..460)
        .map(|i| {
            if i == 184 {
                format!("This is sentence number {i} FAILME of the meeting. ")
            } else {
                format!("This is sentence number {i} of the meeting. ")
            }
        })
        .collect();

    let record = service
        .summarize_document(&document("flaky", text))
        .await
        .unwrap();

    let events = events.lock().unwrap();
    let chunk_count = events
        .iter()
        .find_map(|event| match event {
            ProgressEvent::DocumentStarted { chunks, .. } => Some(*chunks),
            _ => None,
        })
        .unwrap();
    assert_eq!(chunk_count, 4);
    assert!(events.iter().any(|event| matches!(
        event,
        ProgressEvent::ChunkFailed { index: 1, .. }
    )));

    assert_eq!(record.summary, format!("{MERGED_PREFIX}1+3+4"));
    assert!(!record.complete);
    assert_eq!(record.diagnostics.len(), 1);
    assert!(record.diagnostics[0].contains("chunk 2"));
}

#[tokio::test]
async fn all_chunks_failing_fails_the_document() {
    let client = ScriptedClient::new(EXTRACTION_JSON).failing_on("sentence");
    let (service, _events) = service_with(&client);
    let text = sentences(345);

    let error = service
        .summarize_document(&document("outage", text))
        .await
        .unwrap_err();
    assert!(matches!(
        error,
        PipelineError::AllChunksFailed { total: 3, .. }
    ));
}

#[tokio::test]
async fn missing_tags_field_defaults_quietly() {
    let client = ScriptedClient::new(r#"{"title": "Sync", "participants": ["Alice"]}"#);
    let (service, _events) = service_with(&client);

    let record = service
        .summarize_document(&document("notags", "One short meeting. It went well.".into()))
        .await
        .unwrap();

    assert!(record.tags.is_empty());
    assert_eq!(record.summary, "whole-document summary");
    assert!(record.complete);
    assert!(record.diagnostics.is_empty());
}

#[tokio::test]
async fn unreachable_extraction_degrades_to_narrative_only() {
    let client = ScriptedClient::new(EXTRACTION_JSON).with_unreachable_extraction();
    let (service, _events) = service_with(&client);

    let record = service
        .summarize_document(&document("degraded", "A short meeting. Nothing more.".into()))
        .await
        .unwrap();

    assert_eq!(record.summary, "whole-document summary");
    assert!(record.participants.is_empty());
    assert!(!record.complete);
    assert!(record.diagnostics[0].contains("structured extraction unavailable"));
}

#[tokio::test]
async fn batch_continues_past_failures_and_skips_unchanged() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    std::fs::write(
        input.path().join("2024-10-14_09-00-00 -- good.txt"),
        "Alice led a short meeting. Bob took notes.",
    )
    .unwrap();
    std::fs::write(input.path().join("2024-10-15_09-00-00 -- blank.txt"), "   ").unwrap();

    let client = ScriptedClient::new(EXTRACTION_JSON);
    let service = SummaryService::new(
        Box::new(client.clone()),
        pipeline_config(),
        Box::new(minutes::progress::NullSink),
    )
    .unwrap();
    let runner = BatchRunner::new(service, output.path().to_path_buf(), true);
    let report = runner.run(input.path()).await.unwrap();

    assert_eq!(report.total_files, 2);
    assert_eq!(report.records.len(), 1);
    assert_eq!(report.failed.len(), 1);
    assert!(report.failed[0].filename.contains("blank"));
    assert!(output.path().join("index.json").exists());
    assert!(output.path().join("summaries.md").exists());
    assert!(
        output
            .path()
            .join("2024-10-14_09-00-00 -- good_summary.json")
            .exists()
    );

    // A second run sees the unchanged checksum and skips the document.
    let service = SummaryService::new(
        Box::new(client.clone()),
        pipeline_config(),
        Box::new(minutes::progress::NullSink),
    )
    .unwrap();
    let runner = BatchRunner::new(service, output.path().to_path_buf(), true);
    let report = runner.run(input.path()).await.unwrap();
    assert_eq!(report.skipped.len(), 1);
    assert!(report.records.is_empty());
}
