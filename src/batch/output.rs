//! Summary artifact writers: per-document JSON, the batch index, and a
//! readable Markdown digest.

use super::{BatchError, BatchReport};
use crate::pipeline::SummaryRecord;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Path of the JSON record written for a document identifier.
pub fn record_path(output_dir: &Path, id: &str) -> PathBuf {
    output_dir.join(format!("{id}_summary.json"))
}

/// Persist one fully constructed record as pretty-printed JSON.
pub fn write_record(
    output_dir: &Path,
    id: &str,
    record: &SummaryRecord,
) -> Result<PathBuf, BatchError> {
    let path = record_path(output_dir, id);
    let body = serde_json::to_string_pretty(record).map_err(|source| BatchError::Encode {
        path: path.clone(),
        source,
    })?;
    fs::write(&path, body).map_err(|source| BatchError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

/// Checksum stored in a previously written record, if one exists.
pub fn existing_checksum(output_dir: &Path, id: &str) -> Option<String> {
    let body = fs::read_to_string(record_path(output_dir, id)).ok()?;
    let value: serde_json::Value = serde_json::from_str(&body).ok()?;
    value
        .get("metadata")?
        .get("checksum")?
        .as_str()
        .map(str::to_string)
}

/// Write the batch index: totals, failures with their preserved partial
/// summaries, skipped files, and every record.
pub fn write_index(output_dir: &Path, report: &BatchReport) -> Result<(), BatchError> {
    let path = output_dir.join("index.json");
    let body = json!({
        "processed_date": now_rfc3339(),
        "total_files": report.total_files,
        "successful": report.records.len(),
        "failed": report.failed.len(),
        "skipped": report.skipped,
        "failed_files": report.failed,
        "summaries": report.records,
    });
    let rendered =
        serde_json::to_string_pretty(&body).map_err(|source| BatchError::Encode {
            path: path.clone(),
            source,
        })?;
    fs::write(&path, rendered).map_err(|source| BatchError::Io { path, source })
}

/// Write the human-readable digest of every record in the batch.
pub fn write_markdown(output_dir: &Path, report: &BatchReport) -> Result<(), BatchError> {
    let path = output_dir.join("summaries.md");
    let mut body = String::new();
    body.push_str("# Meeting Transcription Summaries\n\n");
    body.push_str(&format!("Generated: {}\n\n", now_rfc3339()));
    body.push_str(&format!(
        "Total files processed: {}/{}\n\n---\n\n",
        report.records.len(),
        report.total_files
    ));

    for record in &report.records {
        body.push_str(&format!("## {}\n\n", record.title));
        body.push_str(&format!("**Date:** {}\n\n", record.date));
        if !record.participants.is_empty() {
            body.push_str(&format!(
                "**Participants:** {}\n\n",
                record.participants.join(", ")
            ));
        }
        body.push_str(&format!("### Summary\n\n{}\n\n", record.summary));
        if !record.topics.is_empty() {
            body.push_str(&format!("**Topics:** {}\n\n", record.topics.join(", ")));
        }
        if !record.decisions.is_empty() {
            body.push_str("**Decisions:**\n");
            for decision in &record.decisions {
                body.push_str(&format!("- {decision}\n"));
            }
            body.push('\n');
        }
        if !record.action_items.is_empty() {
            body.push_str("**Action Items:**\n");
            for item in &record.action_items {
                body.push_str(&format!("- {item}\n"));
            }
            body.push('\n');
        }
        if !record.complete {
            body.push_str("_This summary is incomplete; see the JSON record for diagnostics._\n\n");
        }
        body.push_str("---\n\n");
    }

    fs::write(&path, body).map_err(|source| BatchError::Io { path, source })
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "unknown".into())
}
