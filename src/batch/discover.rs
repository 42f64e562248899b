//! Transcript discovery and loading.
//!
//! Transcripts are `.txt` files directly under the input directory, named by
//! the capture convention `YYYY-MM-DD_HH-MM-SS -- title.txt`. Discovery
//! order is lexicographic so batch progress indices are reproducible.

use super::BatchError;
use crate::pipeline::{Document, DocumentMeta};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use time::macros::format_description;
use walkdir::WalkDir;

/// Enumerate transcript files under `input_dir`, sorted by path.
pub fn discover_transcripts(input_dir: &Path) -> Result<Vec<PathBuf>, BatchError> {
    let mut paths = Vec::new();
    for entry in WalkDir::new(input_dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|source| BatchError::Walk {
            dir: input_dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if entry.file_type().is_file()
            && path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("txt"))
        {
            paths.push(path.to_path_buf());
        }
    }
    paths.sort();
    Ok(paths)
}

/// Read one transcript into a [`Document`], deriving metadata from the
/// filename and content.
pub fn load_document(path: &Path) -> Result<Document, BatchError> {
    let text = std::fs::read_to_string(path).map_err(|source| BatchError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default()
        .to_string();
    let stem = path
        .file_stem()
        .and_then(|name| name.to_str())
        .unwrap_or_default()
        .to_string();
    let (date, title) = parse_source_name(&stem);
    let meta = DocumentMeta {
        filename,
        title,
        date,
        word_count: text.split_whitespace().count(),
        char_count: text.len(),
        checksum: checksum(&text),
    };
    Ok(Document {
        id: stem,
        text,
        meta,
    })
}

/// Split a file stem into its date and title parts.
///
/// Stems outside the convention keep themselves as the title with an
/// `"unknown"` date.
fn parse_source_name(stem: &str) -> (String, String) {
    let (lead, title) = match stem.split_once(" -- ") {
        Some((lead, title)) => (lead, title.to_string()),
        None => (stem, stem.to_string()),
    };
    (normalize_date(lead), title)
}

fn normalize_date(lead: &str) -> String {
    let Some(candidate) = lead.get(..10) else {
        return "unknown".to_string();
    };
    let format = format_description!("[year]-[month]-[day]");
    match time::Date::parse(candidate, &format) {
        Ok(_) => candidate.to_string(),
        Err(_) => "unknown".to_string(),
    }
}

fn checksum(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_conventional_stem() {
        let (date, title) = parse_source_name("2024-10-14_11-01-16 -- 1st meeting w dr rapp");
        assert_eq!(date, "2024-10-14");
        assert_eq!(title, "1st meeting w dr rapp");
    }

    #[test]
    fn unconventional_stem_becomes_title() {
        let (date, title) = parse_source_name("random notes");
        assert_eq!(date, "unknown");
        assert_eq!(title, "random notes");
    }

    #[test]
    fn bad_date_part_is_unknown() {
        let (date, title) = parse_source_name("2024-13-99_x -- planning");
        assert_eq!(date, "unknown");
        assert_eq!(title, "planning");
    }

    #[test]
    fn checksum_is_stable_and_distinct() {
        assert_eq!(checksum("abc"), checksum("abc"));
        assert_ne!(checksum("abc"), checksum("abd"));
    }

    #[test]
    fn discovery_is_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.txt"), "b").unwrap();
        std::fs::write(dir.path().join("a.txt"), "a").unwrap();
        std::fs::write(dir.path().join("notes.md"), "m").unwrap();

        let paths = discover_transcripts(dir.path()).unwrap();
        let names: Vec<_> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn load_document_fills_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("2024-10-14_11-01-16 -- sync.txt");
        std::fs::write(&path, "Alice spoke. Bob listened.").unwrap();

        let document = load_document(&path).unwrap();
        assert_eq!(document.id, "2024-10-14_11-01-16 -- sync");
        assert_eq!(document.meta.date, "2024-10-14");
        assert_eq!(document.meta.title, "sync");
        assert_eq!(document.meta.word_count, 4);
        assert_eq!(document.meta.char_count, 26);
        assert_eq!(document.meta.checksum.len(), 64);
    }
}
