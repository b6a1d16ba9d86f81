//! FAQ source parsing.
//!
//! The source is plain text with one paragraph per line. A line ending in
//! `?` starts a new question; following lines are its answer until the next
//! question line.

use guidebot_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A curated question and its answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqEntry {
    pub question: String,
    pub answer: String,
}

/// Parse FAQ text into entries in first-seen question order.
///
/// Blank lines are skipped and answer lines are joined with a single space.
/// Lines before the first question are ignored. When a question recurs it
/// keeps its original position and takes the answer of its last occurrence.
pub fn parse_faq(text: &str) -> Vec<FaqEntry> {
    let mut entries: Vec<FaqEntry> = Vec::new();
    let mut current: Option<usize> = None;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if line.ends_with('?') {
            let index = match entries.iter().position(|e| e.question == line) {
                Some(existing) => {
                    entries[existing].answer.clear();
                    existing
                }
                None => {
                    entries.push(FaqEntry {
                        question: line.to_string(),
                        answer: String::new(),
                    });
                    entries.len() - 1
                }
            };
            current = Some(index);
            continue;
        }

        if let Some(index) = current {
            let answer = &mut entries[index].answer;
            if !answer.is_empty() {
                answer.push(' ');
            }
            answer.push_str(line);
        }
    }

    entries
}

/// Read and parse the FAQ source.
///
/// A missing or unreadable file is a `DocumentLoad` error: the FAQ fallback
/// cannot run without it.
pub fn load_faq(path: &Path) -> AppResult<Vec<FaqEntry>> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        AppError::DocumentLoad(format!("Failed to read FAQ source {:?}: {}", path, e))
    })?;

    let entries = parse_faq(&text);
    tracing::info!("Parsed {} FAQ entries from {:?}", entries.len(), path);

    Ok(entries)
}
