//! Primary document loading and text extraction.

use guidebot_core::{AppError, AppResult};
use std::io::ErrorKind;
use std::path::Path;

/// Document format, detected from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Markdown,
    PlainText,
}

impl DocumentFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("md") | Some("markdown") => Self::Markdown,
            _ => Self::PlainText,
        }
    }
}

/// Load the primary document.
///
/// A missing or blank file is not an error: it yields `Ok(None)` and the
/// system runs with the FAQ alone. Unreadable or binary files are `DocumentLoad` errors.
pub fn load_document(path: &Path) -> AppResult<Option<String>> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::warn!("Primary document {:?} not found, skipping index build", path);
            return Ok(None);
        }
        Err(e) => {
            return Err(AppError::DocumentLoad(format!(
                "Failed to read {:?}: {}",
                path, e
            )))
        }
    };

    if raw.contains('\0') {
        return Err(AppError::DocumentLoad(format!(
            "{:?} looks like a binary file",
            path
        )));
    }

    let text = match DocumentFormat::from_path(path) {
        DocumentFormat::Markdown => clean_markdown(&raw),
        DocumentFormat::PlainText => raw,
    };

    if text.trim().is_empty() {
        tracing::warn!("Primary document {:?} is blank, skipping index build", path);
        return Ok(None);
    }

    tracing::info!("Loaded primary document {:?} ({} bytes)", path, text.len());
    Ok(Some(text))
}

/// Drop heading markers and fence lines, keep paragraph breaks.
fn clean_markdown(text: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();

    for line in text.lines() {
        let trimmed = line.trim_start_matches('#').trim();
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") || trimmed == "---" {
            continue;
        }
        lines.push(trimmed);
    }

    lines.join("\n").trim().to_string()
}
