//! Text chunking with configurable size and overlap.
//!
//! Splitting is delegated to `text-splitter`, which prefers paragraph, then
//! sentence, then word boundaries and only cuts inside a word when a single
//! word is longer than the chunk size. Sizes are measured in characters.

use guidebot_core::{AppError, AppResult};
use std::ops::Range;
use text_splitter::{ChunkConfig, TextSplitter};

/// Chunk size and overlap, both in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkParams {
    pub chunk_size: usize,
    pub overlap: usize,
}

impl ChunkParams {
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        Self {
            chunk_size,
            overlap,
        }
    }
}

impl Default for ChunkParams {
    fn default() -> Self {
        Self::new(2000, 300)
    }
}

/// A contiguous segment of the source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Zero-based order within the document
    pub position: usize,

    /// Chunk text, untrimmed
    pub text: String,

    /// Byte range of `text` within the document
    pub byte_range: Range<usize>,
}

/// Split `text` into ordered, overlapping chunks.
///
/// Empty input yields an empty vector. Fails only when the parameters are
/// unusable (zero size, or overlap not smaller than the size).
pub fn chunk_text(text: &str, params: ChunkParams) -> AppResult<Vec<Chunk>> {
    if params.chunk_size == 0 {
        return Err(AppError::Config("Chunk size must be positive".to_string()));
    }

    if text.is_empty() {
        return Ok(Vec::new());
    }

    let config = ChunkConfig::new(params.chunk_size)
        .with_overlap(params.overlap)
        .map_err(|e| AppError::Config(format!("Invalid chunk overlap: {}", e)))?
        .with_trim(false);
    let splitter = TextSplitter::new(config);

    let chunks: Vec<Chunk> = splitter
        .chunk_indices(text)
        .enumerate()
        .map(|(position, (offset, slice))| Chunk {
            position,
            text: slice.to_string(),
            byte_range: offset..offset + slice.len(),
        })
        .collect();

    tracing::debug!(
        "Chunked {} bytes into {} chunks (size: {}, overlap: {})",
        text.len(),
        chunks.len(),
        params.chunk_size,
        params.overlap
    );

    Ok(chunks)
}
