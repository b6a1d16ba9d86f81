//! Knowledge system type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A chunk paired with its embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    /// Zero-based order of the chunk within its document
    pub position: usize,

    /// Chunk text
    pub text: String,

    /// Embedding produced by the index's embedder
    pub embedding: Vec<f32>,
}

/// A retrieved chunk with its similarity to the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedChunk {
    pub position: usize,
    pub text: String,
    pub score: f32,
}

/// Where the semantic index came from at initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexOrigin {
    /// Chunks were embedded during this run
    Built,
    /// Loaded from the persisted store without re-embedding
    Persisted,
    /// No primary document; only the FAQ is available
    Absent,
}

/// Summary of the initialized knowledge state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeStats {
    /// SHA-256 of the primary document, if one was loaded
    pub document_key: Option<String>,

    pub chunk_count: usize,

    pub faq_entries: usize,

    pub index_origin: IndexOrigin,

    /// When the index for this document was embedded
    pub built_at: Option<DateTime<Utc>>,
}
