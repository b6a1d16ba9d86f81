//! Grounded question answering over an operational-guidelines document.
//!
//! The pipeline, leaves first:
//! - [`chunker`] splits the document into overlapping chunks.
//! - [`semantic_index`] embeds chunks and retrieves the nearest ones,
//!   persisting them through [`store`].
//! - [`faq`] parses the curated FAQ and matches queries against it.
//! - [`rag`] generates answers constrained to retrieved context and falls
//!   back to FAQ suggestions.
//! - [`translate`] applies best-effort translation to outgoing text.
//!
//! [`KnowledgeRuntime`] wires these together and builds the shared state
//! exactly once.

pub mod chunker;
pub mod embeddings;
pub mod faq;
pub mod parser;
pub mod rag;
pub mod runtime;
pub mod semantic_index;
pub mod store;
pub mod translate;
pub mod types;

#[cfg(test)]
mod tests;

pub use chunker::{chunk_text, Chunk, ChunkParams};
pub use embeddings::{cosine_similarity, create_embedder, Embedder};
pub use faq::{FaqEntry, FaqMatch, FaqMatcher, FaqSuggestion};
pub use rag::{AnswerResult, FaqAnswer, NOT_IN_CONTEXT_SENTINEL};
pub use runtime::KnowledgeRuntime;
pub use semantic_index::SemanticIndex;
pub use translate::{LlmTranslator, TranslationOverlay, Translator};
pub use types::{IndexOrigin, KnowledgeStats, RankedChunk};
