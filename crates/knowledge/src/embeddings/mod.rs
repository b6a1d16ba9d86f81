//! Embedding capability shared by the semantic index and the FAQ matcher.
//!
//! Each consumer holds its own [`Embedder`]; vectors from different embedders
//! are never compared.

pub mod provider;
pub mod providers;

pub use provider::{cosine_similarity, create_embedder, Embedder};
pub use providers::{OllamaEmbedder, TrigramEmbedder};
