//! Embedder trait, factory, and similarity.

use super::providers::{OllamaEmbedder, TrigramEmbedder};
use guidebot_core::{AppError, AppResult, EmbeddingSettings};
use std::sync::Arc;

/// Turns text into fixed-dimension vectors.
#[async_trait::async_trait]
pub trait Embedder: Send + Sync + std::fmt::Debug {
    /// Provider name (e.g. "trigram", "ollama")
    fn provider_name(&self) -> &str;

    /// Model identifier
    fn model_name(&self) -> &str;

    /// Length of every vector this embedder produces
    fn dimensions(&self) -> usize;

    /// Embed several texts, one vector per input in input order.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// Embed a single text.
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut results = self.embed_batch(&[text.to_string()]).await?;
        results
            .pop()
            .ok_or_else(|| AppError::Embedding("No embedding returned".to_string()))
    }

    /// Settings describing this embedder, as persisted alongside its vectors.
    fn settings(&self) -> EmbeddingSettings {
        EmbeddingSettings {
            provider: self.provider_name().to_string(),
            model: self.model_name().to_string(),
            dimensions: self.dimensions(),
            endpoint: None,
        }
    }
}

/// Create an embedder from configuration.
pub fn create_embedder(settings: &EmbeddingSettings) -> AppResult<Arc<dyn Embedder>> {
    match settings.provider.as_str() {
        "trigram" => Ok(Arc::new(TrigramEmbedder::new(settings.dimensions))),
        "ollama" => Ok(Arc::new(OllamaEmbedder::new(settings)?)),
        other => Err(AppError::Embedding(format!(
            "Unknown embedding provider: '{}'. Supported providers: trigram, ollama",
            other
        ))),
    }
}

/// Cosine similarity of two vectors.
///
/// Returns 0.0 when the lengths differ or either vector has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Indices and scores of the `k` vectors most similar to `query`, best first.
///
/// Ties keep input order, so earlier vectors win.
pub(crate) fn top_k<'a>(
    query: &[f32],
    vectors: impl Iterator<Item = &'a [f32]>,
    k: usize,
) -> Vec<(usize, f32)> {
    let mut scored: Vec<(usize, f32)> = vectors
        .enumerate()
        .map(|(i, v)| (i, cosine_similarity(query, v)))
        .collect();

    scored.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });
    scored.truncate(k);
    scored
}
