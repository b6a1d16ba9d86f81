//! Offline hashing embedder built from character trigrams and whole words.

use crate::embeddings::provider::Embedder;
use guidebot_core::AppResult;
use std::collections::BTreeMap;

const MODEL_NAME: &str = "trigram-v1";

const STOP_WORDS: &[&str] = &[
    "the", "is", "at", "which", "on", "a", "an", "as", "are", "was", "were", "for", "to", "of",
    "in", "and", "or", "but", "with", "by", "from", "this", "that", "be", "have", "has", "had",
    "it", "its", "their", "they", "them", "what", "how", "who", "me", "about", "tell",
];

/// Deterministic embedder for local, offline operation.
///
/// Identical text always maps to the identical unit vector, so a chunk
/// queried with its own text scores 1.0. Empty text maps to the zero vector.
#[derive(Debug, Clone)]
pub struct TrigramEmbedder {
    dimensions: usize,
}

impl TrigramEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimensions];
        if self.dimensions == 0 {
            return embedding;
        }

        for (word, freq) in word_frequencies(text) {
            let chars: Vec<char> = word.chars().collect();
            for window in chars.windows(3) {
                let trigram: String = window.iter().collect();
                let slot = hash_slot(&trigram, 37, self.dimensions);
                embedding[slot] += (freq as f32).sqrt();
            }

            embedding[hash_slot(&word, 31, self.dimensions)] += freq as f32;
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            embedding.iter_mut().for_each(|v| *v /= norm);
        }

        embedding
    }
}

/// Lowercased content words with their counts, in sorted order so slot sums
/// accumulate identically on every call. Punctuation is stripped from word
/// edges so "JJM?" and "JJM" collapse to the same token.
fn word_frequencies(text: &str) -> BTreeMap<String, u32> {
    let mut freq = BTreeMap::new();
    for raw in text.split_whitespace() {
        let word = raw
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();
        if word.chars().count() < 2 || STOP_WORDS.contains(&word.as_str()) {
            continue;
        }
        *freq.entry(word).or_insert(0) += 1;
    }
    freq
}

fn hash_slot(token: &str, multiplier: u64, dimensions: usize) -> usize {
    let hash = token
        .bytes()
        .fold(0u64, |acc, b| acc.wrapping_mul(multiplier).wrapping_add(b as u64));
    (hash % dimensions as u64) as usize
}

#[async_trait::async_trait]
impl Embedder for TrigramEmbedder {
    fn provider_name(&self) -> &str {
        "trigram"
    }

    fn model_name(&self) -> &str {
        MODEL_NAME
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.vectorize(text)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::cosine_similarity;

    fn norm(v: &[f32]) -> f32 {
        v.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    #[tokio::test]
    async fn test_unit_length() {
        let embedder = TrigramEmbedder::new(384);
        let embedding = embedder.embed("hello world").await.unwrap();

        assert_eq!(embedding.len(), 384);
        assert!((norm(&embedding) - 1.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_batch_preserves_order() {
        let embedder = TrigramEmbedder::new(128);
        let texts = vec![
            "piped water supply".to_string(),
            "village water committee".to_string(),
        ];

        let batch = embedder.embed_batch(&texts).await.unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0], embedder.embed(&texts[0]).await.unwrap());
        assert_eq!(batch[1], embedder.embed(&texts[1]).await.unwrap());
    }

    #[tokio::test]
    async fn test_identical_text_scores_one() {
        let embedder = TrigramEmbedder::new(384);
        let a = embedder.embed("Paris is the capital of France.").await.unwrap();
        let b = embedder.embed("Paris is the capital of France.").await.unwrap();

        assert_eq!(a, b);
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_related_text_scores_higher() {
        let embedder = TrigramEmbedder::new(384);
        let query = embedder.embed("Tell me about JJM").await.unwrap();
        let related = embedder.embed("What is JJM?").await.unwrap();
        let unrelated = embedder.embed("Who tests water quality?").await.unwrap();

        assert!(cosine_similarity(&query, &related) > cosine_similarity(&query, &unrelated));
    }

    #[tokio::test]
    async fn test_colliding_slots_are_bit_identical() {
        // Four slots force many tokens, some repeated, into shared slots.
        let embedder = TrigramEmbedder::new(4);
        let text = "tap tap water water water pipe pipe village scheme scheme quality";
        let first = embedder.embed(text).await.unwrap();

        for _ in 0..50 {
            let again = embedder.embed(text).await.unwrap();
            let same_bits = first
                .iter()
                .zip(&again)
                .all(|(a, b)| a.to_bits() == b.to_bits());
            assert!(same_bits);
        }
    }

    #[tokio::test]
    async fn test_empty_text_is_zero_vector() {
        let embedder = TrigramEmbedder::new(384);
        let embedding = embedder.embed("").await.unwrap();

        assert_eq!(embedding.len(), 384);
        assert!(embedding.iter().all(|&x| x == 0.0));
    }

    #[tokio::test]
    async fn test_utf8_safety() {
        let embedder = TrigramEmbedder::new(384);
        let embedding = embedder.embed("हर घर जल योजना 🚰 gramin").await.unwrap();
        assert!((norm(&embedding) - 1.0).abs() < 0.001);
    }
}
