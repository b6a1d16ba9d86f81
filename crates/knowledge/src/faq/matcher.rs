//! Nearest-neighbor matching over FAQ questions.

use super::parser::FaqEntry;
use crate::embeddings::provider::top_k;
use crate::embeddings::Embedder;
use guidebot_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// The FAQ entry closest to a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaqMatch {
    pub question: String,
    pub answer: String,
    pub score: f32,
}

/// A suggested FAQ question with its similarity to the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaqSuggestion {
    pub question: String,
    pub score: f32,
}

/// FAQ table with one embedding per question.
///
/// Immutable after [`FaqMatcher::build`]; safe to share across tasks.
#[derive(Debug)]
pub struct FaqMatcher {
    embedder: Arc<dyn Embedder>,
    entries: Vec<FaqEntry>,
    embeddings: Vec<Vec<f32>>,
}

impl FaqMatcher {
    /// Embed every question once.
    pub async fn build(embedder: Arc<dyn Embedder>, entries: Vec<FaqEntry>) -> AppResult<Self> {
        let questions: Vec<String> = entries.iter().map(|e| e.question.clone()).collect();
        let embeddings = embedder.embed_batch(&questions).await?;

        if embeddings.len() != entries.len() {
            return Err(AppError::Embedding(format!(
                "Embedder returned {} vectors for {} FAQ questions",
                embeddings.len(),
                entries.len()
            )));
        }

        tracing::info!(
            "Built FAQ matcher with {} entries ({}/{})",
            entries.len(),
            embedder.provider_name(),
            embedder.model_name()
        );

        Ok(Self {
            embedder,
            entries,
            embeddings,
        })
    }

    /// Answer of the entry whose question is most similar to `query`.
    ///
    /// There is no similarity floor: a non-empty table always yields its
    /// closest entry.
    pub async fn best_match(&self, query: &str) -> AppResult<FaqMatch> {
        if self.entries.is_empty() {
            return Err(AppError::EmptyFaqTable);
        }

        let ranked = self.rank(query, 1).await?;
        let (index, score) = ranked.first().copied().ok_or(AppError::EmptyFaqTable)?;
        let entry = &self.entries[index];

        tracing::debug!("Best FAQ match '{}' (score {:.3})", entry.question, score);

        Ok(FaqMatch {
            question: entry.question.clone(),
            answer: entry.answer.clone(),
            score,
        })
    }

    /// The `k` questions most similar to `query`, best first, ties in table
    /// order. Returns every question when the table has fewer than `k`.
    pub async fn suggest(&self, query: &str, k: usize) -> AppResult<Vec<FaqSuggestion>> {
        if self.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let suggestions = self
            .rank(query, k)
            .await?
            .into_iter()
            .map(|(index, score)| FaqSuggestion {
                question: self.entries[index].question.clone(),
                score,
            })
            .collect();

        Ok(suggestions)
    }

    async fn rank(&self, query: &str, k: usize) -> AppResult<Vec<(usize, f32)>> {
        let query_embedding = self.embedder.embed(query).await?;
        Ok(top_k(
            &query_embedding,
            self.embeddings.iter().map(Vec::as_slice),
            k,
        ))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[FaqEntry] {
        &self.entries
    }
}
