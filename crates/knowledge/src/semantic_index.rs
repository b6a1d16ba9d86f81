//! Semantic index: embedded chunks with nearest-neighbor retrieval.

use crate::chunker::{Chunk, ChunkParams};
use crate::embeddings::provider::top_k;
use crate::embeddings::Embedder;
use crate::store::{IndexStore, StoredDocument};
use crate::types::{IndexEntry, IndexOrigin, RankedChunk};
use chrono::{DateTime, Utc};
use guidebot_core::{AppError, AppResult};
use std::sync::Arc;

#[derive(Debug)]
struct IndexState {
    document_key: String,
    entries: Vec<IndexEntry>,
    built_at: DateTime<Utc>,
    origin: IndexOrigin,
}

/// In-memory index over one document, optionally backed by an [`IndexStore`].
///
/// Queries are embedded with the same embedder used at build time. Until a
/// build or load succeeds every query fails with `IndexNotBuilt`.
#[derive(Debug)]
pub struct SemanticIndex {
    embedder: Arc<dyn Embedder>,
    store: Option<IndexStore>,
    state: Option<IndexState>,
}

impl SemanticIndex {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            store: None,
            state: None,
        }
    }

    /// Persist builds to (and allow loads from) `store`.
    pub fn with_store(mut self, store: IndexStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Embed `chunks` and replace any previous index.
    ///
    /// With a store attached the entries are written under `document_key`
    /// before the in-memory index is swapped, so a failed write leaves the
    /// previous index in place.
    pub async fn build(
        &mut self,
        document_key: &str,
        params: ChunkParams,
        chunks: &[Chunk],
    ) -> AppResult<()> {
        tracing::info!(
            "Embedding {} chunks with {}/{}",
            chunks.len(),
            self.embedder.provider_name(),
            self.embedder.model_name()
        );

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        if embeddings.len() != chunks.len() {
            return Err(AppError::Embedding(format!(
                "Embedder returned {} vectors for {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }

        let entries: Vec<IndexEntry> = chunks
            .iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| IndexEntry {
                position: chunk.position,
                text: chunk.text.clone(),
                embedding,
            })
            .collect();
        self.check_dimensions(&entries)?;

        let built_at = Utc::now();
        let entries = match &self.store {
            Some(store) => {
                let document = StoredDocument {
                    key: document_key.to_string(),
                    embedding: self.embedder.settings(),
                    params,
                    chunk_count: entries.len(),
                    built_at,
                };
                store
                    .run_blocking(move |store| {
                        store.replace_document(&document, &entries)?;
                        Ok(entries)
                    })
                    .await?
            }
            None => entries,
        };

        self.state = Some(IndexState {
            document_key: document_key.to_string(),
            entries,
            built_at,
            origin: IndexOrigin::Built,
        });

        Ok(())
    }

    /// Load a persisted index for `document_key` if one exists that was built
    /// with this embedder and these chunk parameters.
    ///
    /// Returns `Ok(false)` when nothing reusable is stored.
    pub async fn load_persisted(
        &mut self,
        document_key: &str,
        params: ChunkParams,
    ) -> AppResult<bool> {
        let Some(store) = &self.store else {
            return Ok(false);
        };

        let key = document_key.to_string();
        let found = store
            .run_blocking(move |store| store.find_document(&key))
            .await?;
        let Some(document) = found else {
            tracing::debug!("No persisted index for {}", document_key);
            return Ok(false);
        };

        if !document.matches(&self.embedder.settings(), params) {
            tracing::info!(
                "Persisted index for {} was built with different settings, rebuilding",
                document_key
            );
            return Ok(false);
        }

        let key = document_key.to_string();
        let entries = store
            .run_blocking(move |store| store.load_entries(&key))
            .await?;
        if entries.len() != document.chunk_count {
            tracing::warn!(
                "Persisted index for {} is incomplete ({} of {} chunks), rebuilding",
                document_key,
                entries.len(),
                document.chunk_count
            );
            return Ok(false);
        }
        self.check_dimensions(&entries)?;

        tracing::info!(
            "Loaded persisted index for {} ({} chunks, built {})",
            document_key,
            entries.len(),
            document.built_at.to_rfc3339()
        );

        self.state = Some(IndexState {
            document_key: document_key.to_string(),
            entries,
            built_at: document.built_at,
            origin: IndexOrigin::Persisted,
        });

        Ok(true)
    }

    /// Return the `k` chunks most similar to `text`, best first.
    ///
    /// Ties go to the earlier chunk. A `k` larger than the index returns
    /// every chunk.
    pub async fn query(&self, text: &str, k: usize) -> AppResult<Vec<RankedChunk>> {
        let state = self.state.as_ref().ok_or(AppError::IndexNotBuilt)?;

        if state.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(text).await?;
        let ranked = top_k(
            &query_embedding,
            state.entries.iter().map(|e| e.embedding.as_slice()),
            k,
        );

        let results: Vec<RankedChunk> = ranked
            .into_iter()
            .map(|(i, score)| {
                let entry = &state.entries[i];
                RankedChunk {
                    position: entry.position,
                    text: entry.text.clone(),
                    score,
                }
            })
            .collect();

        tracing::debug!(
            "Retrieved {} chunks (requested top-{}), scores: {:?}",
            results.len(),
            k,
            results.iter().map(|r| r.score).collect::<Vec<_>>()
        );

        Ok(results)
    }

    fn check_dimensions(&self, entries: &[IndexEntry]) -> AppResult<()> {
        let expected = self.embedder.dimensions();
        if let Some(bad) = entries.iter().find(|e| e.embedding.len() != expected) {
            return Err(AppError::Embedding(format!(
                "Chunk {} has {} dimensions, expected {}",
                bad.position,
                bad.embedding.len(),
                expected
            )));
        }
        Ok(())
    }

    pub fn is_built(&self) -> bool {
        self.state.is_some()
    }

    pub fn len(&self) -> usize {
        self.state.as_ref().map_or(0, |s| s.entries.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn document_key(&self) -> Option<&str> {
        self.state.as_ref().map(|s| s.document_key.as_str())
    }

    pub fn built_at(&self) -> Option<DateTime<Utc>> {
        self.state.as_ref().map(|s| s.built_at)
    }

    pub fn origin(&self) -> IndexOrigin {
        self.state.as_ref().map_or(IndexOrigin::Absent, |s| s.origin)
    }
}
