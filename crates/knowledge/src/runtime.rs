//! Process-wide knowledge state with single-flight initialization.
//!
//! The FAQ matcher and the document index are built once, on first use.
//! Concurrent first callers share one build; if the build fails the cell
//! stays empty and the next call tries again.

use crate::chunker::{chunk_text, ChunkParams};
use crate::embeddings::{create_embedder, Embedder};
use crate::faq::{load_faq, FaqMatcher, FaqSuggestion};
use crate::parser::load_document;
use crate::rag::{AnswerOptions, AnswerResult, FaqAnswer, Orchestrator};
use crate::semantic_index::SemanticIndex;
use crate::store::{document_key, IndexStore};
use crate::translate::{LlmTranslator, TranslationOverlay, Translator};
use crate::types::{IndexOrigin, KnowledgeStats};
use guidebot_core::{AppConfig, AppResult, EmbeddingSettings};
use guidebot_llm::{create_client, LlmClient};
use guidebot_prompt::{load_prompt, GROUNDED_ANSWER_PROMPT_ID, TRANSLATION_PROMPT_ID};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::OnceCell;

/// Built state, read-only once initialized.
#[derive(Debug)]
struct KnowledgeState {
    /// `None` when no primary document exists
    index: Option<SemanticIndex>,
    faq: FaqMatcher,
}

/// Entry point for answering questions against the configured workspace.
pub struct KnowledgeRuntime {
    config: AppConfig,
    orchestrator: Orchestrator,
    document_embedder: Arc<dyn Embedder>,
    faq_embedder: Arc<dyn Embedder>,
    force_rebuild: bool,
    state: OnceCell<KnowledgeState>,
}

impl KnowledgeRuntime {
    /// Wire every collaborator from configuration.
    pub fn from_config(config: AppConfig) -> AppResult<Self> {
        let client = create_client(&config.provider, Some(&config.endpoint))?;

        let translation_prompt = load_prompt(&config.workspace, TRANSLATION_PROMPT_ID)?;
        let translator: Arc<dyn Translator> = Arc::new(LlmTranslator::new(
            client.clone(),
            config.model.clone(),
            translation_prompt,
        ));

        let document_embedder =
            create_embedder(&with_endpoint(&config.document_embedding, &config.endpoint))?;
        let faq_embedder = create_embedder(&with_endpoint(&config.faq_embedding, &config.endpoint))?;

        Self::new(config, client, translator, document_embedder, faq_embedder)
    }

    /// Assemble a runtime from explicit collaborators.
    pub fn new(
        config: AppConfig,
        client: Arc<dyn LlmClient>,
        translator: Arc<dyn Translator>,
        document_embedder: Arc<dyn Embedder>,
        faq_embedder: Arc<dyn Embedder>,
    ) -> AppResult<Self> {
        let answer_prompt = load_prompt(&config.workspace, GROUNDED_ANSWER_PROMPT_ID)?;

        let overlay = TranslationOverlay::new(
            translator,
            config.translation.source_language.clone(),
            Duration::from_secs(config.translation.timeout_secs),
        );

        let options = AnswerOptions {
            model: config.model.clone(),
            sampling: config.generation.clone(),
            retrieval_k: config.retrieval.top_k,
            suggestion_k: config.retrieval.suggestion_k,
        };

        Ok(Self {
            orchestrator: Orchestrator::new(client, answer_prompt, overlay, options),
            config,
            document_embedder,
            faq_embedder,
            force_rebuild: false,
            state: OnceCell::new(),
        })
    }

    /// Ignore any persisted index and re-embed the document.
    pub fn with_forced_rebuild(mut self, force: bool) -> Self {
        self.force_rebuild = force;
        self
    }

    /// Build (or reuse) the knowledge state and report on it.
    pub async fn initialize(&self) -> AppResult<KnowledgeStats> {
        self.stats().await
    }

    /// Grounded answer with FAQ fallback.
    pub async fn ask(&self, question: &str, language: &str) -> AppResult<AnswerResult> {
        let state = self.state().await?;
        self.orchestrator
            .ask(state.index.as_ref(), &state.faq, question, language)
            .await
    }

    /// Direct FAQ best match, bypassing generation.
    pub async fn faq_answer(&self, question: &str, language: &str) -> AppResult<FaqAnswer> {
        let state = self.state().await?;
        self.orchestrator
            .faq_answer(&state.faq, question, language)
            .await
    }

    /// Ranked FAQ questions for `question`.
    pub async fn suggest(&self, question: &str, k: usize) -> AppResult<Vec<FaqSuggestion>> {
        let state = self.state().await?;
        state.faq.suggest(question, k).await
    }

    pub async fn stats(&self) -> AppResult<KnowledgeStats> {
        let state = self.state().await?;
        let index = state.index.as_ref();

        Ok(KnowledgeStats {
            document_key: index.and_then(|i| i.document_key().map(str::to_string)),
            chunk_count: index.map_or(0, SemanticIndex::len),
            faq_entries: state.faq.len(),
            index_origin: index.map_or(IndexOrigin::Absent, SemanticIndex::origin),
            built_at: index.and_then(SemanticIndex::built_at),
        })
    }

    async fn state(&self) -> AppResult<&KnowledgeState> {
        self.state.get_or_try_init(|| self.build_state()).await
    }

    async fn build_state(&self) -> AppResult<KnowledgeState> {
        let start = Instant::now();
        tracing::info!("Initializing knowledge state");

        let faq_path = self.config.resolve(&self.config.faq_path);
        let faq = FaqMatcher::build(self.faq_embedder.clone(), load_faq(&faq_path)?).await?;

        let document_path = self.config.resolve(&self.config.document_path);
        let index = match load_document(&document_path)? {
            Some(text) => Some(self.build_index(&text).await?),
            None => None,
        };

        tracing::info!(
            "Knowledge state ready in {:.2}s ({} chunks, {} FAQ entries)",
            start.elapsed().as_secs_f64(),
            index.as_ref().map_or(0, SemanticIndex::len),
            faq.len()
        );

        Ok(KnowledgeState { index, faq })
    }

    async fn build_index(&self, text: &str) -> AppResult<SemanticIndex> {
        let key = document_key(text);
        let params = ChunkParams::new(
            self.config.retrieval.chunk_size,
            self.config.retrieval.chunk_overlap,
        );
        let store = IndexStore::new(self.config.resolve(&self.config.index_path));
        let mut index = SemanticIndex::new(self.document_embedder.clone()).with_store(store);

        let reuse = self.config.retrieval.reuse_persisted_index && !self.force_rebuild;
        if reuse && index.load_persisted(&key, params).await? {
            return Ok(index);
        }

        let chunks = chunk_text(text, params)?;
        index.build(&key, params, &chunks).await?;
        Ok(index)
    }
}

/// Remote embedders without their own endpoint share the generation endpoint.
fn with_endpoint(settings: &EmbeddingSettings, endpoint: &str) -> EmbeddingSettings {
    let mut settings = settings.clone();
    if settings.endpoint.is_none() && settings.provider != "trigram" {
        settings.endpoint = Some(endpoint.to_string());
    }
    settings
}
