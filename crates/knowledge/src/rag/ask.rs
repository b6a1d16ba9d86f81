//! Grounded answer orchestration.
//!
//! Per query: retrieve the top chunks, generate under the grounded-answer
//! prompt, classify the output by the sentinel phrase, and on a miss attach
//! FAQ suggestions. Every outgoing text passes through the translation
//! overlay.

use crate::faq::FaqMatcher;
use crate::rag::types::{AnswerResult, FaqAnswer, NOT_IN_CONTEXT_SENTINEL};
use crate::semantic_index::SemanticIndex;
use crate::translate::TranslationOverlay;
use crate::types::RankedChunk;
use guidebot_core::config::GenerationSettings;
use guidebot_core::{AppError, AppResult};
use guidebot_llm::{LlmClient, LlmRequest};
use guidebot_prompt::{build_prompt, PromptDefinition};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Knobs for a single answer.
#[derive(Debug, Clone)]
pub struct AnswerOptions {
    /// Generation model identifier
    pub model: String,

    pub sampling: GenerationSettings,

    /// Chunks fed to generation
    pub retrieval_k: usize,

    /// FAQ questions suggested on a miss
    pub suggestion_k: usize,
}

impl AnswerOptions {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            sampling: GenerationSettings::default(),
            retrieval_k: 4,
            suggestion_k: 5,
        }
    }

    fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.sampling.timeout_secs)
    }
}

/// Outcome of the generation step.
#[derive(Debug, Clone, PartialEq)]
enum Generated {
    Grounded(String),
    Ungrounded,
}

/// Join retrieved chunk texts, in rank order, separated by blank lines.
pub fn build_context(chunks: &[RankedChunk]) -> String {
    chunks
        .iter()
        .map(|chunk| chunk.text.trim())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Whether generated text is a real answer rather than the sentinel.
pub fn is_grounded(generated: &str) -> bool {
    !generated.contains(NOT_IN_CONTEXT_SENTINEL)
}

/// Drives one query through retrieval, generation and fallback.
pub struct Orchestrator {
    client: Arc<dyn LlmClient>,
    prompt: PromptDefinition,
    overlay: TranslationOverlay,
    options: AnswerOptions,
}

impl Orchestrator {
    pub fn new(
        client: Arc<dyn LlmClient>,
        prompt: PromptDefinition,
        overlay: TranslationOverlay,
        options: AnswerOptions,
    ) -> Self {
        Self {
            client,
            prompt,
            overlay,
            options,
        }
    }

    /// Answer `question` from the indexed document, falling back to FAQ
    /// suggestions when the context does not contain the answer.
    ///
    /// Fails with `IndexNotBuilt` when no document index is available and
    /// with a generation error when the generation service fails. A
    /// generation timeout, or retrieval that finds no context at all, is
    /// treated as ungrounded.
    pub async fn ask(
        &self,
        index: Option<&SemanticIndex>,
        faq: &FaqMatcher,
        question: &str,
        language: &str,
    ) -> AppResult<AnswerResult> {
        let index = index.ok_or(AppError::IndexNotBuilt)?;
        tracing::debug!(question = %question, "Retrieving context");

        let chunks = index.query(question, self.options.retrieval_k).await?;
        tracing::info!(
            "Retrieved {} chunks (top score: {:.3})",
            chunks.len(),
            chunks.first().map_or(0.0, |c| c.score)
        );

        let generated = if chunks.is_empty() {
            tracing::info!("No context retrieved, skipping generation");
            Generated::Ungrounded
        } else {
            self.generate(question, &chunks).await?
        };

        match generated {
            Generated::Grounded(answer) => {
                tracing::info!("Answer grounded in retrieved context");
                let answer = self.overlay.apply(&answer, language).await;
                Ok(AnswerResult::grounded(answer))
            }
            Generated::Ungrounded => {
                let suggestions: Vec<String> = faq
                    .suggest(question, self.options.suggestion_k)
                    .await?
                    .into_iter()
                    .map(|s| s.question)
                    .collect();
                tracing::info!(
                    "Answer not in context, attaching {} FAQ suggestions",
                    suggestions.len()
                );

                let (answer, suggestions) = tokio::join!(
                    self.overlay.apply(NOT_IN_CONTEXT_SENTINEL, language),
                    self.overlay.apply_all(&suggestions, language)
                );
                Ok(AnswerResult::ungrounded(answer, suggestions))
            }
        }
    }

    /// Answer directly from the closest FAQ entry, bypassing generation.
    pub async fn faq_answer(
        &self,
        faq: &FaqMatcher,
        question: &str,
        language: &str,
    ) -> AppResult<FaqAnswer> {
        let found = faq.best_match(question).await?;
        tracing::info!(
            "FAQ match '{}' (score {:.3})",
            found.question,
            found.score
        );

        Ok(FaqAnswer {
            answer: self.overlay.apply(&found.answer, language).await,
            matched_question: found.question,
            score: found.score,
        })
    }

    async fn generate(&self, question: &str, chunks: &[RankedChunk]) -> AppResult<Generated> {
        let variables = HashMap::from([
            ("context".to_string(), build_context(chunks)),
            ("question".to_string(), question.to_string()),
            ("sentinel".to_string(), NOT_IN_CONTEXT_SENTINEL.to_string()),
        ]);
        let built = build_prompt(&self.prompt, &variables)?;

        let sampling = &self.options.sampling;
        let mut request = LlmRequest::new(built.user, &self.options.model)
            .with_temperature(sampling.temperature)
            .with_max_tokens(sampling.max_tokens)
            .with_sampling(sampling.top_p, sampling.top_k);
        for stop in &sampling.stop {
            request = request.with_stop(stop.clone());
        }
        if let Some(system) = built.system {
            request = request.with_system(system);
        }

        tracing::debug!(
            "Generating with {} (model: {})",
            self.client.provider_name(),
            self.options.model
        );

        let timeout = self.options.generation_timeout();
        let response = match tokio::time::timeout(timeout, self.client.complete(&request)).await {
            Ok(response) => response?,
            Err(_) => {
                tracing::warn!("Generation timed out after {:?}, treating as ungrounded", timeout);
                return Ok(Generated::Ungrounded);
            }
        };

        let content = response.content.trim();
        if is_grounded(content) {
            Ok(Generated::Grounded(content.to_string()))
        } else {
            Ok(Generated::Ungrounded)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunker::{Chunk, ChunkParams};
    use crate::embeddings::TrigramEmbedder;
    use crate::faq::{parse_faq, FaqMatcher};
    use crate::translate::Translator;
    use guidebot_llm::{LlmResponse, LlmUsage};
    use guidebot_prompt::{builtin_prompt, GROUNDED_ANSWER_PROMPT_ID};
    use std::sync::Mutex;

    /// Replies with a fixed text and records the requests it saw.
    struct ScriptedClient {
        reply: AppResult<String>,
        delay: Duration,
        requests: Mutex<Vec<LlmRequest>>,
    }

    impl ScriptedClient {
        fn replying(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                delay: Duration::ZERO,
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl LlmClient for ScriptedClient {
        fn provider_name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
            self.requests.lock().unwrap().push(request.clone());
            tokio::time::sleep(self.delay).await;
            match &self.reply {
                Ok(content) => Ok(LlmResponse {
                    content: content.clone(),
                    model: request.model.clone(),
                    usage: LlmUsage::default(),
                    done: true,
                }),
                Err(e) => Err(AppError::Generation(e.to_string())),
            }
        }
    }

    struct Shouting;

    #[async_trait::async_trait]
    impl Translator for Shouting {
        async fn translate(&self, text: &str, _language: &str) -> AppResult<String> {
            Ok(text.to_uppercase())
        }
    }

    fn orchestrator(client: Arc<ScriptedClient>, timeout_secs: u64) -> Orchestrator {
        let mut options = AnswerOptions::new("llama3.2");
        options.sampling.timeout_secs = timeout_secs;
        Orchestrator::new(
            client,
            builtin_prompt(GROUNDED_ANSWER_PROMPT_ID).unwrap(),
            TranslationOverlay::new(Arc::new(Shouting), "en", Duration::from_secs(1)),
            options,
        )
    }

    async fn index_of(texts: &[&str]) -> SemanticIndex {
        let chunks: Vec<Chunk> = texts
            .iter()
            .enumerate()
            .map(|(position, text)| Chunk {
                position,
                text: text.to_string(),
                byte_range: 0..text.len(),
            })
            .collect();
        let mut index = SemanticIndex::new(Arc::new(TrigramEmbedder::new(256)));
        index.build("doc", ChunkParams::default(), &chunks).await.unwrap();
        index
    }

    async fn faq() -> FaqMatcher {
        let entries = parse_faq(
            "What is JJM?\nJal Jeevan Mission.\nWho tests water quality?\nVolunteers.\nWhat is an FHTC?\nA tap connection.",
        );
        FaqMatcher::build(Arc::new(TrigramEmbedder::new(256)), entries)
            .await
            .unwrap()
    }

    #[test]
    fn test_build_context_in_rank_order() {
        let chunks = vec![
            RankedChunk {
                position: 3,
                text: "  best  ".to_string(),
                score: 0.9,
            },
            RankedChunk {
                position: 0,
                text: "second".to_string(),
                score: 0.5,
            },
        ];
        assert_eq!(build_context(&chunks), "best\n\nsecond");
    }

    #[test]
    fn test_is_grounded() {
        assert!(is_grounded("Paris."));
        assert!(!is_grounded(NOT_IN_CONTEXT_SENTINEL));
        assert!(!is_grounded(
            "Sorry. The answer is not available in the context. Try again."
        ));
    }

    #[tokio::test]
    async fn test_grounded_answer() {
        let client = Arc::new(ScriptedClient::replying(" Paris. \n"));
        let orchestrator = orchestrator(client.clone(), 5);
        let index = index_of(&["Paris is the capital of France."]).await;

        let result = orchestrator
            .ask(Some(&index), &faq().await, "What is the capital of France?", "en")
            .await
            .unwrap();

        assert_eq!(result, AnswerResult::grounded("Paris.".to_string()));

        let requests = client.requests.lock().unwrap();
        let prompt = &requests[0].prompt;
        assert!(prompt.contains("Context:\nParis is the capital of France."));
        assert!(prompt.contains("Question:\nWhat is the capital of France?"));
        assert!(prompt.contains(NOT_IN_CONTEXT_SENTINEL));
        assert!(requests[0].stop.is_empty());
    }

    #[tokio::test]
    async fn test_grounded_answer_is_translated() {
        let client = Arc::new(ScriptedClient::replying("Paris."));
        let orchestrator = orchestrator(client, 5);
        let index = index_of(&["Paris is the capital of France."]).await;

        let result = orchestrator
            .ask(Some(&index), &faq().await, "capital?", "fr")
            .await
            .unwrap();
        assert_eq!(result.answer, "PARIS.");
        assert!(result.grounded);
    }

    #[tokio::test]
    async fn test_sentinel_triggers_suggestions() {
        let client = Arc::new(ScriptedClient::replying(NOT_IN_CONTEXT_SENTINEL));
        let orchestrator = orchestrator(client, 5);
        let index = index_of(&["Paris is the capital of France."]).await;

        let result = orchestrator
            .ask(Some(&index), &faq().await, "Who checks water quality?", "en")
            .await
            .unwrap();

        assert!(!result.grounded);
        assert!(result.faq_available);
        assert_eq!(result.answer, NOT_IN_CONTEXT_SENTINEL);

        let suggestions = result.suggestions.unwrap();
        assert_eq!(suggestions.len(), 3);
        assert_eq!(suggestions[0], "Who tests water quality?");
    }

    #[tokio::test]
    async fn test_suggestions_translated_independently() {
        let client = Arc::new(ScriptedClient::replying(NOT_IN_CONTEXT_SENTINEL));
        let orchestrator = orchestrator(client, 5);
        let index = index_of(&["Unrelated text."]).await;

        let result = orchestrator
            .ask(Some(&index), &faq().await, "water quality", "hi")
            .await
            .unwrap();

        assert_eq!(result.answer, NOT_IN_CONTEXT_SENTINEL.to_uppercase());
        assert!(result
            .suggestions
            .unwrap()
            .iter()
            .all(|s| s == &s.to_uppercase()));
    }

    #[tokio::test]
    async fn test_generation_timeout_is_ungrounded() {
        let client = Arc::new(ScriptedClient {
            reply: Ok("Too late.".to_string()),
            delay: Duration::from_secs(30),
            requests: Mutex::new(Vec::new()),
        });
        let orchestrator = orchestrator(client, 0);
        let index = index_of(&["Paris is the capital of France."]).await;

        let result = orchestrator
            .ask(Some(&index), &faq().await, "What is JJM?", "en")
            .await
            .unwrap();

        assert!(!result.grounded);
        assert!(result.faq_available);
    }

    #[tokio::test]
    async fn test_generation_error_propagates() {
        let client = Arc::new(ScriptedClient {
            reply: Err(AppError::Generation("connection refused".to_string())),
            delay: Duration::ZERO,
            requests: Mutex::new(Vec::new()),
        });
        let orchestrator = orchestrator(client, 5);
        let index = index_of(&["Paris is the capital of France."]).await;

        let err = orchestrator
            .ask(Some(&index), &faq().await, "capital?", "en")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Generation(_)));
    }

    #[tokio::test]
    async fn test_sampling_reaches_request() {
        let client = Arc::new(ScriptedClient::replying("Paris."));
        let mut options = AnswerOptions::new("llama3.2");
        options.sampling.stop = vec!["\n".to_string()];
        options.sampling.top_k = 40;
        let orchestrator = Orchestrator::new(
            client.clone(),
            builtin_prompt(GROUNDED_ANSWER_PROMPT_ID).unwrap(),
            TranslationOverlay::new(Arc::new(Shouting), "en", Duration::from_secs(1)),
            options,
        );
        let index = index_of(&["Paris is the capital of France."]).await;

        orchestrator
            .ask(Some(&index), &faq().await, "capital?", "en")
            .await
            .unwrap();

        let requests = client.requests.lock().unwrap();
        assert_eq!(requests[0].stop, vec!["\n".to_string()]);
        assert_eq!(requests[0].top_k, Some(40));
        assert_eq!(requests[0].max_tokens, Some(1000));
    }

    #[tokio::test]
    async fn test_empty_index_skips_generation() {
        let client = Arc::new(ScriptedClient::replying("Paris."));
        let orchestrator = orchestrator(client.clone(), 5);
        let index = index_of(&[]).await;

        let result = orchestrator
            .ask(Some(&index), &faq().await, "What is the capital of France?", "en")
            .await
            .unwrap();

        assert!(!result.grounded);
        assert_eq!(result.answer, NOT_IN_CONTEXT_SENTINEL);
        assert_eq!(result.suggestions.map(|s| s.len()), Some(3));
        assert!(client.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_index() {
        let orchestrator = orchestrator(Arc::new(ScriptedClient::replying("x")), 5);
        let err = orchestrator
            .ask(None, &faq().await, "capital?", "en")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::IndexNotBuilt));
    }

    #[tokio::test]
    async fn test_faq_answer() {
        let orchestrator = orchestrator(Arc::new(ScriptedClient::replying("unused")), 5);
        let faq = faq().await;

        let found = orchestrator
            .faq_answer(&faq, "Tell me about JJM", "en")
            .await
            .unwrap();
        assert_eq!(found.answer, "Jal Jeevan Mission.");
        assert_eq!(found.matched_question, "What is JJM?");

        let translated = orchestrator
            .faq_answer(&faq, "Tell me about JJM", "hi")
            .await
            .unwrap();
        assert_eq!(translated.answer, "JAL JEEVAN MISSION.");
    }
}
