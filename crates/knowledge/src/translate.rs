//! Best-effort translation of outgoing text.
//!
//! [`TranslationOverlay`] never fails: any translator error or timeout is
//! logged and the original text is returned unchanged.

use futures::future::join_all;
use guidebot_core::{AppError, AppResult};
use guidebot_llm::{LlmClient, LlmRequest};
use guidebot_prompt::{build_prompt, PromptDefinition};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Translates text into a language identified by its code (e.g. "hi").
#[async_trait::async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, language: &str) -> AppResult<String>;
}

/// Translator that asks the generation service using a translation prompt.
pub struct LlmTranslator {
    client: Arc<dyn LlmClient>,
    model: String,
    prompt: PromptDefinition,
}

impl LlmTranslator {
    pub fn new(
        client: Arc<dyn LlmClient>,
        model: impl Into<String>,
        prompt: PromptDefinition,
    ) -> Self {
        Self {
            client,
            model: model.into(),
            prompt,
        }
    }
}

#[async_trait::async_trait]
impl Translator for LlmTranslator {
    async fn translate(&self, text: &str, language: &str) -> AppResult<String> {
        let variables = HashMap::from([
            ("text".to_string(), text.to_string()),
            ("language".to_string(), language.to_string()),
        ]);
        let built = build_prompt(&self.prompt, &variables)?;

        let mut request = LlmRequest::new(built.user, &self.model).with_temperature(0.0);
        if let Some(system) = built.system {
            request = request.with_system(system);
        }

        let response = self
            .client
            .complete(&request)
            .await
            .map_err(|e| AppError::Translation(e.to_string()))?;

        let translated = response.content.trim();
        if translated.is_empty() {
            return Err(AppError::Translation(
                "Translator returned empty text".to_string(),
            ));
        }

        Ok(translated.to_string())
    }
}

/// Wraps a [`Translator`] with the never-fail policy.
#[derive(Clone)]
pub struct TranslationOverlay {
    translator: Arc<dyn Translator>,
    source_language: String,
    timeout: Duration,
}

impl TranslationOverlay {
    pub fn new(
        translator: Arc<dyn Translator>,
        source_language: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            translator,
            source_language: source_language.into(),
            timeout,
        }
    }

    /// Whether text bound for `language` goes through the translator at all.
    pub fn needs_translation(&self, language: &str) -> bool {
        let language = language.trim();
        !language.is_empty() && !language.eq_ignore_ascii_case(&self.source_language)
    }

    /// Translate `text` into `language`, or return it unchanged.
    ///
    /// Single attempt, bounded by the configured timeout.
    pub async fn apply(&self, text: &str, language: &str) -> String {
        if text.trim().is_empty() || !self.needs_translation(language) {
            return text.to_string();
        }

        let language = language.trim();
        match tokio::time::timeout(self.timeout, self.translator.translate(text, language)).await {
            Ok(Ok(translated)) => translated,
            Ok(Err(e)) => {
                tracing::warn!("Translation to '{}' failed, keeping original: {}", language, e);
                text.to_string()
            }
            Err(_) => {
                tracing::warn!(
                    "Translation to '{}' timed out after {:?}, keeping original",
                    language,
                    self.timeout
                );
                text.to_string()
            }
        }
    }

    /// Translate each text independently, preserving order.
    pub async fn apply_all(&self, texts: &[String], language: &str) -> Vec<String> {
        join_all(texts.iter().map(|text| self.apply(text, language))).await
    }
}
