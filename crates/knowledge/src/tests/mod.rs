//! Cross-module tests driving the full runtime against stub services.

mod scenarios;

use crate::embeddings::{Embedder, TrigramEmbedder};
use crate::runtime::KnowledgeRuntime;
use crate::translate::Translator;
use guidebot_core::{AppConfig, AppError, AppResult};
use guidebot_llm::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub(crate) const FAQ_SOURCE: &str = "\
Jal Jeevan Mission FAQ

What is JJM?
Jal Jeevan Mission.

Who tests drinking water quality?
Trained women volunteers use field test kits.

What is an FHTC?
A functional household tap connection.

Who maintains the piped water scheme?
The village water and sanitation committee.

What is the community contribution?
A share of the capital cost of in-village infrastructure.

How is the village action plan prepared?
By the gram panchayat together with the community.

When is a village declared Har Ghar Jal?
When every household has a tap connection and the gram sabha certifies it.
";

/// Generation stub returning one fixed reply.
pub(crate) struct StubClient {
    reply: Option<String>,
    pub calls: AtomicUsize,
}

impl StubClient {
    pub fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Some(reply.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            reply: None,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait::async_trait]
impl LlmClient for StubClient {
    fn provider_name(&self) -> &str {
        "stub"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let content = self
            .reply
            .clone()
            .ok_or_else(|| AppError::Generation("service unavailable".to_string()))?;

        Ok(LlmResponse {
            content,
            model: request.model.clone(),
            usage: LlmUsage::default(),
            done: true,
        })
    }
}

/// Translator stub: prefixes the language code.
pub(crate) struct TaggingTranslator;

#[async_trait::async_trait]
impl Translator for TaggingTranslator {
    async fn translate(&self, text: &str, language: &str) -> AppResult<String> {
        Ok(format!("[{}] {}", language, text))
    }
}

/// Translator stub that always fails.
pub(crate) struct BrokenTranslator;

#[async_trait::async_trait]
impl Translator for BrokenTranslator {
    async fn translate(&self, _text: &str, _language: &str) -> AppResult<String> {
        Err(AppError::Translation("network unreachable".to_string()))
    }
}

/// Trigram embedder that counts the texts it embeds and yields while doing
/// so, widening any window for duplicate builds.
#[derive(Debug)]
pub(crate) struct CountingEmbedder {
    inner: TrigramEmbedder,
    pub texts: AtomicUsize,
}

impl CountingEmbedder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: TrigramEmbedder::new(384),
            texts: AtomicUsize::new(0),
        })
    }

    pub fn count(&self) -> usize {
        self.texts.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Embedder for CountingEmbedder {
    fn provider_name(&self) -> &str {
        self.inner.provider_name()
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        self.texts.fetch_add(texts.len(), Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.inner.embed_batch(texts).await
    }
}

/// Write the workspace files; `None` leaves a file absent.
pub(crate) fn write_workspace(dir: &Path, document: Option<&str>, faq: Option<&str>) {
    if let Some(document) = document {
        std::fs::write(dir.join("JJM_Operational_Guidelines.txt"), document).unwrap();
    }
    if let Some(faq) = faq {
        std::fs::write(dir.join("faq.txt"), faq).unwrap();
    }
}

pub(crate) struct Harness {
    pub runtime: KnowledgeRuntime,
    pub document_embedder: Arc<CountingEmbedder>,
    pub faq_embedder: Arc<CountingEmbedder>,
}

pub(crate) fn harness(
    config: AppConfig,
    client: Arc<StubClient>,
    translator: Arc<dyn Translator>,
) -> Harness {
    let document_embedder = CountingEmbedder::new();
    let faq_embedder = CountingEmbedder::new();

    let runtime = KnowledgeRuntime::new(
        config,
        client,
        translator,
        document_embedder.clone(),
        faq_embedder.clone(),
    )
    .unwrap();

    Harness {
        runtime,
        document_embedder,
        faq_embedder,
    }
}
