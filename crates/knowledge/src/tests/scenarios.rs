//! End-to-end answering scenarios.

use super::*;
use crate::rag::NOT_IN_CONTEXT_SENTINEL;
use crate::types::IndexOrigin;
use tempfile::TempDir;

const PARIS: &str = "Paris is the capital of France.";

fn config_for(dir: &TempDir) -> AppConfig {
    AppConfig::for_workspace(dir.path().to_path_buf())
}

#[tokio::test]
async fn test_grounded_answer_has_no_suggestions() {
    let dir = TempDir::new().unwrap();
    write_workspace(dir.path(), Some(PARIS), Some(FAQ_SOURCE));
    let h = harness(
        config_for(&dir),
        StubClient::replying("Paris."),
        Arc::new(TaggingTranslator),
    );

    let result = h
        .runtime
        .ask("What is the capital of France?", "en")
        .await
        .unwrap();

    assert_eq!(result.answer, "Paris.");
    assert!(result.grounded);
    assert!(!result.faq_available);
    assert!(result.suggestions.is_none());

    let stats = h.runtime.stats().await.unwrap();
    assert_eq!(stats.chunk_count, 1);
    assert_eq!(stats.faq_entries, 7);
    assert_eq!(stats.index_origin, IndexOrigin::Built);
}

#[tokio::test]
async fn test_faq_answer_best_match_and_translation() {
    let dir = TempDir::new().unwrap();
    write_workspace(dir.path(), Some(PARIS), Some(FAQ_SOURCE));
    let client = StubClient::replying("unused");
    let h = harness(config_for(&dir), client.clone(), Arc::new(TaggingTranslator));

    let answer = h.runtime.faq_answer("Tell me about JJM", "en").await.unwrap();
    assert_eq!(answer.answer, "Jal Jeevan Mission.");

    let translated = h.runtime.faq_answer("Tell me about JJM", "hi").await.unwrap();
    assert_eq!(translated.answer, "[hi] Jal Jeevan Mission.");

    assert_eq!(client.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_ungrounded_answer_attaches_five_suggestions() {
    let dir = TempDir::new().unwrap();
    write_workspace(dir.path(), Some(PARIS), Some(FAQ_SOURCE));
    let h = harness(
        config_for(&dir),
        StubClient::replying(NOT_IN_CONTEXT_SENTINEL),
        Arc::new(TaggingTranslator),
    );

    let result = h
        .runtime
        .ask("Who checks the quality of drinking water?", "en")
        .await
        .unwrap();

    assert!(!result.grounded);
    assert!(result.faq_available);
    assert_eq!(result.answer, NOT_IN_CONTEXT_SENTINEL);

    let suggestions = result.suggestions.unwrap();
    assert_eq!(suggestions.len(), 5);
    assert_eq!(suggestions[0], "Who tests drinking water quality?");
}

#[tokio::test]
async fn test_small_faq_returns_all_suggestions() {
    let dir = TempDir::new().unwrap();
    write_workspace(
        dir.path(),
        Some(PARIS),
        Some("What is JJM?\nJal Jeevan Mission.\nWhat is an FHTC?\nA tap.\n"),
    );
    let h = harness(
        config_for(&dir),
        StubClient::replying(NOT_IN_CONTEXT_SENTINEL),
        Arc::new(TaggingTranslator),
    );

    let result = h.runtime.ask("Anything else?", "en").await.unwrap();
    assert_eq!(result.suggestions.unwrap().len(), 2);
}

#[tokio::test]
async fn test_translation_failure_keeps_original_text() {
    let dir = TempDir::new().unwrap();
    write_workspace(dir.path(), Some(PARIS), Some(FAQ_SOURCE));
    let h = harness(
        config_for(&dir),
        StubClient::replying(NOT_IN_CONTEXT_SENTINEL),
        Arc::new(BrokenTranslator),
    );

    let result = h.runtime.ask("What is JJM?", "hi").await.unwrap();
    assert_eq!(result.answer, NOT_IN_CONTEXT_SENTINEL);
    assert_eq!(result.suggestions.unwrap()[0], "What is JJM?");
}

#[tokio::test]
async fn test_generation_failure_is_request_error() {
    let dir = TempDir::new().unwrap();
    write_workspace(dir.path(), Some(PARIS), Some(FAQ_SOURCE));
    let h = harness(
        config_for(&dir),
        StubClient::failing(),
        Arc::new(TaggingTranslator),
    );

    let err = h.runtime.ask("capital?", "en").await.unwrap_err();
    assert!(matches!(err, AppError::Generation(_)));

    // The FAQ path does not depend on generation.
    assert!(h.runtime.faq_answer("What is JJM?", "en").await.is_ok());
}

#[tokio::test]
async fn test_missing_document_serves_faq_only() {
    let dir = TempDir::new().unwrap();
    write_workspace(dir.path(), None, Some(FAQ_SOURCE));
    let h = harness(
        config_for(&dir),
        StubClient::replying("Paris."),
        Arc::new(TaggingTranslator),
    );

    let err = h.runtime.ask("capital?", "en").await.unwrap_err();
    assert!(matches!(err, AppError::IndexNotBuilt));

    let answer = h.runtime.faq_answer("What is an FHTC?", "en").await.unwrap();
    assert_eq!(answer.answer, "A functional household tap connection.");

    let stats = h.runtime.stats().await.unwrap();
    assert_eq!(stats.index_origin, IndexOrigin::Absent);
    assert!(stats.document_key.is_none());
}

#[tokio::test]
async fn test_blank_document_is_treated_as_missing() {
    let dir = TempDir::new().unwrap();
    write_workspace(dir.path(), Some(" \n\n "), Some(FAQ_SOURCE));
    let client = StubClient::replying("Paris.");
    let h = harness(config_for(&dir), client.clone(), Arc::new(TaggingTranslator));

    let err = h.runtime.ask("capital?", "en").await.unwrap_err();
    assert!(matches!(err, AppError::IndexNotBuilt));
    assert_eq!(client.calls.load(Ordering::SeqCst), 0);

    let stats = h.runtime.stats().await.unwrap();
    assert_eq!(stats.index_origin, IndexOrigin::Absent);
    assert_eq!(stats.chunk_count, 0);
    assert_eq!(h.document_embedder.count(), 0);
}

#[tokio::test]
async fn test_missing_faq_fails_until_present() {
    let dir = TempDir::new().unwrap();
    write_workspace(dir.path(), Some(PARIS), None);
    let h = harness(
        config_for(&dir),
        StubClient::replying("Paris."),
        Arc::new(TaggingTranslator),
    );

    let err = h.runtime.ask("capital?", "en").await.unwrap_err();
    assert!(matches!(err, AppError::DocumentLoad(_)));

    write_workspace(dir.path(), None, Some(FAQ_SOURCE));
    assert!(h.runtime.ask("capital?", "en").await.unwrap().grounded);
}

#[tokio::test]
async fn test_persisted_index_reused_across_runtimes() {
    let dir = TempDir::new().unwrap();
    let document = "Piped water must reach every rural household.\n\n\
                    Village water committees plan and maintain the scheme.";
    write_workspace(dir.path(), Some(document), Some(FAQ_SOURCE));

    let first = harness(
        config_for(&dir),
        StubClient::replying("ok"),
        Arc::new(TaggingTranslator),
    );
    let built = first.runtime.initialize().await.unwrap();
    assert_eq!(built.index_origin, IndexOrigin::Built);

    let second = harness(
        config_for(&dir),
        StubClient::replying("ok"),
        Arc::new(TaggingTranslator),
    );
    let reused = second.runtime.initialize().await.unwrap();
    assert_eq!(reused.index_origin, IndexOrigin::Persisted);
    assert_eq!(reused.document_key, built.document_key);
    assert_eq!(reused.chunk_count, built.chunk_count);
    assert_eq!(second.document_embedder.count(), 0);

    let third = harness(
        config_for(&dir),
        StubClient::replying("ok"),
        Arc::new(TaggingTranslator),
    );
    let third_runtime = third.runtime.with_forced_rebuild(true);
    let rebuilt = third_runtime.initialize().await.unwrap();
    assert_eq!(rebuilt.index_origin, IndexOrigin::Built);
}

#[tokio::test]
async fn test_changed_document_is_rebuilt() {
    let dir = TempDir::new().unwrap();
    write_workspace(dir.path(), Some(PARIS), Some(FAQ_SOURCE));

    let first = harness(
        config_for(&dir),
        StubClient::replying("ok"),
        Arc::new(TaggingTranslator),
    );
    let before = first.runtime.initialize().await.unwrap();

    write_workspace(dir.path(), Some("Berlin is the capital of Germany."), None);
    let second = harness(
        config_for(&dir),
        StubClient::replying("ok"),
        Arc::new(TaggingTranslator),
    );
    let after = second.runtime.initialize().await.unwrap();

    assert_eq!(after.index_origin, IndexOrigin::Built);
    assert_ne!(after.document_key, before.document_key);
}

#[tokio::test]
async fn test_reuse_disabled_always_rebuilds() {
    let dir = TempDir::new().unwrap();
    write_workspace(dir.path(), Some(PARIS), Some(FAQ_SOURCE));

    let mut config = config_for(&dir);
    config.retrieval.reuse_persisted_index = false;

    let first = harness(config.clone(), StubClient::replying("ok"), Arc::new(TaggingTranslator));
    first.runtime.initialize().await.unwrap();

    let second = harness(config, StubClient::replying("ok"), Arc::new(TaggingTranslator));
    let stats = second.runtime.initialize().await.unwrap();
    assert_eq!(stats.index_origin, IndexOrigin::Built);
    assert_eq!(second.document_embedder.count(), 1);
}
