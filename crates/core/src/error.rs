//! Error types for Guidebot.
//!
//! A single error enum covers configuration, I/O, the opaque generation and
//! translation boundaries, embedding, and the precondition failures of the
//! retrieval pipeline.

use thiserror::Error;

/// Unified error type for Guidebot.
///
/// All fallible functions return `Result<T, AppError>`. Precondition
/// violations get dedicated variants so callers can match on them instead of
/// parsing messages.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The semantic index was queried before any successful build or load
    #[error("Semantic index has not been built")]
    IndexNotBuilt,

    /// The FAQ table holds no entries
    #[error("FAQ table is empty")]
    EmptyFaqTable,

    /// Answer generation failed (network or model failure)
    #[error("Generation service error: {0}")]
    Generation(String),

    /// Translation failed; recovered by the translation overlay
    #[error("Translation service error: {0}")]
    Translation(String),

    /// A source document could not be loaded
    #[error("Document load error: {0}")]
    DocumentLoad(String),

    /// Embedding provider errors
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Index store and retrieval errors
    #[error("Knowledge error: {0}")]
    Knowledge(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
