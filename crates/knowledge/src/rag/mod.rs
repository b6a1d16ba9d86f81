//! Grounded answering: retrieval, constrained generation, FAQ fallback.

pub mod ask;
pub mod types;

pub use ask::{build_context, is_grounded, AnswerOptions, Orchestrator};
pub use types::{AnswerResult, FaqAnswer, NOT_IN_CONTEXT_SENTINEL};
