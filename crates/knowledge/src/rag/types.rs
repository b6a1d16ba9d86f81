//! Answer types returned to callers.

use serde::{Deserialize, Serialize};

/// Phrase the generation service is instructed to emit when the retrieved
/// context does not contain the answer.
pub const NOT_IN_CONTEXT_SENTINEL: &str = "The answer is not available in the context.";

/// Result of a grounded `ask`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResult {
    /// Generated answer, or the sentinel when ungrounded (possibly translated)
    pub answer: String,

    /// Whether the answer came from the retrieved context
    pub grounded: bool,

    /// Whether FAQ suggestions are attached
    pub faq_available: bool,

    /// Suggested FAQ questions, only for ungrounded answers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<String>>,
}

impl AnswerResult {
    pub fn grounded(answer: String) -> Self {
        Self {
            answer,
            grounded: true,
            faq_available: false,
            suggestions: None,
        }
    }

    /// Ungrounded result; an empty suggestion list is dropped.
    pub fn ungrounded(answer: String, suggestions: Vec<String>) -> Self {
        let suggestions = (!suggestions.is_empty()).then_some(suggestions);
        Self {
            answer,
            grounded: false,
            faq_available: suggestions.is_some(),
            suggestions,
        }
    }
}

/// Result of a direct FAQ lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaqAnswer {
    /// Answer of the closest FAQ entry (possibly translated)
    pub answer: String,

    /// The FAQ question that matched, untranslated
    pub matched_question: String,

    /// Similarity of the matched question to the query
    #[serde(skip_serializing)]
    pub score: f32,
}
