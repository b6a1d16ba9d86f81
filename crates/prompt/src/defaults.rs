//! Built-in prompt definitions.

/// Prompt that constrains answers to retrieved context.
///
/// Inputs: `context`, `question`, `sentinel`.
pub const GROUNDED_ANSWER_PROMPT_ID: &str = "qa.grounded";

/// Prompt that translates a piece of text.
///
/// Inputs: `text`, `language`.
pub const TRANSLATION_PROMPT_ID: &str = "translate.default";

pub(crate) const GROUNDED_ANSWER_YAML: &str = r#"
id: qa.grounded
title: Grounded answer from retrieved context
apiVersion: "1.0"
createdBy: guidebot
inputs: [context, question, sentinel]
template: |
  You are an expert on the operational guidelines below. Answer the question as detailed as possible from the provided context.
  If the answer is not in the provided context, say "{{sentinel}}" Do not provide a wrong answer.

  Context:
  {{context}}

  Question:
  {{question}}

  Answer:
"#;

pub(crate) const TRANSLATION_YAML: &str = r#"
id: translate.default
title: Translate text
apiVersion: "1.0"
createdBy: guidebot
inputs: [text, language]
system: |
  You are a translation engine. Reply with the translation only, without notes, quotes or explanations.
template: |
  Translate the following text into the language with code "{{language}}". Keep numbers, names and formatting unchanged.

  {{text}}
"#;
