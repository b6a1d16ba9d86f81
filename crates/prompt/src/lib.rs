//! Prompt system for Guidebot.
//!
//! Prompts are YAML definitions with Handlebars templates. Two prompts ship
//! built in (grounded answering and translation); a workspace can override
//! either by placing `<id>.yml` under `.guidebot/prompts/`.

pub mod builder;
pub mod defaults;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use defaults::{GROUNDED_ANSWER_PROMPT_ID, TRANSLATION_PROMPT_ID};
pub use loader::{builtin_prompt, list_prompts, load_prompt};
pub use types::{BuiltPrompt, PromptDefinition};
