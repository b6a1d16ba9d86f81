//! FAQ command handler.

use super::print_json;
use clap::Args;
use guidebot_core::{config::AppConfig, AppResult};
use guidebot_knowledge::KnowledgeRuntime;

/// Answer directly from the closest FAQ entry
#[derive(Args, Debug)]
pub struct FaqCommand {
    /// The question to match
    pub question: String,

    /// Target language code for the answer (e.g. "hi")
    #[arg(short, long)]
    pub language: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl FaqCommand {
    pub async fn execute(&self, config: AppConfig) -> AppResult<()> {
        tracing::info!("Executing faq command");

        let language = self
            .language
            .clone()
            .unwrap_or_else(|| config.translation.source_language.clone());

        let runtime = KnowledgeRuntime::from_config(config)?;
        let answer = runtime.faq_answer(&self.question, &language).await?;

        if self.json {
            return print_json(&answer);
        }

        println!("{}", answer.answer);
        tracing::debug!(
            "Matched '{}' (score {:.3})",
            answer.matched_question,
            answer.score
        );

        Ok(())
    }
}
