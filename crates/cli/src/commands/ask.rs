//! Ask command handler.

use super::print_json;
use clap::Args;
use guidebot_core::{config::AppConfig, AppResult};
use guidebot_knowledge::KnowledgeRuntime;

/// Answer a question from the guidelines
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    /// Target language code for the answer (e.g. "hi")
    #[arg(short, long)]
    pub language: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Question: {}", self.question);

        let language = self
            .language
            .clone()
            .unwrap_or_else(|| config.translation.source_language.clone());

        let runtime = KnowledgeRuntime::from_config(config)?;
        let result = runtime.ask(&self.question, &language).await?;

        if self.json {
            return print_json(&result);
        }

        println!("{}", result.answer);
        if let Some(suggestions) = &result.suggestions {
            println!();
            println!("Related questions:");
            for (i, question) in suggestions.iter().enumerate() {
                println!("  {}. {}", i + 1, question);
            }
        }

        Ok(())
    }
}
