//! Suggest command handler.

use super::print_json;
use clap::Args;
use guidebot_core::{config::AppConfig, AppResult};
use guidebot_knowledge::KnowledgeRuntime;

/// List the FAQ questions closest to a query
#[derive(Args, Debug)]
pub struct SuggestCommand {
    /// Query text
    pub question: String,

    /// Number of suggestions (default: configured suggestion count)
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl SuggestCommand {
    pub async fn execute(&self, config: AppConfig) -> AppResult<()> {
        tracing::info!("Executing suggest command");

        let k = self.top_k.unwrap_or(config.retrieval.suggestion_k);
        let runtime = KnowledgeRuntime::from_config(config)?;
        let suggestions = runtime.suggest(&self.question, k).await?;

        if self.json {
            return print_json(&suggestions);
        }

        if suggestions.is_empty() {
            println!("No FAQ entries.");
        }
        for (i, suggestion) in suggestions.iter().enumerate() {
            println!("{:>2}. [{:.3}] {}", i + 1, suggestion.score, suggestion.question);
        }

        Ok(())
    }
}
