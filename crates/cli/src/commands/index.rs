//! Index command handler.

use super::print_json;
use clap::Args;
use guidebot_core::{config::AppConfig, AppResult};
use guidebot_knowledge::{IndexOrigin, KnowledgeRuntime};

/// Build or reuse the document index and show its state
#[derive(Args, Debug)]
pub struct IndexCommand {
    /// Re-embed the document even if a matching persisted index exists
    #[arg(long)]
    pub rebuild: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IndexCommand {
    pub async fn execute(&self, config: AppConfig) -> AppResult<()> {
        tracing::info!("Executing index command (rebuild: {})", self.rebuild);

        let index_path = config.resolve(&config.index_path);
        let runtime = KnowledgeRuntime::from_config(config)?.with_forced_rebuild(self.rebuild);
        let stats = runtime.initialize().await?;

        if self.json {
            return print_json(&stats);
        }

        match stats.index_origin {
            IndexOrigin::Absent => println!("No primary document found; FAQ only."),
            IndexOrigin::Built => println!("Built index with {} chunks.", stats.chunk_count),
            IndexOrigin::Persisted => {
                println!("Reused persisted index with {} chunks.", stats.chunk_count)
            }
        }

        if let Some(key) = &stats.document_key {
            println!("Document:   {}", key);
        }
        if let Some(built_at) = stats.built_at {
            println!("Built at:   {}", built_at.to_rfc3339());
        }
        println!("Store:      {}", index_path.display());
        println!("FAQ:        {} entries", stats.faq_entries);

        Ok(())
    }
}
