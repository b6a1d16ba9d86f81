//! Guidebot CLI
//!
//! Grounded answers over an operational-guidelines document, with FAQ
//! fallback and optional translation.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AskCommand, FaqCommand, IndexCommand, SuggestCommand};
use guidebot_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// Guidebot - grounded Q&A over operational guidelines
#[derive(Parser, Debug)]
#[command(name = "guidebot")]
#[command(about = "Grounded Q&A over operational guidelines with FAQ fallback", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "GUIDEBOT_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "GUIDEBOT_CONFIG")]
    config: Option<PathBuf>,

    /// Log level or filter (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Generation provider (ollama)
    #[arg(short, long, global = true)]
    provider: Option<String>,

    /// Generation model identifier
    #[arg(short, long, global = true)]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Answer a question from the guidelines, with FAQ suggestions on a miss
    Ask(AskCommand),

    /// Answer directly from the closest FAQ entry
    Faq(FaqCommand),

    /// List the FAQ questions closest to a query
    Suggest(SuggestCommand),

    /// Build or reuse the document index and show its state
    Index(IndexCommand),
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Ask(_) => "ask",
            Commands::Faq(_) => "faq",
            Commands::Suggest(_) => "suggest",
            Commands::Index(_) => "index",
        }
    }
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();

    let config = AppConfig::load(cli.workspace, cli.config)?.with_overrides(
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    logging::init_logging(config.log_level.as_deref(), config.no_color)?;
    config.validate()?;

    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {} (model: {})", config.provider, config.model);

    let _span = tracing::info_span!("command", name = cli.command.name()).entered();

    let result = match cli.command {
        Commands::Ask(cmd) => cmd.execute(config).await,
        Commands::Faq(cmd) => cmd.execute(config).await,
        Commands::Suggest(cmd) => cmd.execute(config).await,
        Commands::Index(cmd) => cmd.execute(config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
