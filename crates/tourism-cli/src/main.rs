//! Tourism RAG assistant
//!
//! Answers tourism questions grounded in a local chunk index.
//!
//! # Usage
//!
//! ```bash
//! tourism-rag ask "What is the history of Lalibela?" [--model MODEL] [--session ID] [--json]
//! tourism-rag chat [--model MODEL]
//! tourism-rag trace "Compare hotels in Axum and Gondar"
//! tourism-rag inspect [--query QUERY]
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (<config dir>/tourism-rag/config.toml)
//! 3. Environment variables (TOURISM_*, e.g. TOURISM_GENERATOR__MODEL)
//! 4. CLI flags

use anyhow::Result;
use clap::Parser;

use tourism_cli::{handle_ask, handle_chat, handle_inspect, handle_trace, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Ask {
            question,
            model,
            session,
            json,
        } => {
            handle_ask(
                cli.config.as_deref(),
                cli.log_level.as_deref(),
                &question,
                model,
                session,
                json,
            )
            .await?;
        }
        Commands::Chat { model } => {
            handle_chat(cli.config.as_deref(), cli.log_level.as_deref(), model).await?;
        }
        Commands::Trace { question } => {
            handle_trace(&question)?;
        }
        Commands::Inspect { query } => {
            handle_inspect(
                cli.config.as_deref(),
                cli.log_level.as_deref(),
                query.as_deref(),
            )
            .await?;
        }
    }

    Ok(())
}
