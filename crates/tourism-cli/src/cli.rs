//! CLI argument parsing for the tourism query engine.
//!
//! CLI flags override every other configuration source.

use clap::{Parser, Subcommand};

/// Tourism RAG assistant
///
/// Answers tourism questions grounded in a local chunk index.
#[derive(Parser, Debug)]
#[command(name = "tourism-rag")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default <config dir>/tourism-rag/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Answer a single question
    Ask {
        /// The question to answer
        question: String,

        /// Backend model (default from config)
        #[arg(short, long)]
        model: Option<String>,

        /// Session ID to tag the exchange with (generated when absent)
        #[arg(short, long)]
        session: Option<String>,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Interactive session keeping conversation history
    Chat {
        /// Backend model (default from config)
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Show how a question would be classified
    Trace {
        /// The question to classify
        question: String,
    },

    /// Inspect the chunk index
    Inspect {
        /// Show the strategy and chunks selected for this query
        #[arg(short, long)]
        query: Option<String>,
    },
}
