//! Tourism query engine CLI library exports.
//!
//! # Modules
//!
//! - `cli`: Command-line argument parsing with clap
//! - `commands`: Command implementations (ask, chat, trace, inspect)

pub mod cli;
pub mod commands;

pub use cli::{Cli, Commands};
pub use commands::{
    answer_in_session, build_embedder, build_generator, format_output, handle_ask, handle_chat,
    handle_inspect, handle_trace, init_logging, inspect_report, load_index, load_settings,
};
