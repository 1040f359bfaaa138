//! # tourism-types
//!
//! Shared domain types for the tourism query engine.
//!
//! This crate defines the data structures threaded through the orchestration
//! pipeline:
//! - Chunks: Retrieved units of document text with metadata
//! - Intents: The closed set of categories a query is routed under
//! - Retrieval strategies: Lexical, dense, or similarity-filtered hybrid
//! - Request state: The record each orchestration node transforms
//! - Settings: Layered configuration
//!
//! ## Usage
//!
//! ```rust
//! use tourism_types::{Intent, RequestState};
//!
//! let state = RequestState::new("Plan a 3 day trip to Harar", vec![], "qwen:0.5b")
//!     .with_intent(Intent::PlanTrip);
//! assert_eq!(state.intent, Some(Intent::PlanTrip));
//! ```

pub mod chunk;
pub mod config;
pub mod error;
pub mod history;
pub mod intent;
pub mod state;
pub mod strategy;

pub use chunk::{Chunk, ScoredChunk, FILENAME_KEY, FILE_ID_KEY};
pub use config::{
    EmbedderKind, EmbeddingSettings, FallbackSettings, GeneratorSettings, ReflectionSettings,
    RetrievalSettings, Settings,
};
pub use error::TourismError;
pub use history::{ChatTurn, TurnRole};
pub use intent::{Intent, Verdict};
pub use state::RequestState;
pub use strategy::RetrievalStrategy;
