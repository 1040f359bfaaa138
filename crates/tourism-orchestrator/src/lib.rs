//! # tourism-orchestrator
//!
//! Intent-driven orchestration of a single tourism query:
//! classify, pick a retrieval strategy, generate a grounded answer, and
//! critique it before returning.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tourism_llm::MockGenerator;
//! use tourism_orchestrator::Orchestrator;
//! use tourism_retrieval::InMemoryIndex;
//!
//! let index = Arc::new(InMemoryIndex::with_hashing_embedder()?);
//! let orchestrator = Orchestrator::new(index, Arc::new(MockGenerator::default()));
//! let output = orchestrator.run("Plan a 3 day trip to Harar", vec![], "qwen:0.5b").await?;
//! println!("{}\n\n{}", output.answer, output.source_text());
//! ```

pub mod answer;
pub mod error;
pub mod graph;
pub mod history;
pub mod prompts;
pub mod reflection;
pub mod reformulate;

pub use answer::AnswerGenerator;
pub use error::OrchestratorError;
pub use graph::{next, route, Node, Orchestrator, RunOutput, PLAN_FACTUAL_GUARD};
pub use history::{HistoryStore, InMemoryHistoryStore};
pub use prompts::{FallbackKind, PromptKind};
pub use reflection::{resolve_verdict, ReflectionEvaluator};
pub use reformulate::QueryReformulator;
