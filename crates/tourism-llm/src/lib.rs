//! # tourism-llm
//!
//! Prompt-in, text-out generation backends.
//!
//! The orchestration engine only needs `generate(prompt) -> text`; this crate
//! provides the [`TextGenerator`] seam, an HTTP adapter for Ollama,
//! OpenAI-compatible and Anthropic endpoints, and a scriptable mock for tests.

mod api;
mod error;
mod generator;
mod mock;
mod response;

pub use api::{ApiGenerator, ApiGeneratorConfig, Provider};
pub use error::GeneratorError;
pub use generator::{GenerationRequest, TextGenerator};
pub use mock::MockGenerator;
pub use response::GenerationResponse;
