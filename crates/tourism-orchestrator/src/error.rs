use thiserror::Error;

use tourism_llm::GeneratorError;

/// Errors that abort a request.
///
/// Empty retrieval and unsupported queries are not errors; they end in a
/// fallback answer.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The text-generation backend failed
    #[error("Generation failed: {0}")]
    Generation(#[from] GeneratorError),

    /// A node received a state it cannot process (e.g. routing without an intent)
    #[error("Invalid state at {node}: {message}")]
    InvalidState { node: &'static str, message: String },

    /// The pipeline reached its end without producing an answer
    #[error("Pipeline finished without an answer")]
    MissingAnswer,

    /// Conversation history could not be read or written
    #[error("History store error: {0}")]
    History(String),
}

impl OrchestratorError {
    pub(crate) fn invalid_state(node: &'static str, message: impl Into<String>) -> Self {
        OrchestratorError::InvalidState {
            node,
            message: message.into(),
        }
    }
}
