use async_trait::async_trait;

use crate::error::GeneratorError;
use crate::response::GenerationResponse;

/// One prompt sent to a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    /// Backend model identifier chosen by the caller
    pub model: String,
    pub prompt: String,
}

impl GenerationRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
        }
    }
}

/// Pluggable text-generation backend.
///
/// One call is one logical backend invocation. Failures are returned to the
/// caller; implementations do not fall back silently.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: GenerationRequest)
        -> Result<GenerationResponse, GeneratorError>;
}
