use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// A model produced a vector of the wrong width.
    #[error("Embedding width {actual} does not match model width {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Tensor operation inside the transformer failed.
    #[error("Candle error: {0}")]
    Candle(#[from] candle_core::Error),

    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    /// Model files missing or unreadable.
    #[error("Model not available: {0}")]
    ModelNotFound(String),

    #[error("Failed to download model: {0}")]
    Download(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Failure inside an injected embedding model.
    #[error("Embedding model failed: {0}")]
    Model(String),
}
