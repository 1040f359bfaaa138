//! Retrieval index seam.
//!
//! The orchestration engine consumes an index it does not own. Ingestion,
//! persistence and concurrency control for writes all live behind this
//! trait; the engine only reads.

use async_trait::async_trait;
use thiserror::Error;

use tourism_types::{Chunk, ScoredChunk};

/// Errors raised by index implementations.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Snapshot could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot line could not be decoded
    #[error("Invalid chunk on line {line}: {message}")]
    InvalidChunk { line: usize, message: String },

    /// Lexical index failure
    #[error("Lexical index error: {0}")]
    Lexical(#[from] tantivy::TantivyError),

    /// Embedding the query or a chunk failed
    #[error("Embedding error: {0}")]
    Embedding(#[from] tourism_embeddings::EmbeddingError),

    /// Backend-specific failure
    #[error("Index unavailable: {0}")]
    Unavailable(String),
}

/// Read-only view of a chunk index.
///
/// Implementations must be safe for concurrent reads.
#[async_trait]
pub trait RetrievalIndex: Send + Sync {
    /// Every indexed chunk, in insertion order.
    async fn get_all_chunks(&self) -> Result<Vec<Chunk>, IndexError>;

    /// Top-k chunks ranked by lexical overlap with the query.
    async fn lexical_search(&self, query: &str, k: usize)
        -> Result<Vec<ScoredChunk>, IndexError>;

    /// Top-k chunks ranked by cosine similarity, best first, with the
    /// similarity as score.
    async fn dense_search(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>, IndexError>;

    /// Whether the index holds no chunks.
    async fn is_empty(&self) -> Result<bool, IndexError> {
        Ok(self.get_all_chunks().await?.is_empty())
    }
}
