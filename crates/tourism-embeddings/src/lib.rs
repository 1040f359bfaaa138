//! # tourism-embeddings
//!
//! Vector embeddings for dense retrieval.
//!
//! The index only depends on the [`EmbeddingModel`] trait. Two models ship:
//!
//! - [`CandleEmbedder`]: all-MiniLM-L6-v2 on Candle, downloaded once into a
//!   local [`ModelCache`]. The hybrid similarity threshold is calibrated
//!   against this model.
//! - [`HashingEmbedder`]: deterministic feature hashing with no model files,
//!   for tests and fully offline use.

pub mod cache;
pub mod candle;
pub mod error;
pub mod hashing;
pub mod model;

pub use cache::{default_cache_dir, ModelCache, ModelPaths, DEFAULT_MODEL_REPO};
pub use candle::{CandleEmbedder, MINILM_DIMENSION};
pub use error::EmbeddingError;
pub use hashing::{tokenize, HashingEmbedder, DEFAULT_DIMENSION};
pub use model::{Embedding, EmbeddingModel, ModelInfo};
