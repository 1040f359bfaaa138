//! Deterministic feature-hashing embedder.
//!
//! Each lower-cased alphanumeric token is hashed with xxHash64 into one of
//! `dimension` buckets; the bucket counts are normalized to unit length. Two
//! texts with the same bag of tokens get identical embeddings, and cosine
//! similarity tracks token overlap.

use std::hash::{Hash, Hasher};

use tracing::trace;
use twox_hash::XxHash64;

use crate::error::EmbeddingError;
use crate::model::{Embedding, EmbeddingModel, ModelInfo};

/// Default number of hash buckets (matches all-MiniLM-L6-v2's width).
pub const DEFAULT_DIMENSION: usize = 384;

/// Split text into lower-cased alphanumeric tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

/// Offline embedder based on the hashing trick.
pub struct HashingEmbedder {
    info: ModelInfo,
    seed: u64,
}

impl HashingEmbedder {
    /// Create an embedder with [`DEFAULT_DIMENSION`] buckets.
    pub fn new() -> Self {
        Self::with_dimension(DEFAULT_DIMENSION)
    }

    /// Create an embedder with a custom number of buckets.
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            info: ModelInfo {
                name: "feature-hashing-xxh64".to_string(),
                dimension: dimension.max(1),
            },
            seed: 0,
        }
    }

    fn bucket(&self, token: &str) -> usize {
        let mut hasher = XxHash64::with_seed(self.seed);
        token.hash(&mut hasher);
        (hasher.finish() % self.info.dimension as u64) as usize
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

impl EmbeddingModel for HashingEmbedder {
    fn info(&self) -> &ModelInfo {
        &self.info
    }

    fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        let mut values = vec![0f32; self.info.dimension];
        let tokens = tokenize(text);
        for token in &tokens {
            values[self.bucket(token)] += 1.0;
        }
        trace!(tokens = tokens.len(), "Hashed text into embedding");
        Ok(Embedding::new(values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize("Compare hotels in Axum, Gondar!"),
            vec!["compare", "hotels", "in", "axum", "gondar"]
        );
        assert!(tokenize("  ... ").is_empty());
    }

    #[test]
    fn test_embedding_is_deterministic() {
        let embedder = HashingEmbedder::new();
        let a = embedder.embed("Rock-hewn churches of Lalibela").unwrap();
        let b = embedder.embed("Rock-hewn churches of Lalibela").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.dimension(), DEFAULT_DIMENSION);
    }

    #[test]
    fn test_same_tokens_are_identical() {
        let embedder = HashingEmbedder::new();
        let a = embedder.embed("Harar walled city").unwrap();
        let b = embedder.embed("walled city HARAR").unwrap();
        assert!((a.cosine_similarity(&b) - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_overlap_scores_higher_than_disjoint() {
        let embedder = HashingEmbedder::new();
        let query = embedder.embed("castles of gondar").unwrap();
        let related = embedder.embed("the castles of gondar were built").unwrap();
        let unrelated = embedder.embed("coffee ceremony traditions").unwrap();
        assert!(query.cosine_similarity(&related) > query.cosine_similarity(&unrelated));
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let embedder = HashingEmbedder::with_dimension(16);
        let emb = embedder.embed("").unwrap();
        assert!(emb.is_zero());
        assert_eq!(emb.dimension(), 16);
    }
}
