//! Retrieval strategies chosen per query.

use serde::{Deserialize, Serialize};

/// How chunks are retrieved for a query.
///
/// Chosen once per query by the adaptive retriever; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum RetrievalStrategy {
    /// Top-k by lexical overlap score
    Lexical { k: usize },

    /// Top-k by embedding cosine similarity
    Dense { k: usize },

    /// Dense top-k, then drop candidates scoring below the threshold
    Hybrid { k: usize, similarity_threshold: f32 },
}

impl RetrievalStrategy {
    /// Number of candidates requested from the index.
    pub fn k(&self) -> usize {
        match self {
            RetrievalStrategy::Lexical { k }
            | RetrievalStrategy::Dense { k }
            | RetrievalStrategy::Hybrid { k, .. } => *k,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RetrievalStrategy::Lexical { .. } => "lexical",
            RetrievalStrategy::Dense { .. } => "dense",
            RetrievalStrategy::Hybrid { .. } => "hybrid",
        }
    }
}

impl std::fmt::Display for RetrievalStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RetrievalStrategy::Lexical { k } => write!(f, "lexical(k={k})"),
            RetrievalStrategy::Dense { k } => write!(f, "dense(k={k})"),
            RetrievalStrategy::Hybrid {
                k,
                similarity_threshold,
            } => write!(f, "hybrid(k={k}, threshold={similarity_threshold})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_k_accessor() {
        assert_eq!(RetrievalStrategy::Lexical { k: 6 }.k(), 6);
        assert_eq!(RetrievalStrategy::Dense { k: 3 }.k(), 3);
        let hybrid = RetrievalStrategy::Hybrid {
            k: 6,
            similarity_threshold: 0.7,
        };
        assert_eq!(hybrid.k(), 6);
        assert_eq!(hybrid.to_string(), "hybrid(k=6, threshold=0.7)");
    }
}
