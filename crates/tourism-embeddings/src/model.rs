//! The [`EmbeddingModel`] seam used by dense retrieval.

use crate::error::EmbeddingError;

/// Unit-length vector for a piece of text.
///
/// An all-zero input (text without tokens) is kept as-is and scores 0
/// against everything.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    values: Vec<f32>,
}

impl Embedding {
    /// Scale `values` to unit length.
    pub fn new(mut values: Vec<f32>) -> Self {
        let norm = values.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            values.iter_mut().for_each(|v| *v /= norm);
        }
        Self { values }
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    pub fn dimension(&self) -> usize {
        self.values.len()
    }

    pub fn is_zero(&self) -> bool {
        self.values.iter().all(|v| *v == 0.0)
    }

    /// Cosine similarity in [-1, 1]. Vectors of different width score 0.
    pub fn cosine_similarity(&self, other: &Embedding) -> f32 {
        if self.dimension() != other.dimension() {
            return 0.0;
        }
        self.values
            .iter()
            .zip(&other.values)
            .map(|(a, b)| a * b)
            .sum()
    }
}

/// Name and output width of an embedder.
#[derive(Debug, Clone)]
pub struct ModelInfo {
    pub name: String,
    pub dimension: usize,
}

/// Text-to-vector model shared across index tasks.
pub trait EmbeddingModel: Send + Sync {
    fn info(&self) -> &ModelInfo;

    fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError>;

    /// Embed several texts, rejecting any vector whose width differs from
    /// [`ModelInfo::dimension`].
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, EmbeddingError> {
        let expected = self.info().dimension;
        texts
            .iter()
            .map(|text| {
                let embedding = self.embed(text)?;
                if embedding.dimension() != expected {
                    return Err(EmbeddingError::DimensionMismatch {
                        expected,
                        actual: embedding.dimension(),
                    });
                }
                Ok(embedding)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed {
        info: ModelInfo,
        width: usize,
    }

    impl EmbeddingModel for Fixed {
        fn info(&self) -> &ModelInfo {
            &self.info
        }

        fn embed(&self, _text: &str) -> Result<Embedding, EmbeddingError> {
            Ok(Embedding::new(vec![1.0; self.width]))
        }
    }

    fn fixed(declared: usize, width: usize) -> Fixed {
        Fixed {
            info: ModelInfo {
                name: "fixed".to_string(),
                dimension: declared,
            },
            width,
        }
    }

    #[test]
    fn test_new_scales_to_unit_length() {
        let emb = Embedding::new(vec![3.0, 0.0, 4.0]);
        let expected = [0.6, 0.0, 0.8];
        for (got, want) in emb.as_slice().iter().zip(expected) {
            assert!((got - want).abs() < 1e-6);
        }
    }

    #[test]
    fn test_zero_vector_scores_nothing() {
        let empty = Embedding::new(vec![0.0; 4]);
        assert!(empty.is_zero());
        assert_eq!(empty.cosine_similarity(&Embedding::new(vec![1.0; 4])), 0.0);
    }

    #[test]
    fn test_cosine_of_parallel_and_opposite_vectors() {
        let a = Embedding::new(vec![2.0, 2.0]);
        let b = Embedding::new(vec![5.0, 5.0]);
        let c = Embedding::new(vec![-1.0, -1.0]);
        assert!((a.cosine_similarity(&b) - 1.0).abs() < 1e-6);
        assert!((a.cosine_similarity(&c) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_width_mismatch_scores_zero() {
        let a = Embedding::new(vec![1.0, 0.0]);
        let b = Embedding::new(vec![1.0, 0.0, 0.0]);
        assert_eq!(a.cosine_similarity(&b), 0.0);
    }

    #[test]
    fn test_embed_batch_checks_declared_width() {
        let ok = fixed(3, 3).embed_batch(&["Axum", "Gondar"]).unwrap();
        assert_eq!(ok.len(), 2);

        let err = fixed(3, 5).embed_batch(&["Axum"]).unwrap_err();
        assert!(matches!(
            err,
            EmbeddingError::DimensionMismatch {
                expected: 3,
                actual: 5
            }
        ));
    }
}
