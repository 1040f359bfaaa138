//! Adaptive retrieval strategy selection.
//!
//! Strategy selection policy (order matters):
//! 1. Empty index: Dense with a small k, regardless of query shape
//! 2. Short query (< 4 whitespace tokens): Lexical, favoring exact recall
//! 3. Query mentions "compare": Hybrid, dense candidates filtered by
//!    minimum similarity
//! 4. Otherwise: Dense
//!
//! Index failures are logged and degrade to an empty result; the caller
//! never sees an error from retrieval.

use std::sync::Arc;

use tracing::{debug, warn};

use tourism_types::{Chunk, RetrievalSettings, RetrievalStrategy, ScoredChunk};

use crate::index::{IndexError, RetrievalIndex};

/// Strategy plus the chunks it produced.
#[derive(Debug, Clone)]
pub struct RetrievalOutcome {
    pub strategy: RetrievalStrategy,
    pub chunks: Vec<Chunk>,
}

/// Picks a retrieval strategy per query and executes it.
pub struct AdaptiveRetriever {
    index: Arc<dyn RetrievalIndex>,
    settings: RetrievalSettings,
}

impl AdaptiveRetriever {
    /// Create a retriever with default policy parameters.
    pub fn new(index: Arc<dyn RetrievalIndex>) -> Self {
        Self::with_settings(index, RetrievalSettings::default())
    }

    pub fn with_settings(index: Arc<dyn RetrievalIndex>, settings: RetrievalSettings) -> Self {
        let settings = RetrievalSettings {
            hybrid_trigger: settings.hybrid_trigger.to_lowercase(),
            ..settings
        };
        Self { index, settings }
    }

    /// Choose a strategy for the query.
    pub async fn select(&self, query: &str) -> RetrievalStrategy {
        let index_empty = match self.index.is_empty().await {
            Ok(empty) => empty,
            Err(e) => {
                warn!(error = %e, "Could not inspect index, treating it as empty");
                true
            }
        };

        let strategy = if index_empty {
            RetrievalStrategy::Dense {
                k: self.settings.empty_index_k,
            }
        } else if query.split_whitespace().count() < self.settings.short_query_tokens {
            RetrievalStrategy::Lexical {
                k: self.settings.default_k,
            }
        } else if query
            .to_lowercase()
            .contains(self.settings.hybrid_trigger.as_str())
        {
            RetrievalStrategy::Hybrid {
                k: self.settings.default_k,
                similarity_threshold: self.settings.hybrid_threshold,
            }
        } else {
            RetrievalStrategy::Dense {
                k: self.settings.default_k,
            }
        };

        debug!(strategy = %strategy, index_empty, "Selected retrieval strategy");
        strategy
    }

    /// Execute a strategy. Never fails: errors become an empty result.
    pub async fn retrieve(&self, strategy: RetrievalStrategy, query: &str) -> Vec<Chunk> {
        match self.search(strategy, query).await {
            Ok(results) => {
                debug!(strategy = %strategy, chunks = results.len(), "Retrieved chunks");
                results.into_iter().map(|r| r.chunk).collect()
            }
            Err(e) => {
                warn!(strategy = %strategy, error = %e, "Retrieval failed, returning no chunks");
                Vec::new()
            }
        }
    }

    /// Select a strategy for `selection_query` and retrieve with
    /// `retrieval_query`. The two differ only when a follow-up question was
    /// rewritten into a standalone one.
    pub async fn select_and_retrieve(
        &self,
        selection_query: &str,
        retrieval_query: &str,
    ) -> RetrievalOutcome {
        let strategy = self.select(selection_query).await;
        let chunks = self.retrieve(strategy, retrieval_query).await;
        RetrievalOutcome { strategy, chunks }
    }

    async fn search(
        &self,
        strategy: RetrievalStrategy,
        query: &str,
    ) -> Result<Vec<ScoredChunk>, IndexError> {
        match strategy {
            RetrievalStrategy::Lexical { k } => self.index.lexical_search(query, k).await,
            RetrievalStrategy::Dense { k } => self.index.dense_search(query, k).await,
            RetrievalStrategy::Hybrid {
                k,
                similarity_threshold,
            } => {
                let candidates = self.index.dense_search(query, k).await?;
                let before = candidates.len();
                let kept: Vec<ScoredChunk> = candidates
                    .into_iter()
                    .filter(|c| c.score >= similarity_threshold)
                    .collect();
                debug!(
                    candidates = before,
                    kept = kept.len(),
                    threshold = similarity_threshold,
                    "Filtered dense candidates"
                );
                Ok(kept)
            }
        }
    }
}
