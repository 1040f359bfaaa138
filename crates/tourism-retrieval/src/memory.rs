//! In-process retrieval index.
//!
//! Chunks and their embeddings sit in memory next to a RAM-backed tantivy
//! index for BM25. Writes go through `add_chunks` (a single writer outside
//! the engine); searches take a read lock and never block each other.

use std::path::Path;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tracing::{debug, info};

use tourism_embeddings::{Embedding, EmbeddingModel, HashingEmbedder};
use tourism_types::{Chunk, ScoredChunk};

use crate::index::{IndexError, RetrievalIndex};
use crate::lexical::LexicalIndex;

struct IndexedChunk {
    chunk: Chunk,
    embedding: Embedding,
}

/// Chunk index kept entirely in memory.
pub struct InMemoryIndex {
    embedder: Arc<dyn EmbeddingModel>,
    lexical: LexicalIndex,
    chunks: RwLock<Vec<IndexedChunk>>,
}

impl std::fmt::Debug for InMemoryIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryIndex").finish_non_exhaustive()
    }
}

impl InMemoryIndex {
    /// Create an empty index using the given embedding model.
    pub fn new(embedder: Arc<dyn EmbeddingModel>) -> Result<Self, IndexError> {
        Ok(Self {
            embedder,
            lexical: LexicalIndex::new()?,
            chunks: RwLock::new(Vec::new()),
        })
    }

    /// Create an empty index backed by the offline [`HashingEmbedder`].
    pub fn with_hashing_embedder() -> Result<Self, IndexError> {
        Self::new(Arc::new(HashingEmbedder::new()))
    }

    /// Embed and add chunks. Returns the number added.
    pub fn add_chunks(&self, chunks: impl IntoIterator<Item = Chunk>) -> Result<usize, IndexError> {
        let chunks: Vec<Chunk> = chunks.into_iter().collect();
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let embeddings = self.embedder.embed_batch(&texts)?;

        let mut stored = self
            .chunks
            .write()
            .map_err(|_| IndexError::Unavailable("index lock poisoned".to_string()))?;
        self.lexical.add(stored.len(), texts.iter().copied())?;

        let added = chunks.len();
        stored.extend(
            chunks
                .into_iter()
                .zip(embeddings)
                .map(|(chunk, embedding)| IndexedChunk { chunk, embedding }),
        );
        debug!(added, total = stored.len(), "Added chunks to index");
        Ok(added)
    }

    /// Number of indexed chunks.
    pub fn len(&self) -> usize {
        self.chunks.read().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Parse a JSONL snapshot: one `{"text": ..., "metadata": {...}}` per
    /// line, blank lines ignored.
    pub fn parse_jsonl(contents: &str) -> Result<Vec<Chunk>, IndexError> {
        contents
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(i, line)| {
                serde_json::from_str(line).map_err(|e| IndexError::InvalidChunk {
                    line: i + 1,
                    message: e.to_string(),
                })
            })
            .collect()
    }

    /// Build an index from a JSONL snapshot file.
    pub async fn load_jsonl(
        path: impl AsRef<Path>,
        embedder: Arc<dyn EmbeddingModel>,
    ) -> Result<Self, IndexError> {
        let path = path.as_ref();
        let contents = tokio::fs::read_to_string(path).await?;
        let chunks = Self::parse_jsonl(&contents)?;
        let index = Self::new(embedder)?;
        let added = index.add_chunks(chunks)?;
        info!(path = %path.display(), chunks = added, "Loaded chunk snapshot");
        Ok(index)
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Vec<IndexedChunk>>, IndexError> {
        self.chunks
            .read()
            .map_err(|_| IndexError::Unavailable("index lock poisoned".to_string()))
    }
}

#[async_trait]
impl RetrievalIndex for InMemoryIndex {
    async fn get_all_chunks(&self) -> Result<Vec<Chunk>, IndexError> {
        Ok(self.read()?.iter().map(|c| c.chunk.clone()).collect())
    }

    async fn lexical_search(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<ScoredChunk>, IndexError> {
        let stored = self.read()?;
        let hits = self.lexical.search(query, k)?;
        Ok(hits
            .into_iter()
            .filter_map(|(position, score)| {
                stored
                    .get(position)
                    .map(|c| ScoredChunk::new(c.chunk.clone(), score))
            })
            .collect())
    }

    /// Cosine scan over every chunk; ties keep insertion order.
    async fn dense_search(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>, IndexError> {
        let query_embedding = self.embedder.embed(query)?;
        let stored = self.read()?;
        let mut ranked: Vec<(usize, f32)> = stored
            .iter()
            .map(|c| query_embedding.cosine_similarity(&c.embedding))
            .enumerate()
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        Ok(ranked
            .into_iter()
            .take(k)
            .map(|(i, score)| ScoredChunk::new(stored[i].chunk.clone(), score))
            .collect())
    }

    async fn is_empty(&self) -> Result<bool, IndexError> {
        Ok(self.read()?.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_index() -> InMemoryIndex {
        let index = InMemoryIndex::with_hashing_embedder().unwrap();
        index
            .add_chunks(vec![
                Chunk::new("Gondar is known for the Fasil Ghebbi royal castles")
                    .with_filename("gondar.pdf"),
                Chunk::new("Axum hotels range from budget guesthouses to the Sabean hotel")
                    .with_filename("axum.pdf"),
                Chunk::new("Harar is a walled city famous for its hyena feeding")
                    .with_filename("harar.pdf"),
            ])
            .unwrap();
        index
    }

    #[tokio::test]
    async fn test_add_and_list() {
        let index = sample_index();
        assert_eq!(index.len(), 3);
        assert!(!RetrievalIndex::is_empty(&index).await.unwrap());

        let all = index.get_all_chunks().await.unwrap();
        assert_eq!(all[0].filename(), "gondar.pdf");
        assert_eq!(all[2].filename(), "harar.pdf");
    }

    #[tokio::test]
    async fn test_lexical_search_ranks_by_bm25() {
        let index = sample_index();
        let results = index.lexical_search("hyena Harar hotels", 3).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk.filename(), "harar.pdf");
        assert_eq!(results[1].chunk.filename(), "axum.pdf");
        assert!(results[0].score > results[1].score);
    }

    #[tokio::test]
    async fn test_lexical_search_skips_unrelated_chunks() {
        let index = sample_index();
        let results = index.lexical_search("Danakil salt flats", 6).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_dense_search_ranks_by_similarity() {
        let index = sample_index();
        let results = index
            .dense_search("royal castles of Gondar", 3)
            .await
            .unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].chunk.filename(), "gondar.pdf");
        assert!(results[0].score >= results[1].score);
        assert!(results[1].score >= results[2].score);
    }

    #[tokio::test]
    async fn test_k_larger_than_index() {
        let index = sample_index();
        let results = index.dense_search("anything", 10).await.unwrap();
        assert_eq!(results.len(), 3);
    }

    #[tokio::test]
    async fn test_empty_index() {
        let index = InMemoryIndex::with_hashing_embedder().unwrap();
        assert!(RetrievalIndex::is_empty(&index).await.unwrap());
        assert!(index.lexical_search("gondar", 6).await.unwrap().is_empty());
        assert!(index.dense_search("gondar", 6).await.unwrap().is_empty());
    }

    #[test]
    fn test_parse_jsonl() {
        let contents = r#"{"text": "Lalibela churches", "metadata": {"filename": "lalibela.pdf"}}

{"text": "Danakil depression"}
"#;
        let chunks = InMemoryIndex::parse_jsonl(contents).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].filename(), "lalibela.pdf");
        assert_eq!(chunks[1].filename(), "unknown");
    }

    #[test]
    fn test_parse_jsonl_reports_line() {
        let contents = "{\"text\": \"ok\"}\nnot json\n";
        let err = InMemoryIndex::parse_jsonl(contents).unwrap_err();
        assert!(matches!(err, IndexError::InvalidChunk { line: 2, .. }));
    }

    #[tokio::test]
    async fn test_load_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chunks.jsonl");
        std::fs::write(
            &path,
            "{\"text\": \"Bahir Dar sits on Lake Tana\", \"metadata\": {\"filename\": \"tana.pdf\"}}\n",
        )
        .unwrap();

        let index = InMemoryIndex::load_jsonl(&path, Arc::new(HashingEmbedder::new()))
            .await
            .unwrap();
        assert_eq!(index.len(), 1);
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let result =
            InMemoryIndex::load_jsonl("/nonexistent/chunks.jsonl", Arc::new(HashingEmbedder::new()))
                .await;
        assert!(matches!(result, Err(IndexError::Io(_))));
    }
}
