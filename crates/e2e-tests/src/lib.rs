//! End-to-end test infrastructure for the tourism query engine.
//!
//! Provides a shared TestHarness: a chunk snapshot written to a temp dir and
//! loaded into an in-memory index, an index wrapper counting every call,
//! and a recording mock backend.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use tourism_embeddings::HashingEmbedder;
use tourism_llm::{GenerationRequest, MockGenerator};
use tourism_orchestrator::Orchestrator;
use tourism_retrieval::{IndexError, InMemoryIndex, RetrievalIndex};
use tourism_types::{Chunk, ScoredChunk, Settings};

/// Prefix of the evaluator prompt, used to tell reflection calls apart.
pub const REFLECTION_PROMPT_PREFIX: &str = "You are a critical evaluator";

pub const STRICT_FALLBACK: &str =
    "I do not know and it is not in the data and context provided to me";
pub const SOFT_FALLBACK: &str = "I don't know based on the documents.";

/// Sample corpus about Ethiopian destinations.
pub fn tourism_chunks() -> Vec<Chunk> {
    vec![
        Chunk::new(
            "Lalibela is known for its eleven monolithic rock-hewn churches, carved in the \
             12th and 13th centuries under King Lalibela.",
        )
        .with_filename("lalibela.pdf")
        .with_file_id("1"),
        Chunk::new(
            "The history of Lalibela: the town was the capital of the Zagwe dynasty and is \
             a major pilgrimage site during Timkat.",
        )
        .with_filename("lalibela.pdf")
        .with_file_id("1"),
        Chunk::new(
            "Gondar hotels: the Goha Hotel overlooks the city from a hilltop, while the \
             Taye Hotel offers budget rooms near Fasil Ghebbi.",
        )
        .with_filename("hotels.pdf")
        .with_file_id("2"),
        Chunk::new(
            "Axum hotels: the Sabean Hotel and Yared Zema hotel are close to the stelae \
             field. Prices range from 30 to 90 USD per night.",
        )
        .with_filename("hotels.pdf")
        .with_file_id("2"),
        Chunk::new(
            "Harar Jugol is a walled city with 82 mosques. Visitors spend a day in the old \
             town and watch the evening hyena feeding outside the walls.",
        )
        .with_filename("harar.pdf")
        .with_file_id("3"),
        Chunk::new(
            "A trip to Harar usually starts from Dire Dawa, a 1 hour drive. Three days are \
             enough for the markets, Rimbaud House and the hyena men.",
        )
        .with_filename("harar.pdf")
        .with_file_id("3"),
        Chunk::new(
            "The Simien Mountains National Park is home to gelada baboons and Ras Dashen, \
             the highest peak in Ethiopia.",
        )
        .with_filename("simien.pdf")
        .with_file_id("4"),
    ]
}

/// Serialize chunks to the JSONL snapshot format.
pub fn to_jsonl(chunks: &[Chunk]) -> String {
    chunks
        .iter()
        .map(|c| serde_json::to_string(c).expect("Failed to serialize chunk"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Index wrapper that counts calls to the wrapped index.
pub struct CountingIndex {
    inner: Arc<dyn RetrievalIndex>,
    lexical: AtomicUsize,
    dense: AtomicUsize,
    listings: AtomicUsize,
}

impl CountingIndex {
    pub fn new(inner: Arc<dyn RetrievalIndex>) -> Self {
        Self {
            inner,
            lexical: AtomicUsize::new(0),
            dense: AtomicUsize::new(0),
            listings: AtomicUsize::new(0),
        }
    }

    pub fn lexical_calls(&self) -> usize {
        self.lexical.load(Ordering::SeqCst)
    }

    pub fn dense_calls(&self) -> usize {
        self.dense.load(Ordering::SeqCst)
    }

    pub fn search_calls(&self) -> usize {
        self.lexical_calls() + self.dense_calls()
    }

    /// Every call of any kind, emptiness checks included.
    pub fn total_calls(&self) -> usize {
        self.search_calls() + self.listings.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RetrievalIndex for CountingIndex {
    async fn get_all_chunks(&self) -> Result<Vec<Chunk>, IndexError> {
        self.listings.fetch_add(1, Ordering::SeqCst);
        self.inner.get_all_chunks().await
    }

    async fn lexical_search(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>, IndexError> {
        self.lexical.fetch_add(1, Ordering::SeqCst);
        self.inner.lexical_search(query, k).await
    }

    async fn dense_search(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>, IndexError> {
        self.dense.fetch_add(1, Ordering::SeqCst);
        self.inner.dense_search(query, k).await
    }

    async fn is_empty(&self) -> Result<bool, IndexError> {
        self.listings.fetch_add(1, Ordering::SeqCst);
        self.inner.is_empty().await
    }
}

/// Index whose every call fails.
pub struct UnavailableIndex;

#[async_trait]
impl RetrievalIndex for UnavailableIndex {
    async fn get_all_chunks(&self) -> Result<Vec<Chunk>, IndexError> {
        Err(IndexError::Unavailable("connection refused".to_string()))
    }

    async fn lexical_search(&self, _query: &str, _k: usize) -> Result<Vec<ScoredChunk>, IndexError> {
        Err(IndexError::Unavailable("connection refused".to_string()))
    }

    async fn dense_search(&self, _query: &str, _k: usize) -> Result<Vec<ScoredChunk>, IndexError> {
        Err(IndexError::Unavailable("connection refused".to_string()))
    }
}

/// Index returning its chunks for every dense search with one fixed
/// similarity score. Lexical search finds nothing.
pub struct FixedScoreIndex {
    chunks: Vec<Chunk>,
    score: f32,
}

impl FixedScoreIndex {
    pub fn new(chunks: Vec<Chunk>, score: f32) -> Self {
        Self { chunks, score }
    }
}

#[async_trait]
impl RetrievalIndex for FixedScoreIndex {
    async fn get_all_chunks(&self) -> Result<Vec<Chunk>, IndexError> {
        Ok(self.chunks.clone())
    }

    async fn lexical_search(&self, _query: &str, _k: usize) -> Result<Vec<ScoredChunk>, IndexError> {
        Ok(Vec::new())
    }

    async fn dense_search(&self, _query: &str, k: usize) -> Result<Vec<ScoredChunk>, IndexError> {
        Ok(self
            .chunks
            .iter()
            .take(k)
            .map(|c| ScoredChunk::new(c.clone(), self.score))
            .collect())
    }
}

/// The hotels.pdf chunks of the sample corpus.
pub fn hotel_chunks() -> Vec<Chunk> {
    tourism_chunks()
        .into_iter()
        .filter(|c| c.filename() == "hotels.pdf")
        .collect()
}

/// Mock backend answering generation prompts with `answer` and evaluator
/// prompts with `verdict`.
pub fn scripted_backend(answer: &str, verdict: &str) -> MockGenerator {
    let answer = answer.to_string();
    let verdict = verdict.to_string();
    MockGenerator::new(move |req: &GenerationRequest| {
        if req.prompt.starts_with(REFLECTION_PROMPT_PREFIX) {
            Ok(verdict.clone())
        } else {
            Ok(answer.clone())
        }
    })
}

/// Shared test harness for E2E tests.
pub struct TestHarness {
    /// Keeps temp dir alive for the lifetime of the harness
    pub _temp_dir: tempfile::TempDir,
    pub index: Arc<CountingIndex>,
    pub backend: Arc<MockGenerator>,
    pub orchestrator: Orchestrator,
}

impl TestHarness {
    /// Harness over the sample corpus, loaded from a JSONL snapshot.
    pub async fn new(backend: MockGenerator) -> Self {
        Self::with_chunks(tourism_chunks(), backend, &Settings::default()).await
    }

    /// Harness over an empty index.
    pub async fn empty(backend: MockGenerator) -> Self {
        Self::with_chunks(Vec::new(), backend, &Settings::default()).await
    }

    pub async fn with_chunks(chunks: Vec<Chunk>, backend: MockGenerator, settings: &Settings) -> Self {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let snapshot = temp_dir.path().join("chunks.jsonl");
        std::fs::write(&snapshot, to_jsonl(&chunks)).expect("Failed to write snapshot");

        let loaded = InMemoryIndex::load_jsonl(&snapshot, Arc::new(HashingEmbedder::new()))
            .await
            .expect("Failed to load snapshot");
        Self::assemble(temp_dir, Arc::new(loaded), backend, settings)
    }

    /// Harness over a caller-supplied index, default settings.
    pub fn with_index(index: Arc<dyn RetrievalIndex>, backend: MockGenerator) -> Self {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        Self::assemble(temp_dir, index, backend, &Settings::default())
    }

    fn assemble(
        temp_dir: tempfile::TempDir,
        inner: Arc<dyn RetrievalIndex>,
        backend: MockGenerator,
        settings: &Settings,
    ) -> Self {
        let index = Arc::new(CountingIndex::new(inner));
        let backend = Arc::new(backend);
        let orchestrator = Orchestrator::with_settings(index.clone(), backend.clone(), settings);

        Self {
            _temp_dir: temp_dir,
            index,
            backend,
            orchestrator,
        }
    }

    /// Backend calls that were not reflection prompts.
    pub fn generation_calls(&self) -> usize {
        self.backend
            .prompts()
            .iter()
            .filter(|p| !p.starts_with(REFLECTION_PROMPT_PREFIX))
            .count()
    }

    pub fn reflection_calls(&self) -> usize {
        self.backend.call_count() - self.generation_calls()
    }
}
