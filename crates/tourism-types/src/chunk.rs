//! Chunk type for retrieved document content.
//!
//! Chunks are produced and owned by the retrieval index. The orchestration
//! engine reads them and hands them back to the caller as source documents,
//! but never mutates them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metadata key holding the source filename.
pub const FILENAME_KEY: &str = "filename";

/// Metadata key holding the originating document identifier.
pub const FILE_ID_KEY: &str = "file_id";

/// A retrievable unit of document text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Text payload
    pub text: String,

    /// Metadata (at minimum the source filename)
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl Chunk {
    /// Create a chunk with no metadata.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: BTreeMap::new(),
        }
    }

    /// Set the source filename.
    pub fn with_filename(self, filename: impl Into<String>) -> Self {
        self.with_metadata(FILENAME_KEY, filename)
    }

    /// Set the originating document identifier.
    pub fn with_file_id(self, file_id: impl Into<String>) -> Self {
        self.with_metadata(FILE_ID_KEY, file_id)
    }

    /// Add an arbitrary metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Source filename, or "unknown" when the index did not record one.
    pub fn filename(&self) -> &str {
        self.metadata
            .get(FILENAME_KEY)
            .map(String::as_str)
            .unwrap_or("unknown")
    }

    /// Originating document identifier, if any.
    pub fn file_id(&self) -> Option<&str> {
        self.metadata.get(FILE_ID_KEY).map(String::as_str)
    }

    /// Single-line preview of at most `max_chars` characters.
    pub fn preview(&self, max_chars: usize) -> String {
        self.text
            .trim()
            .replace('\n', " ")
            .chars()
            .take(max_chars)
            .collect()
    }
}

/// A chunk paired with the score a search assigned to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,

    /// Lexical score or cosine similarity, depending on the search
    pub score: f32,
}

impl ScoredChunk {
    pub fn new(chunk: Chunk, score: f32) -> Self {
        Self { chunk, score }
    }
}
