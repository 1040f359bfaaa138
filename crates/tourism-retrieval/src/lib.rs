//! # tourism-retrieval
//!
//! Query classification and adaptive retrieval for the tourism query engine.
//!
//! ## Core Concepts
//!
//! - **Intent**: What the user wants (fact, itinerary, hotel comparison,
//!   place overview), decided by ordered keyword rules
//! - **Retrieval Strategy**: Lexical, dense, or similarity-filtered hybrid,
//!   chosen from the query's shape
//! - **Retrieval Index**: The external chunk store, consumed through a trait
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tourism_retrieval::{AdaptiveRetriever, InMemoryIndex, IntentClassifier};
//!
//! let classifier = IntentClassifier::new();
//! let intent = classifier.classify("Compare hotels in Axum and Gondar");
//!
//! let index = Arc::new(InMemoryIndex::with_hashing_embedder()?);
//! let retriever = AdaptiveRetriever::new(index);
//! let strategy = retriever.select("Compare hotels in Axum and Gondar").await;
//! let chunks = retriever.retrieve(strategy, "Compare hotels in Axum and Gondar").await;
//! ```
//!
//! ## Modules
//!
//! - [`classifier`]: Intent classification using ordered keyword rules
//! - [`index`]: The retrieval index trait
//! - [`memory`]: In-memory index with BM25 and cosine search
//! - [`lexical`]: BM25 keyword search on tantivy
//! - [`selector`]: Strategy selection and execution

pub mod classifier;
pub mod index;
pub mod lexical;
pub mod memory;
pub mod selector;

pub use classifier::{ClassificationResult, ClassifierConfig, IntentClassifier, IntentRule};
pub use index::{IndexError, RetrievalIndex};
pub use lexical::LexicalIndex;
pub use memory::InMemoryIndex;
pub use selector::{AdaptiveRetriever, RetrievalOutcome};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::classifier::IntentClassifier;
    pub use crate::index::RetrievalIndex;
    pub use crate::memory::InMemoryIndex;
    pub use crate::selector::AdaptiveRetriever;
}
