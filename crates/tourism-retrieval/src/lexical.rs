//! BM25 keyword search over chunk text.
//!
//! Chunk text lives in a RAM-backed tantivy index; each document stores the
//! chunk's position in the owning [`InMemoryIndex`](crate::InMemoryIndex) so
//! hits map back without duplicating the chunk.

use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::schema::{Field, Schema, Value, STORED, TEXT};
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument};
use tracing::debug;

use crate::index::IndexError;

/// Writer memory budget (50MB), single indexing thread.
const WRITER_MEMORY_BYTES: usize = 50 * 1024 * 1024;

pub struct LexicalIndex {
    index: Index,
    reader: IndexReader,
    text: Field,
    position: Field,
}

impl LexicalIndex {
    pub fn new() -> Result<Self, IndexError> {
        let mut builder = Schema::builder();
        let text = builder.add_text_field("text", TEXT);
        let position = builder.add_u64_field("position", STORED);
        let index = Index::create_in_ram(builder.build());

        let reader: IndexReader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;

        Ok(Self {
            index,
            reader,
            text,
            position,
        })
    }

    /// Index `texts` as positions `first_position..`. Searchable on return.
    pub fn add<'a>(
        &self,
        first_position: usize,
        texts: impl IntoIterator<Item = &'a str>,
    ) -> Result<(), IndexError> {
        let mut writer: IndexWriter = self
            .index
            .writer_with_num_threads(1, WRITER_MEMORY_BYTES)?;
        let mut added = 0usize;
        for (offset, text) in texts.into_iter().enumerate() {
            writer.add_document(doc!(
                self.text => text,
                self.position => (first_position + offset) as u64
            ))?;
            added += 1;
        }
        writer.commit()?;
        self.reader.reload()?;
        debug!(added, "Committed chunks to lexical index");
        Ok(())
    }

    /// Best `k` (position, BM25 score) pairs, highest first. Only chunks
    /// sharing at least one term with the query are returned.
    pub fn search(&self, query: &str, k: usize) -> Result<Vec<(usize, f32)>, IndexError> {
        if query.trim().is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        // Lenient parsing: tourist questions carry '?', ':' and quotes that the
        // strict grammar rejects.
        let parser = QueryParser::for_index(&self.index, vec![self.text]);
        let (parsed, errors) = parser.parse_query_lenient(query);
        if !errors.is_empty() {
            debug!(query, errors = errors.len(), "Ignored unparsable query fragments");
        }

        let searcher = self.reader.searcher();
        let top_docs = searcher.search(&parsed, &TopDocs::with_limit(k))?;

        let mut hits = Vec::with_capacity(top_docs.len());
        for (score, address) in top_docs {
            let doc: TantivyDocument = searcher.doc(address)?;
            if let Some(position) = doc.get_first(self.position).and_then(|v| v.as_u64()) {
                hits.push((position as usize, score));
            }
        }
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> LexicalIndex {
        let index = LexicalIndex::new().unwrap();
        index
            .add(
                0,
                [
                    "Gondar is known for the Fasil Ghebbi royal castles",
                    "Axum hotels range from budget guesthouses to the Sabean hotel",
                    "Harar is a walled city famous for its hyena feeding",
                ],
            )
            .unwrap();
        index
    }

    #[test]
    fn test_matching_terms_rank_first() {
        let hits = sample().search("hyena Harar", 3).unwrap();
        assert_eq!(hits[0].0, 2);
        assert!(hits[0].1 > 0.0);
        assert!(hits.iter().all(|(position, _)| *position == 2));
    }

    #[test]
    fn test_only_matching_chunks_returned() {
        let hits = sample().search("hotels hotel Axum", 3).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, 1);
    }

    #[test]
    fn test_punctuation_does_not_fail() {
        let index = sample();
        let hits = index
            .search("What are the royal castles of Gondar?", 3)
            .unwrap();
        assert_eq!(hits[0].0, 0);
        assert!(index.search("Gondar \"castles", 3).is_ok());
    }

    #[test]
    fn test_positions_continue_across_batches() {
        let index = sample();
        index.add(3, ["Lalibela rock-hewn churches"]).unwrap();
        let hits = index.search("Lalibela", 5).unwrap();
        assert_eq!(hits, vec![(3, hits[0].1)]);
    }

    #[test]
    fn test_no_match_and_blank_query() {
        let index = sample();
        assert!(index.search("Danakil", 3).unwrap().is_empty());
        assert!(index.search("   ", 3).unwrap().is_empty());
        assert!(index.search("Harar", 0).unwrap().is_empty());
    }
}
