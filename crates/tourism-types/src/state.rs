//! Request state threaded through the orchestration pipeline.
//!
//! A `RequestState` is created when a request enters the engine and
//! discarded when it completes. Each node consumes the state and returns a
//! new one equal to its input plus specific field updates; fields are only
//! ever added or overwritten, never removed.

use serde::{Deserialize, Serialize};

use crate::chunk::Chunk;
use crate::history::ChatTurn;
use crate::intent::Intent;
use crate::strategy::RetrievalStrategy;

/// The record each orchestration node transforms.
///
/// Invariant: whenever `answer` is set, `source_documents` is `Some` (possibly
/// empty). The `with_answer*` updates maintain this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestState {
    /// Raw user question
    pub input: String,

    /// Prior turns, oldest first
    pub chat_history: Vec<ChatTurn>,

    /// Model identifier forwarded to the text-generation backend
    pub model: String,

    /// Chunks retrieved for grounded QA
    pub context: Option<Vec<Chunk>>,

    /// Final or intermediate answer
    pub answer: Option<String>,

    /// Chunks returned to the caller as supporting evidence
    pub source_documents: Option<Vec<Chunk>>,

    /// Intent assigned by the classifier
    pub intent: Option<Intent>,

    /// Strategy the retrieving node selected
    pub strategy: Option<RetrievalStrategy>,
}

impl RequestState {
    pub fn new(
        input: impl Into<String>,
        chat_history: Vec<ChatTurn>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            input: input.into(),
            chat_history,
            model: model.into(),
            context: None,
            answer: None,
            source_documents: None,
            intent: None,
            strategy: None,
        }
    }

    pub fn with_intent(self, intent: Intent) -> Self {
        Self {
            intent: Some(intent),
            ..self
        }
    }

    pub fn with_strategy(self, strategy: RetrievalStrategy) -> Self {
        Self {
            strategy: Some(strategy),
            ..self
        }
    }

    pub fn with_context(self, context: Vec<Chunk>) -> Self {
        Self {
            context: Some(context),
            ..self
        }
    }

    /// Set the answer together with the chunks that support it.
    pub fn with_answer(self, answer: impl Into<String>, source_documents: Vec<Chunk>) -> Self {
        Self {
            answer: Some(answer.into()),
            source_documents: Some(source_documents),
            ..self
        }
    }

    /// Replace the answer text, leaving previously recorded sources intact.
    pub fn with_replaced_answer(self, answer: impl Into<String>) -> Self {
        let source_documents = Some(self.source_documents.unwrap_or_default());
        Self {
            answer: Some(answer.into()),
            source_documents,
            ..self
        }
    }

    /// Retrieved context, empty when nothing was retrieved.
    pub fn context_chunks(&self) -> &[Chunk] {
        self.context.as_deref().unwrap_or_default()
    }

    pub fn is_answered(&self) -> bool {
        self.answer.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> RequestState {
        RequestState::new("What is the history of Lalibela?", vec![], "qwen:0.5b")
    }

    #[test]
    fn test_new_state_is_empty() {
        let state = base();
        assert!(state.context.is_none());
        assert!(state.answer.is_none());
        assert!(state.source_documents.is_none());
        assert!(state.intent.is_none());
        assert!(!state.is_answered());
    }

    #[test]
    fn test_updates_are_additive() {
        let chunks = vec![Chunk::new("Lalibela churches").with_filename("lalibela.pdf")];
        let state = base()
            .with_intent(Intent::AskFact)
            .with_strategy(RetrievalStrategy::Dense { k: 6 })
            .with_context(chunks.clone());

        assert_eq!(state.intent, Some(Intent::AskFact));
        assert_eq!(state.strategy, Some(RetrievalStrategy::Dense { k: 6 }));
        assert_eq!(state.context_chunks(), chunks.as_slice());
        assert_eq!(state.input, "What is the history of Lalibela?");
    }

    #[test]
    fn test_answer_always_carries_sources() {
        let state = base().with_answer("fallback", vec![]);
        assert_eq!(state.source_documents, Some(vec![]));
    }

    #[test]
    fn test_replaced_answer_keeps_sources() {
        let chunks = vec![Chunk::new("Axum stelae")];
        let state = base()
            .with_answer("The stelae are in Axum.", chunks.clone())
            .with_replaced_answer("I do not know");

        assert_eq!(state.answer.as_deref(), Some("I do not know"));
        assert_eq!(state.source_documents, Some(chunks));
    }

    #[test]
    fn test_replaced_answer_on_unanswered_state_sets_empty_sources() {
        let state = base().with_replaced_answer("I do not know");
        assert_eq!(state.source_documents, Some(vec![]));
    }
}
