use std::sync::Arc;

use tracing::debug;

use tourism_llm::{GenerationRequest, TextGenerator};
use tourism_types::ChatTurn;

use crate::error::OrchestratorError;
use crate::prompts::reformulation_prompt;

/// Rewrites follow-up questions into standalone ones using the conversation.
pub struct QueryReformulator {
    generator: Arc<dyn TextGenerator>,
}

impl QueryReformulator {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Returns `query` unchanged, without a backend call, when there is no
    /// history. A blank rewrite also falls back to `query`.
    pub async fn reformulate(
        &self,
        model: &str,
        query: &str,
        history: &[ChatTurn],
    ) -> Result<String, OrchestratorError> {
        if history.is_empty() {
            return Ok(query.to_string());
        }

        let response = self
            .generator
            .generate(GenerationRequest::new(
                model,
                reformulation_prompt(query, history),
            ))
            .await?;
        let rewritten = response.into_text().trim().to_string();

        if rewritten.is_empty() {
            return Ok(query.to_string());
        }
        debug!(original = query, rewritten = %rewritten, "Reformulated query");
        Ok(rewritten)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tourism_llm::MockGenerator;

    #[tokio::test]
    async fn test_no_history_no_call() {
        let mock = Arc::new(MockGenerator::fixed("rewritten"));
        let reformulator = QueryReformulator::new(mock.clone());
        let query = reformulator
            .reformulate("m", "What is Axum?", &[])
            .await
            .unwrap();
        assert_eq!(query, "What is Axum?");
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_rewrites_with_history() {
        let mock = Arc::new(MockGenerator::fixed(" How old are the Axum obelisks? "));
        let reformulator = QueryReformulator::new(mock.clone());
        let query = reformulator
            .reformulate(
                "m",
                "How old are they?",
                &[
                    ChatTurn::user("Tell me about the Axum obelisks"),
                    ChatTurn::assistant("They are granite stelae."),
                ],
            )
            .await
            .unwrap();
        assert_eq!(query, "How old are the Axum obelisks?");
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_blank_rewrite_keeps_original() {
        let mock = Arc::new(MockGenerator::fixed("   "));
        let reformulator = QueryReformulator::new(mock);
        let query = reformulator
            .reformulate("m", "How old are they?", &[ChatTurn::user("Axum")])
            .await
            .unwrap();
        assert_eq!(query, "How old are they?");
    }
}
