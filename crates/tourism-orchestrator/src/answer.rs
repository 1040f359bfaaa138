//! Grounded answer generation.

use std::sync::Arc;

use tracing::{debug, info};

use tourism_llm::{GenerationRequest, TextGenerator};
use tourism_types::{ChatTurn, Chunk, FallbackSettings};

use crate::error::OrchestratorError;
use crate::prompts::PromptKind;

/// Turns a query plus retrieved chunks into an answer.
///
/// With no context the backend is never called and the prompt family's
/// fallback literal is returned.
pub struct AnswerGenerator {
    generator: Arc<dyn TextGenerator>,
    fallbacks: FallbackSettings,
}

impl AnswerGenerator {
    pub fn new(generator: Arc<dyn TextGenerator>, fallbacks: FallbackSettings) -> Self {
        Self {
            generator,
            fallbacks,
        }
    }

    /// Fallback literal for a prompt family.
    pub fn fallback(&self, kind: PromptKind) -> &str {
        kind.fallback_kind().resolve(&self.fallbacks)
    }

    pub fn fallbacks(&self) -> &FallbackSettings {
        &self.fallbacks
    }

    pub async fn generate(
        &self,
        kind: PromptKind,
        model: &str,
        query: &str,
        context: &[Chunk],
        history: &[ChatTurn],
    ) -> Result<String, OrchestratorError> {
        let fallback = self.fallback(kind);
        if context.is_empty() {
            info!(?kind, "No context available, returning fallback");
            return Ok(fallback.to_string());
        }

        let prompt = kind.render(fallback, query, context, history);
        debug!(?kind, chunks = context.len(), prompt_len = prompt.len(), "Generating answer");

        let response = self
            .generator
            .generate(GenerationRequest::new(model, prompt))
            .await?;
        Ok(response.into_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tourism_llm::MockGenerator;

    fn answerer(mock: &Arc<MockGenerator>) -> AnswerGenerator {
        AnswerGenerator::new(mock.clone(), FallbackSettings::default())
    }

    #[tokio::test]
    async fn test_empty_context_skips_backend() {
        let mock = Arc::new(MockGenerator::fixed("should not be used"));
        let answerer = answerer(&mock);

        let strict = answerer
            .generate(PromptKind::GroundedQa, "m", "Who won?", &[], &[])
            .await
            .unwrap();
        let soft = answerer
            .generate(PromptKind::HotelComparison, "m", "Compare", &[], &[])
            .await
            .unwrap();

        assert_eq!(
            strict,
            "I do not know and it is not in the data and context provided to me"
        );
        assert_eq!(soft, "I don't know based on the documents.");
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_single_call_with_context() {
        let mock = Arc::new(MockGenerator::fixed(
            r#"{"answer": "Carved in the 12th century."}"#,
        ));
        let answerer = answerer(&mock);
        let context = vec![Chunk::new("Lalibela churches were carved in the 12th century.")];

        let answer = answerer
            .generate(
                PromptKind::GroundedQa,
                "qwen:0.5b",
                "When were the Lalibela churches built?",
                &context,
                &[ChatTurn::user("Hi")],
            )
            .await
            .unwrap();

        assert_eq!(answer, "Carved in the 12th century.");
        assert_eq!(mock.call_count(), 1);
        let request = &mock.requests()[0];
        assert_eq!(request.model, "qwen:0.5b");
        assert!(request.prompt.contains("12th century"));
        assert!(request.prompt.contains("user: Hi"));
    }

    #[tokio::test]
    async fn test_backend_failure_propagates() {
        let mock = Arc::new(MockGenerator::failing("connection refused"));
        let answerer = answerer(&mock);
        let result = answerer
            .generate(PromptKind::Itinerary, "m", "q", &[Chunk::new("x")], &[])
            .await;
        assert!(matches!(result, Err(OrchestratorError::Generation(_))));
    }

    #[tokio::test]
    async fn test_custom_fallbacks() {
        let mock = Arc::new(MockGenerator::default());
        let answerer = AnswerGenerator::new(
            mock.clone(),
            FallbackSettings {
                strict: "no data".to_string(),
                soft: "not sure".to_string(),
            },
        );
        assert_eq!(answerer.fallback(PromptKind::Itinerary), "no data");
        assert_eq!(answerer.fallback(PromptKind::PlaceExploration), "not sure");
    }
}
