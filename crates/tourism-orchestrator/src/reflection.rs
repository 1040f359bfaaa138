//! Answer self-critique.

use std::sync::Arc;

use tracing::{debug, warn};

use tourism_llm::{GenerationRequest, TextGenerator};
use tourism_types::Verdict;

use crate::error::OrchestratorError;
use crate::prompts::reflection_prompt;

/// Asks the backend whether an answer is good, needs a retry, or is
/// unsupported.
pub struct ReflectionEvaluator {
    generator: Arc<dyn TextGenerator>,
}

impl ReflectionEvaluator {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// One backend call. Returns the trimmed, lower-cased reply; it may be
    /// anything, see [`resolve_verdict`].
    pub async fn reflect(
        &self,
        model: &str,
        question: &str,
        answer: &str,
    ) -> Result<String, OrchestratorError> {
        let prompt = reflection_prompt(question, answer);
        let response = self
            .generator
            .generate(GenerationRequest::new(model, prompt))
            .await?;
        let verdict = Verdict::normalize(response.as_text());
        debug!(verdict = %verdict, "Reflection verdict");
        Ok(verdict)
    }
}

/// Map normalized evaluator output to a verdict. Only an exact `good`,
/// `retry` or `unknown` is recognized; anything else gets `unrecognized`.
pub fn resolve_verdict(normalized: &str, unrecognized: Verdict) -> Verdict {
    match Verdict::from_normalized(normalized) {
        Some(verdict) => verdict,
        None => {
            warn!(reply = normalized, applied = %unrecognized, "Unrecognized reflection verdict");
            unrecognized
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tourism_llm::MockGenerator;

    #[tokio::test]
    async fn test_reflect_normalizes() {
        let mock = Arc::new(MockGenerator::fixed("  GOOD\n"));
        let evaluator = ReflectionEvaluator::new(mock.clone());

        let verdict = evaluator
            .reflect("m", "Who built Gondar?", "Fasilides")
            .await
            .unwrap();
        assert_eq!(verdict, "good");
        assert_eq!(mock.call_count(), 1);
        assert!(mock.prompts()[0].contains("Answer: Fasilides"));
    }

    #[tokio::test]
    async fn test_reflect_returns_unrecognized_text() {
        let mock = Arc::new(MockGenerator::fixed("The answer looks Good."));
        let evaluator = ReflectionEvaluator::new(mock);
        let verdict = evaluator.reflect("m", "q", "a").await.unwrap();
        assert_eq!(verdict, "the answer looks good.");
    }

    #[tokio::test]
    async fn test_reflect_propagates_failure() {
        let evaluator = ReflectionEvaluator::new(Arc::new(MockGenerator::failing("down")));
        assert!(evaluator.reflect("m", "q", "a").await.is_err());
    }

    #[test]
    fn test_resolve_verdict() {
        assert_eq!(resolve_verdict("good", Verdict::Unknown), Verdict::Good);
        assert_eq!(resolve_verdict("retry", Verdict::Unknown), Verdict::Retry);
        assert_eq!(resolve_verdict("unknown", Verdict::Good), Verdict::Unknown);
        assert_eq!(resolve_verdict("good.", Verdict::Unknown), Verdict::Unknown);
        assert_eq!(resolve_verdict("", Verdict::Good), Verdict::Good);
    }
}
