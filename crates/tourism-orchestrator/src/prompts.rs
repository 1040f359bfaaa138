//! Prompt templates.
//!
//! Every grounded prompt has the same layout: instructions, the retrieved
//! context, optionally the conversation so far, then the question. The
//! refusal sentence is injected from [`FallbackSettings`] so the text the
//! model is told to emit and the text the engine substitutes never drift.

use tourism_types::{ChatTurn, Chunk, FallbackSettings};

/// Which fallback literal a prompt family refuses with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackKind {
    /// "I do not know and it is not in the data and context provided to me"
    Strict,
    /// "I don't know based on the documents."
    Soft,
}

impl FallbackKind {
    pub fn resolve<'a>(&self, fallbacks: &'a FallbackSettings) -> &'a str {
        match self {
            FallbackKind::Strict => &fallbacks.strict,
            FallbackKind::Soft => &fallbacks.soft,
        }
    }
}

/// Grounded prompt families, one per answering node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    /// Fact lookup
    GroundedQa,
    /// Multi-day trip planning
    Itinerary,
    /// Side-by-side hotel comparison
    HotelComparison,
    /// Overview of a destination
    PlaceExploration,
}

impl PromptKind {
    pub fn fallback_kind(&self) -> FallbackKind {
        match self {
            PromptKind::GroundedQa | PromptKind::Itinerary => FallbackKind::Strict,
            PromptKind::HotelComparison | PromptKind::PlaceExploration => FallbackKind::Soft,
        }
    }

    /// Only fact lookup is conversational.
    pub fn includes_history(&self) -> bool {
        matches!(self, PromptKind::GroundedQa)
    }

    pub fn instructions(&self, fallback: &str) -> String {
        match self {
            PromptKind::GroundedQa => format!(
                "You are a tourism assistant for Ethiopia.\n\
                 You must answer ONLY using the provided context. If the context does not \
                 contain the answer, respond exactly with:\n'{fallback}'"
            ),
            PromptKind::Itinerary => format!(
                "You are a travel itinerary planner for Ethiopia.\n\
                 Use ONLY the provided context to generate a multi-day itinerary.\n\
                 If the context does not contain enough information, respond exactly with:\n\
                 '{fallback}'"
            ),
            PromptKind::HotelComparison => format!(
                "Compare hotels based on location, amenities, pricing, and reviews using ONLY \
                 the provided context. Do not guess or hallucinate.\n\
                 If the context is insufficient, say '{fallback}'"
            ),
            PromptKind::PlaceExploration => format!(
                "You are a tourism expert for Ethiopia.\n\
                 Explore the location mentioned in the user's query using ONLY the provided \
                 context.\nSummarize its geography, history, culture, attractions, and travel \
                 tips.\n\nIf the context is insufficient, say '{fallback}'"
            ),
        }
    }

    /// Build the full prompt.
    pub fn render(
        &self,
        fallback: &str,
        query: &str,
        context: &[Chunk],
        history: &[ChatTurn],
    ) -> String {
        let mut prompt = self.instructions(fallback);

        prompt.push_str("\n\nContext:\n");
        prompt.push_str(&join_context(context));

        if self.includes_history() && !history.is_empty() {
            prompt.push_str("\n\nConversation history:\n");
            prompt.push_str(&format_history(history));
        }

        prompt.push_str("\n\nQuestion: ");
        prompt.push_str(query);
        prompt
    }
}

/// Chunk texts separated by blank lines.
pub fn join_context(context: &[Chunk]) -> String {
    context
        .iter()
        .map(|c| c.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn format_history(history: &[ChatTurn]) -> String {
    history
        .iter()
        .map(ChatTurn::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Evaluator prompt; the reply is expected to be one of good, retry, unknown.
pub fn reflection_prompt(question: &str, answer: &str) -> String {
    format!(
        "You are a critical evaluator of AI-generated answers.\n\n\
         Evaluate the following answer to a user question.\n\
         Is it vague, hallucinated, or unsupported by the context?\n\
         Respond with one of: 'good', 'retry', or 'unknown'.\n\n\
         Question: {question}\nAnswer: {answer}"
    )
}

/// Rewrite a follow-up into a standalone question.
pub fn reformulation_prompt(query: &str, history: &[ChatTurn]) -> String {
    format!(
        "Given a chat history and the latest user question which might reference context in \
         the chat history, formulate a standalone question which can be understood without \
         the chat history. Do NOT answer the question, just reformulate it if needed and \
         otherwise return it as is.\n\n\
         Conversation history:\n{}\n\nQuestion: {query}",
        format_history(history)
    )
}
