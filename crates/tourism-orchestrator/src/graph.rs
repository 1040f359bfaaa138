//! Request state machine.
//!
//! ```text
//! classify ─┬─ ask_fact ────── retrieve → answer → reflect ─┐
//!           ├─ plan_trip ───── plan ─────────────────────────┤
//!           ├─ compare_hotels  compare ──────────────────────┼─ END
//!           ├─ explore_place ─ explore ──────────────────────┤
//!           └─ unsupported ─── unsupported ──────────────────┘
//! ```
//!
//! Each node takes the request state by value and returns the updated one.
//! Nothing runs concurrently within a request.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use tourism_llm::TextGenerator;
use tourism_retrieval::{AdaptiveRetriever, IntentClassifier, RetrievalIndex};
use tourism_types::{
    ChatTurn, Chunk, Intent, ReflectionSettings, RequestState, RetrievalStrategy, Settings,
    Verdict,
};

use crate::answer::AnswerGenerator;
use crate::error::OrchestratorError;
use crate::prompts::PromptKind;
use crate::reflection::{resolve_verdict, ReflectionEvaluator};
use crate::reformulate::QueryReformulator;

/// Substrings that mark a trip request as a factual question the planner
/// must not answer.
pub const PLAN_FACTUAL_GUARD: [&str; 6] = ["who", "what", "when", "where", "how", "won"];

/// Characters of each source shown by [`RunOutput::source_text`].
pub const SOURCE_PREVIEW_CHARS: usize = 200;

/// Pipeline states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    Classify,
    Retrieve,
    Answer,
    Reflect,
    Plan,
    Compare,
    Explore,
    Unsupported,
    End,
}

impl Node {
    pub fn name(&self) -> &'static str {
        match self {
            Node::Classify => "classify",
            Node::Retrieve => "retrieve",
            Node::Answer => "answer",
            Node::Reflect => "reflect",
            Node::Plan => "plan",
            Node::Compare => "compare",
            Node::Explore => "explore",
            Node::Unsupported => "unsupported",
            Node::End => "end",
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Branch taken after classification. A state without an intent is an
/// internal error, never defaulted.
pub fn route(state: &RequestState) -> Result<Node, OrchestratorError> {
    match state.intent {
        Some(Intent::AskFact) => Ok(Node::Retrieve),
        Some(Intent::PlanTrip) => Ok(Node::Plan),
        Some(Intent::CompareHotels) => Ok(Node::Compare),
        Some(Intent::ExplorePlace) => Ok(Node::Explore),
        Some(Intent::Unsupported) => Ok(Node::Unsupported),
        None => Err(OrchestratorError::invalid_state(
            "route",
            "state has no intent",
        )),
    }
}

/// Successor of `node` given the state it produced.
pub fn next(node: Node, state: &RequestState) -> Result<Node, OrchestratorError> {
    match node {
        Node::Classify => route(state),
        Node::Retrieve => Ok(Node::Answer),
        Node::Answer => Ok(Node::Reflect),
        Node::Reflect | Node::Plan | Node::Compare | Node::Explore | Node::Unsupported => {
            Ok(Node::End)
        }
        Node::End => Err(OrchestratorError::invalid_state(
            "end",
            "no transition out of the terminal node",
        )),
    }
}

/// Result of one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunOutput {
    pub answer: String,
    pub source_documents: Vec<Chunk>,
    pub intent: Intent,
    /// Absent when the request ended without retrieving
    pub strategy: Option<RetrievalStrategy>,
    /// Nodes executed, in order
    pub path: Vec<Node>,
}

impl RunOutput {
    fn from_state(state: RequestState, path: Vec<Node>) -> Result<Self, OrchestratorError> {
        let answer = state.answer.ok_or(OrchestratorError::MissingAnswer)?;
        let intent = state
            .intent
            .ok_or_else(|| OrchestratorError::invalid_state("end", "state has no intent"))?;
        Ok(Self {
            answer,
            source_documents: state.source_documents.unwrap_or_default(),
            intent,
            strategy: state.strategy,
            path,
        })
    }

    /// Sources as `[filename] preview`, separated by blank lines.
    pub fn source_text(&self) -> String {
        self.source_documents
            .iter()
            .map(|c| format!("[{}] {}", c.filename(), c.preview(SOURCE_PREVIEW_CHARS)))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Runs requests through classification, retrieval, generation and
/// reflection.
pub struct Orchestrator {
    classifier: IntentClassifier,
    retriever: AdaptiveRetriever,
    answerer: AnswerGenerator,
    evaluator: ReflectionEvaluator,
    reformulator: QueryReformulator,
    reflection: ReflectionSettings,
    reformulate_with_history: bool,
}

impl Orchestrator {
    /// Create an orchestrator with default settings.
    pub fn new(index: Arc<dyn RetrievalIndex>, generator: Arc<dyn TextGenerator>) -> Self {
        Self::with_settings(index, generator, &Settings::default())
    }

    pub fn with_settings(
        index: Arc<dyn RetrievalIndex>,
        generator: Arc<dyn TextGenerator>,
        settings: &Settings,
    ) -> Self {
        Self {
            classifier: IntentClassifier::new(),
            retriever: AdaptiveRetriever::with_settings(index, settings.retrieval.clone()),
            answerer: AnswerGenerator::new(generator.clone(), settings.fallback.clone()),
            evaluator: ReflectionEvaluator::new(generator.clone()),
            reformulator: QueryReformulator::new(generator),
            reflection: settings.reflection.clone(),
            reformulate_with_history: settings.reformulate_with_history,
        }
    }

    /// Replace the intent classifier.
    pub fn with_classifier(mut self, classifier: IntentClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn classifier(&self) -> &IntentClassifier {
        &self.classifier
    }

    pub fn retriever(&self) -> &AdaptiveRetriever {
        &self.retriever
    }

    /// Answer one query.
    pub async fn run(
        &self,
        input: &str,
        chat_history: Vec<ChatTurn>,
        model: &str,
    ) -> Result<RunOutput, OrchestratorError> {
        info!(input, model, history = chat_history.len(), "Request started");

        let mut state = RequestState::new(input, chat_history, model);
        let mut node = Node::Classify;
        let mut path = Vec::new();

        while node != Node::End {
            state = self.step(node, state).await?;
            path.push(node);
            let successor = next(node, &state)?;
            debug!(from = %node, to = %successor, "Transition");
            node = successor;
        }

        let output = RunOutput::from_state(state, path)?;
        info!(
            intent = %output.intent,
            sources = output.source_documents.len(),
            "Request finished"
        );
        Ok(output)
    }

    /// Execute a single node.
    pub async fn step(
        &self,
        node: Node,
        state: RequestState,
    ) -> Result<RequestState, OrchestratorError> {
        match node {
            Node::Classify => Ok(self.classify(state)),
            Node::Retrieve => self.retrieve(state).await,
            Node::Answer => self.answer(state).await,
            Node::Reflect => self.reflect(state).await,
            Node::Plan => self.plan(state).await,
            Node::Compare => self.specialized(state, PromptKind::HotelComparison).await,
            Node::Explore => self.specialized(state, PromptKind::PlaceExploration).await,
            Node::Unsupported => Ok(self.unsupported(state)),
            Node::End => Err(OrchestratorError::invalid_state(
                "end",
                "the terminal node does not execute",
            )),
        }
    }

    fn classify(&self, state: RequestState) -> RequestState {
        let intent = self.classifier.classify(&state.input);
        debug!(intent = %intent, "Classified intent");
        state.with_intent(intent)
    }

    async fn retrieve(&self, state: RequestState) -> Result<RequestState, OrchestratorError> {
        let query = if self.reformulate_with_history {
            self.reformulator
                .reformulate(&state.model, &state.input, &state.chat_history)
                .await?
        } else {
            state.input.clone()
        };

        let outcome = self.retriever.select_and_retrieve(&state.input, &query).await;
        debug!(strategy = %outcome.strategy, chunks = outcome.chunks.len(), "Retrieved context");
        Ok(state
            .with_strategy(outcome.strategy)
            .with_context(outcome.chunks))
    }

    async fn answer(&self, state: RequestState) -> Result<RequestState, OrchestratorError> {
        let context = state.context_chunks().to_vec();
        let answer = self
            .answerer
            .generate(
                PromptKind::GroundedQa,
                &state.model,
                &state.input,
                &context,
                &state.chat_history,
            )
            .await?;
        Ok(state.with_answer(answer, context))
    }

    async fn reflect(&self, state: RequestState) -> Result<RequestState, OrchestratorError> {
        if !self.reflection.enabled {
            return Ok(state);
        }
        // Nothing was generated; the answer is already the fallback.
        if state.context_chunks().is_empty() {
            debug!("Skipping reflection on fallback answer");
            return Ok(state);
        }

        let answer = state
            .answer
            .as_deref()
            .ok_or_else(|| OrchestratorError::invalid_state("reflect", "no answer to evaluate"))?;
        let reply = self
            .evaluator
            .reflect(&state.model, &state.input, answer)
            .await?;

        match resolve_verdict(&reply, self.reflection.unrecognized_verdict) {
            Verdict::Good => Ok(state),
            Verdict::Retry => {
                info!("Regenerating answer once after reflection");
                self.answer(state).await
            }
            Verdict::Unknown => {
                info!("Answer judged unsupported, returning fallback");
                let fallback = self.answerer.fallback(PromptKind::GroundedQa).to_string();
                Ok(state.with_replaced_answer(fallback))
            }
        }
    }

    async fn plan(&self, state: RequestState) -> Result<RequestState, OrchestratorError> {
        let lowered = state.input.to_lowercase();
        if let Some(keyword) = PLAN_FACTUAL_GUARD.iter().find(|k| lowered.contains(*k)) {
            info!(keyword, "Factual question routed to planner, returning fallback");
            let fallback = self.answerer.fallback(PromptKind::Itinerary).to_string();
            return Ok(state.with_answer(fallback, Vec::new()));
        }
        self.specialized(state, PromptKind::Itinerary).await
    }

    /// Retrieve for the node's own query, then answer with its prompt
    /// family. No reflection.
    async fn specialized(
        &self,
        state: RequestState,
        kind: PromptKind,
    ) -> Result<RequestState, OrchestratorError> {
        let outcome = self
            .retriever
            .select_and_retrieve(&state.input, &state.input)
            .await;
        debug!(
            ?kind,
            strategy = %outcome.strategy,
            chunks = outcome.chunks.len(),
            "Retrieved context"
        );

        let answer = self
            .answerer
            .generate(kind, &state.model, &state.input, &outcome.chunks, &[])
            .await?;
        Ok(state
            .with_strategy(outcome.strategy)
            .with_answer(answer, outcome.chunks))
    }

    fn unsupported(&self, state: RequestState) -> RequestState {
        info!("Unsupported query, returning fallback");
        let fallback = self.answerer.fallbacks().strict.clone();
        state.with_answer(fallback, Vec::new())
    }
}
