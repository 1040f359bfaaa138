//! Pipeline-wide properties: strategy selection, retry bound, planner
//! guard, empty-index behavior and determinism.

use pretty_assertions::assert_eq;

use e2e_tests::{scripted_backend, TestHarness, SOFT_FALLBACK, STRICT_FALLBACK};
use tourism_orchestrator::Node;
use tourism_types::{Intent, RequestState, RetrievalStrategy};

#[tokio::test]
async fn test_short_queries_select_lexical() {
    let harness = TestHarness::new(scripted_backend("unused", "good")).await;
    let retriever = harness.orchestrator.retriever();

    for query in ["Harar", "Gondar hotels", "compare Axum hotels"] {
        assert_eq!(
            retriever.select(query).await,
            RetrievalStrategy::Lexical { k: 6 },
            "query: {query}"
        );
    }
}

#[tokio::test]
async fn test_long_compare_queries_select_hybrid() {
    let harness = TestHarness::new(scripted_backend("unused", "good")).await;
    let retriever = harness.orchestrator.retriever();

    for query in [
        "Compare hotels in Axum",
        "Can you COMPARE Gondar and Harar?",
        "please compare the prices of lodges",
    ] {
        assert_eq!(
            retriever.select(query).await,
            RetrievalStrategy::Hybrid {
                k: 6,
                similarity_threshold: 0.7
            },
            "query: {query}"
        );
    }
}

#[tokio::test]
async fn test_always_retry_generates_at_most_twice() {
    let harness = TestHarness::new(scripted_backend("A vague answer.", "retry")).await;

    let output = harness
        .orchestrator
        .run("Who carved the churches of Lalibela?", vec![], "qwen:0.5b")
        .await
        .unwrap();

    assert_eq!(output.answer, "A vague answer.");
    assert_eq!(harness.generation_calls(), 2);
    assert_eq!(harness.reflection_calls(), 1);
}

#[tokio::test]
async fn test_unknown_verdict_keeps_sources() {
    let harness = TestHarness::new(scripted_backend("Invented facts.", "unknown")).await;

    let output = harness
        .orchestrator
        .run("Who carved the churches of Lalibela?", vec![], "qwen:0.5b")
        .await
        .unwrap();

    assert_eq!(output.answer, STRICT_FALLBACK);
    assert!(!output.source_documents.is_empty());
}

#[tokio::test]
async fn test_plan_guard_on_factual_words() {
    let harness = TestHarness::new(scripted_backend("unused", "good")).await;

    for query in ["Plan a trip: who built Gondar?", "Plan a trip for when Timkat happens"] {
        let state = RequestState::new(query, vec![], "qwen:0.5b").with_intent(Intent::PlanTrip);
        let state = harness.orchestrator.step(Node::Plan, state).await.unwrap();

        assert_eq!(state.answer.as_deref(), Some(STRICT_FALLBACK));
        assert_eq!(state.source_documents, Some(vec![]));
    }

    assert_eq!(harness.backend.call_count(), 0);
    assert_eq!(harness.index.total_calls(), 0);
}

/// "wonderful" contains "won", so this trip request never reaches retrieval.
#[tokio::test]
async fn test_plan_guard_through_full_run() {
    let harness = TestHarness::new(scripted_backend("unused", "good")).await;

    let output = harness
        .orchestrator
        .run("Plan a wonderful trip to Gondar", vec![], "qwen:0.5b")
        .await
        .unwrap();

    assert_eq!(output.intent, Intent::PlanTrip);
    assert_eq!(output.answer, STRICT_FALLBACK);
    assert_eq!(output.strategy, None);
    assert_eq!(harness.backend.call_count(), 0);
    assert_eq!(harness.index.total_calls(), 0);
}

#[tokio::test]
async fn test_empty_index_never_calls_backend() {
    let cases = [
        ("What is the history of Lalibela?", Intent::AskFact, STRICT_FALLBACK),
        ("Plan a 3 day trip to Harar", Intent::PlanTrip, STRICT_FALLBACK),
        ("Compare hotels in Axum and Gondar", Intent::CompareHotels, SOFT_FALLBACK),
        ("Discover the Simien Mountains", Intent::ExplorePlace, SOFT_FALLBACK),
    ];

    for (query, intent, fallback) in cases {
        let harness = TestHarness::empty(scripted_backend("unused", "good")).await;
        let output = harness
            .orchestrator
            .run(query, vec![], "qwen:0.5b")
            .await
            .unwrap();

        assert_eq!(output.intent, intent, "query: {query}");
        assert_eq!(output.strategy, Some(RetrievalStrategy::Dense { k: 3 }));
        assert_eq!(output.answer, fallback, "query: {query}");
        assert!(output.source_documents.is_empty());
        assert_eq!(harness.backend.call_count(), 0, "query: {query}");
    }
}

#[tokio::test]
async fn test_retrieval_is_deterministic() {
    let harness = TestHarness::new(scripted_backend("unused", "good")).await;
    let retriever = harness.orchestrator.retriever();

    for query in [
        "Harar hyena",
        "Where can I see gelada baboons in Ethiopia?",
        "Compare hotels in Axum and Gondar",
    ] {
        let first = retriever.select_and_retrieve(query, query).await;
        let second = retriever.select_and_retrieve(query, query).await;
        assert_eq!(first.strategy, second.strategy);
        assert_eq!(first.chunks, second.chunks);
    }
}

#[tokio::test]
async fn test_same_request_same_output() {
    let first = TestHarness::new(scripted_backend("Answer.", "good")).await;
    let second = TestHarness::new(scripted_backend("Answer.", "good")).await;
    let query = "Where is the highest peak in Ethiopia?";

    let a = first.orchestrator.run(query, vec![], "m").await.unwrap();
    let b = second.orchestrator.run(query, vec![], "m").await.unwrap();
    assert_eq!(a, b);
    assert_eq!(first.backend.prompts(), second.backend.prompts());
}
