//! Command implementations.
//!
//! Handles:
//! - ask: Run one question through the orchestrator
//! - chat: Interactive loop with per-session history
//! - trace: Explain the intent classification of a question
//! - inspect: Summarize the index or a query's retrieval

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use ulid::Ulid;

use tourism_embeddings::{CandleEmbedder, EmbeddingModel, HashingEmbedder, ModelCache};
use tourism_llm::{ApiGenerator, TextGenerator};
use tourism_orchestrator::{HistoryStore, InMemoryHistoryStore, Orchestrator, RunOutput};
use tourism_retrieval::{AdaptiveRetriever, InMemoryIndex, IntentClassifier, RetrievalIndex};
use tourism_types::{EmbedderKind, EmbeddingSettings, Settings};

/// Chunks previewed by `inspect` without a query.
const INSPECT_PREVIEW_COUNT: usize = 3;

/// Load configuration and apply CLI overrides.
pub fn load_settings(config_path: Option<&str>, log_level: Option<&str>) -> Result<Settings> {
    let mut settings = Settings::load(config_path).context("Failed to load configuration")?;
    if let Some(log_level) = log_level {
        settings.log_level = log_level.to_string();
    }
    Ok(settings)
}

/// Initialize logging from RUST_LOG, falling back to the configured level.
pub fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;
    Ok(())
}

/// Build the dense-retrieval embedder. MiniLM is loaded (and downloaded on
/// first use) on the blocking pool.
pub async fn build_embedder(settings: &EmbeddingSettings) -> Result<Arc<dyn EmbeddingModel>> {
    match settings.model {
        EmbedderKind::Hashing => {
            info!("Using offline hashing embedder");
            Ok(Arc::new(HashingEmbedder::new()))
        }
        EmbedderKind::MiniLm => {
            let cache = match &settings.cache_dir {
                Some(dir) => ModelCache::new(dir, &settings.repo_id),
                None => ModelCache {
                    repo_id: settings.repo_id.clone(),
                    ..ModelCache::default()
                },
            };
            let embedder = tokio::task::spawn_blocking(move || CandleEmbedder::load(&cache))
                .await
                .context("Embedding model loader panicked")?
                .context(
                    "Failed to load embedding model (set embedding.model = \"hashing\" to run offline)",
                )?;
            Ok(Arc::new(embedder))
        }
    }
}

/// Load the chunk snapshot. A missing snapshot yields an empty index.
pub async fn load_index(settings: &Settings) -> Result<Arc<InMemoryIndex>> {
    let path = settings.expanded_chunks_path();
    let embedder = build_embedder(&settings.embedding).await?;

    if !Path::new(&path).exists() {
        warn!(path = %path.display(), "Chunk snapshot not found, starting with an empty index");
        let index = InMemoryIndex::new(embedder).context("Failed to create index")?;
        return Ok(Arc::new(index));
    }

    let index = InMemoryIndex::load_jsonl(&path, embedder)
        .await
        .with_context(|| format!("Failed to load chunk snapshot {}", path.display()))?;
    Ok(Arc::new(index))
}

pub fn build_generator(settings: &Settings) -> Result<Arc<dyn TextGenerator>> {
    let generator = ApiGenerator::from_settings(&settings.generator)
        .context("Failed to configure text-generation backend")?;
    info!(
        provider = %generator.config().provider,
        base_url = %generator.config().base_url,
        "Generation backend configured"
    );
    Ok(Arc::new(generator))
}

/// Run a question within a session and record the exchange.
pub async fn answer_in_session(
    orchestrator: &Orchestrator,
    store: &dyn HistoryStore,
    session_id: &str,
    question: &str,
    model: &str,
) -> Result<RunOutput> {
    let history = store
        .get_history(session_id)
        .await
        .context("Failed to read conversation history")?;
    let output = orchestrator
        .run(question, history, model)
        .await
        .context("Request failed")?;
    store
        .record_exchange(session_id, question, &output.answer)
        .await
        .context("Failed to record conversation history")?;
    Ok(output)
}

/// Human-readable rendering of a result.
pub fn format_output(output: &RunOutput) -> String {
    let mut text = output.answer.clone();
    let sources = output.source_text();
    if !sources.is_empty() {
        text.push_str("\n\nSources:\n");
        text.push_str(&sources);
    }
    text
}

/// Handle the ask command.
pub async fn handle_ask(
    config_path: Option<&str>,
    log_level: Option<&str>,
    question: &str,
    model: Option<String>,
    session: Option<String>,
    json: bool,
) -> Result<()> {
    let settings = load_settings(config_path, log_level)?;
    init_logging(&settings.log_level)?;

    let model = model.unwrap_or_else(|| settings.generator.model.clone());
    let session_id = session.unwrap_or_else(|| Ulid::new().to_string());
    info!(session_id = %session_id, model = %model, "Answering question");

    let index = load_index(&settings).await?;
    let orchestrator = Orchestrator::with_settings(index, build_generator(&settings)?, &settings);
    let store = InMemoryHistoryStore::new();

    let output = answer_in_session(&orchestrator, &store, &session_id, question, &model).await?;

    if json {
        let rendered = serde_json::to_string_pretty(&output).context("Failed to encode result")?;
        println!("{rendered}");
    } else {
        println!("{}", format_output(&output));
        println!();
        println!("Intent: {}  Session: {}", output.intent, session_id);
    }
    Ok(())
}

/// Handle the chat command.
pub async fn handle_chat(
    config_path: Option<&str>,
    log_level: Option<&str>,
    model: Option<String>,
) -> Result<()> {
    let settings = load_settings(config_path, log_level)?;
    init_logging(&settings.log_level)?;

    let model = model.unwrap_or_else(|| settings.generator.model.clone());
    let index = load_index(&settings).await?;
    let orchestrator = Orchestrator::with_settings(index, build_generator(&settings)?, &settings);
    let store = InMemoryHistoryStore::new();
    let session_id = Ulid::new().to_string();

    println!("Session {session_id} (model {model}). Type 'exit' to quit.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("> ");
        std::io::stdout().flush().context("Failed to flush stdout")?;

        let Some(line) = lines.next_line().await.context("Failed to read input")? else {
            break;
        };
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if matches!(question, "exit" | "quit") {
            break;
        }

        match answer_in_session(&orchestrator, &store, &session_id, question, &model).await {
            Ok(output) => println!("{}\n", format_output(&output)),
            Err(e) => eprintln!("Error: {e:#}\n"),
        }
    }

    Ok(())
}

/// Handle the trace command.
pub fn handle_trace(question: &str) -> Result<()> {
    let result = IntentClassifier::new().trace(question);
    println!("Intent: {}", result.intent);
    if let Some(keyword) = &result.matched_keyword {
        println!("Matched keyword: {keyword}");
    }
    println!("Reason: {}", result.reason);
    Ok(())
}

/// Render the index summary, or the retrieval for `query`.
pub async fn inspect_report(
    index: Arc<dyn RetrievalIndex>,
    settings: &Settings,
    query: Option<&str>,
) -> Result<String> {
    let mut lines = Vec::new();

    match query {
        None => {
            let chunks = index
                .get_all_chunks()
                .await
                .context("Failed to list chunks")?;
            lines.push(format!("Chunks: {}", chunks.len()));
            for chunk in chunks.iter().take(INSPECT_PREVIEW_COUNT) {
                lines.push(format!("[{}] {}", chunk.filename(), chunk.preview(200)));
            }
        }
        Some(query) => {
            let retriever = AdaptiveRetriever::with_settings(index, settings.retrieval.clone());
            let outcome = retriever.select_and_retrieve(query, query).await;
            lines.push(format!("Strategy: {}", outcome.strategy));
            lines.push(format!("Chunks: {}", outcome.chunks.len()));
            for chunk in &outcome.chunks {
                lines.push(format!("[{}] {}", chunk.filename(), chunk.preview(200)));
            }
        }
    }

    Ok(lines.join("\n"))
}

/// Handle the inspect command.
pub async fn handle_inspect(
    config_path: Option<&str>,
    log_level: Option<&str>,
    query: Option<&str>,
) -> Result<()> {
    let settings = load_settings(config_path, log_level)?;
    init_logging(&settings.log_level)?;

    let index = load_index(&settings).await?;
    println!("{}", inspect_report(index, &settings, query).await?);
    Ok(())
}
