//! Configuration loading for the tourism query engine.
//!
//! Layered config: defaults -> config file -> env vars -> CLI flags.
//! The default config file lives at `<config dir>/tourism-rag/config.toml`.

use config::{Config, Environment, File};
use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::TourismError;
use crate::intent::Verdict;

const APP_NAME: &str = "tourism-rag";

/// Text-generation backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorSettings {
    /// Provider name ("ollama", "openai", "anthropic")
    #[serde(default = "default_generator_provider")]
    pub provider: String,

    /// Model used when a request does not name one
    #[serde(default = "default_generator_model")]
    pub model: String,

    /// API key (loaded from env var, not stored in config file)
    #[serde(default)]
    pub api_key: Option<String>,

    /// API base URL (for custom endpoints)
    #[serde(default)]
    pub api_base_url: Option<String>,

    /// HTTP request timeout in seconds
    #[serde(default = "default_generator_timeout")]
    pub timeout_secs: u64,

    /// Transport attempts per backend invocation (1 = no transport retry)
    #[serde(default = "default_generator_attempts")]
    pub max_retries: u32,
}

fn default_generator_provider() -> String {
    "ollama".to_string()
}

fn default_generator_model() -> String {
    "qwen:0.5b".to_string()
}

fn default_generator_timeout() -> u64 {
    120
}

fn default_generator_attempts() -> u32 {
    1
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            provider: default_generator_provider(),
            model: default_generator_model(),
            api_key: None,
            api_base_url: None,
            timeout_secs: default_generator_timeout(),
            max_retries: default_generator_attempts(),
        }
    }
}

impl GeneratorSettings {
    pub fn validate(&self) -> Result<(), String> {
        if self.model.trim().is_empty() {
            return Err("model must not be empty".to_string());
        }
        if self.timeout_secs == 0 {
            return Err("timeout_secs must be > 0".to_string());
        }
        if self.max_retries == 0 {
            return Err("max_retries must be >= 1".to_string());
        }
        Ok(())
    }
}

/// Adaptive retrieval policy parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalSettings {
    /// Queries with fewer whitespace tokens than this use lexical retrieval
    #[serde(default = "default_short_query_tokens")]
    pub short_query_tokens: usize,

    /// Candidates requested from a populated index
    #[serde(default = "default_k")]
    pub default_k: usize,

    /// Candidates requested when the index is empty
    #[serde(default = "default_empty_index_k")]
    pub empty_index_k: usize,

    /// Minimum cosine similarity kept by hybrid retrieval
    #[serde(default = "default_hybrid_threshold")]
    pub hybrid_threshold: f32,

    /// Substring (case-insensitive) that selects hybrid retrieval
    #[serde(default = "default_hybrid_trigger")]
    pub hybrid_trigger: String,
}

fn default_short_query_tokens() -> usize {
    4
}

fn default_k() -> usize {
    6
}

fn default_empty_index_k() -> usize {
    3
}

fn default_hybrid_threshold() -> f32 {
    0.7
}

fn default_hybrid_trigger() -> String {
    "compare".to_string()
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            short_query_tokens: default_short_query_tokens(),
            default_k: default_k(),
            empty_index_k: default_empty_index_k(),
            hybrid_threshold: default_hybrid_threshold(),
            hybrid_trigger: default_hybrid_trigger(),
        }
    }
}

impl RetrievalSettings {
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.hybrid_threshold) {
            return Err(format!(
                "hybrid_threshold must be 0.0-1.0, got {}",
                self.hybrid_threshold
            ));
        }
        if self.default_k == 0 || self.empty_index_k == 0 {
            return Err("k values must be > 0".to_string());
        }
        if self.hybrid_trigger.trim().is_empty() {
            return Err("hybrid_trigger must not be empty".to_string());
        }
        Ok(())
    }
}

/// Fixed answers returned instead of generated text.
///
/// Both literals are defined here once so every node draws from the same
/// source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackSettings {
    /// Used by grounded QA, reflection, unsupported queries and planning
    #[serde(default = "default_strict_fallback")]
    pub strict: String,

    /// Used by hotel comparison and place exploration
    #[serde(default = "default_soft_fallback")]
    pub soft: String,
}

fn default_strict_fallback() -> String {
    "I do not know and it is not in the data and context provided to me".to_string()
}

fn default_soft_fallback() -> String {
    "I don't know based on the documents.".to_string()
}

impl Default for FallbackSettings {
    fn default() -> Self {
        Self {
            strict: default_strict_fallback(),
            soft: default_soft_fallback(),
        }
    }
}

impl FallbackSettings {
    pub fn validate(&self) -> Result<(), String> {
        if self.strict.trim().is_empty() {
            return Err("strict must not be empty".to_string());
        }
        if self.soft.trim().is_empty() {
            return Err("soft must not be empty".to_string());
        }
        Ok(())
    }
}

/// Which embedding model backs dense search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedderKind {
    /// all-MiniLM-L6-v2 via Candle
    MiniLm,
    /// Offline feature hashing, no model files
    Hashing,
}

/// Dense-retrieval embedding model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    #[serde(default = "default_embedder_kind")]
    pub model: EmbedderKind,

    /// HuggingFace repository of the sentence-transformer
    #[serde(default = "default_embedding_repo")]
    pub repo_id: String,

    /// Model cache directory (default: `<cache dir>/tourism-rag/models`)
    #[serde(default)]
    pub cache_dir: Option<String>,
}

fn default_embedder_kind() -> EmbedderKind {
    EmbedderKind::MiniLm
}

fn default_embedding_repo() -> String {
    "sentence-transformers/all-MiniLM-L6-v2".to_string()
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: default_embedder_kind(),
            repo_id: default_embedding_repo(),
            cache_dir: None,
        }
    }
}

impl EmbeddingSettings {
    /// Settings for the offline hashing embedder.
    pub fn hashing() -> Self {
        Self {
            model: EmbedderKind::Hashing,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.model == EmbedderKind::MiniLm && self.repo_id.trim().is_empty() {
            return Err("repo_id must not be empty".to_string());
        }
        Ok(())
    }
}

/// Self-reflection on grounded answers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReflectionSettings {
    /// When false the reflect node keeps every answer as-is
    #[serde(default = "default_reflection_enabled")]
    pub enabled: bool,

    /// Verdict applied when the evaluator replies with anything other than
    /// exactly "good", "retry" or "unknown"
    #[serde(default = "default_unrecognized_verdict")]
    pub unrecognized_verdict: Verdict,
}

fn default_reflection_enabled() -> bool {
    true
}

fn default_unrecognized_verdict() -> Verdict {
    Verdict::Unknown
}

impl Default for ReflectionSettings {
    fn default() -> Self {
        Self {
            enabled: default_reflection_enabled(),
            unrecognized_verdict: default_unrecognized_verdict(),
        }
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Text-generation backend
    #[serde(default)]
    pub generator: GeneratorSettings,

    /// Adaptive retrieval policy
    #[serde(default)]
    pub retrieval: RetrievalSettings,

    /// Embedding model for dense search
    #[serde(default)]
    pub embedding: EmbeddingSettings,

    /// Fallback answers
    #[serde(default)]
    pub fallback: FallbackSettings,

    /// Answer reflection
    #[serde(default)]
    pub reflection: ReflectionSettings,

    /// Rewrite follow-up questions into standalone ones before retrieval
    #[serde(default)]
    pub reformulate_with_history: bool,

    /// Path to the JSONL chunk snapshot loaded into the index
    #[serde(default = "default_chunks_path")]
    pub chunks_path: String,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_chunks_path() -> String {
    ProjectDirs::from("", "", APP_NAME)
        .map(|p| p.data_local_dir().join("chunks.jsonl"))
        .unwrap_or_else(|| PathBuf::from("./chunks.jsonl"))
        .to_string_lossy()
        .to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            generator: GeneratorSettings::default(),
            retrieval: RetrievalSettings::default(),
            embedding: EmbeddingSettings::default(),
            fallback: FallbackSettings::default(),
            reflection: ReflectionSettings::default(),
            reformulate_with_history: false,
            chunks_path: default_chunks_path(),
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file (<config dir>/tourism-rag/config.toml)
    /// 3. CLI-specified config file (optional)
    /// 4. Environment variables (TOURISM_*, nested keys joined by `__`)
    ///
    /// CLI flags should be applied by the caller after this returns.
    pub fn load(cli_config_path: Option<&str>) -> Result<Self, TourismError> {
        let config_dir = ProjectDirs::from("", "", APP_NAME)
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let default_config_path = config_dir.join("config");

        let mut builder = Config::builder()
            .set_default("chunks_path", default_chunks_path())
            .map_err(|e| TourismError::Config(e.to_string()))?
            .set_default("log_level", default_log_level())
            .map_err(|e| TourismError::Config(e.to_string()))?
            .set_default("generator.provider", default_generator_provider())
            .map_err(|e| TourismError::Config(e.to_string()))?
            .set_default("generator.model", default_generator_model())
            .map_err(|e| TourismError::Config(e.to_string()))?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = cli_config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // Format: TOURISM_LOG_LEVEL, TOURISM_GENERATOR__MODEL, TOURISM_RETRIEVAL__DEFAULT_K
        builder = builder.add_source(
            Environment::with_prefix("TOURISM")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings: Settings = builder
            .build()
            .map_err(|e| TourismError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| TourismError::Config(e.to_string()))?;

        settings.validate()?;
        Ok(settings)
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<(), TourismError> {
        self.generator
            .validate()
            .map_err(|e| TourismError::Config(format!("generator: {e}")))?;
        self.retrieval
            .validate()
            .map_err(|e| TourismError::Config(format!("retrieval: {e}")))?;
        self.embedding
            .validate()
            .map_err(|e| TourismError::Config(format!("embedding: {e}")))?;
        self.fallback
            .validate()
            .map_err(|e| TourismError::Config(format!("fallback: {e}")))?;
        Ok(())
    }

    /// Expand ~ in chunks_path to the home directory
    pub fn expanded_chunks_path(&self) -> PathBuf {
        if let Some(rest) = self.chunks_path.strip_prefix("~/") {
            if let Some(dirs) = BaseDirs::new() {
                return dirs.home_dir().join(rest);
            }
        }
        PathBuf::from(&self.chunks_path)
    }
}
