//! Local cache of sentence-transformer files fetched from HuggingFace Hub.

use std::path::PathBuf;

use directories::ProjectDirs;
use tracing::{debug, info};

use crate::error::EmbeddingError;

/// Model the hybrid similarity threshold is calibrated against.
pub const DEFAULT_MODEL_REPO: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Files needed to run a BERT-style encoder.
pub const MODEL_FILES: &[&str] = &["config.json", "tokenizer.json", "model.safetensors"];

#[derive(Debug, Clone)]
pub struct ModelCache {
    pub cache_dir: PathBuf,
    pub repo_id: String,
}

impl Default for ModelCache {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            repo_id: DEFAULT_MODEL_REPO.to_string(),
        }
    }
}

/// `<cache dir>/tourism-rag/models`, or `./.cache/models` without a home.
pub fn default_cache_dir() -> PathBuf {
    ProjectDirs::from("", "", "tourism-rag")
        .map(|p| p.cache_dir().join("models"))
        .unwrap_or_else(|| PathBuf::from(".cache").join("models"))
}

impl ModelCache {
    pub fn new(cache_dir: impl Into<PathBuf>, repo_id: impl Into<String>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            repo_id: repo_id.into(),
        }
    }

    /// One directory per repository, `/` flattened to `_`.
    pub fn model_dir(&self) -> PathBuf {
        self.cache_dir.join(self.repo_id.replace('/', "_"))
    }

    pub fn is_cached(&self) -> bool {
        let dir = self.model_dir();
        MODEL_FILES.iter().all(|f| dir.join(f).exists())
    }

    pub fn paths(&self) -> ModelPaths {
        let dir = self.model_dir();
        ModelPaths {
            config: dir.join("config.json"),
            tokenizer: dir.join("tokenizer.json"),
            weights: dir.join("model.safetensors"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelPaths {
    pub config: PathBuf,
    pub tokenizer: PathBuf,
    pub weights: PathBuf,
}

/// Return cached model files, downloading whatever is missing.
pub fn get_or_download_model(cache: &ModelCache) -> Result<ModelPaths, EmbeddingError> {
    if cache.is_cached() {
        debug!(path = ?cache.model_dir(), "Using cached embedding model");
    } else {
        info!(repo = %cache.repo_id, "Downloading embedding model");
        download_model_files(cache)?;
    }
    Ok(cache.paths())
}

fn download_model_files(cache: &ModelCache) -> Result<(), EmbeddingError> {
    use hf_hub::api::sync::Api;

    let api = Api::new().map_err(|e| EmbeddingError::Download(e.to_string()))?;
    let repo = api.model(cache.repo_id.clone());
    let dir = cache.model_dir();
    std::fs::create_dir_all(&dir)?;

    for filename in MODEL_FILES {
        let fetched = repo
            .get(filename)
            .map_err(|e| EmbeddingError::Download(format!("{filename}: {e}")))?;
        let dest = dir.join(filename);
        std::fs::copy(&fetched, &dest)?;
        debug!(file = filename, dest = ?dest, "Cached model file");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_points_at_minilm() {
        let cache = ModelCache::default();
        assert_eq!(cache.repo_id, DEFAULT_MODEL_REPO);
        assert!(cache.cache_dir.ends_with("models"));
    }

    #[test]
    fn test_model_dir_flattens_repo() {
        let cache = ModelCache::new("/tmp/models", "sentence-transformers/all-MiniLM-L6-v2");
        assert_eq!(
            cache.model_dir(),
            PathBuf::from("/tmp/models/sentence-transformers_all-MiniLM-L6-v2")
        );
        assert_eq!(
            cache.paths().weights,
            PathBuf::from("/tmp/models/sentence-transformers_all-MiniLM-L6-v2/model.safetensors")
        );
    }

    #[test]
    fn test_is_cached_needs_every_file() {
        let temp = TempDir::new().unwrap();
        let cache = ModelCache::new(temp.path(), "org/encoder");
        assert!(!cache.is_cached());

        std::fs::create_dir_all(cache.model_dir()).unwrap();
        std::fs::write(cache.paths().config, "{}").unwrap();
        std::fs::write(cache.paths().tokenizer, "{}").unwrap();
        assert!(!cache.is_cached());

        std::fs::write(cache.paths().weights, b"").unwrap();
        assert!(cache.is_cached());
    }
}
