use thiserror::Error;

/// Errors raised while loading settings or parsing domain labels.
#[derive(Debug, Error)]
pub enum TourismError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// Label outside the five routing categories.
    #[error("Unknown intent: {0}")]
    UnknownIntent(String),

    #[error("Unknown verdict: {0}")]
    UnknownVerdict(String),
}
