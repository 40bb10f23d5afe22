use thiserror::Error;

/// Everything that can go wrong while reading, changing or syncing quotes.
#[derive(Error, Debug)]
pub enum QuoteError {
    #[error("failed to parse quotes: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("please enter both a quote and a category ({field} is empty).")]
    Validation { field: &'static str },

    #[error("request to quote server failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}
