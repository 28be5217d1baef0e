//! Review pipeline errors

use credential_pool::GenerationError;

/// The model's text could not be parsed into a `ReviewResult`.
///
/// Display stays generic; `raw` is kept for diagnostic logging only and must
/// not be echoed to callers.
#[derive(Debug, thiserror::Error)]
#[error("invalid format")]
pub struct ExtractionError {
    pub raw: String,
    #[source]
    pub source: serde_json::Error,
}

/// Errors from `Reviewer::review`.
#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("response format error: {0}")]
    Extraction(#[from] ExtractionError),
}

/// Result alias for review operations.
pub type Result<T> = std::result::Result<T, ReviewError>;
