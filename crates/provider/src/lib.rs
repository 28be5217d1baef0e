//! Remote text-generation capability
//!
//! Defines the `TextGenerator` trait that decouples the review pipeline from the
//! model vendor. The pipeline only needs "given a model, a credential and a
//! prompt, return text or fail"; `GeminiGenerator` implements that over the
//! Generative Language REST API.

pub mod gemini;

pub use gemini::{DEFAULT_BASE_URL, GeminiGenerator};

use common::Secret;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Classification of generation failures, driving the rotate-or-stop decision.
///
/// - Capacity: the credential's quota or the service's load is exhausted,
///   rotate to the next credential and retry immediately
/// - Fatal: anything else, surface to the caller without retrying
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClassification {
    Capacity,
    Fatal,
}

impl ErrorClassification {
    /// Label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            ErrorClassification::Capacity => "capacity",
            ErrorClassification::Fatal => "fatal",
        }
    }
}

/// Errors raised by a single generation attempt.
///
/// The Display output is what the capacity classifier inspects, so upstream
/// errors always render their numeric HTTP status.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("upstream returned {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid response body: {0}")]
    InvalidResponse(String),

    #[error("empty response")]
    EmptyResponse,

    #[error("generation timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
}

/// Result alias for provider operations.
pub type Result<T> = std::result::Result<T, ProviderError>;

/// A remote model that turns a prompt into a text completion.
///
/// `Ok(None)` means the remote answered but the answer carried no usable text
/// (no candidates, blocked prompt, empty parts).
///
/// Uses `Pin<Box<dyn Future>>` return types for dyn-compatibility (`Arc<dyn TextGenerator>`).
pub trait TextGenerator: Send + Sync {
    /// Identifier for logging (e.g. "gemini")
    fn id(&self) -> &str;

    fn generate<'a>(
        &'a self,
        model_id: &'a str,
        credential: &'a Secret<String>,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<String>>> + Send + 'a>>;
}
