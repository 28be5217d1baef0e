//! Error types for pool and generation operations

use provider::ProviderError;

/// Errors from rotator construction and access.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no credentials configured")]
    NoCredentialsConfigured,

    #[error("credential pool is empty")]
    EmptyPool,
}

/// Result alias for pool operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Terminal outcome of a failed `ResilientGenerator::generate` call.
///
/// Capacity failures never appear here individually: they are absorbed by
/// rotation until the pool is exhausted.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// Non-capacity error from the remote capability, passed through unchanged.
    #[error("generation failed: {0}")]
    Fatal(#[source] ProviderError),

    #[error("all {attempts} credentials exhausted by capacity failures")]
    AllCredentialsExhausted { attempts: usize },

    #[error(transparent)]
    Pool(#[from] Error),
}
