//! Resilient generation: one attempt per credential, rotating on capacity failures
//!
//! Attempts start from wherever the shared cursor sits at call time; the cursor
//! is never reset, so consecutive calls continue the rotation. There is no delay
//! between attempts since each key has its own quota.
//!
//! The whole call is an ordinary future. Dropping it (for example when the HTTP
//! client disconnects) drops the in-flight remote request with it.

use std::sync::Arc;
use std::time::Duration;

use provider::{ErrorClassification, ProviderError, TextGenerator};
use tracing::{debug, error, info, warn};

use crate::error::GenerationError;
use crate::pool::{Credential, CredentialRotator};
use crate::quota::classify_error;

/// Runs prompts against a `TextGenerator`, failing over across a credential pool.
pub struct ResilientGenerator {
    rotator: Arc<CredentialRotator>,
    backend: Arc<dyn TextGenerator>,
    attempt_timeout: Duration,
}

impl ResilientGenerator {
    pub fn new(
        rotator: Arc<CredentialRotator>,
        backend: Arc<dyn TextGenerator>,
        attempt_timeout: Duration,
    ) -> Self {
        Self {
            rotator,
            backend,
            attempt_timeout,
        }
    }

    /// Generate a completion for `prompt` with `model_id`.
    ///
    /// Makes at most one attempt per pool entry. Capacity failures rotate and
    /// continue; the first non-capacity failure is returned unchanged as
    /// `Fatal` without rotating. If every attempt hits capacity, returns
    /// `AllCredentialsExhausted`, leaving the cursor where the last rotation put it.
    pub async fn generate(&self, prompt: &str, model_id: &str) -> Result<String, GenerationError> {
        let attempts = self.rotator.len();

        for attempt in 1..=attempts {
            let credential = self.rotator.current()?;
            debug!(
                backend = self.backend.id(),
                credential = credential.label.as_str(),
                attempt,
                "generation attempt"
            );

            let err = match self.attempt(&credential, prompt, model_id).await {
                Ok(text) => {
                    record_attempt("success");
                    info!(
                        credential = credential.label.as_str(),
                        attempt,
                        chars = text.len(),
                        "generation succeeded"
                    );
                    return Ok(text);
                }
                Err(e) => e,
            };

            match classify(&err) {
                ErrorClassification::Capacity => {
                    record_attempt(ErrorClassification::Capacity.label());
                    warn!(
                        credential = credential.label.as_str(),
                        attempt,
                        error = %err,
                        "capacity failure, rotating credential"
                    );
                    self.rotator.rotate()?;
                    metrics::counter!("credential_rotations_total").increment(1);
                }
                ErrorClassification::Fatal => {
                    record_attempt(ErrorClassification::Fatal.label());
                    error!(
                        credential = credential.label.as_str(),
                        attempt,
                        error = %err,
                        "generation failed"
                    );
                    return Err(GenerationError::Fatal(err));
                }
            }
        }

        warn!(attempts, "all credentials exhausted by capacity failures");
        Err(GenerationError::AllCredentialsExhausted { attempts })
    }

    /// One bounded call against one credential. A response without usable
    /// text is an `EmptyResponse` failure.
    async fn attempt(
        &self,
        credential: &Credential,
        prompt: &str,
        model_id: &str,
    ) -> Result<String, ProviderError> {
        let call = self.backend.generate(model_id, &credential.key, prompt);
        match tokio::time::timeout(self.attempt_timeout, call).await {
            Ok(Ok(Some(text))) if !text.trim().is_empty() => Ok(text),
            Ok(Ok(_)) => Err(ProviderError::EmptyResponse),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(ProviderError::Timeout(self.attempt_timeout)),
        }
    }
}

/// Timeouts are fatal whatever the configured duration renders as; everything
/// else goes through the status-marker heuristic.
fn classify(err: &ProviderError) -> ErrorClassification {
    match err {
        ProviderError::Timeout(_) => ErrorClassification::Fatal,
        other => classify_error(&other.to_string()),
    }
}

fn record_attempt(outcome: &'static str) {
    metrics::counter!("generation_attempts_total", "outcome" => outcome).increment(1);
}
