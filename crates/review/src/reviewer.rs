//! The `review` operation: validate, prompt, generate, extract

use credential_pool::ResilientGenerator;
use tracing::{info, instrument, warn};

use crate::error::{Result, ReviewError};
use crate::extract::extract;
use crate::prompt::{DEFAULT_LANGUAGE, build_review_prompt};
use crate::types::ReviewResult;

/// Reviews code snippets with a fixed model through a resilient generator.
pub struct Reviewer {
    generator: ResilientGenerator,
    model_id: String,
}

impl Reviewer {
    pub fn new(generator: ResilientGenerator, model_id: impl Into<String>) -> Self {
        Self {
            generator,
            model_id: model_id.into(),
        }
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// Review `code`, optionally hinting its `language` (defaults to "Auto-detect").
    ///
    /// Empty or whitespace-only code is rejected before any remote call. When the
    /// model's output cannot be parsed, the raw text is logged and a generic
    /// `Extraction` error is returned.
    #[instrument(skip_all, fields(model_id = %self.model_id, code_len = code.len()))]
    pub async fn review(&self, code: &str, language: Option<&str>) -> Result<ReviewResult> {
        if code.trim().is_empty() {
            return Err(ReviewError::InvalidInput("No code provided".into()));
        }
        let language = language
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(DEFAULT_LANGUAGE);

        let prompt = build_review_prompt(code, language);
        let raw = self.generator.generate(&prompt, &self.model_id).await?;

        match extract(&raw) {
            Ok(result) => {
                info!(
                    language,
                    quality_score = result.quality_score,
                    findings = result.finding_count(),
                    "review completed"
                );
                Ok(result)
            }
            Err(e) => {
                warn!(
                    raw = %e.raw,
                    error = %e.source,
                    "model output was not a valid review object"
                );
                Err(e.into())
            }
        }
    }
}
