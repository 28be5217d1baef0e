//! Caller-facing error payloads
//!
//! Every failure crossing the HTTP boundary is rendered as
//! `{"error":{"type":"...","message":"...","request_id":"req_..."}}`.
//! Diagnostic detail (provider messages, raw model output, which credential
//! failed) is logged by the pipeline and never placed in the payload.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use credential_pool::GenerationError;
use review::ReviewError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("Connection to the model failed. Check API key status.")]
    GenerationFailed,

    #[error("Service temporarily saturated, retry shortly.")]
    Saturated,

    #[error("AI response format error. Try again.")]
    FormatError,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::GenerationFailed => StatusCode::BAD_GATEWAY,
            ApiError::Saturated => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::FormatError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Error `type` field and metrics label.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::InvalidRequest(_) => "invalid_request",
            ApiError::GenerationFailed => "generation_failed",
            ApiError::Saturated => "service_saturated",
            ApiError::FormatError => "format_error",
        }
    }

    /// Render the JSON error payload tagged with `request_id`.
    pub fn into_response_for(self, request_id: &str) -> Response {
        let body = serde_json::json!({
            "error": {
                "type": self.kind(),
                "message": self.to_string(),
                "request_id": request_id,
            }
        });
        (
            self.status(),
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}

impl From<ReviewError> for ApiError {
    fn from(err: ReviewError) -> Self {
        match err {
            ReviewError::InvalidInput(msg) => ApiError::InvalidRequest(msg),
            ReviewError::Generation(GenerationError::AllCredentialsExhausted { .. }) => {
                ApiError::Saturated
            }
            ReviewError::Generation(_) => ApiError::GenerationFailed,
            ReviewError::Extraction(_) => ApiError::FormatError,
        }
    }
}
