//! Review endpoint logic
//!
//! Parses the inbound JSON, runs the review pipeline and renders either the
//! `ReviewResult` or a structured error payload. Client disconnects drop this
//! future, which drops the in-flight generation call with it.

use crate::error::ApiError;
use axum::body::Bytes;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use review::Reviewer;
use serde::Deserialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{info, instrument, warn};

/// Inbound review request. A missing `code` is treated as empty.
#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub language: Option<String>,
}

/// Shared state passed to the review handler via axum State extractor
#[derive(Clone)]
pub struct ApiState {
    pub reviewer: Arc<Reviewer>,
    pub requests_total: Arc<AtomicU64>,
    pub errors_total: Arc<AtomicU64>,
}

/// Handle one `POST /review` body.
#[instrument(skip_all, fields(request_id = %request_id, body_len = body.len()))]
pub async fn review_code(state: &ApiState, body: Bytes, request_id: String) -> Response {
    state.requests_total.fetch_add(1, Ordering::Relaxed);
    let started = Instant::now();

    let outcome = match serde_json::from_slice::<ReviewRequest>(&body) {
        Ok(request) => state
            .reviewer
            .review(&request.code, request.language.as_deref())
            .await
            .map_err(ApiError::from),
        Err(e) => {
            warn!(error = %e, "rejecting malformed review request body");
            Err(ApiError::InvalidRequest("No code provided".into()))
        }
    };

    let response = match outcome {
        Ok(result) => {
            info!(quality_score = result.quality_score, "review served");
            (StatusCode::OK, axum::Json(result)).into_response()
        }
        Err(err) => {
            state.errors_total.fetch_add(1, Ordering::Relaxed);
            crate::metrics::record_review_failure(err.kind());
            warn!(kind = err.kind(), "review failed");
            err.into_response_for(&request_id)
        }
    };

    crate::metrics::record_request(
        response.status().as_u16(),
        started.elapsed().as_secs_f64(),
    );
    response
}
