//! Code Review Service
//!
//! Single-binary Rust service that:
//! 1. Loads a pool of model API keys from the environment / key files
//! 2. Accepts code snippets on `POST /review`
//! 3. Sends an audit prompt to the model, rotating keys on rate limits
//! 4. Returns the structured verdict (optimized code, score, findings)

mod api;
mod config;
mod error;
mod metrics;

use anyhow::{Context, Result};
use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use credential_pool::{CredentialRotator, ResilientGenerator};
use provider::{GeminiGenerator, TextGenerator};
use review::Reviewer;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use metrics_exporter_prometheus::PrometheusHandle;

use crate::api::ApiState;
use crate::config::Config;

/// How long in-flight reviews get to finish after a shutdown signal
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared application state accessible from all handlers
#[derive(Clone)]
struct AppState {
    api: ApiState,
    rotator: Arc<CredentialRotator>,
    started_at: Instant,
    prometheus: PrometheusHandle,
}

/// Build the axum router with all routes and shared state.
///
/// Applies a concurrency limit layer based on `max_connections`.
fn build_router(state: AppState, max_connections: usize) -> Router {
    Router::new()
        .route("/review", post(review_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .layer(tower::limit::ConcurrencyLimitLayer::new(max_connections))
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and LOG_LEVEL / RUST_LOG support
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("starting code-review-service");

    // Install Prometheus metrics recorder before any metrics are emitted
    let prometheus_handle =
        metrics::install_recorder().context("failed to install Prometheus recorder")?;

    // CLI: simple --config flag parsing
    let args: Vec<String> = std::env::args().collect();
    let cli_config_path = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str());

    let config_path = Config::resolve_path(cli_config_path);
    info!(path = %config_path.display(), "loading configuration");

    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    let credentials = config
        .credentials
        .resolve()
        .context("failed to resolve credentials")?;
    let rotator = Arc::new(CredentialRotator::new(credentials).with_context(|| {
        format!(
            "no API keys found; set one of {:?} or configure credentials.key_files",
            config.credentials.env
        )
    })?);

    info!(
        listen_addr = %config.server.listen_addr,
        model_id = %config.model.model_id,
        base_url = %config.model.base_url,
        credentials = rotator.len(),
        timeout_secs = config.server.timeout_secs,
        "configuration loaded"
    );

    let backend: Arc<dyn TextGenerator> = Arc::new(GeminiGenerator::new(
        reqwest::Client::new(),
        config.model.base_url.clone(),
    ));
    let generator = ResilientGenerator::new(
        Arc::clone(&rotator),
        backend,
        Duration::from_secs(config.server.timeout_secs),
    );
    let reviewer = Arc::new(Reviewer::new(generator, config.model.model_id.clone()));

    let app_state = AppState {
        api: ApiState {
            reviewer,
            requests_total: Arc::new(AtomicU64::new(0)),
            errors_total: Arc::new(AtomicU64::new(0)),
        },
        rotator,
        started_at: Instant::now(),
        prometheus: prometheus_handle,
    };

    let app = build_router(app_state, config.server.max_connections);

    let listen_addr = config.server.listen_addr;
    let listener = TcpListener::bind(listen_addr)
        .await
        .with_context(|| format!("failed to bind to {listen_addr}"))?;
    info!(addr = %listen_addr, "accepting requests");

    // The drain timeout starts when the shutdown signal fires: notify the server
    // to drain, then race the drain against the timeout.
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
    });

    shutdown_signal().await;
    let _ = shutdown_tx.send(());

    match tokio::time::timeout(DRAIN_TIMEOUT, server_handle).await {
        Ok(Ok(Ok(()))) => {
            info!("all in-flight requests drained");
        }
        Ok(Ok(Err(e))) => {
            error!(error = %e, "server error during shutdown");
        }
        Ok(Err(e)) => {
            error!(error = %e, "server task panicked");
        }
        Err(_) => {
            warn!(
                drain_timeout_secs = DRAIN_TIMEOUT.as_secs(),
                "drain timeout exceeded, forcing shutdown"
            );
        }
    }

    info!("shutdown complete");
    Ok(())
}

/// `POST /review`
async fn review_handler(State(state): State<AppState>, body: Bytes) -> Response {
    let request_id = format!("req_{}", uuid::Uuid::new_v4().as_simple());
    api::review_code(&state.api, body, request_id).await
}

/// Health endpoint: uptime, request counters and credential pool position.
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let uptime = state.started_at.elapsed().as_secs();
    let requests = state.api.requests_total.load(Ordering::Relaxed);
    let errors = state.api.errors_total.load(Ordering::Relaxed);
    let current = state
        .rotator
        .current()
        .map(|c| c.label)
        .unwrap_or_default();

    let body = serde_json::json!({
        "status": "healthy",
        "model_id": state.api.reviewer.model_id(),
        "uptime_seconds": uptime,
        "requests_served": requests,
        "errors_total": errors,
        "credentials": {
            "total": state.rotator.len(),
            "cursor": state.rotator.position(),
            "current": current,
            "labels": state.rotator.labels(),
        },
    });

    (
        axum::http::StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "application/json")],
        body.to_string(),
    )
}

/// Prometheus metrics endpoint, text exposition format
async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        axum::http::StatusCode::OK,
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        state.prometheus.render(),
    )
}

/// Wait for SIGTERM or SIGINT for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use common::Secret;
    use credential_pool::Credential;
    use tower::ServiceExt;

    const VALID_REVIEW: &str = r#"{"optimized_code":"x","quality_score":90,"errors":[],"inefficiencies":[],"security":[]}"#;

    /// Create a PrometheusHandle for tests without installing a global recorder.
    fn test_prometheus_handle() -> PrometheusHandle {
        let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
        recorder.handle()
    }

    /// Start a mock Gemini server. Requests carrying a key listed in
    /// `rate_limited_keys` get 429; everyone else gets `completion` as text.
    async fn start_mock_gemini(
        rate_limited_keys: &'static [&'static str],
        completion: &'static str,
    ) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let app = axum::Router::new().fallback(
                move |request: axum::http::Request<Body>| async move {
                    let key = request
                        .headers()
                        .get("x-goog-api-key")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("")
                        .to_string();
                    if rate_limited_keys.contains(&key.as_str()) {
                        return (
                            StatusCode::TOO_MANY_REQUESTS,
                            axum::Json(serde_json::json!({
                                "error": {
                                    "code": 429,
                                    "message": "Resource has been exhausted",
                                    "status": "RESOURCE_EXHAUSTED"
                                }
                            })),
                        );
                    }
                    (
                        StatusCode::OK,
                        axum::Json(serde_json::json!({
                            "candidates": [{"content": {"parts": [{"text": completion}]}}]
                        })),
                    )
                },
            );
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{addr}")
    }

    /// Build app state backed by a real Gemini client pointed at `base_url`.
    fn test_app_state(base_url: &str, keys: &[&str]) -> AppState {
        let rotator = Arc::new(
            CredentialRotator::new(
                keys.iter()
                    .map(|k| Credential::new(*k, Secret::new(k.to_string())))
                    .collect(),
            )
            .unwrap(),
        );
        let backend: Arc<dyn TextGenerator> =
            Arc::new(GeminiGenerator::new(reqwest::Client::new(), base_url));
        let generator =
            ResilientGenerator::new(Arc::clone(&rotator), backend, Duration::from_secs(5));

        AppState {
            api: ApiState {
                reviewer: Arc::new(Reviewer::new(generator, "gemini-test")),
                requests_total: Arc::new(AtomicU64::new(0)),
                errors_total: Arc::new(AtomicU64::new(0)),
            },
            rotator,
            started_at: Instant::now(),
            prometheus: test_prometheus_handle(),
        }
    }

    fn review_request(body: &str) -> Request<Body> {
        Request::builder()
            .uri("/review")
            .method("POST")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn review_rotates_past_rate_limited_keys() {
        let url = start_mock_gemini(&["A", "B"], VALID_REVIEW).await;
        let state = test_app_state(&url, &["A", "B", "C"]);
        let rotator = Arc::clone(&state.rotator);
        let app = build_router(state, 1000);

        let response = app
            .oneshot(review_request(r#"{"code":"let x = 1;","language":"Rust"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["quality_score"], 90);
        assert_eq!(json["optimized_code"], "x");
        assert_eq!(json["errors"].as_array().unwrap().len(), 0);
        assert_eq!(json["inefficiencies"].as_array().unwrap().len(), 0);
        assert_eq!(json["security"].as_array().unwrap().len(), 0);
        assert_eq!(rotator.position(), 2);
    }

    #[tokio::test]
    async fn review_extracts_fenced_completion() {
        let url = start_mock_gemini(
            &[],
            "```json\n{\"optimized_code\":\"y\",\"quality_score\":40,\"errors\":[\"bug\"],\"inefficiencies\":[],\"security\":[\"XSS\"]}\n```",
        )
        .await;
        let app = build_router(test_app_state(&url, &["A"]), 1000);

        let response = app
            .oneshot(review_request(r#"{"code":"document.write(input)"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["quality_score"], 40);
        assert_eq!(json["security"][0], "XSS");
    }

    #[tokio::test]
    async fn empty_code_returns_400_without_calling_model() {
        // Unreachable model: any remote call would surface as 502
        let app = build_router(test_app_state("http://127.0.0.1:1", &["A"]), 1000);

        let response = app
            .oneshot(review_request(r#"{"code":""}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert_eq!(json["error"]["type"], "invalid_request");
        assert_eq!(json["error"]["message"], "No code provided");
        assert!(
            json["error"]["request_id"]
                .as_str()
                .unwrap()
                .starts_with("req_")
        );
    }

    #[tokio::test]
    async fn malformed_body_returns_400() {
        let app = build_router(test_app_state("http://127.0.0.1:1", &["A"]), 1000);

        let response = app.oneshot(review_request("{not json")).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert_eq!(json["error"]["type"], "invalid_request");
        assert_eq!(json["error"]["message"], "No code provided");
    }

    #[tokio::test]
    async fn all_keys_rate_limited_returns_503() {
        let url = start_mock_gemini(&["A", "B"], VALID_REVIEW).await;
        let state = test_app_state(&url, &["A", "B"]);
        let rotator = Arc::clone(&state.rotator);
        let app = build_router(state, 1000);

        let response = app
            .oneshot(review_request(r#"{"code":"x"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let json = json_body(response).await;
        assert_eq!(json["error"]["type"], "service_saturated");
        assert_eq!(rotator.position(), 0);
    }

    #[tokio::test]
    async fn unreachable_model_returns_502() {
        let app = build_router(test_app_state("http://127.0.0.1:1", &["A", "B"]), 1000);

        let response = app
            .oneshot(review_request(r#"{"code":"x"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let json = json_body(response).await;
        assert_eq!(json["error"]["type"], "generation_failed");
    }

    #[tokio::test]
    async fn unparseable_completion_returns_500_without_raw_text() {
        let url = start_mock_gemini(&[], "I refuse to answer in JSON: secret-raw-output").await;
        let app = build_router(test_app_state(&url, &["A"]), 1000);

        let response = app
            .oneshot(review_request(r#"{"code":"x"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = json_body(response).await;
        assert_eq!(json["error"]["type"], "format_error");
        assert!(!json.to_string().contains("secret-raw-output"));
    }

    #[tokio::test]
    async fn health_reports_counters_and_pool() {
        let state = test_app_state("http://unused", &["A", "B", "C"]);
        state.api.requests_total.fetch_add(5, Ordering::Relaxed);
        state.rotator.rotate().unwrap();
        let app = build_router(state, 1000);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["model_id"], "gemini-test");
        assert_eq!(json["requests_served"], 5);
        assert!(json["uptime_seconds"].is_u64());
        assert_eq!(json["credentials"]["total"], 3);
        assert_eq!(json["credentials"]["cursor"], 1);
        assert_eq!(json["credentials"]["current"], "B");
        assert_eq!(json["credentials"]["labels"][2], "C");
    }

    #[tokio::test]
    async fn metrics_endpoint_returns_prometheus_format() {
        let app = build_router(test_app_state("http://unused", &["A"]), 1000);
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/metrics")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response
            .headers()
            .get("content-type")
            .unwrap()
            .to_str()
            .unwrap();
        assert!(content_type.contains("text/plain"));
    }

    #[tokio::test]
    async fn review_route_rejects_get() {
        let app = build_router(test_app_state("http://unused", &["A"]), 1000);
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/review")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
