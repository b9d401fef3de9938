//! HTTP surface: `POST /fetch` and `GET /health`.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use fetcher_engine::{BatchError, BatchRunner, FetchRequest};
use fetcher_logging::fetcher_error;

use crate::config::ServiceConfig;

#[derive(Clone)]
struct AppState {
    runner: Arc<BatchRunner>,
}

pub fn build_router(config: &ServiceConfig) -> Router {
    let runner = BatchRunner::new(
        config.limits.clone(),
        config.fetch_settings(),
        config.allowed_content_keywords.clone(),
    );
    let state = AppState {
        runner: Arc::new(runner),
    };

    Router::new()
        .route("/health", get(health_handler))
        .route("/fetch", post(fetch_handler))
        .with_state(state)
}

/// Liveness probe; independent of the fetch pipeline.
async fn health_handler() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

/// Accepted batches answer 200 even when individual items failed; only a
/// malformed request or a systemic fault gets an error status.
async fn fetch_handler(
    State(state): State<AppState>,
    Json(request): Json<FetchRequest>,
) -> Response {
    match state.runner.run(&request).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(err) => BatchErrorResponse(err).into_response(),
    }
}

struct BatchErrorResponse(BatchError);

impl IntoResponse for BatchErrorResponse {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            BatchError::Request(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => {
                fetcher_error!("batch failed: {}", self.0);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(json!({"detail": self.0.to_string()}))).into_response()
    }
}
