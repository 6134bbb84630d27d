use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use fundigest_core::{parse_write_body, DigestRecord};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::db::DigestRepository;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub digests: DigestRepository,
}

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
}

fn error_response(status: StatusCode, error: &'static str) -> Response {
    (status, Json(ErrorBody { error })).into_response()
}

/// Builds the router with all digest routes.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/api/digest",
            get(read_digest).post(write_digest).put(write_digest),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Latest stored digest, or the placeholder record when nothing is stored.
async fn read_digest(State(state): State<AppState>) -> Response {
    match state.digests.latest().await {
        Ok(Some(record)) => Json(record).into_response(),
        Ok(None) => Json(DigestRecord::placeholder()).into_response(),
        Err(e) => {
            tracing::error!("Failed to read digest: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to read digest")
        }
    }
}

async fn write_digest(State(state): State<AppState>, body: Bytes) -> Response {
    let parsed = serde_json::from_slice(&body)
        .map_err(|e| e.to_string())
        .and_then(|value| parse_write_body(value).map_err(|e| e.to_string()));

    let (data, run_id) = match parsed {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!("Rejected digest payload: {}", e);
            return error_response(StatusCode::BAD_REQUEST, "Invalid digest payload");
        }
    };

    match state.digests.save(&data, run_id.as_deref()).await {
        Ok(record) => Json(record).into_response(),
        Err(e) => {
            tracing::error!("Failed to write digest: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to write digest")
        }
    }
}
