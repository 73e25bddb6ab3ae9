use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::classify::{AnalysisRecord, BatchStats, Pipeline, BATCH_LIMIT};

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/analyze", post(analyze))
        // Legacy route kept for older clients; same handler.
        .route("/classify_sms", post(analyze))
        .route("/batch_classify", post(batch_classify))
        .route("/models", get(list_models))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(serde::Deserialize)]
struct AnalyzeReq {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    sender: Option<String>,
}

#[derive(serde::Deserialize)]
struct BatchReq {
    #[serde(default)]
    messages: Option<Vec<AnalyzeReq>>,
}

#[derive(serde::Serialize)]
struct BatchResp {
    results: Vec<AnalysisRecord>,
    total_processed: usize,
    stats: BatchStats,
}

fn bad_request(msg: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response()
}

async fn analyze(State(state): State<AppState>, Json(body): Json<AnalyzeReq>) -> Response {
    let message = body.message.as_deref().map(str::trim).unwrap_or("");
    if message.is_empty() {
        return bad_request("Missing 'message' field");
    }
    let sender = body.sender.as_deref().unwrap_or("Unknown");

    let record = state.pipeline.analyze(message, sender).await;
    Json(record).into_response()
}

async fn batch_classify(State(state): State<AppState>, Json(body): Json<BatchReq>) -> Response {
    let Some(messages) = body.messages.filter(|m| !m.is_empty()) else {
        return bad_request("Missing or invalid 'messages' array");
    };

    let items: Vec<(String, String)> = messages
        .into_iter()
        .take(BATCH_LIMIT)
        .map(|m| {
            (
                m.message.unwrap_or_default(),
                m.sender.unwrap_or_else(|| "Unknown".to_string()),
            )
        })
        .collect();

    let (results, stats) = state.pipeline.batch(&items).await;
    Json(BatchResp {
        total_processed: results.len(),
        results,
        stats,
    })
    .into_response()
}

/// Reachability probe against the inference endpoint with round-trip timing.
async fn health(State(state): State<AppState>) -> Response {
    let inference = state.pipeline.inference();
    let started = Instant::now();
    let reachable = inference.list_models().await.is_ok();
    let round_trip_ms = started.elapsed().as_millis() as u64;

    Json(json!({
        "status": "healthy",
        "model": inference.model_name(),
        "ollama_reachable": reachable,
        "round_trip_ms": round_trip_ms,
        "timestamp": Utc::now().to_rfc3339(),
    }))
    .into_response()
}

/// Model names installed on the inference endpoint. Degrades to an empty
/// list with an error note rather than failing the request.
async fn list_models(State(state): State<AppState>) -> Response {
    match state.pipeline.inference().list_models().await {
        Ok(models) => Json(json!({ "models": models })).into_response(),
        Err(e) => Json(json!({ "models": [], "error": e.to_string() })).into_response(),
    }
}
