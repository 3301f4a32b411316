//! REST API Server for the orchestrator
//!
//! One request/response endpoint in front of the pipeline, plus liveness probes.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::error::OrchestrationError;
use crate::models::{OrchestrateRequest, OrchestrateResponse};
use crate::pipeline::Pipeline;

/// =============================
/// Error Body
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(message: String) -> Self {
        Self {
            error: message,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub pipeline: Arc<Pipeline>,
}

/// =============================
/// Health Endpoints
/// =============================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn ping() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "msg": "orchestrator up" }))
}

/// =============================
/// Orchestration Endpoint
/// =============================

async fn orchestrate(
    State(state): State<ApiState>,
    Json(req): Json<OrchestrateRequest>,
) -> Response {
    let question = req.question.trim();
    if question.is_empty() {
        warn!("Rejected orchestrate request with blank question");
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(
                OrchestrationError::InvalidRequest("question must not be empty".to_string())
                    .to_string(),
            )),
        )
            .into_response();
    }

    info!("Received orchestrate request: {}", question);

    let run = state.pipeline.run(question).await;
    info!(run_id = %run.run_id, elapsed_ms = run.elapsed_ms, "Orchestrate request answered");

    (
        StatusCode::OK,
        Json(OrchestrateResponse {
            answer: run.into_answer(),
        }),
    )
        .into_response()
}

/// =============================
/// Router
/// =============================

pub fn create_router(pipeline: Arc<Pipeline>) -> Router {
    let state = ApiState { pipeline };

    Router::new()
        .route("/health", get(health))
        .route("/ping", get(ping))
        .route("/orchestrate", post(orchestrate))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(pipeline: Arc<Pipeline>, port: u16) -> crate::Result<()> {
    let router = create_router(pipeline);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router)
        .await
        .map_err(|e| OrchestrationError::Server(e.to_string()))?;

    Ok(())
}
