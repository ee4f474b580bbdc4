//! Stub inference server for local runs and tests
//!
//! Answers the two endpoints the prober uses with canned responses whose
//! outcome can be changed while the server is running.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde_json::json;
use tokio::sync::RwLock;

/// Adjustable behavior of the stub server
#[derive(Debug, Clone)]
pub struct StubBehavior {
    pub health_status: u16,
    pub models_status: u16,
    pub models: Vec<String>,
}

impl StubBehavior {
    /// Healthy server serving exactly `model_name`
    pub fn serving(model_name: impl Into<String>) -> Self {
        Self {
            health_status: 200,
            models_status: 200,
            models: vec![model_name.into()],
        }
    }
}

pub type StubHandle = Arc<RwLock<StubBehavior>>;

pub fn build_router(behavior: StubHandle) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/v1/models", get(models_handler))
        .fallback(|| async { StatusCode::NOT_FOUND })
        .with_state(behavior)
}

fn status_code(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

async fn health_handler(State(behavior): State<StubHandle>) -> Response {
    let code = status_code(behavior.read().await.health_status);
    if code.is_success() {
        (code, axum::Json(json!({"status": "healthy"}))).into_response()
    } else {
        code.into_response()
    }
}

async fn models_handler(State(behavior): State<StubHandle>) -> Response {
    let behavior = behavior.read().await;
    let code = status_code(behavior.models_status);
    if !code.is_success() {
        return code.into_response();
    }

    let data: Vec<_> = behavior
        .models
        .iter()
        .map(|id| {
            json!({
                "id": id,
                "object": "model",
                "owned_by": "vllm",
                "max_model_len": 4096,
                "permission": [{
                    "object": "model_permission",
                    "allow_create_engine": false,
                    "allow_sampling": true,
                    "allow_logprobs": false,
                    "allow_fine_tuning": true
                }]
            })
        })
        .collect();

    (code, axum::Json(json!({"object": "list", "data": data}))).into_response()
}
