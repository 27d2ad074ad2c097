//! HTTP 服务：远端 Agent 端点
//!
//! - `POST /agent`：AgentRequest → AgentResponse；失败返回 500 与 `{error, message}`
//! - `GET /health`：`{status: "ok"}`

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use crate::agent::RemoteAgent;
use crate::core::AgentError;
use crate::protocol::{AgentRequest, AgentResponse};

pub struct ServerState {
    pub agent: RemoteAgent,
}

pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/agent", post(handle_agent))
        .route("/health", get(health))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

fn error_kind(e: &AgentError) -> &'static str {
    match e {
        AgentError::LlmError(_) => "llm_error",
        AgentError::Decode(_) => "decode_error",
        AgentError::NetworkFailure(_) => "network_failure",
        _ => "internal_error",
    }
}

async fn handle_agent(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<AgentRequest>,
) -> Result<Json<AgentResponse>, (StatusCode, Json<Value>)> {
    tracing::info!(
        input_chars = request.input.len(),
        markers = request.context.markers.len(),
        "agent request"
    );
    let result = state.agent.respond(request).await;
    if let Some((prompt, completion, total)) = state.agent.token_usage() {
        tracing::info!(prompt, completion, total, "token usage");
    }
    match result {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            tracing::warn!(error = %e, "agent request failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": error_kind(&e), "message": e.to_string() })),
            ))
        }
    }
}
