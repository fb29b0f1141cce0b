//! Chat route — one conversational turn per request.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::routes::error_response;
use crate::state::AppState;
use docsage_agent::ChatTurnRequest;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/chat", post(chat))
}

/// POST /api/chat — run one turn and return the answer with its sources.
async fn chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatTurnRequest>,
) -> impl IntoResponse {
    match state.orchestrator.run_turn(&req).await {
        Ok(outcome) => (StatusCode::OK, Json(serde_json::to_value(outcome).unwrap())),
        Err(e) => {
            let (status, body) = error_response(e);
            (status, body)
        }
    }
}
