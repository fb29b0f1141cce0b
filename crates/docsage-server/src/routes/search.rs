//! Debug search route — raw blended candidates, no answerer, no memory.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;

use crate::routes::error_response;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/search", post(search))
}

#[derive(Debug, Deserialize)]
struct SearchRequest {
    query: String,
    #[serde(default)]
    product: Option<String>,
    /// Override the configured final candidate count.
    #[serde(default)]
    k_final: Option<usize>,
}

/// POST /api/search — inspect the hybrid ranking for a query.
async fn search(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SearchRequest>,
) -> impl IntoResponse {
    let result = state
        .ranker
        .retrieve(&req.query, req.product.as_deref(), None, req.k_final)
        .await;

    match result {
        Ok(candidates) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "query": req.query,
                "total": candidates.len(),
                "results": candidates,
            })),
        ),
        Err(e) => {
            let (status, body) = error_response(e);
            (status, body)
        }
    }
}
