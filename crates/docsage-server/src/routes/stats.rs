//! Stats route — corpus and session counters.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::routes::error_response;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/stats", get(get_stats))
}

/// GET /api/stats — storage statistics.
async fn get_stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.store.get_stats() {
        Ok(stats) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "documents": stats.total_documents,
                "chunks": stats.total_chunks,
                "embeddings": stats.embeddings_stored,
                "embedding_dimension": stats.embedding_dimension,
                "sessions": stats.sessions,
                "turns": stats.turns,
                "db_size_mb": stats.db_size_mb,
                "matrix_loaded": stats.matrix_loaded,
                "matrix_rows": stats.matrix_rows,
            })),
        ),
        Err(e) => {
            let (status, body) = error_response(e);
            (status, body)
        }
    }
}
