//! Products route — distinct product tags for filter population.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::routes::error_response;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/products", get(list_products))
}

/// GET /api/products — distinct product tags, ascending.
async fn list_products(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.store.list_products() {
        Ok(products) => (
            StatusCode::OK,
            Json(serde_json::json!({ "products": products })),
        ),
        Err(e) => {
            let (status, body) = error_response(e);
            (status, body)
        }
    }
}
