use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

use crate::error::problem_response;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

async fn health(State(state): State<AppState>) -> Response {
    if state.health().is_healthy().await {
        Json(json!({ "status": "ok" })).into_response()
    } else {
        problem_response(StatusCode::SERVICE_UNAVAILABLE, "Database unavailable")
    }
}
