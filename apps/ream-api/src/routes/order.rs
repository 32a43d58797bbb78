//! `/api/Order` routes.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::Deserialize;

use crate::dto::{OrderCreateModel, OrderDto};
use crate::error::ApiResult;
use crate::routes::{AppJson, AppPath, AppQuery};
use crate::AppState;
use ream_core::OrderStatus;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/Order", post(create_order))
        .route("/api/Order/status", patch(update_status_many))
        .route("/api/Order/{id}", get(get_order))
        .route("/api/Order/{id}/status", patch(update_status_one))
}

async fn create_order(
    State(state): State<AppState>,
    AppJson(model): AppJson<OrderCreateModel>,
) -> ApiResult<impl IntoResponse> {
    let order = state
        .orders()
        .create(model.customer_id, &model.order_entries)
        .await?;

    let location = format!("/api/Order/{}", order.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(OrderDto::from(order)),
    ))
}

async fn get_order(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> ApiResult<Json<OrderDto>> {
    let order = state.orders().get(id).await?;
    Ok(Json(OrderDto::from(order)))
}

#[derive(Debug, Deserialize)]
struct StatusParams {
    status: String,
}

impl StatusParams {
    fn status(&self) -> ApiResult<OrderStatus> {
        Ok(self.status.parse::<OrderStatus>()?)
    }
}

async fn update_status_many(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<StatusParams>,
    AppJson(ids): AppJson<Vec<i64>>,
) -> ApiResult<StatusCode> {
    state.orders().update_status(&ids, params.status()?).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn update_status_one(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
    AppQuery(params): AppQuery<StatusParams>,
) -> ApiResult<StatusCode> {
    state.orders().update_status_one(id, params.status()?).await?;
    Ok(StatusCode::NO_CONTENT)
}
