//! `/api/Customer` routes.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use crate::dto::{CustomerDto, OrderDto, PagedResponse};
use crate::error::ApiResult;
use crate::routes::{AppPath, AppQuery};
use crate::AppState;
use ream_core::validation::{validate_page, validate_page_size};
use ream_core::DEFAULT_PAGE_SIZE;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/Customer", get(list_customers))
        .route("/api/Customer/{id}", get(get_customer))
        .route("/api/Customer/{id}/Orders", get(customer_orders))
}

#[derive(Debug, Default, Deserialize)]
struct HistoryParams {
    #[serde(default)]
    orders: bool,
}

async fn list_customers(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<HistoryParams>,
) -> ApiResult<Json<Vec<CustomerDto>>> {
    let customers = state.customers().list(params.orders).await?;
    Ok(Json(
        customers
            .into_iter()
            .map(|(customer, orders)| CustomerDto::new(customer, orders))
            .collect(),
    ))
}

async fn get_customer(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
    AppQuery(params): AppQuery<HistoryParams>,
) -> ApiResult<Json<CustomerDto>> {
    let (customer, orders) = state.customers().get(id, params.orders).await?;
    Ok(Json(CustomerDto::new(customer, orders)))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageParams {
    page: Option<i64>,
    page_size: Option<i64>,
}

async fn customer_orders(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
    AppQuery(params): AppQuery<PageParams>,
) -> ApiResult<Json<PagedResponse<OrderDto>>> {
    let page = validate_page(params.page.unwrap_or(1))?;
    let page_size = validate_page_size(params.page_size.unwrap_or(i64::from(DEFAULT_PAGE_SIZE)))?;

    let orders = state.customers().orders_page(id, page, page_size).await?;
    Ok(Json(PagedResponse::from_page(orders, page_size, page)))
}
