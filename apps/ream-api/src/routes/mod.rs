//! # HTTP Routes
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  GET    /api/Paper                       catalog page                   │
//! │  POST   /api/Paper                       create papers          201     │
//! │  GET    /api/Paper/property              properties + counts            │
//! │  POST   /api/Paper/property              create property        201     │
//! │  PATCH  /api/Paper/discontinue           bulk discontinue       204     │
//! │  PATCH  /api/Paper/{id}/discontinue      discontinue one        204     │
//! │  PATCH  /api/Paper/restock               bulk restock           204     │
//! │  PATCH  /api/Paper/{id}/restock          restock one            204     │
//! │                                                                         │
//! │  POST   /api/Order                       create order           201     │
//! │  GET    /api/Order/{id}                  one order                      │
//! │  PATCH  /api/Order/status                bulk status            204     │
//! │  PATCH  /api/Order/{id}/status           status of one          204     │
//! │                                                                         │
//! │  GET    /api/Customer                    customers (+orders)            │
//! │  GET    /api/Customer/{id}               one customer (+orders)         │
//! │  GET    /api/Customer/{id}/Orders        paged orders                   │
//! │                                                                         │
//! │  GET    /health                          store liveness                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Malformed bodies, queries and paths are rejected through [`AppJson`],
//! [`AppQuery`] and [`AppPath`], so every failure is a problem body.

pub mod customer;
pub mod health;
pub mod order;
pub mod paper;

use axum::extract::{FromRequest, FromRequestParts};
use axum::http::Uri;
use axum::Router;

use crate::error::ApiError;
use crate::AppState;

/// Builds the complete application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(paper::routes())
        .merge(order::routes())
        .merge(customer::routes())
        .merge(health::routes())
        .fallback(fallback)
        .with_state(state)
}

async fn fallback(uri: Uri) -> ApiError {
    ApiError::not_found(format!("No route for {}", uri.path()))
}

/// JSON body extractor whose rejection is a problem body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);

/// Query string extractor whose rejection is a problem body.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct AppQuery<T>(pub T);

/// Path extractor whose rejection is a problem body.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct AppPath<T>(pub T);
