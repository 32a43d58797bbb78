//! # API Errors
//!
//! Every failure leaves the service as a problem-details body.
//!
//! ## Status Mapping
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ApiError::Core(e)          e.kind()                                    │
//! │     ├── InvalidArgument ───────────────────────────────► 400            │
//! │     ├── NotFound        ───────────────────────────────► 404            │
//! │     └── Conflict        ───────────────────────────────► 409            │
//! │                                                                         │
//! │  ApiError::Persistence      unique violation ──────────► 400            │
//! │                             anything else ─────────────► 500 (logged)   │
//! │                                                                         │
//! │  ApiError::BadRequest       malformed body/query/path ─► 400            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Body
//! ```json
//! {
//!   "type": "https://tools.ietf.org/html/rfc9110#section-15.5.10",
//!   "title": "Conflict",
//!   "status": 409,
//!   "detail": "Insufficient stock for A4 Copy: available 3, requested 5"
//! }
//! ```

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::error;

use ream_core::{CoreError, ErrorKind};
use ream_db::{DbError, DbResult};

const PROBLEM_CONTENT_TYPE: &str = "application/problem+json";

/// API errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A domain rule rejected the request.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The store failed while performing `operation`.
    #[error("Persistence failure while {operation}: {source}")]
    Persistence {
        operation: &'static str,
        #[source]
        source: DbError,
    },

    /// The request could not be decoded.
    #[error("{0}")]
    BadRequest(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::Core(CoreError::not_found(message))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Core(e) => match e.kind() {
                ErrorKind::InvalidArgument => StatusCode::BAD_REQUEST,
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Conflict => StatusCode::CONFLICT,
            },
            ApiError::Persistence { source, .. } if source.is_unique_violation() => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Persistence { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Human-readable detail. Store internals never leave the process.
    fn detail(&self) -> String {
        match self {
            ApiError::Persistence { operation, source } if !source.is_unique_violation() => {
                format!("An unexpected error occurred while {operation}")
            }
            ApiError::Persistence { source, .. } => source.to_string(),
            other => other.to_string(),
        }
    }
}

/// Attaches the failing operation to a store error.
pub trait PersistenceContext<T> {
    fn with_operation(self, operation: &'static str) -> ApiResult<T>;
}

impl<T> PersistenceContext<T> for DbResult<T> {
    fn with_operation(self, operation: &'static str) -> ApiResult<T> {
        self.map_err(|source| ApiError::Persistence { operation, source })
    }
}

// =============================================================================
// Problem Details
// =============================================================================

/// RFC 9457 problem description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemDetails {
    #[serde(rename = "type")]
    pub problem_type: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
}

impl ProblemDetails {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        ProblemDetails {
            problem_type: problem_type(status).to_string(),
            title: status.canonical_reason().unwrap_or("Error").to_string(),
            status: status.as_u16(),
            detail: detail.into(),
        }
    }
}

fn problem_type(status: StatusCode) -> &'static str {
    match status {
        StatusCode::BAD_REQUEST => "https://tools.ietf.org/html/rfc9110#section-15.5.1",
        StatusCode::NOT_FOUND => "https://tools.ietf.org/html/rfc9110#section-15.5.5",
        StatusCode::CONFLICT => "https://tools.ietf.org/html/rfc9110#section-15.5.10",
        StatusCode::SERVICE_UNAVAILABLE => "https://tools.ietf.org/html/rfc9110#section-15.6.4",
        _ => "https://tools.ietf.org/html/rfc9110#section-15.6.1",
    }
}

/// Builds a problem response for any status.
pub fn problem_response(status: StatusCode, detail: impl Into<String>) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, PROBLEM_CONTENT_TYPE)],
        Json(ProblemDetails::new(status, detail)),
    )
        .into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }

        problem_response(status, self.detail())
    }
}

// =============================================================================
// Extractor Rejections
// =============================================================================

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<ream_core::ValidationError> for ApiError {
    fn from(error: ream_core::ValidationError) -> Self {
        ApiError::Core(CoreError::Validation(error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::from(CoreError::invalid("bad")).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::not_found("gone").status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::from(CoreError::DiscontinuedProducts {
                names: vec!["Vellum".into()]
            })
            .status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::BadRequest("not json".into()).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_persistence_detail_hides_cause() {
        let err: ApiResult<()> =
            Err(DbError::Sql("disk I/O error".into())).with_operation("restocking papers");
        let err = err.unwrap_err();

        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            err.detail(),
            "An unexpected error occurred while restocking papers"
        );
        assert!(err.to_string().contains("disk I/O error"));
    }

    #[test]
    fn test_unique_violation_is_bad_request() {
        let err: ApiResult<()> = Err(DbError::Duplicate {
            column: "papers.name".into(),
        })
        .with_operation("creating papers");
        let err = err.unwrap_err();

        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.detail(), "Duplicate value for papers.name");
    }

    #[test]
    fn test_problem_details_shape() {
        let problem = ProblemDetails::new(StatusCode::CONFLICT, "Orders [3] cannot move to pending");
        let body = serde_json::to_value(&problem).unwrap();

        assert_eq!(body["type"], "https://tools.ietf.org/html/rfc9110#section-15.5.10");
        assert_eq!(body["title"], "Conflict");
        assert_eq!(body["status"], 409);
        assert_eq!(body["detail"], "Orders [3] cannot move to pending");
    }
}
