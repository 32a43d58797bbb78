//! # Error Types
//!
//! Domain-specific error types for ream-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  ream-core errors (this file)                                          │
//! │  ├── CoreError        - Domain failures, classified by ErrorKind       │
//! │  └── ValidationError  - Field-level input failures                     │
//! │                                                                         │
//! │  ream-db errors (separate crate)                                       │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  ream-api errors                                                       │
//! │  └── ApiError         - Problem details sent to the client             │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ApiError → HTTP problem body      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::types::OrderStatus;

// =============================================================================
// Error Kind
// =============================================================================

/// Coarse classification of a domain failure.
///
/// The HTTP layer maps each kind to exactly one status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed, duplicate or empty-after-filtering input.
    InvalidArgument,
    /// Nothing actionable exists for the request.
    NotFound,
    /// A business rule forbids the operation in the current state.
    Conflict,
}

// =============================================================================
// Core Error
// =============================================================================

/// Failures raised by the inventory and order rules.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Input was malformed or nothing usable remained after filtering.
    #[error("{0}")]
    InvalidArgument(String),

    /// The referenced entity (or every referenced entity) is absent.
    #[error("{0}")]
    NotFound(String),

    /// A bulk restock where no requested paper could take stock.
    ///
    /// ## When This Occurs
    /// Every id in the request was either unknown or discontinued. Partial
    /// batches never raise this; the restockable subset is applied.
    #[error(
        "No papers could be restocked. Invalid ids: {missing:?}. Discontinued ids: {discontinued:?}"
    )]
    NothingToRestock {
        missing: Vec<i64>,
        discontinued: Vec<i64>,
    },

    /// An order references products that can no longer be sold.
    #[error("Cannot order discontinued products: {}", .names.join(", "))]
    DiscontinuedProducts { names: Vec<String> },

    /// Insufficient stock to fulfil an order entry.
    ///
    /// ## User Workflow
    /// ```text
    /// POST /api/Order (paper 7, quantity 5)
    ///      │
    ///      ▼
    /// Check stock: available=3
    ///      │
    ///      ▼
    /// InsufficientStock { paper: "A4 Copy", available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// 409: "Insufficient stock for A4 Copy: available 3, requested 5"
    /// ```
    #[error("Insufficient stock for {paper}: available {available}, requested {requested}")]
    InsufficientStock {
        paper: String,
        available: i32,
        requested: i32,
    },

    /// One or more orders would move backwards through the status lifecycle.
    #[error("Orders {order_ids:?} cannot move to {to}")]
    InvalidStatusTransition { order_ids: Vec<i64>, to: OrderStatus },

    /// Another writer changed the rows this operation planned against, and
    /// the retry budget ran out.
    #[error("Concurrent modification: {0}")]
    ConcurrentModification(String),

    /// A request field failed its check.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates an InvalidArgument error.
    pub fn invalid(message: impl Into<String>) -> Self {
        CoreError::InvalidArgument(message.into())
    }

    /// Creates a NotFound error.
    pub fn not_found(message: impl Into<String>) -> Self {
        CoreError::NotFound(message.into())
    }

    /// Classifies the error for transport mapping.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::InvalidArgument(_) | CoreError::Validation(_) => ErrorKind::InvalidArgument,
            CoreError::NotFound(_) | CoreError::NothingToRestock { .. } => ErrorKind::NotFound,
            CoreError::DiscontinuedProducts { .. }
            | CoreError::InsufficientStock { .. }
            | CoreError::InvalidStatusTransition { .. }
            | CoreError::ConcurrentModification(_) => ErrorKind::Conflict,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// A single field of a request body or query string failed its check.
///
/// Raised before the store is touched. `field` carries the wire name
/// (`priceCents`, `pageSize`, ...) so the problem detail points at what the
/// client actually sent.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    Required { field: String },

    #[error("{field} needs at least {min} characters")]
    TooShort { field: String, min: usize },

    #[error("{field} allows at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must lie in [{min}, {max}]")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} must be greater than zero")]
    MustBePositive { field: String },

    /// e.g. `filter=3,x`
    #[error("{field} is malformed: {reason}")]
    InvalidFormat { field: String, reason: String },

    #[error("{field} accepts only {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Case-insensitive name clash, within a batch or against the store.
    #[error("{field} named '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            paper: "A4 Copy".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for A4 Copy: available 3, requested 5"
        );

        let err = CoreError::DiscontinuedProducts {
            names: vec!["Vellum".to_string(), "Onion Skin".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Cannot order discontinued products: Vellum, Onion Skin"
        );
    }

    #[test]
    fn test_nothing_to_restock_lists_both_groups() {
        let err = CoreError::NothingToRestock {
            missing: vec![4, 9],
            discontinued: vec![2],
        };
        let message = err.to_string();
        assert!(message.contains("Invalid ids: [4, 9]"));
        assert!(message.contains("Discontinued ids: [2]"));
    }

    #[test]
    fn test_kind_classification() {
        assert_eq!(CoreError::invalid("x").kind(), ErrorKind::InvalidArgument);
        assert_eq!(CoreError::not_found("x").kind(), ErrorKind::NotFound);
        assert_eq!(
            CoreError::NothingToRestock {
                missing: vec![],
                discontinued: vec![1]
            }
            .kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            CoreError::InvalidStatusTransition {
                order_ids: vec![1],
                to: OrderStatus::Pending
            }
            .kind(),
            ErrorKind::Conflict
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "name".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert_eq!(core_err.kind(), ErrorKind::InvalidArgument);
    }
}
