//! # Validation Module
//!
//! Input validation utilities for the storefront.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP extractors (ream-api)                                   │
//! │  ├── Type validation (deserialization of query/body)                   │
//! │  └── Malformed JSON → 400 before any handler runs                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Engine boundary                                              │
//! │  ├── THIS MODULE: field rules (names, prices, paging, filters)         │
//! │  └── Raised before any store access or mutation                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── UNIQUE COLLATE NOCASE on names                                    │
//! │  ├── CHECK (stock >= 0), CHECK (price_cents > 0)                       │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use ream_core::validation::{validate_paper_name, validate_quantity};
//!
//! let name = validate_paper_name("  A4 Copy  ").unwrap();
//! assert_eq!(name, "A4 Copy");
//! assert!(validate_quantity(0).is_err());
//! ```

use std::collections::HashSet;

use crate::error::ValidationError;
use crate::{MAX_PAGE_SIZE, PAPER_NAME_MAX, PAPER_NAME_MIN, PROPERTY_NAME_MAX, PROPERTY_NAME_MIN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest accepted catalog search term (characters).
const MAX_SEARCH_LEN: usize = 255;

/// Distinct property ids one catalog filter may name.
pub const MAX_FILTER_IDS: usize = 1000;

// =============================================================================
// String Validators
// =============================================================================

/// Trims `value` and checks its length in characters.
fn validate_name(field: &str, value: &str, min: usize, max: usize) -> ValidationResult<String> {
    let value = value.trim();
    let len = value.chars().count();

    if len == 0 {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if len < min {
        return Err(ValidationError::TooShort {
            field: field.to_string(),
            min,
        });
    }

    if len > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(value.to_string())
}

/// Validates a paper name.
///
/// ## Rules
/// - Trimmed before checking
/// - Must be between 2 and 255 characters
///
/// ## Returns
/// The trimmed name, ready to store.
///
/// ## Example
/// ```rust
/// use ream_core::validation::validate_paper_name;
///
/// assert!(validate_paper_name("Kraft 80gsm").is_ok());
/// assert!(validate_paper_name(" x ").is_err());
/// assert!(validate_paper_name(&"A".repeat(256)).is_err());
/// ```
pub fn validate_paper_name(name: &str) -> ValidationResult<String> {
    validate_name("name", name, PAPER_NAME_MIN, PAPER_NAME_MAX)
}

/// Validates a property name. Same shape as a paper name.
pub fn validate_property_name(name: &str) -> ValidationResult<String> {
    validate_name("name", name, PROPERTY_NAME_MIN, PROPERTY_NAME_MAX)
}

/// Validates a catalog search term.
///
/// ## Returns
/// `None` for an absent or blank term, otherwise the trimmed term.
pub fn validate_search_query(query: Option<&str>) -> ValidationResult<Option<String>> {
    let Some(query) = query.map(str::trim).filter(|q| !q.is_empty()) else {
        return Ok(None);
    };

    if query.chars().count() > MAX_SEARCH_LEN {
        return Err(ValidationError::TooLong {
            field: "search".to_string(),
            max: MAX_SEARCH_LEN,
        });
    }

    Ok(Some(query.to_string()))
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a price in cents. Papers are never free.
///
/// ```rust
/// use ream_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(1099).is_ok());
/// assert!(validate_price_cents(0).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "price".to_string(),
        });
    }

    Ok(())
}

/// Validates an initial stock level (zero allowed).
pub fn validate_stock(stock: i32) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::OutOfRange {
            field: "stock".to_string(),
            min: 0,
            max: i64::from(i32::MAX),
        });
    }

    Ok(())
}

/// Validates an order line quantity.
pub fn validate_quantity(quantity: i32) -> ValidationResult<()> {
    if quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates a restock amount.
pub fn validate_restock_amount(amount: i32) -> ValidationResult<()> {
    if amount < 1 {
        return Err(ValidationError::MustBePositive {
            field: "amount".to_string(),
        });
    }

    Ok(())
}

/// Validates a customer reference on an incoming order.
pub fn validate_customer_id(id: i64) -> ValidationResult<()> {
    if id <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "customerId".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Paging Validators
// =============================================================================

/// Validates a 1-based page number.
pub fn validate_page(page: i64) -> ValidationResult<u32> {
    if page < 1 || page > i64::from(u32::MAX) {
        return Err(ValidationError::OutOfRange {
            field: "page".to_string(),
            min: 1,
            max: i64::from(u32::MAX),
        });
    }

    Ok(page as u32)
}

/// Validates a page size against `[1, MAX_PAGE_SIZE]`.
pub fn validate_page_size(page_size: i64) -> ValidationResult<u32> {
    if !(1..=i64::from(MAX_PAGE_SIZE)).contains(&page_size) {
        return Err(ValidationError::OutOfRange {
            field: "pageSize".to_string(),
            min: 1,
            max: i64::from(MAX_PAGE_SIZE),
        });
    }

    Ok(page_size as u32)
}

// =============================================================================
// Filter Validators
// =============================================================================

/// Parses the comma-separated `filter` query value into property ids.
///
/// Blank segments are skipped and repeated ids collapse to one, keeping the
/// first occurrence. A segment that is not an integer is rejected, as is a
/// list naming more than [`MAX_FILTER_IDS`] distinct ids.
///
/// ```rust
/// use ream_core::validation::parse_property_filter;
///
/// assert_eq!(parse_property_filter("3, 1,,3").unwrap(), vec![3, 1]);
/// assert!(parse_property_filter("1,a4").is_err());
/// ```
pub fn parse_property_filter(raw: &str) -> ValidationResult<Vec<i64>> {
    let mut ids: Vec<i64> = Vec::new();
    let mut seen = HashSet::new();

    for segment in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let id = segment
            .parse::<i64>()
            .map_err(|_| ValidationError::InvalidFormat {
                field: "filter".to_string(),
                reason: format!("'{segment}' is not a property id"),
            })?;
        if seen.insert(id) {
            ids.push(id);
        }
        if ids.len() > MAX_FILTER_IDS {
            return Err(ValidationError::InvalidFormat {
                field: "filter".to_string(),
                reason: format!("at most {MAX_FILTER_IDS} property ids are allowed"),
            });
        }
    }

    Ok(ids)
}

/// Validates optional inclusive price bounds.
pub fn validate_price_range(min: Option<i64>, max: Option<i64>) -> ValidationResult<()> {
    for (field, bound) in [("priceMin", min), ("priceMax", max)] {
        if matches!(bound, Some(cents) if cents < 0) {
            return Err(ValidationError::OutOfRange {
                field: field.to_string(),
                min: 0,
                max: i64::MAX,
            });
        }
    }

    if let (Some(min), Some(max)) = (min, max) {
        if min > max {
            return Err(ValidationError::InvalidFormat {
                field: "priceMin".to_string(),
                reason: format!("{min} is greater than priceMax {max}"),
            });
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
