//! # Bulk Id Policy
//!
//! Every bulk endpoint (discontinue, restock, status update) runs its ids
//! through the same pipeline:
//!
//! ```text
//! ids ──► dedupe ──► drop ids <= 0 ──► ≥1 left? ──► lookup ──► ≥1 found? ──► apply
//!                                        │                       │
//!                                        ▼                       ▼
//!                                 InvalidArgument             NotFound
//! ```
//!
//! Ids that survive filtering but match no record are ignored. A bulk call
//! succeeds as long as at least one target is actionable.

use std::collections::HashSet;

use crate::error::{CoreError, CoreResult};

/// Result of deduplicating a list while remembering what was repeated.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DedupeReport {
    /// First occurrence of every id, in input order.
    pub unique: Vec<i64>,
    /// Ids that appeared more than once (each listed once).
    pub duplicates: Vec<i64>,
}

impl DedupeReport {
    pub fn has_duplicates(&self) -> bool {
        !self.duplicates.is_empty()
    }
}

/// Deduplicates `ids`, keeping input order and reporting repeats.
pub fn dedupe_with_report(ids: &[i64]) -> DedupeReport {
    let mut seen = HashSet::with_capacity(ids.len());
    let mut repeated = HashSet::new();
    let mut report = DedupeReport::default();

    for &id in ids {
        if seen.insert(id) {
            report.unique.push(id);
        } else if repeated.insert(id) {
            report.duplicates.push(id);
        }
    }

    report
}

/// Keeps only ids that could exist (positive integers).
pub fn filter_valid_ids(ids: &[i64]) -> Vec<i64> {
    ids.iter().copied().filter(|&id| id > 0).collect()
}

/// Ids in `requested` with no counterpart in `found`, in request order.
pub fn missing_ids(requested: &[i64], found: &[i64]) -> Vec<i64> {
    let found: HashSet<i64> = found.iter().copied().collect();
    requested
        .iter()
        .copied()
        .filter(|id| !found.contains(id))
        .collect()
}

/// Dedupes and drops invalid ids; fails if nothing is left to look up.
///
/// ```rust
/// use ream_core::bulk::normalize_ids;
///
/// assert_eq!(normalize_ids(&[3, 3, -1, 2]).unwrap(), vec![3, 2]);
/// assert!(normalize_ids(&[-1, 0]).is_err());
/// ```
pub fn normalize_ids(ids: &[i64]) -> CoreResult<Vec<i64>> {
    let valid = filter_valid_ids(&dedupe_with_report(ids).unique);

    if valid.is_empty() {
        return Err(CoreError::invalid(format!(
            "No valid ids supplied. Received: {ids:?}"
        )));
    }

    Ok(valid)
}

/// Fails with NotFound when a lookup matched nothing.
pub fn require_found<T>(found: Vec<T>, what: &str, requested: &[i64]) -> CoreResult<Vec<T>> {
    if found.is_empty() {
        return Err(CoreError::not_found(format!(
            "No {what} found for ids {requested:?}"
        )));
    }

    Ok(found)
}

// =============================================================================
// Unit Tests
// =============================================================================
