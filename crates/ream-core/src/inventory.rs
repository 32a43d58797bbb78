//! # Inventory Planning
//!
//! Pure planning for the two stock mutations, restock and discontinue.
//! The service layer reads the current papers, asks this module what to
//! write, then applies the plan in one transaction.
//!
//! ## Restock Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  [{paperId, amount}, ...]                                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  validate_restock_requests  ── empty / dup id / amount < 1 ──► 400      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  load papers by id (store)                                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  plan_restock                                                           │
//! │       ├── missing       (ignored)                                       │
//! │       ├── discontinued  (ignored)                                       │
//! │       └── restockable ──► min(MAX_STOCK, stock + amount)                │
//! │                                                                         │
//! │  restockable empty ──► NothingToRestock (404)                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use crate::bulk::{dedupe_with_report, missing_ids, require_found};
use crate::error::{CoreError, CoreResult};
use crate::types::{Paper, RestockRequest};
use crate::validation::validate_restock_amount;
use crate::MAX_STOCK;

// =============================================================================
// Restock
// =============================================================================

/// Adds `amount` to `current`, clamping at [`MAX_STOCK`] instead of wrapping.
///
/// ```rust
/// use ream_core::inventory::restocked_stock;
///
/// assert_eq!(restocked_stock(10, 5), 15);
/// assert_eq!(restocked_stock(i32::MAX - 100, 1_000_000_000), i32::MAX);
/// ```
#[inline]
pub fn restocked_stock(current: i32, amount: i32) -> i32 {
    current.saturating_add(amount).min(MAX_STOCK)
}

/// Rejects a restock batch that is empty, targets a paper twice or carries a
/// non-positive amount. Any one bad line rejects the whole batch.
pub fn validate_restock_requests(requests: &[RestockRequest]) -> CoreResult<()> {
    if requests.is_empty() {
        return Err(CoreError::invalid("At least one restock request is required"));
    }

    let ids: Vec<i64> = requests.iter().map(|r| r.paper_id).collect();
    let report = dedupe_with_report(&ids);
    if report.has_duplicates() {
        return Err(CoreError::invalid(format!(
            "Duplicate paper ids in restock request: {:?}",
            report.duplicates
        )));
    }

    for request in requests {
        validate_restock_amount(request.amount)?;
    }

    Ok(())
}

/// One planned stock write, with the value it was planned against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockChange {
    pub paper_id: i64,
    pub previous: i32,
    pub new: i32,
}

/// What a restock batch will do.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RestockPlan {
    pub changes: Vec<StockChange>,
    /// Requested ids with no matching paper (including ids <= 0).
    pub missing: Vec<i64>,
    /// Requested ids whose paper is discontinued.
    pub discontinued: Vec<i64>,
}

/// Plans a validated restock batch against the papers currently stored.
///
/// `papers` holds whatever the store returned for the requested ids; extra
/// rows are ignored.
pub fn plan_restock(requests: &[RestockRequest], papers: &[Paper]) -> CoreResult<RestockPlan> {
    let by_id: HashMap<i64, &Paper> = papers.iter().map(|p| (p.id, p)).collect();
    let mut plan = RestockPlan::default();

    for request in requests {
        match by_id.get(&request.paper_id) {
            None => plan.missing.push(request.paper_id),
            Some(paper) if paper.discontinued => plan.discontinued.push(paper.id),
            Some(paper) => plan.changes.push(StockChange {
                paper_id: paper.id,
                previous: paper.stock,
                new: restocked_stock(paper.stock, request.amount),
            }),
        }
    }

    if plan.changes.is_empty() {
        return Err(CoreError::NothingToRestock {
            missing: plan.missing,
            discontinued: plan.discontinued,
        });
    }

    Ok(plan)
}

// =============================================================================
// Discontinue
// =============================================================================

/// What a discontinue batch will do.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DiscontinuePlan {
    /// Every found id. Already-discontinued papers are rewritten as a no-op.
    pub targets: Vec<i64>,
    /// Found ids that were already discontinued.
    pub already_discontinued: Vec<i64>,
    /// Normalised ids with no matching paper.
    pub missing: Vec<i64>,
}

/// Plans a discontinue batch. `requested` must already be normalised with
/// [`crate::bulk::normalize_ids`].
pub fn plan_discontinue(requested: &[i64], papers: &[Paper]) -> CoreResult<DiscontinuePlan> {
    let found: Vec<&Paper> = papers
        .iter()
        .filter(|p| requested.contains(&p.id))
        .collect();
    let found = require_found(found, "papers", requested)?;

    let found_ids: Vec<i64> = found.iter().map(|p| p.id).collect();
    Ok(DiscontinuePlan {
        missing: missing_ids(requested, &found_ids),
        already_discontinued: found
            .iter()
            .filter(|p| p.discontinued)
            .map(|p| p.id)
            .collect(),
        targets: found_ids,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    fn paper(id: i64, stock: i32, discontinued: bool) -> Paper {
        Paper {
            id,
            name: format!("Paper {id}"),
            price_cents: 100,
            stock,
            discontinued,
            properties: Vec::new(),
        }
    }

    fn restock(paper_id: i64, amount: i32) -> RestockRequest {
        RestockRequest { paper_id, amount }
    }

    #[test]
    fn test_restock_clamps_at_max() {
        assert_eq!(restocked_stock(i32::MAX - 100, 1_000_000_000), i32::MAX);
        assert_eq!(restocked_stock(i32::MAX, 1), i32::MAX);
        assert_eq!(restocked_stock(0, 1), 1);
    }

    #[test]
    fn test_duplicate_targets_rejected() {
        let err = validate_restock_requests(&[restock(3, 5), restock(3, 10)]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(err.to_string().contains('3'));
    }

    #[test]
    fn test_bad_batches_rejected() {
        assert!(validate_restock_requests(&[]).is_err());
        let err = validate_restock_requests(&[restock(1, 5), restock(2, 0)]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(validate_restock_requests(&[restock(1, 5), restock(2, 1)]).is_ok());
    }

    #[test]
    fn test_plan_restock_partial() {
        let papers = [paper(1, 10, false), paper(2, 4, true)];
        let requests = [restock(1, 5), restock(2, 5), restock(9, 5), restock(-2, 5)];

        let plan = plan_restock(&requests, &papers).unwrap();
        assert_eq!(
            plan.changes,
            vec![StockChange { paper_id: 1, previous: 10, new: 15 }]
        );
        assert_eq!(plan.discontinued, vec![2]);
        assert_eq!(plan.missing, vec![9, -2]);
    }

    #[test]
    fn test_plan_restock_nothing_actionable() {
        let papers = [paper(2, 4, true)];
        let err = plan_restock(&[restock(2, 1), restock(8, 1)], &papers).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        match err {
            CoreError::NothingToRestock { missing, discontinued } => {
                assert_eq!(missing, vec![8]);
                assert_eq!(discontinued, vec![2]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_restock_on_discontinued_always_rejected() {
        let papers = [paper(5, 0, true)];
        for _ in 0..3 {
            assert!(plan_restock(&[restock(5, 10)], &papers).is_err());
        }
    }

    #[test]
    fn test_plan_discontinue() {
        let papers = [paper(1, 3, true)];
        let plan = plan_discontinue(&[1, 2], &papers).unwrap();
        assert_eq!(plan.targets, vec![1]);
        assert_eq!(plan.already_discontinued, vec![1]);
        assert_eq!(plan.missing, vec![2]);

        let err = plan_discontinue(&[7], &papers).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
