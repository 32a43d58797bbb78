//! Restock and discontinue.
//!
//! ## Bulk Id Policy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ids ──► dedupe ──► drop ids <= 0 ──► none left? ──► 400                │
//! │                                          │                              │
//! │                                          ▼                              │
//! │                               load ──► none found? ──► 404              │
//! │                                          │                              │
//! │                                          ▼                              │
//! │                         apply to found, ignore the rest                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tracing::{debug, info, warn};

use crate::error::{ApiError, ApiResult, PersistenceContext};
use crate::services::{retry_stale, Attempt, RetryPolicy};
use ream_core::bulk::{filter_valid_ids, normalize_ids};
use ream_core::inventory::{plan_discontinue, plan_restock, validate_restock_requests};
use ream_core::{CoreError, RestockRequest};
use ream_db::Database;

#[derive(Debug, Clone)]
pub struct InventoryService {
    db: Database,
    retry: RetryPolicy,
}

impl InventoryService {
    pub fn new(db: Database, retry: RetryPolicy) -> Self {
        InventoryService { db, retry }
    }

    /// Discontinues every found paper among `ids`. Already discontinued
    /// papers are left as they are.
    pub async fn discontinue(&self, ids: &[i64]) -> ApiResult<()> {
        debug!(?ids, "Discontinuing papers");

        let ids = normalize_ids(ids)?;
        let papers = self
            .db
            .papers()
            .find_by_ids(&ids)
            .await
            .with_operation("loading papers to discontinue")?;

        let plan = plan_discontinue(&ids, &papers)?;
        if !plan.missing.is_empty() {
            warn!(missing = ?plan.missing, "Ignoring unknown paper ids");
        }

        let changed = self
            .db
            .papers()
            .discontinue(&plan.targets)
            .await
            .with_operation("discontinuing papers")?;

        info!(
            changed,
            already = plan.already_discontinued.len(),
            "Papers discontinued"
        );
        Ok(())
    }

    pub async fn discontinue_one(&self, id: i64) -> ApiResult<()> {
        if id <= 0 {
            return Err(CoreError::not_found(format!("Paper {id} not found")).into());
        }
        self.discontinue(&[id]).await
    }

    /// Adds stock to every restockable paper in `requests`.
    ///
    /// Unknown and discontinued papers are skipped. The batch is applied
    /// with compare-and-set and replanned if another writer moved a stock
    /// value in between.
    pub async fn restock(&self, requests: &[RestockRequest]) -> ApiResult<()> {
        debug!(?requests, "Restocking papers");

        validate_restock_requests(requests)?;
        let requested: Vec<i64> = requests.iter().map(|r| r.paper_id).collect();
        let lookup = &filter_valid_ids(&requested);

        let plan = retry_stale(&self.retry, "restocking papers", move || async move {
            let papers = self
                .db
                .papers()
                .find_by_ids(lookup)
                .await
                .with_operation("loading papers to restock")?;

            let plan = plan_restock(requests, &papers)?;
            let applied = self
                .db
                .papers()
                .apply_stock_changes(&plan.changes)
                .await
                .with_operation("restocking papers")?;

            Ok::<_, ApiError>(if applied { Attempt::Done(plan) } else { Attempt::Stale })
        })
        .await?;

        if !plan.missing.is_empty() || !plan.discontinued.is_empty() {
            warn!(
                missing = ?plan.missing,
                discontinued = ?plan.discontinued,
                "Skipped papers that cannot be restocked"
            );
        }
        info!(restocked = plan.changes.len(), "Papers restocked");
        Ok(())
    }

    pub async fn restock_one(&self, id: i64, amount: i32) -> ApiResult<()> {
        if id <= 0 {
            return Err(CoreError::not_found(format!("Paper {id} not found")).into());
        }
        self.restock(&[RestockRequest {
            paper_id: id,
            amount,
        }])
        .await
    }
}
