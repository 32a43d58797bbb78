//! Order creation and status changes.
//!
//! ## Create Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  {customerId, orderEntries}                                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  validate + merge lines ──────────────────────────────► 400             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  customer exists? ────────────────────────────────────► 404             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─► load papers ─► plan_order ── discontinued / no stock ─► 409        │
//! │  │                     │          unknown paper ─────────► 404          │
//! │  │                     ▼                                                │
//! │  │        conditional decrement + insert (one transaction)              │
//! │  │                     │                                                │
//! │  └──── StockChanged ◄──┤                                                │
//! │     (backoff, replan)  ▼                                                │
//! │                     Created ──► 201                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A replan after `StockChanged` reads the new stock, so the caller gets
//! the precise Conflict or NotFound rather than a generic failure.

use chrono::Utc;
use tracing::{debug, info};

use crate::error::{ApiError, ApiResult, PersistenceContext};
use crate::services::{retry_stale, Attempt, RetryPolicy};
use ream_core::bulk::normalize_ids;
use ream_core::ordering::{delivery_date, merge_order_lines, plan_order, plan_status_change};
use ream_core::validation::validate_customer_id;
use ream_core::{CoreError, Order, OrderLine, OrderStatus};
use ream_db::{Database, OrderWrite};

#[derive(Debug, Clone)]
pub struct OrderService {
    db: Database,
    retry: RetryPolicy,
    delivery_days: u32,
}

impl OrderService {
    pub fn new(db: Database, retry: RetryPolicy, delivery_days: u32) -> Self {
        OrderService {
            db,
            retry,
            delivery_days,
        }
    }

    /// Places an order for `customer_id`.
    ///
    /// Either the order, its entries and every stock decrement are
    /// committed together, or nothing is.
    pub async fn create(&self, customer_id: i64, lines: &[OrderLine]) -> ApiResult<Order> {
        debug!(customer_id, lines = lines.len(), "Creating order");

        validate_customer_id(customer_id)?;
        let lines = &merge_order_lines(lines)?;

        let customer_exists = self
            .db
            .customers()
            .exists(customer_id)
            .await
            .with_operation("loading the customer")?;
        if !customer_exists {
            return Err(CoreError::not_found(format!("Customer {customer_id} not found")).into());
        }

        let product_ids = &lines.iter().map(|l| l.product_id).collect::<Vec<_>>();
        let order_date = Utc::now();
        let delivery = delivery_date(order_date, self.delivery_days)?;

        let order = retry_stale(&self.retry, "creating the order", move || async move {
            let papers = self
                .db
                .papers()
                .find_by_ids(product_ids)
                .await
                .with_operation("loading ordered papers")?;

            let plan = plan_order(lines, &papers)?;
            let write = self
                .db
                .orders()
                .create(customer_id, &plan, order_date, delivery)
                .await
                .with_operation("creating the order")?;

            Ok::<_, ApiError>(match write {
                OrderWrite::Created(order) => Attempt::Done(order),
                OrderWrite::StockChanged { product_id } => {
                    debug!(product_id, "Stock moved while ordering, replanning");
                    Attempt::Stale
                }
            })
        })
        .await?;

        info!(
            order_id = order.id,
            customer_id,
            total = %order.total_amount(),
            "Order created"
        );
        Ok(order)
    }

    /// Moves every found order among `ids` to `status`.
    ///
    /// All found orders are checked first; one backward move rejects the
    /// whole batch.
    pub async fn update_status(&self, ids: &[i64], status: OrderStatus) -> ApiResult<()> {
        debug!(?ids, %status, "Updating order status");

        let ids = &normalize_ids(ids)?;

        let changes = retry_stale(&self.retry, "updating order status", move || async move {
            let found = self
                .db
                .orders()
                .find_statuses(ids)
                .await
                .with_operation("loading orders")?;

            let changes = plan_status_change(ids, &found, status)?;
            let applied = self
                .db
                .orders()
                .apply_status_changes(&changes)
                .await
                .with_operation("updating order status")?;

            Ok::<_, ApiError>(if applied { Attempt::Done(changes) } else { Attempt::Stale })
        })
        .await?;

        info!(updated = changes.len(), %status, "Order status updated");
        Ok(())
    }

    pub async fn update_status_one(&self, id: i64, status: OrderStatus) -> ApiResult<()> {
        if id <= 0 {
            return Err(CoreError::not_found(format!("Order {id} not found")).into());
        }
        self.update_status(&[id], status).await
    }

    pub async fn get(&self, id: i64) -> ApiResult<Order> {
        self.db
            .orders()
            .get_by_id(id)
            .await
            .with_operation("loading the order")?
            .ok_or_else(|| ApiError::not_found(format!("Order {id} not found")))
    }
}
