//! # Order Repository
//!
//! Orders and their entries are written once, atomically, and afterwards
//! only their status changes.
//!
//! ## Order Creation Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │    for each planned line:                                               │
//! │      UPDATE papers SET stock = stock - q                                │
//! │       WHERE id = ? AND discontinued = 0 AND stock >= q                  │
//! │        │                                                                │
//! │        └── 0 rows? ──► ROLLBACK, report StockChanged                    │
//! │    INSERT INTO orders (..., status = 'pending', total)                  │
//! │    INSERT INTO order_entries (..., unit_price_cents)   × lines          │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The stock decrements are the first statements of the transaction, so the
//! write lock is taken before anything is read and two concurrent orders can
//! never both spend the same units.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, warn};

use super::{push_id_list, BIND_CHUNK};
use crate::error::DbResult;
use ream_core::ordering::{OrderPlan, StatusChange};
use ream_core::{Order, OrderEntry, OrderStatus, Page};

const ORDER_COLUMNS: &str =
    "id, customer_id, order_date, delivery_date, status, total_amount_cents";

/// Outcome of an order write.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderWrite {
    /// The order, its entries and the stock decrements were committed.
    Created(Order),
    /// A paper's stock or status moved after planning. Nothing was written.
    StockChanged { product_id: i64 },
}

#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Writes a planned order as one unit.
    ///
    /// ## Returns
    /// * `Ok(OrderWrite::Created(order))` - committed, status `Pending`
    /// * `Ok(OrderWrite::StockChanged { .. })` - a guard missed, rolled back
    /// * `Err(DbError)` - the store failed, rolled back
    pub async fn create(
        &self,
        customer_id: i64,
        plan: &OrderPlan,
        order_date: DateTime<Utc>,
        delivery_date: DateTime<Utc>,
    ) -> DbResult<OrderWrite> {
        debug!(customer_id, lines = plan.lines.len(), total = %plan.total, "Creating order");

        let mut tx = self.pool.begin().await?;

        for line in &plan.lines {
            let result = sqlx::query(
                "UPDATE papers SET stock = stock - ?1 \
                 WHERE id = ?2 AND discontinued = 0 AND stock >= ?1",
            )
            .bind(line.quantity)
            .bind(line.product_id)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                warn!(product_id = line.product_id, "Stock guard missed, rolling back order");
                tx.rollback().await?;
                return Ok(OrderWrite::StockChanged {
                    product_id: line.product_id,
                });
            }
        }

        let status = OrderStatus::Pending;
        let order_id = sqlx::query(
            "INSERT INTO orders (customer_id, order_date, delivery_date, status, total_amount_cents) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(customer_id)
        .bind(order_date)
        .bind(delivery_date)
        .bind(status)
        .bind(plan.total.cents())
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        let mut entries = Vec::with_capacity(plan.lines.len());
        for line in &plan.lines {
            let id = sqlx::query(
                "INSERT INTO order_entries (order_id, product_id, quantity, unit_price_cents) \
                 VALUES (?1, ?2, ?3, ?4)",
            )
            .bind(order_id)
            .bind(line.product_id)
            .bind(line.quantity)
            .bind(line.unit_price_cents)
            .execute(&mut *tx)
            .await?
            .last_insert_rowid();

            entries.push(OrderEntry {
                id,
                order_id,
                product_id: line.product_id,
                quantity: line.quantity,
                unit_price_cents: line.unit_price_cents,
            });
        }

        tx.commit().await?;

        Ok(OrderWrite::Created(Order {
            id: order_id,
            customer_id,
            order_date,
            delivery_date,
            status,
            total_amount_cents: plan.total.cents(),
            entries,
        }))
    }

    /// Applies planned status changes with compare-and-set, all or nothing.
    ///
    /// Returns `false` (and writes nothing) when any order's status moved
    /// since it was read.
    pub async fn apply_status_changes(&self, changes: &[StatusChange]) -> DbResult<bool> {
        let mut tx = self.pool.begin().await?;

        for change in changes {
            let result = sqlx::query("UPDATE orders SET status = ?1 WHERE id = ?2 AND status = ?3")
                .bind(change.to)
                .bind(change.order_id)
                .bind(change.from)
                .execute(&mut *tx)
                .await?;

            if result.rows_affected() == 0 {
                warn!(order_id = change.order_id, "Status changed since planning");
                tx.rollback().await?;
                return Ok(false);
            }
        }

        tx.commit().await?;
        Ok(true)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Gets an order with its entries.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Order>> {
        let mut conn = self.pool.acquire().await?;

        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        let Some(order) = order else {
            return Ok(None);
        };

        let mut orders = vec![order];
        attach_entries(&mut conn, &mut orders).await?;
        Ok(orders.pop())
    }

    /// Current status of each order found among `ids`.
    pub async fn find_statuses(&self, ids: &[i64]) -> DbResult<Vec<(i64, OrderStatus)>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.pool.acquire().await?;
        let mut statuses = Vec::new();

        for chunk in ids.chunks(BIND_CHUNK) {
            let mut qb = QueryBuilder::<Sqlite>::new("SELECT id, status FROM orders WHERE id IN (");
            push_id_list(&mut qb, chunk);
            qb.push(")");

            statuses.extend(
                qb.build_query_as::<(i64, OrderStatus)>()
                    .fetch_all(&mut *conn)
                    .await?,
            );
        }

        statuses.sort_by_key(|(id, _)| *id);
        Ok(statuses)
    }

    /// One page of a customer's orders, newest first, with entries.
    ///
    /// Ids are assigned in creation order, so id order is age order.
    pub async fn page_for_customer(
        &self,
        customer_id: i64,
        page: u32,
        page_size: u32,
    ) -> DbResult<Page<Order>> {
        let mut tx = self.pool.begin().await?;

        let total_items: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE customer_id = ?1")
            .bind(customer_id)
            .fetch_one(&mut *tx)
            .await?;

        let offset = i64::from(page.saturating_sub(1)) * i64::from(page_size);
        let mut items = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE customer_id = ?1 \
             ORDER BY id DESC LIMIT ?2 OFFSET ?3"
        ))
        .bind(customer_id)
        .bind(i64::from(page_size))
        .bind(offset)
        .fetch_all(&mut *tx)
        .await?;

        attach_entries(&mut tx, &mut items).await?;
        tx.commit().await?;

        Ok(Page { items, total_items })
    }

    /// Every order of the given customers, newest first, with entries.
    pub async fn list_for_customers(&self, customer_ids: &[i64]) -> DbResult<Vec<Order>> {
        if customer_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.pool.acquire().await?;
        let mut orders = Vec::new();

        for chunk in customer_ids.chunks(BIND_CHUNK) {
            let mut qb = QueryBuilder::<Sqlite>::new(format!(
                "SELECT {ORDER_COLUMNS} FROM orders WHERE customer_id IN ("
            ));
            push_id_list(&mut qb, chunk);
            qb.push(")");

            let batch = qb.build_query_as::<Order>().fetch_all(&mut *conn).await?;
            orders.extend(batch);
        }

        orders.sort_by(|a, b| b.id.cmp(&a.id));
        attach_entries(&mut conn, &mut orders).await?;
        Ok(orders)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

/// Loads and attaches entries (ordered by entry id) for `orders`.
async fn attach_entries(conn: &mut SqliteConnection, orders: &mut [Order]) -> DbResult<()> {
    let ids: Vec<i64> = orders.iter().map(|o| o.id).collect();
    let mut by_order: HashMap<i64, Vec<OrderEntry>> = HashMap::new();

    for chunk in ids.chunks(BIND_CHUNK) {
        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT id, order_id, product_id, quantity, unit_price_cents \
             FROM order_entries WHERE order_id IN (",
        );
        push_id_list(&mut qb, chunk);
        qb.push(") ORDER BY id");

        let entries = qb.build_query_as::<OrderEntry>().fetch_all(&mut *conn).await?;
        for entry in entries {
            by_order.entry(entry.order_id).or_default().push(entry);
        }
    }

    for order in orders.iter_mut() {
        order.entries = by_order.remove(&order.id).unwrap_or_default();
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use ream_core::ordering::{delivery_date, plan_order, PlannedLine};
    use ream_core::{Money, NewCustomer, NewPaper, OrderLine};

    async fn setup() -> (Database, i64) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.papers()
            .insert_many(&[
                NewPaper {
                    name: "A4 Copy".to_string(),
                    price_cents: 500,
                    stock: 10,
                    property_ids: Vec::new(),
                },
                NewPaper {
                    name: "Kraft".to_string(),
                    price_cents: 250,
                    stock: 2,
                    property_ids: Vec::new(),
                },
            ])
            .await
            .unwrap();
        let customer = db
            .customers()
            .insert(&NewCustomer {
                name: "Ada".to_string(),
                ..NewCustomer::default()
            })
            .await
            .unwrap();
        (db, customer.id)
    }

    async fn place(db: &Database, customer_id: i64, lines: &[OrderLine]) -> OrderWrite {
        let papers = db.papers().find_by_ids(&[1, 2]).await.unwrap();
        let plan = plan_order(lines, &papers).unwrap();
        let now = Utc::now();
        db.orders()
            .create(customer_id, &plan, now, delivery_date(now, 3).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_decrements_stock_and_snapshots_price() {
        let (db, customer_id) = setup().await;
        let lines = [
            OrderLine { product_id: 1, quantity: 3 },
            OrderLine { product_id: 2, quantity: 2 },
        ];

        let OrderWrite::Created(order) = place(&db, customer_id, &lines).await else {
            panic!("order was not created");
        };
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total_amount(), Money::from_cents(2000));
        assert_eq!(order.entries.len(), 2);

        let stored = db.orders().get_by_id(order.id).await.unwrap().unwrap();
        assert_eq!(stored.entries, order.entries);
        assert_eq!(stored.total_amount_cents, 2000);

        let papers = db.papers().find_by_ids(&[1, 2]).await.unwrap();
        assert_eq!(papers[0].stock, 7);
        assert_eq!(papers[1].stock, 0);
    }

    #[tokio::test]
    async fn test_stale_plan_writes_nothing() {
        let (db, customer_id) = setup().await;

        // Planned against stock 2, but stock drops before the write.
        let plan = OrderPlan {
            lines: vec![
                PlannedLine {
                    product_id: 1,
                    product_name: "A4 Copy".to_string(),
                    quantity: 1,
                    unit_price_cents: 500,
                },
                PlannedLine {
                    product_id: 2,
                    product_name: "Kraft".to_string(),
                    quantity: 2,
                    unit_price_cents: 250,
                },
            ],
            total: Money::from_cents(1000),
        };
        place(&db, customer_id, &[OrderLine { product_id: 2, quantity: 1 }]).await;

        let now = Utc::now();
        let write = db
            .orders()
            .create(customer_id, &plan, now, now)
            .await
            .unwrap();
        assert_eq!(write, OrderWrite::StockChanged { product_id: 2 });

        let papers = db.papers().find_by_ids(&[1, 2]).await.unwrap();
        assert_eq!(papers[0].stock, 10);
        assert_eq!(papers[1].stock, 1);
        assert_eq!(db.orders().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_status_compare_and_set() {
        let (db, customer_id) = setup().await;
        let OrderWrite::Created(order) =
            place(&db, customer_id, &[OrderLine { product_id: 1, quantity: 1 }]).await
        else {
            panic!("order was not created");
        };

        let ship = StatusChange {
            order_id: order.id,
            from: OrderStatus::Pending,
            to: OrderStatus::Shipped,
        };
        assert!(db.orders().apply_status_changes(&[ship]).await.unwrap());
        // Second attempt was planned against Pending, which is stale now.
        assert!(!db.orders().apply_status_changes(&[ship]).await.unwrap());

        let statuses = db.orders().find_statuses(&[order.id, 77]).await.unwrap();
        assert_eq!(statuses, vec![(order.id, OrderStatus::Shipped)]);
    }

    #[tokio::test]
    async fn test_customer_pages_newest_first() {
        let (db, customer_id) = setup().await;
        for _ in 0..3 {
            place(&db, customer_id, &[OrderLine { product_id: 1, quantity: 1 }]).await;
        }

        let page = db.orders().page_for_customer(customer_id, 1, 2).await.unwrap();
        assert_eq!(page.total_items, 3);
        let ids: Vec<i64> = page.items.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![3, 2]);
        assert!(page.items.iter().all(|o| o.entries.len() == 1));

        let page = db.orders().page_for_customer(customer_id, 3, 2).await.unwrap();
        assert!(page.items.is_empty());

        let all = db.orders().list_for_customers(&[customer_id]).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].id, 3);
    }
}
