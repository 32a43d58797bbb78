//! Customer reads, optionally with order history.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{ApiError, ApiResult, PersistenceContext};
use ream_core::{Customer, Order, Page};
use ream_db::Database;

#[derive(Debug, Clone)]
pub struct CustomerService {
    db: Database,
}

impl CustomerService {
    pub fn new(db: Database) -> Self {
        CustomerService { db }
    }

    /// Every customer ordered by id. With `with_orders`, each customer
    /// carries its orders, newest first.
    pub async fn list(&self, with_orders: bool) -> ApiResult<Vec<(Customer, Option<Vec<Order>>)>> {
        let customers = self
            .db
            .customers()
            .list()
            .await
            .with_operation("listing customers")?;

        if !with_orders {
            return Ok(customers.into_iter().map(|c| (c, None)).collect());
        }

        let ids: Vec<i64> = customers.iter().map(|c| c.id).collect();
        let orders = self
            .db
            .orders()
            .list_for_customers(&ids)
            .await
            .with_operation("loading customer orders")?;

        let mut by_customer: HashMap<i64, Vec<Order>> = HashMap::new();
        for order in orders {
            by_customer.entry(order.customer_id).or_default().push(order);
        }

        debug!(customers = customers.len(), "Customers loaded with orders");
        Ok(customers
            .into_iter()
            .map(|c| {
                let orders = by_customer.remove(&c.id).unwrap_or_default();
                (c, Some(orders))
            })
            .collect())
    }

    pub async fn get(&self, id: i64, with_orders: bool) -> ApiResult<(Customer, Option<Vec<Order>>)> {
        let customer = self.require(id).await?;

        if !with_orders {
            return Ok((customer, None));
        }

        let orders = self
            .db
            .orders()
            .list_for_customers(&[id])
            .await
            .with_operation("loading customer orders")?;
        Ok((customer, Some(orders)))
    }

    /// One page of a customer's orders, newest first.
    pub async fn orders_page(&self, id: i64, page: u32, page_size: u32) -> ApiResult<Page<Order>> {
        self.require(id).await?;

        self.db
            .orders()
            .page_for_customer(id, page, page_size)
            .await
            .with_operation("loading customer orders")
    }

    async fn require(&self, id: i64) -> ApiResult<Customer> {
        self.db
            .customers()
            .get_by_id(id)
            .await
            .with_operation("loading the customer")?
            .ok_or_else(|| ApiError::not_found(format!("Customer {id} not found")))
    }
}
