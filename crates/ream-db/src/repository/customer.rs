//! # Customer Repository
//!
//! Customers are effectively append-only. There is no HTTP endpoint that
//! creates them; the seed binary and tests use [`CustomerRepository::insert`].

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use ream_core::{Customer, NewCustomer};

const CUSTOMER_COLUMNS: &str = "id, name, address, phone, email";

#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// All customers ordered by id.
    pub async fn list(&self) -> DbResult<Vec<Customer>> {
        let customers = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }

    /// Gets a customer by id.
    ///
    /// ## Returns
    /// * `Ok(Some(Customer))` - Customer found
    /// * `Ok(None)` - Customer not found
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    pub async fn exists(&self, id: i64) -> DbResult<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT id FROM customers WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(found.is_some())
    }

    /// Inserts a customer and returns it with its assigned id.
    pub async fn insert(&self, customer: &NewCustomer) -> DbResult<Customer> {
        debug!(name = %customer.name, "Inserting customer");

        let id = sqlx::query(
            "INSERT INTO customers (name, address, phone, email) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&customer.name)
        .bind(&customer.address)
        .bind(&customer.phone)
        .bind(&customer.email)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        Ok(Customer {
            id,
            name: customer.name.clone(),
            address: customer.address.clone(),
            phone: customer.phone.clone(),
            email: customer.email.clone(),
        })
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_insert_and_fetch() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let ada = db
            .customers()
            .insert(&NewCustomer {
                name: "Ada Stationers".to_string(),
                email: Some("orders@ada.example".to_string()),
                ..NewCustomer::default()
            })
            .await
            .unwrap();

        assert_eq!(db.customers().get_by_id(ada.id).await.unwrap(), Some(ada.clone()));
        assert!(db.customers().exists(ada.id).await.unwrap());
        assert!(!db.customers().exists(ada.id + 1).await.unwrap());
        assert_eq!(db.customers().get_by_id(404).await.unwrap(), None);
        assert_eq!(db.customers().list().await.unwrap(), vec![ada]);
        assert_eq!(db.customers().count().await.unwrap(), 1);
    }
}
