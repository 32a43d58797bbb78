//! # Ream API
//!
//! HTTP server for the paper storefront: catalog, stock and orders.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           Ream API                                      │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │ /api/Paper     │  │ /api/Order     │  │ /api/Customer              ││
//! │  │                │  │                │  │                            ││
//! │  │ • list/filter  │  │ • create       │  │ • list (+orders)           ││
//! │  │ • create       │  │ • get          │  │ • get (+orders)            ││
//! │  │ • properties   │  │ • status (1/n) │  │ • paged orders             ││
//! │  │ • restock      │  │                │  │                            ││
//! │  │ • discontinue  │  │                │  │                            ││
//! │  └───────┬────────┘  └───────┬────────┘  └─────────────┬──────────────┘│
//! │          ▼                   ▼                         ▼               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Services: Catalog • Inventory • Order • Customer • Health       │  │
//! │  │  plan with ream-core, write with ream-db, retry stale writes     │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                 │                                       │
//! │                                 ▼                                       │
//! │                         SQLite (ream-db)                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! See [`config`]. Environment variables:
//! - `REAM_CONFIG` - Path to a TOML config file
//! - `REAM_BIND_ADDR` - Listen address (default: 0.0.0.0:8080)
//! - `REAM_DB_PATH` - SQLite file (default: ream.db)
//! - `REAM_DB_MAX_CONNECTIONS` - Pool size (default: 5)
//! - `REAM_MAX_WRITE_RETRIES` - Replans after a conflicting write (default: 3)
//! - `REAM_DELIVERY_DAYS` - Days until delivery (default: 3)
//! - `RUST_LOG` - Log filter (default: info,ream=debug,sqlx=warn)

pub mod config;
pub mod dto;
pub mod error;
pub mod routes;
pub mod services;

use std::sync::Arc;

use ream_db::{Database, DbConfig, DbResult};

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::router;

use crate::services::{
    CatalogService, CustomerService, HealthService, InventoryService, OrderService, RetryPolicy,
};

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<ApiConfig>,
}

impl AppState {
    pub fn new(db: Database, config: ApiConfig) -> Self {
        AppState {
            db,
            config: Arc::new(config),
        }
    }

    /// Opens the database described by `config` and builds the state.
    pub async fn connect(config: ApiConfig) -> DbResult<Self> {
        let db_config = DbConfig::new(config.database.path.clone());
        let db_config = if db_config.is_in_memory() {
            DbConfig::in_memory()
        } else {
            db_config.max_connections(config.database.max_connections)
        };
        let db = Database::new(db_config).await?;
        Ok(AppState::new(db, config))
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from_settings(&self.config.inventory)
    }

    pub fn catalog(&self) -> CatalogService {
        CatalogService::new(self.db.clone())
    }

    pub fn inventory(&self) -> InventoryService {
        InventoryService::new(self.db.clone(), self.retry_policy())
    }

    pub fn orders(&self) -> OrderService {
        OrderService::new(
            self.db.clone(),
            self.retry_policy(),
            self.config.inventory.delivery_days,
        )
    }

    pub fn customers(&self) -> CustomerService {
        CustomerService::new(self.db.clone())
    }

    pub fn health(&self) -> HealthService {
        HealthService::new(self.db.clone())
    }
}
