//! # Store Handle
//!
//! Opens the storefront's SQLite store and hands out repositories.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Storefront Store                                │
//! │                                                                         │
//! │  DbConfig::new("ream.db")                                              │
//! │      .max_connections(8)                                               │
//! │      .busy_timeout(5s)                                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::new(config) ──► SqlitePool ──► migrations/sqlite            │
//! │       │                                                                 │
//! │       ├── papers()      catalog reads, stock compare-and-set           │
//! │       ├── properties()  tags + counts                                  │
//! │       ├── customers()   customer records                               │
//! │       └── orders()      order transactions, status compare-and-set     │
//! │                                                                         │
//! │  Each HTTP request borrows one pooled connection per statement or      │
//! │  transaction:                                                           │
//! │    GET   /api/Paper          read    (never blocked by writers: WAL)   │
//! │    POST  /api/Order          write   (queues on the write lock)        │
//! │    PATCH /api/Paper/restock  write   (queues on the write lock)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! SQLite admits a single writer. `busy_timeout` turns lock contention into a
//! wait rather than an immediate `SQLITE_BUSY`.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::customer::CustomerRepository;
use crate::repository::order::OrderRepository;
use crate::repository::paper::PaperRepository;
use crate::repository::property::PropertyRepository;

const IN_MEMORY: &str = ":memory:";

// =============================================================================
// Configuration
// =============================================================================

/// How to open the store.
///
/// ```rust,ignore
/// let db = Database::new(DbConfig::new("ream.db").max_connections(8)).await?;
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Store file, or `:memory:` for a private throwaway store.
    pub path: PathBuf,

    /// Pool ceiling. Default 5.
    pub max_connections: u32,

    /// Connections opened eagerly and kept warm. Default 1.
    pub min_connections: u32,

    /// Wait for a free pooled connection. Default 30s.
    pub acquire_timeout: Duration,

    /// Wait for SQLite's write lock. Default 5s.
    pub busy_timeout: Duration,

    /// `None` never reaps idle connections.
    pub idle_timeout: Option<Duration>,

    /// Apply embedded migrations on open. Default true.
    pub run_migrations: bool,
}

impl DbConfig {
    /// File-backed store at `path`; the file is created when missing.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            path: path.into(),
            max_connections: 5,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(30),
            busy_timeout: Duration::from_secs(5),
            idle_timeout: Some(Duration::from_secs(600)),
            run_migrations: true,
        }
    }

    /// Private store living only as long as the pool.
    ///
    /// Each `:memory:` connection is its own database, so the pool holds
    /// exactly one connection and never lets it idle out.
    pub fn in_memory() -> Self {
        DbConfig {
            path: PathBuf::from(IN_MEMORY),
            max_connections: 1,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(5),
            busy_timeout: Duration::from_secs(5),
            idle_timeout: None,
            run_migrations: true,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str() == IN_MEMORY
    }

    /// Per-connection pragmas: WAL for files, foreign keys and busy wait
    /// everywhere.
    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        let base = if self.is_in_memory() {
            SqliteConnectOptions::from_str("sqlite::memory:")
        } else {
            SqliteConnectOptions::from_str(&format!("sqlite://{}", self.path.display()))
                .map(|opts| opts.journal_mode(SqliteJournalMode::Wal).create_if_missing(true))
        }
        .map_err(|e| DbError::Unavailable(e.to_string()))?;

        Ok(base
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(self.busy_timeout))
    }
}

// =============================================================================
// Database
// =============================================================================

/// Shared handle to the store. Clones share one pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the pool and, unless disabled, brings the schema up to date.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(path = %config.path.display(), "Opening store");

        let options = config.connect_options()?;
        debug!(in_memory = config.is_in_memory(), "Store options ready");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout)
            .idle_timeout(config.idle_timeout)
            .connect_with(options)
            .await
            .map_err(|e| DbError::Unavailable(e.to_string()))?;

        info!(max_connections = config.max_connections, "Store pool open");

        let db = Database { pool };
        if config.run_migrations {
            db.run_migrations().await?;
        }
        Ok(db)
    }

    /// Applies pending migrations. Safe to call repeatedly.
    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn papers(&self) -> PaperRepository {
        PaperRepository::new(self.pool.clone())
    }

    pub fn properties(&self) -> PropertyRepository {
        PropertyRepository::new(self.pool.clone())
    }

    pub fn customers(&self) -> CustomerRepository {
        CustomerRepository::new(self.pool.clone())
    }

    pub fn orders(&self) -> OrderRepository {
        OrderRepository::new(self.pool.clone())
    }

    /// Waits for in-flight statements, then closes every connection.
    pub async fn close(&self) {
        info!("Closing store");
        self.pool.close().await;
    }

    /// `SELECT 1` round trip.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_store_is_migrated() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(db.health_check().await);

        let (total, applied) = migrations::migration_status(db.pool()).await.unwrap();
        assert_eq!(total, applied);
    }

    #[tokio::test]
    async fn test_closed_store_is_unhealthy() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.close().await;
        assert!(!db.health_check().await);
    }

    #[test]
    fn test_builder_overrides_defaults() {
        let config = DbConfig::new("ream-test.db")
            .max_connections(10)
            .min_connections(2)
            .acquire_timeout(Duration::from_secs(2))
            .busy_timeout(Duration::from_secs(1))
            .run_migrations(false);

        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 2);
        assert_eq!(config.acquire_timeout, Duration::from_secs(2));
        assert_eq!(config.busy_timeout, Duration::from_secs(1));
        assert!(!config.run_migrations);
        assert!(!config.is_in_memory());
        assert!(DbConfig::in_memory().is_in_memory());
    }
}
