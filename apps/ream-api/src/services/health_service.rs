//! Liveness of the store.

use tracing::warn;

use ream_db::Database;

#[derive(Debug, Clone)]
pub struct HealthService {
    db: Database,
}

impl HealthService {
    pub fn new(db: Database) -> Self {
        HealthService { db }
    }

    /// True when the store answers a trivial query.
    pub async fn is_healthy(&self) -> bool {
        let healthy = self.db.health_check().await;
        if !healthy {
            warn!("Database health check failed");
        }
        healthy
    }
}
