//! Units of work behind the HTTP routes.
//!
//! Each service reads the rows it needs, asks `ream_core` for a plan, and
//! hands the plan to one repository write. Writes that are guarded by a
//! compare-and-set come back as [`Attempt::Stale`] when another caller got
//! there first, and [`retry_stale`] replans them with exponential backoff.

pub mod catalog_service;
pub mod customer_service;
pub mod health_service;
pub mod inventory_service;
pub mod order_service;

use std::future::Future;
use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use tracing::warn;

use crate::config::InventorySettings;
use crate::error::ApiResult;
use ream_core::CoreError;

pub use catalog_service::CatalogService;
pub use customer_service::CustomerService;
pub use health_service::HealthService;
pub use inventory_service::InventoryService;
pub use order_service::OrderService;

/// How often, and how patiently, a stale write is replanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    pub fn from_settings(settings: &InventorySettings) -> Self {
        RetryPolicy {
            max_retries: settings.max_write_retries,
            initial_backoff: settings.initial_backoff(),
            max_backoff: settings.max_backoff(),
        }
    }

    fn backoff(&self) -> ExponentialBackoff {
        let mut backoff = ExponentialBackoff {
            initial_interval: self.initial_backoff,
            max_interval: self.max_backoff,
            multiplier: 2.0,
            max_elapsed_time: None,
            ..Default::default()
        };
        backoff.reset();
        backoff
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::from_settings(&InventorySettings::default())
    }
}

/// Result of one plan-and-write pass.
#[derive(Debug)]
pub(crate) enum Attempt<T> {
    Done(T),
    /// The rows moved after they were read. Nothing was written.
    Stale,
}

/// Runs `attempt` until it completes, replanning stale writes.
///
/// Fails with `ConcurrentModification` once `max_retries` replans were
/// spent. Errors from `attempt` are returned immediately.
pub(crate) async fn retry_stale<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &'static str,
    mut attempt: F,
) -> ApiResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ApiResult<Attempt<T>>>,
{
    let mut backoff = policy.backoff();
    let mut retries = 0;

    loop {
        match attempt().await? {
            Attempt::Done(value) => return Ok(value),
            Attempt::Stale if retries >= policy.max_retries => {
                warn!(operation, retries, "Giving up after repeated concurrent modifications");
                return Err(CoreError::ConcurrentModification(format!(
                    "{operation} kept conflicting with other writes, try again"
                ))
                .into());
            }
            Attempt::Stale => {
                retries += 1;
                let delay = backoff.next_backoff().unwrap_or(policy.max_backoff);
                warn!(operation, retries, ?delay, "Rows changed since planning, retrying");
                tokio::time::sleep(delay).await;
            }
        }
    }
}
