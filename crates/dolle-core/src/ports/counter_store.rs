//! Counter store port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Counter, CounterKey};
use crate::error::StoreError;

/// Persistent store of quota counters, one document per [`CounterKey`].
///
/// Every method must be atomic with respect to concurrent callers touching the
/// same key, including callers in other processes. Implementations get that
/// from the backend (scripts, conditional writes), not from an in-process lock,
/// unless the store itself only lives in one process.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Return the counter, creating it with `count = 0` and the given
    /// `reset_at` if it does not exist. Concurrent first calls converge on one
    /// document.
    async fn get_or_create(
        &self,
        key: &CounterKey,
        reset_at: DateTime<Utc>,
    ) -> Result<Counter, StoreError>;

    /// Add one to the count and return the updated counter.
    ///
    /// Fails with [`StoreError::Missing`] if the counter was never created.
    async fn increment(&self, key: &CounterKey) -> Result<Counter, StoreError>;

    /// Point read. Never creates.
    async fn get(&self, key: &CounterKey) -> Result<Option<Counter>, StoreError>;

    /// If the stored window has lapsed at `now`, set `count = 0` and
    /// `reset_at = next_reset_at`. Returns the counter as it is afterwards.
    async fn roll_over(
        &self,
        key: &CounterKey,
        now: DateTime<Utc>,
        next_reset_at: DateTime<Utc>,
    ) -> Result<Counter, StoreError>;
}
