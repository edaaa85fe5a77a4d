//! In-memory counter store - used as fallback when Redis is unavailable.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use dolle_core::domain::{Counter, CounterKey};
use dolle_core::ports::CounterStore;
use dolle_core::StoreError;

/// Counters in a `HashMap` behind an async `RwLock`.
///
/// Every mutation holds the write lock, so operations are atomic within this
/// process. Counts are lost on restart and not shared between processes.
pub struct InMemoryCounterStore {
    counters: RwLock<HashMap<CounterKey, Counter>>,
}

impl InMemoryCounterStore {
    pub fn new() -> Self {
        Self {
            counters: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryCounterStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CounterStore for InMemoryCounterStore {
    async fn get_or_create(
        &self,
        key: &CounterKey,
        reset_at: DateTime<Utc>,
    ) -> Result<Counter, StoreError> {
        let mut counters = self.counters.write().await;
        let counter = counters.entry(key.clone()).or_insert_with(|| Counter {
            key: key.clone(),
            count: 0,
            reset_at,
        });
        Ok(counter.clone())
    }

    async fn increment(&self, key: &CounterKey) -> Result<Counter, StoreError> {
        let mut counters = self.counters.write().await;
        let counter = counters
            .get_mut(key)
            .ok_or_else(|| StoreError::Missing(key.storage_key()))?;
        counter.count += 1;
        Ok(counter.clone())
    }

    async fn get(&self, key: &CounterKey) -> Result<Option<Counter>, StoreError> {
        let counters = self.counters.read().await;
        Ok(counters.get(key).cloned())
    }

    async fn roll_over(
        &self,
        key: &CounterKey,
        now: DateTime<Utc>,
        next_reset_at: DateTime<Utc>,
    ) -> Result<Counter, StoreError> {
        let mut counters = self.counters.write().await;
        let counter = counters
            .get_mut(key)
            .ok_or_else(|| StoreError::Missing(key.storage_key()))?;
        if !counter.window_open(now) {
            counter.count = 0;
            counter.reset_at = next_reset_at;
        }
        Ok(counter.clone())
    }
}
