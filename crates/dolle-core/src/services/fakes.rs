//! Test doubles for the ports.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use futures::stream;

use crate::domain::{Counter, CounterKey, LedgerEntry, PortfolioFilter, Scope};
use crate::error::{ProviderError, StoreError};
use crate::ports::{
    ArtifactRelay, CounterStore, Destination, ImageGenerator, LedgerStream, UsageLedger,
};

/// Counter store holding documents behind one mutex. Yields before every
/// operation so concurrent callers interleave.
#[derive(Default)]
pub struct MemoryStore {
    counters: Mutex<HashMap<CounterKey, Counter>>,
    creations: AtomicUsize,
}

impl MemoryStore {
    pub fn snapshot(&self, key: &CounterKey) -> Option<Counter> {
        self.counters.lock().unwrap().get(key).cloned()
    }

    pub fn count_scope(&self, scope: Scope) -> usize {
        self.counters
            .lock()
            .unwrap()
            .keys()
            .filter(|k| k.scope == scope)
            .count()
    }

    pub fn creations(&self) -> usize {
        self.creations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CounterStore for MemoryStore {
    async fn get_or_create(
        &self,
        key: &CounterKey,
        reset_at: DateTime<Utc>,
    ) -> Result<Counter, StoreError> {
        tokio::task::yield_now().await;
        let mut counters = self.counters.lock().unwrap();
        let counter = counters.entry(key.clone()).or_insert_with(|| {
            self.creations.fetch_add(1, Ordering::SeqCst);
            Counter {
                key: key.clone(),
                count: 0,
                reset_at,
            }
        });
        Ok(counter.clone())
    }

    async fn increment(&self, key: &CounterKey) -> Result<Counter, StoreError> {
        tokio::task::yield_now().await;
        let mut counters = self.counters.lock().unwrap();
        let counter = counters
            .get_mut(key)
            .ok_or_else(|| StoreError::Missing(key.storage_key()))?;
        counter.count += 1;
        Ok(counter.clone())
    }

    async fn get(&self, key: &CounterKey) -> Result<Option<Counter>, StoreError> {
        tokio::task::yield_now().await;
        Ok(self.snapshot(key))
    }

    async fn roll_over(
        &self,
        key: &CounterKey,
        now: DateTime<Utc>,
        next_reset_at: DateTime<Utc>,
    ) -> Result<Counter, StoreError> {
        tokio::task::yield_now().await;
        let mut counters = self.counters.lock().unwrap();
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

/// Store whose backend is always unreachable.
pub struct FailingStore;

#[async_trait]
impl CounterStore for FailingStore {
    async fn get_or_create(&self, _: &CounterKey, _: DateTime<Utc>) -> Result<Counter, StoreError> {
        Err(StoreError::Connection("connection refused".into()))
    }

    async fn increment(&self, _: &CounterKey) -> Result<Counter, StoreError> {
        Err(StoreError::Connection("connection refused".into()))
    }

    async fn get(&self, _: &CounterKey) -> Result<Option<Counter>, StoreError> {
        Err(StoreError::Connection("connection refused".into()))
    }

    async fn roll_over(
        &self,
        _: &CounterKey,
        _: DateTime<Utc>,
        _: DateTime<Utc>,
    ) -> Result<Counter, StoreError> {
        Err(StoreError::Connection("connection refused".into()))
    }
}

#[derive(Default)]
pub struct MemoryLedger {
    entries: Mutex<Vec<LedgerEntry>>,
}

impl MemoryLedger {
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

#[async_trait]
impl UsageLedger for MemoryLedger {
    async fn record(&self, entry: &LedgerEntry) -> Result<(), StoreError> {
        self.entries.lock().unwrap().push(entry.clone());
        Ok(())
    }

    fn find(&self, filter: PortfolioFilter) -> LedgerStream {
        let matching: Vec<_> = self
            .entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .map(Ok)
            .collect();
        stream::iter(matching).boxed()
    }
}

/// Generator returning a fixed payload or a fixed error.
pub struct StubGenerator {
    pub error: Option<String>,
    pub calls: AtomicUsize,
}

impl StubGenerator {
    pub fn ok() -> Self {
        Self {
            error: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            error: Some(message.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageGenerator for StubGenerator {
    async fn generate(&self, _prompt: &str) -> Result<Vec<u8>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.error {
            Some(message) => Err(ProviderError::Response(message.clone())),
            None => Ok(b"\x89PNG".to_vec()),
        }
    }
}

/// Relay that "uploads" to a fake CDN.
pub struct StubRelay;

#[async_trait]
impl ArtifactRelay for StubRelay {
    async fn relay(
        &self,
        destination: &Destination,
        filename: &str,
        _bytes: Vec<u8>,
    ) -> Result<String, ProviderError> {
        Ok(format!(
            "https://cdn.test/{}/{}",
            destination.channel_name, filename
        ))
    }
}
