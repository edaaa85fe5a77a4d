//! In-memory usage ledger.

use std::sync::Arc;

use async_trait::async_trait;
use futures::{StreamExt, stream};
use tokio::sync::RwLock;

use dolle_core::domain::{LedgerEntry, PortfolioFilter};
use dolle_core::ports::{LedgerStream, UsageLedger};
use dolle_core::StoreError;

/// Ledger kept in a `Vec`. Data is lost on process restart.
#[derive(Clone, Default)]
pub struct InMemoryUsageLedger {
    entries: Arc<RwLock<Vec<LedgerEntry>>>,
}

impl InMemoryUsageLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UsageLedger for InMemoryUsageLedger {
    async fn record(&self, entry: &LedgerEntry) -> Result<(), StoreError> {
        self.entries.write().await.push(entry.clone());
        Ok(())
    }

    fn find(&self, filter: PortfolioFilter) -> LedgerStream {
        let entries = self.entries.clone();

        // The snapshot is taken on first poll, not when the stream is built.
        stream::once(async move {
            let entries = entries.read().await;
            entries
                .iter()
                .filter(|entry| filter.matches(entry))
                .cloned()
                .map(Ok)
                .collect::<Vec<_>>()
        })
        .flat_map(stream::iter)
        .boxed()
    }
}
