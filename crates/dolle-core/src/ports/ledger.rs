//! Usage ledger port.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::domain::{LedgerEntry, PortfolioFilter};
use crate::error::StoreError;

/// Lazy, finite sequence of ledger entries.
pub type LedgerStream = BoxStream<'static, Result<LedgerEntry, StoreError>>;

/// Append-only log of completed generations.
#[async_trait]
pub trait UsageLedger: Send + Sync {
    /// Append an entry. Appends are independent of each other.
    async fn record(&self, entry: &LedgerEntry) -> Result<(), StoreError>;

    /// Stream every entry matching `filter`, each exactly once, in store order.
    ///
    /// Each call starts a fresh scan, so the query can be repeated.
    fn find(&self, filter: PortfolioFilter) -> LedgerStream;
}
