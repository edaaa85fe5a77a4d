//! Domain entities - counters, quota policy, ledger entries, portfolio queries.

mod counter;
mod ledger;
mod portfolio;
mod quota;

pub use counter::{Counter, CounterKey, Scope};
pub use ledger::LedgerEntry;
pub use portfolio::{ChannelSelector, PortfolioFilter, PortfolioQuery, ServerSelector};
pub use quota::{
    Decision, DenyReason, QuotaPolicy, UsageSummary, WindowConfig, WindowRollover,
    DEFAULT_SERVER_LIMIT, DEFAULT_USER_LIMIT, DEFAULT_WINDOW_SECS,
};
