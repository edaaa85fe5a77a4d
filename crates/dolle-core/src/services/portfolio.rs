//! Portfolio lookups over the usage ledger.

use std::sync::Arc;

use crate::domain::PortfolioQuery;
use crate::error::QuotaError;
use crate::ports::{LedgerStream, UsageLedger};

pub struct PortfolioService {
    ledger: Arc<dyn UsageLedger>,
}

impl PortfolioService {
    pub fn new(ledger: Arc<dyn UsageLedger>) -> Self {
        Self { ledger }
    }

    /// Images generated by `user_id`, narrowed by the command modifiers.
    ///
    /// `server_name` and `channel_name` are where the command was issued and
    /// only matter for the `-same-*` modifiers.
    pub fn lookup<S: AsRef<str>>(
        &self,
        user_id: &str,
        server_name: &str,
        channel_name: &str,
        args: &[S],
    ) -> Result<LedgerStream, QuotaError> {
        let query = PortfolioQuery::parse(args)?;
        let filter = query.resolve(user_id, server_name, channel_name);
        tracing::debug!(?filter, "Portfolio lookup");
        Ok(self.ledger.find(filter))
    }
}
