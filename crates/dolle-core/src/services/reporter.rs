//! Usage summaries for `usage` and `server_usage` style queries.

use std::sync::Arc;

use crate::clock::Clock;
use crate::domain::{CounterKey, QuotaPolicy, UsageSummary};
use crate::error::QuotaError;
use crate::ports::CounterStore;

/// Read-only view of the quota counters.
pub struct QuotaReporter {
    store: Arc<dyn CounterStore>,
    policy: Arc<QuotaPolicy>,
    clock: Arc<dyn Clock>,
}

impl QuotaReporter {
    pub fn new(
        store: Arc<dyn CounterStore>,
        policy: Arc<QuotaPolicy>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            policy,
            clock,
        }
    }

    /// Summary for `key`, or `None` if the entity never used the bot.
    /// Does not create counters.
    pub async fn report(&self, key: &CounterKey) -> Result<Option<UsageSummary>, QuotaError> {
        let Some(counter) = self.store.get(key).await? else {
            return Ok(None);
        };

        let limit = self.policy.limit(key);
        Ok(Some(UsageSummary::from_counter(&counter, limit, self.clock.now())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::domain::{WindowConfig, WindowRollover};
    use crate::services::RateLimiter;
    use crate::services::fakes::MemoryStore;
    use chrono::Duration;

    #[tokio::test]
    async fn test_unused_entity_has_no_summary() {
        let store = Arc::new(MemoryStore::default());
        let reporter = QuotaReporter::new(
            store.clone(),
            Arc::new(QuotaPolicy::default()),
            Arc::new(ManualClock::default()),
        );

        assert_eq!(reporter.report(&CounterKey::user("nobody")).await.unwrap(), None);
        assert!(store.snapshot(&CounterKey::user("nobody")).is_none());
    }

    #[tokio::test]
    async fn test_report_after_usage_is_stable() {
        let store = Arc::new(MemoryStore::default());
        let clock = Arc::new(ManualClock::default());
        let policy = Arc::new(QuotaPolicy::default());
        let window = WindowConfig {
            length: Duration::days(7),
            rollover: WindowRollover::Reset,
        };
        let limiter = RateLimiter::new(store.clone(), policy.clone(), window, clock.clone());
        let reporter = QuotaReporter::new(store, policy, clock.clone());

        for _ in 0..3 {
            limiter.check_and_consume("u1", "s1").await.unwrap();
        }
        clock.advance(Duration::hours(1));

        let first = reporter.report(&CounterKey::user("u1")).await.unwrap().unwrap();
        let second = reporter.report(&CounterKey::user("u1")).await.unwrap().unwrap();

        assert_eq!(first, second);
        assert_eq!(first.count, 3);
        assert_eq!(first.limit, 10);
        assert_eq!(first.remaining, 7);
        assert_eq!(first.seconds_left, Duration::days(7).num_seconds() - 3600);

        let server = reporter.report(&CounterKey::server("s1")).await.unwrap().unwrap();
        assert_eq!(server.remaining, 17);
    }
}
