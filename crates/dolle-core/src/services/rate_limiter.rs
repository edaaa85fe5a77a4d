//! Per-user and per-server weekly quotas.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::clock::Clock;
use crate::domain::{
    Counter, CounterKey, Decision, DenyReason, QuotaPolicy, WindowConfig, WindowRollover,
};
use crate::error::QuotaError;
use crate::ports::CounterStore;

/// Checks a request against both the server and the user quota and consumes
/// one unit of each when it passes.
pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
    policy: Arc<QuotaPolicy>,
    window: WindowConfig,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(
        store: Arc<dyn CounterStore>,
        policy: Arc<QuotaPolicy>,
        window: WindowConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            policy,
            window,
            clock,
        }
    }

    pub fn policy(&self) -> &QuotaPolicy {
        &self.policy
    }

    /// Server quota first, then user quota. Nothing is written on denial.
    ///
    /// The two increments are separate store operations: if the second one
    /// fails the server counter stays one ahead, which later calls tolerate.
    pub async fn check_and_consume(
        &self,
        user_id: &str,
        server_id: &str,
    ) -> Result<Decision, QuotaError> {
        let now = self.clock.now();
        let server_key = CounterKey::server(server_id);
        let user_key = CounterKey::user(user_id);

        let server = self.resolve(&server_key, now).await?;
        let user = self.resolve(&user_key, now).await?;

        let server_limit = self.policy.limit(&server_key);
        if server.exhausted(server_limit, now) {
            tracing::info!(
                server_id,
                user_id,
                count = server.count,
                limit = server_limit,
                "Server quota exhausted"
            );
            return Ok(Decision::Denied(DenyReason::Server));
        }

        let user_limit = self.policy.limit(&user_key);
        if user.exhausted(user_limit, now) {
            tracing::info!(
                server_id,
                user_id,
                count = user.count,
                limit = user_limit,
                "User quota exhausted"
            );
            return Ok(Decision::Denied(DenyReason::User));
        }

        let server = self.store.increment(&server_key).await?;
        let user = self.store.increment(&user_key).await?;

        tracing::debug!(
            server_id,
            user_id,
            server_count = server.count,
            user_count = user.count,
            "Quota consumed"
        );

        Ok(Decision::Allowed)
    }

    async fn resolve(&self, key: &CounterKey, now: DateTime<Utc>) -> Result<Counter, QuotaError> {
        let next_reset_at = now
            .checked_add_signed(self.window.length)
            .ok_or(QuotaError::WindowOverflow(self.window.length.num_seconds()))?;
        let counter = self.store.get_or_create(key, next_reset_at).await?;

        match self.window.rollover {
            WindowRollover::Reset if !counter.window_open(now) => {
                let counter = self.store.roll_over(key, now, next_reset_at).await?;
                tracing::debug!(key = %key, reset_at = %counter.reset_at, "Quota window rolled over");
                Ok(counter)
            }
            _ => Ok(counter),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::domain::Scope;
    use crate::services::fakes::{FailingStore, MemoryStore};
    use chrono::Duration;

    fn limiter(
        store: Arc<MemoryStore>,
        policy: QuotaPolicy,
        rollover: WindowRollover,
        clock: Arc<ManualClock>,
    ) -> RateLimiter {
        let window = WindowConfig {
            length: Duration::days(7),
            rollover,
        };
        RateLimiter::new(store, Arc::new(policy), window, clock)
    }

    fn setup(rollover: WindowRollover) -> (RateLimiter, Arc<MemoryStore>, Arc<ManualClock>) {
        let store = Arc::new(MemoryStore::default());
        let clock = Arc::new(ManualClock::default());
        let limiter = limiter(store.clone(), QuotaPolicy::default(), rollover, clock.clone());
        (limiter, store, clock)
    }

    #[tokio::test]
    async fn test_first_call_creates_and_consumes() {
        let (limiter, store, clock) = setup(WindowRollover::Reset);

        let decision = limiter.check_and_consume("u1", "s1").await.unwrap();
        assert_eq!(decision, Decision::Allowed);

        let user = store.snapshot(&CounterKey::user("u1")).unwrap();
        assert_eq!(user.count, 1);
        assert_eq!(user.reset_at, clock.now() + Duration::days(7));
        assert_eq!(store.snapshot(&CounterKey::server("s1")).unwrap().count, 1);
    }

    #[tokio::test]
    async fn test_eleventh_call_is_denied_for_user() {
        let (limiter, store, _clock) = setup(WindowRollover::Reset);

        for _ in 0..10 {
            assert!(limiter.check_and_consume("u1", "s1").await.unwrap().is_allowed());
        }
        let decision = limiter.check_and_consume("u1", "s1").await.unwrap();

        assert_eq!(decision, Decision::Denied(DenyReason::User));
        assert_eq!(decision_message(decision), "User rate limit exceeded.");
        assert_eq!(store.snapshot(&CounterKey::user("u1")).unwrap().count, 10);
        assert_eq!(store.snapshot(&CounterKey::server("s1")).unwrap().count, 10);
    }

    #[tokio::test]
    async fn test_user_override_raises_limit() {
        let store = Arc::new(MemoryStore::default());
        let clock = Arc::new(ManualClock::default());
        let policy = QuotaPolicy::new(10, 100).with_user_override("vip", 40);
        let limiter = limiter(store.clone(), policy, WindowRollover::Reset, clock);

        for _ in 0..40 {
            assert!(limiter.check_and_consume("vip", "s1").await.unwrap().is_allowed());
        }
        assert_eq!(
            limiter.check_and_consume("vip", "s1").await.unwrap(),
            Decision::Denied(DenyReason::User)
        );
    }

    #[tokio::test]
    async fn test_server_is_checked_before_user() {
        let store = Arc::new(MemoryStore::default());
        let clock = Arc::new(ManualClock::default());
        let policy = QuotaPolicy::new(10, 2);
        let limiter = limiter(store.clone(), policy, WindowRollover::Reset, clock.clone());

        limiter.check_and_consume("a", "s1").await.unwrap();
        limiter.check_and_consume("b", "s1").await.unwrap();
        let decision = limiter.check_and_consume("c", "s1").await.unwrap();

        assert_eq!(decision, Decision::Denied(DenyReason::Server));
        // Neither counter moves on a server denial.
        let server = store.snapshot(&CounterKey::server("s1")).unwrap();
        assert_eq!(server.count, 2);
        let user = store.snapshot(&CounterKey::user("c")).unwrap();
        assert_eq!(user.count, 0);
        assert_eq!(user.reset_at, clock.now() + Duration::days(7));

        let again = limiter.check_and_consume("c", "s1").await.unwrap();
        assert_eq!(again, Decision::Denied(DenyReason::Server));
        assert_eq!(store.snapshot(&CounterKey::server("s1")).unwrap().count, 2);
        assert_eq!(store.snapshot(&CounterKey::user("c")).unwrap(), user);
    }

    #[tokio::test]
    async fn test_reset_rollover_starts_new_window() {
        let (limiter, store, clock) = setup(WindowRollover::Reset);
        for _ in 0..10 {
            limiter.check_and_consume("u1", "s1").await.unwrap();
        }

        clock.advance(Duration::days(7));
        let decision = limiter.check_and_consume("u1", "s1").await.unwrap();

        assert_eq!(decision, Decision::Allowed);
        let user = store.snapshot(&CounterKey::user("u1")).unwrap();
        assert_eq!(user.count, 1);
        assert_eq!(user.reset_at, clock.now() + Duration::days(7));
    }

    #[tokio::test]
    async fn test_carry_rollover_keeps_counting() {
        let (limiter, store, clock) = setup(WindowRollover::Carry);
        for _ in 0..10 {
            limiter.check_and_consume("u1", "s1").await.unwrap();
        }
        let original_reset = store.snapshot(&CounterKey::user("u1")).unwrap().reset_at;

        clock.advance(Duration::days(8));
        assert!(limiter.check_and_consume("u1", "s1").await.unwrap().is_allowed());
        assert!(limiter.check_and_consume("u1", "s1").await.unwrap().is_allowed());

        let user = store.snapshot(&CounterKey::user("u1")).unwrap();
        assert_eq!(user.count, 12);
        assert_eq!(user.reset_at, original_reset);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_calls_share_one_counter() {
        let store = Arc::new(MemoryStore::default());
        let clock = Arc::new(ManualClock::default());
        let policy = QuotaPolicy::new(10, 1_000);
        let limiter = Arc::new(limiter(store.clone(), policy, WindowRollover::Reset, clock));

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let limiter = limiter.clone();
                tokio::spawn(async move { limiter.check_and_consume("fresh", "s1").await })
            })
            .collect();

        let mut allowed = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap().is_allowed() {
                allowed += 1;
            }
        }

        assert_eq!(store.count_scope(Scope::User), 1);
        assert_eq!(store.snapshot(&CounterKey::user("fresh")).unwrap().count, allowed);
        assert_eq!(store.creations(), 2);
    }

    #[tokio::test]
    async fn test_store_failure_is_not_allowed() {
        let limiter = RateLimiter::new(
            Arc::new(FailingStore),
            Arc::new(QuotaPolicy::default()),
            WindowConfig::default(),
            Arc::new(ManualClock::default()),
        );

        let result = limiter.check_and_consume("u1", "s1").await;
        assert!(matches!(result, Err(QuotaError::Store(_))));
    }

    #[tokio::test]
    async fn test_window_past_calendar_end_is_an_error() {
        let store = Arc::new(MemoryStore::default());
        let window = WindowConfig {
            length: Duration::seconds(10_000_000_000_000),
            rollover: WindowRollover::Reset,
        };
        let limiter = RateLimiter::new(
            store.clone(),
            Arc::new(QuotaPolicy::default()),
            window,
            Arc::new(ManualClock::default()),
        );

        let result = limiter.check_and_consume("u1", "s1").await;
        assert!(matches!(result, Err(QuotaError::WindowOverflow(10_000_000_000_000))));
        assert_eq!(store.creations(), 0);
    }

    fn decision_message(decision: Decision) -> String {
        match decision {
            Decision::Denied(reason) => reason.to_string(),
            Decision::Allowed => String::new(),
        }
    }
}
