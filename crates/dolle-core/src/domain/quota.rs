use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::counter::{Counter, CounterKey, Scope};

pub const DEFAULT_USER_LIMIT: u64 = 10;
pub const DEFAULT_SERVER_LIMIT: u64 = 20;
/// One week.
pub const DEFAULT_WINDOW_SECS: i64 = 604_800;

/// Per-scope limits with per-id overrides.
///
/// Built once from configuration at startup and shared read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaPolicy {
    pub default_user_limit: u64,
    pub default_server_limit: u64,
    pub user_overrides: HashMap<String, u64>,
    pub server_overrides: HashMap<String, u64>,
}

impl Default for QuotaPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_USER_LIMIT, DEFAULT_SERVER_LIMIT)
    }
}

impl QuotaPolicy {
    pub fn new(default_user_limit: u64, default_server_limit: u64) -> Self {
        Self {
            default_user_limit,
            default_server_limit,
            user_overrides: HashMap::new(),
            server_overrides: HashMap::new(),
        }
    }

    pub fn with_user_override(mut self, user_id: impl Into<String>, limit: u64) -> Self {
        self.user_overrides.insert(user_id.into(), limit);
        self
    }

    pub fn with_server_override(mut self, server_id: impl Into<String>, limit: u64) -> Self {
        self.server_overrides.insert(server_id.into(), limit);
        self
    }

    /// Effective limit for a counter: the override if one exists, else the scope default.
    pub fn limit(&self, key: &CounterKey) -> u64 {
        let (overrides, default) = match key.scope {
            Scope::User => (&self.user_overrides, self.default_user_limit),
            Scope::Server => (&self.server_overrides, self.default_server_limit),
        };
        overrides.get(&key.id).copied().unwrap_or(default)
    }
}

/// What happens to a counter whose window has lapsed when it is next checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowRollover {
    /// Start a new window: count back to zero, `reset_at` moved one window past now.
    #[default]
    Reset,
    /// Let the check pass but keep counting in the old document. Counts grow
    /// across windows and `reset_at` never moves.
    Carry,
}

impl FromStr for WindowRollover {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reset" => Ok(WindowRollover::Reset),
            "carry" => Ok(WindowRollover::Carry),
            other => Err(format!("unknown rollover mode '{other}' (expected reset or carry)")),
        }
    }
}

/// Quota window length and rollover behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowConfig {
    pub length: Duration,
    pub rollover: WindowRollover,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            length: Duration::seconds(DEFAULT_WINDOW_SECS),
            rollover: WindowRollover::default(),
        }
    }
}

/// Which quota turned a request away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DenyReason {
    Server,
    User,
}

impl DenyReason {
    pub fn scope(&self) -> Scope {
        match self {
            DenyReason::Server => Scope::Server,
            DenyReason::User => Scope::User,
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenyReason::Server => f.write_str("Server rate limit exceeded."),
            DenyReason::User => f.write_str("User rate limit exceeded."),
        }
    }
}

/// Outcome of a quota check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Denied(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed)
    }
}

/// Read-only projection of a counter against its limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageSummary {
    pub key: CounterKey,
    pub count: u64,
    pub limit: u64,
    pub remaining: u64,
    /// Seconds until `reset_at`; negative once the window has lapsed.
    pub seconds_left: i64,
}

impl UsageSummary {
    pub fn from_counter(counter: &Counter, limit: u64, now: DateTime<Utc>) -> Self {
        Self {
            key: counter.key.clone(),
            count: counter.count,
            limit,
            remaining: limit.saturating_sub(counter.count),
            seconds_left: (counter.reset_at - now).num_seconds(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_wins_over_default() {
        let policy = QuotaPolicy::default()
            .with_user_override("317413000548188160", 40)
            .with_server_override("1229813598033936445", 40);

        assert_eq!(policy.limit(&CounterKey::user("317413000548188160")), 40);
        assert_eq!(policy.limit(&CounterKey::user("42")), DEFAULT_USER_LIMIT);
        assert_eq!(policy.limit(&CounterKey::server("1229813598033936445")), 40);
        assert_eq!(policy.limit(&CounterKey::server("42")), DEFAULT_SERVER_LIMIT);
    }

    #[test]
    fn test_override_is_scoped() {
        let policy = QuotaPolicy::default().with_user_override("7", 99);
        assert_eq!(policy.limit(&CounterKey::server("7")), DEFAULT_SERVER_LIMIT);
    }

    #[test]
    fn test_summary_clamps_remaining_but_not_time() {
        let now = Utc::now();
        let counter = Counter {
            key: CounterKey::user("u"),
            count: 12,
            reset_at: now - Duration::seconds(30),
        };
        let summary = UsageSummary::from_counter(&counter, 10, now);
        assert_eq!(summary.remaining, 0);
        assert_eq!(summary.seconds_left, -30);
    }

    #[test]
    fn test_rollover_parse() {
        assert_eq!("Carry".parse::<WindowRollover>(), Ok(WindowRollover::Carry));
        assert_eq!("reset".parse::<WindowRollover>(), Ok(WindowRollover::Reset));
        assert!("sliding".parse::<WindowRollover>().is_err());
    }

    #[test]
    fn test_deny_reason_messages() {
        assert_eq!(DenyReason::User.to_string(), "User rate limit exceeded.");
        assert_eq!(DenyReason::Server.to_string(), "Server rate limit exceeded.");
    }
}
