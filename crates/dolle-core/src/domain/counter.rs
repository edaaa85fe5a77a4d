use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Which kind of entity a counter belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    User,
    Server,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::User => "user",
            Scope::Server => "server",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Composite counter key.
///
/// User ids and server ids share one string space on the chat platform, so the
/// scope is always part of the stored key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CounterKey {
    pub scope: Scope,
    pub id: String,
}

impl CounterKey {
    pub fn new(scope: Scope, id: impl Into<String>) -> Self {
        Self {
            scope,
            id: id.into(),
        }
    }

    pub fn user(id: impl Into<String>) -> Self {
        Self::new(Scope::User, id)
    }

    pub fn server(id: impl Into<String>) -> Self {
        Self::new(Scope::Server, id)
    }

    /// Key under which the counter document is persisted, e.g. `user:1234`.
    pub fn storage_key(&self) -> String {
        format!("{}:{}", self.scope, self.id)
    }
}

impl fmt::Display for CounterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.scope, self.id)
    }
}

/// Usage counter for one user or server within the current window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counter {
    pub key: CounterKey,
    pub count: u64,
    pub reset_at: DateTime<Utc>,
}

impl Counter {
    /// A counter as first created: nothing consumed, window ending `window` from now.
    pub fn fresh(key: CounterKey, now: DateTime<Utc>, window: Duration) -> Self {
        Self {
            key,
            count: 0,
            reset_at: now + window,
        }
    }

    /// True while `now` is still inside this counter's window.
    pub fn window_open(&self, now: DateTime<Utc>) -> bool {
        now < self.reset_at
    }

    /// True when the limit is reached and the window has not lapsed yet.
    pub fn exhausted(&self, limit: u64, now: DateTime<Utc>) -> bool {
        self.count >= limit && self.window_open(now)
    }
}
