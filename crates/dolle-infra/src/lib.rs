//! # Dolle Infrastructure
//!
//! Concrete implementations of the ports defined in `dolle-core`.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external dependencies, in-memory only
//! - `postgres` - PostgreSQL usage ledger via SeaORM
//! - `redis` - Redis counter store shared by every bot process
//! - `openai` - OpenAI images API generator
//! - `webhook` - Discord webhook attachment relay

pub mod counters;
pub mod ledger;
pub mod relay;

#[cfg(feature = "postgres")]
pub mod database;

#[cfg(feature = "openai")]
pub mod provider;

// Re-exports - In-Memory
pub use counters::InMemoryCounterStore;
pub use ledger::InMemoryUsageLedger;
pub use relay::InMemoryRelay;

// Re-exports - Networked backends
#[cfg(feature = "redis")]
pub use counters::{RedisConfig, RedisCounterStore};
#[cfg(feature = "postgres")]
pub use ledger::PostgresUsageLedger;
#[cfg(feature = "openai")]
pub use provider::{OpenAiConfig, OpenAiImageGenerator};
#[cfg(feature = "webhook")]
pub use relay::WebhookRelay;
