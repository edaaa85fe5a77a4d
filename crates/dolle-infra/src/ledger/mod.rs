//! Usage ledger implementations - PostgreSQL and in-memory fallback.

mod memory;

pub use memory::InMemoryUsageLedger;

#[cfg(feature = "postgres")]
mod postgres;
#[cfg(feature = "postgres")]
pub use postgres::PostgresUsageLedger;
