//! Domain-level error types.

use thiserror::Error;

/// Counter store and usage ledger failures.
///
/// Any of these aborts the in-flight request; a store error is never read as
/// "no limit".
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store connection failed: {0}")]
    Connection(String),

    #[error("Store operation failed: {0}")]
    Operation(String),

    #[error("Stored document is malformed: {0}")]
    Serialization(String),

    #[error("Counter {0} does not exist")]
    Missing(String),
}

/// Failures of the image provider or the attachment relay.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{0}")]
    Request(String),

    #[error("{0}")]
    Response(String),

    #[error("relay failed: {0}")]
    Relay(String),
}

/// Malformed portfolio modifiers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PortfolioQueryError {
    #[error("unknown modifier '{0}'")]
    UnknownFlag(String),

    #[error("'{0}' needs a name after it")]
    MissingValue(&'static str),

    #[error("'{0}' was given more than once")]
    Repeated(&'static str),

    #[error("'{0}' and '{1}' cannot be combined")]
    Conflict(&'static str, &'static str),

    #[error("unexpected argument '{0}'")]
    StrayValue(String),
}

/// Service-level failures surfaced to the request boundary.
#[derive(Debug, Error)]
pub enum QuotaError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Invalid portfolio query: {0}")]
    InvalidQuery(#[from] PortfolioQueryError),

    #[error("Quota window of {0} seconds runs past the end of the calendar")]
    WindowOverflow(i64),
}
