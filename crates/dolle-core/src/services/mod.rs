//! Quota, reporting and generation services built on the ports.

mod generation;
mod portfolio;
mod rate_limiter;
mod reporter;

#[cfg(test)]
pub(crate) mod fakes;

pub use generation::{GenerationOutcome, GenerationRequest, GenerationService};
pub use portfolio::PortfolioService;
pub use rate_limiter::RateLimiter;
pub use reporter::QuotaReporter;
