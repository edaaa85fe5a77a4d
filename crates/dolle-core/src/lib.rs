//! # Dolle Core
//!
//! The domain layer of the Dolle image bot.
//! Quota accounting, usage reporting and the generation workflow live here,
//! written against ports so that no storage or network code leaks in.

pub mod clock;
pub mod domain;
pub mod error;
pub mod ports;
pub mod services;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{PortfolioQueryError, ProviderError, QuotaError, StoreError};
