//! Attachment relays.

mod memory;

pub use memory::InMemoryRelay;

#[cfg(feature = "webhook")]
mod webhook;
#[cfg(feature = "webhook")]
pub use webhook::WebhookRelay;
