//! Image provider and attachment relay ports.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

/// External image-generation provider.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Render `prompt` and return the encoded image (PNG).
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>, ProviderError>;
}

/// Where a generated file should be posted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    pub server_id: String,
    pub server_name: String,
    pub channel_name: String,
}

/// Chat attachment relay.
#[async_trait]
pub trait ArtifactRelay: Send + Sync {
    /// Post `bytes` as `filename` to `destination` and return the durable URL
    /// the chat platform assigned to the attachment.
    async fn relay(
        &self,
        destination: &Destination,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<String, ProviderError>;
}
