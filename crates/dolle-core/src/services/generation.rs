//! The generation write path: quota check, render, relay, record.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::domain::{Decision, DenyReason, LedgerEntry};
use crate::error::{ProviderError, QuotaError};
use crate::ports::{ArtifactRelay, Destination, ImageGenerator, UsageLedger};
use crate::services::RateLimiter;

const MAX_FILENAME_LEN: usize = 96;

/// A generation command as received from the chat platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub user_id: String,
    pub user_name: String,
    pub server_id: String,
    pub server_name: String,
    pub channel_name: String,
    pub prompt: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// A quota was exhausted; nothing was generated.
    Denied(DenyReason),
    /// The image was posted and recorded.
    Completed(LedgerEntry),
    /// The provider or the relay failed. Carries the message for the requester.
    /// Quota consumed by the check stays consumed.
    Failed(String),
}

pub struct GenerationService {
    limiter: Arc<RateLimiter>,
    generator: Arc<dyn ImageGenerator>,
    relay: Arc<dyn ArtifactRelay>,
    ledger: Arc<dyn UsageLedger>,
    clock: Arc<dyn Clock>,
}

impl GenerationService {
    pub fn new(
        limiter: Arc<RateLimiter>,
        generator: Arc<dyn ImageGenerator>,
        relay: Arc<dyn ArtifactRelay>,
        ledger: Arc<dyn UsageLedger>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            limiter,
            generator,
            relay,
            ledger,
            clock,
        }
    }

    /// Run one generation command.
    ///
    /// Store failures (quota counters or ledger) are returned as errors and end
    /// the request; provider and relay failures become [`GenerationOutcome::Failed`].
    pub async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationOutcome, QuotaError> {
        let decision = self
            .limiter
            .check_and_consume(&request.user_id, &request.server_id)
            .await?;
        if let Decision::Denied(reason) = decision {
            return Ok(GenerationOutcome::Denied(reason));
        }

        tracing::info!(
            user = %request.user_name,
            prompt = %request.prompt,
            "Generating image"
        );

        let artifact_url = match self.render_and_relay(request).await {
            Ok(url) => url,
            Err(e) => {
                let message = format!("Error generating image: {e}");
                tracing::warn!(user = %request.user_name, error = %e, "Generation failed");
                return Ok(GenerationOutcome::Failed(message));
            }
        };

        let entry = LedgerEntry::new(
            artifact_url,
            request.user_id.as_str(),
            request.user_name.as_str(),
            request.prompt.as_str(),
            request.server_name.as_str(),
            request.channel_name.as_str(),
            self.clock.now(),
        );
        self.ledger.record(&entry).await?;

        tracing::info!(image_url = %entry.artifact_url, "Image recorded");
        Ok(GenerationOutcome::Completed(entry))
    }

    async fn render_and_relay(&self, request: &GenerationRequest) -> Result<String, ProviderError> {
        let image = self.generator.generate(&request.prompt).await?;
        let destination = Destination {
            server_id: request.server_id.clone(),
            server_name: request.server_name.clone(),
            channel_name: request.channel_name.clone(),
        };
        self.relay
            .relay(&destination, &attachment_name(&request.prompt), image)
            .await
    }
}

/// `"{prompt}.png"`, reduced to characters every chat CDN accepts.
fn attachment_name(prompt: &str) -> String {
    let stem: String = prompt
        .trim()
        .chars()
        .map(|c| match c {
            c if c.is_ascii_alphanumeric() || c == '-' || c == '_' => c,
            _ => '_',
        })
        .take(MAX_FILENAME_LEN)
        .collect();

    if stem.is_empty() {
        "image.png".to_string()
    } else {
        format!("{stem}.png")
    }
}
