//! Discord webhook relay.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use dolle_core::ProviderError;
use dolle_core::ports::{ArtifactRelay, Destination};

const UPLOAD_TIMEOUT_SECS: u64 = 60;

#[derive(Deserialize)]
struct WebhookMessage {
    attachments: Vec<Attachment>,
}

#[derive(Deserialize)]
struct Attachment {
    url: String,
}

/// Posts generated images to one channel through a Discord webhook and
/// returns the CDN URL Discord assigned to the attachment.
///
/// The webhook is bound to a single archive channel; the message text names
/// the server and channel the command came from.
pub struct WebhookRelay {
    http: reqwest::Client,
    url: String,
}

impl WebhookRelay {
    pub fn new(url: impl Into<String>) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(UPLOAD_TIMEOUT_SECS))
            .build()
            .map_err(|e| ProviderError::Relay(e.to_string()))?;

        Ok(Self {
            http,
            url: url.into(),
        })
    }

    /// `None` when `RELAY_WEBHOOK_URL` is not set.
    pub fn from_env() -> Option<Result<Self, ProviderError>> {
        std::env::var("RELAY_WEBHOOK_URL").ok().map(Self::new)
    }
}

#[async_trait]
impl ArtifactRelay for WebhookRelay {
    async fn relay(
        &self,
        destination: &Destination,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<String, ProviderError> {
        let file = Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str("image/png")
            .map_err(|e| ProviderError::Relay(e.to_string()))?;
        let payload = serde_json::json!({
            "content": format!("{} #{}", destination.server_name, destination.channel_name),
        });
        let form = Form::new()
            .text("payload_json", payload.to_string())
            .part("files[0]", file);

        let message: WebhookMessage = self
            .http
            .post(&self.url)
            .query(&[("wait", "true")])
            .multipart(form)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ProviderError::Relay(e.to_string()))?
            .json()
            .await
            .map_err(|e| ProviderError::Relay(e.to_string()))?;

        let url = message
            .attachments
            .into_iter()
            .next()
            .map(|a| a.url)
            .ok_or_else(|| ProviderError::Relay("webhook reply had no attachment".to_string()))?;

        tracing::debug!(server = %destination.server_name, channel = %destination.channel_name, %url, "Image relayed");
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_webhook_reply() {
        let body = r#"{"id":"1","attachments":[{"id":"2","filename":"fox.png","url":"https://cdn.discordapp.com/attachments/1/2/fox.png"}]}"#;
        let message: WebhookMessage = serde_json::from_str(body).unwrap();
        assert_eq!(
            message.attachments[0].url,
            "https://cdn.discordapp.com/attachments/1/2/fox.png"
        );
    }
}
