//! OpenAI images API client.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as GovernorRateLimiter};
use serde::{Deserialize, Serialize};

use dolle_core::ProviderError;
use dolle_core::ports::ImageGenerator;

type DirectRateLimiter = GovernorRateLimiter<NotKeyed, InMemoryState, DefaultClock>;

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const REQUEST_TIMEOUT_SECS: u64 = 120;
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// OpenAI image generation configuration.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub size: String,
    pub quality: String,
    /// Outbound calls allowed per minute from this process.
    pub max_requests_per_minute: u32,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            model: "dall-e-3".to_string(),
            size: "1024x1024".to_string(),
            quality: "standard".to_string(),
            max_requests_per_minute: 5,
        }
    }
}

impl OpenAiConfig {
    /// `None` when `OPENAI_API_KEY` is not set.
    pub fn from_env() -> Option<Self> {
        let defaults = Self::default();
        Some(Self {
            api_key: std::env::var("OPENAI_API_KEY").ok()?,
            base_url: std::env::var("OPENAI_BASE_URL").unwrap_or(defaults.base_url),
            model: std::env::var("OPENAI_IMAGE_MODEL").unwrap_or(defaults.model),
            size: std::env::var("OPENAI_IMAGE_SIZE").unwrap_or(defaults.size),
            quality: std::env::var("OPENAI_IMAGE_QUALITY").unwrap_or(defaults.quality),
            max_requests_per_minute: std::env::var("OPENAI_MAX_REQUESTS_PER_MINUTE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_requests_per_minute),
        })
    }
}

#[derive(Serialize)]
struct GenerationBody<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u8,
    size: &'a str,
    quality: &'a str,
}

#[derive(Deserialize)]
struct GenerationResponse {
    data: Vec<GeneratedImage>,
}

#[derive(Deserialize)]
struct GeneratedImage {
    url: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Generates one image per prompt through `/images/generations`, then
/// downloads it from the returned URL.
///
/// Calls are paced by a process-local GCRA limiter so bursts of chat commands
/// queue instead of tripping the provider's own rate limit.
pub struct OpenAiImageGenerator {
    http: reqwest::Client,
    config: OpenAiConfig,
    throttle: Arc<DirectRateLimiter>,
}

impl OpenAiImageGenerator {
    pub fn new(config: OpenAiConfig) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        let per_minute = NonZeroU32::new(config.max_requests_per_minute).unwrap_or(NonZeroU32::MIN);
        let throttle = Arc::new(DirectRateLimiter::direct(Quota::per_minute(per_minute)));

        Ok(Self {
            http,
            config: OpenAiConfig {
                base_url: config.base_url.trim_end_matches('/').to_string(),
                ..config
            },
            throttle,
        })
    }

    async fn request_image_url(&self, prompt: &str) -> Result<String, ProviderError> {
        let body = GenerationBody {
            model: &self.config.model,
            prompt,
            n: 1,
            size: &self.config.size,
            quality: &self.config.quality,
        };

        let response = self
            .http
            .post(format!("{}/images/generations", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ProviderError::Response(e.to_string()))?;

        if !status.is_success() {
            return Err(ProviderError::Response(error_message(status.as_u16(), &text)));
        }

        let parsed: GenerationResponse = serde_json::from_str(&text)
            .map_err(|e| ProviderError::Response(format!("unexpected response: {e}")))?;
        parsed
            .data
            .into_iter()
            .next()
            .and_then(|image| image.url)
            .ok_or_else(|| ProviderError::Response("response contained no image".to_string()))
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ProviderError::Response(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl ImageGenerator for OpenAiImageGenerator {
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>, ProviderError> {
        self.throttle.until_ready().await;

        let url = self.request_image_url(prompt).await?;
        tracing::info!(image_url = %url, model = %self.config.model, "Image generated");

        self.download(&url).await
    }
}

/// The provider's own error message when it sent one, else the status line.
fn error_message(status: u16, body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| format!("provider returned HTTP {status}"))
}
