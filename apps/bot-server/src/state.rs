//! Application state - shared across all handlers.

use std::sync::Arc;

use async_trait::async_trait;

use dolle_core::domain::{QuotaPolicy, WindowConfig};
use dolle_core::ports::{ArtifactRelay, CounterStore, ImageGenerator, UsageLedger};
use dolle_core::services::{GenerationService, PortfolioService, QuotaReporter, RateLimiter};
use dolle_core::{Clock, ProviderError, SystemClock};
use dolle_infra::{InMemoryCounterStore, InMemoryRelay, InMemoryUsageLedger};

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub generation: Arc<GenerationService>,
    pub reporter: Arc<QuotaReporter>,
    pub portfolio: Arc<PortfolioService>,
}

/// Stand-in provider when no API key is configured. Every request fails with
/// the usual "Error generating image" reply.
pub struct DisabledGenerator;

#[async_trait]
impl ImageGenerator for DisabledGenerator {
    async fn generate(&self, _prompt: &str) -> Result<Vec<u8>, ProviderError> {
        Err(ProviderError::Request(
            "image generation is not configured".to_string(),
        ))
    }
}

/// Adapters behind the services.
pub struct Backends {
    pub counters: Arc<dyn CounterStore>,
    pub ledger: Arc<dyn UsageLedger>,
    pub generator: Arc<dyn ImageGenerator>,
    pub relay: Arc<dyn ArtifactRelay>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Build the application state from configuration.
    ///
    /// A configured store that cannot be reached is a startup error; the
    /// in-memory stores are only used when nothing is configured.
    pub async fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let backends = Backends {
            counters: counter_store(config).await?,
            ledger: usage_ledger(config).await?,
            generator: image_generator(config)?,
            relay: artifact_relay(config)?,
            clock: Arc::new(SystemClock),
        };

        tracing::info!("Application state initialized");
        Ok(Self::from_parts(backends, config.policy.clone(), config.window))
    }

    /// Wire the services over already-built adapters.
    pub fn from_parts(backends: Backends, policy: QuotaPolicy, window: WindowConfig) -> Self {
        let policy = Arc::new(policy);
        let limiter = Arc::new(RateLimiter::new(
            backends.counters.clone(),
            policy.clone(),
            window,
            backends.clock.clone(),
        ));

        Self {
            generation: Arc::new(GenerationService::new(
                limiter,
                backends.generator,
                backends.relay,
                backends.ledger.clone(),
                backends.clock.clone(),
            )),
            reporter: Arc::new(QuotaReporter::new(
                backends.counters,
                policy,
                backends.clock,
            )),
            portfolio: Arc::new(PortfolioService::new(backends.ledger)),
        }
    }
}

async fn counter_store(config: &AppConfig) -> anyhow::Result<Arc<dyn CounterStore>> {
    #[cfg(feature = "redis")]
    if let Some(redis) = &config.redis {
        let store = dolle_infra::RedisCounterStore::new(redis.clone()).await?;
        return Ok(Arc::new(store));
    }

    #[cfg(not(feature = "redis"))]
    let _ = config;

    tracing::warn!("REDIS_URL not set. Quota counters are in-memory and per-process.");
    Ok(Arc::new(InMemoryCounterStore::new()))
}

async fn usage_ledger(config: &AppConfig) -> anyhow::Result<Arc<dyn UsageLedger>> {
    #[cfg(feature = "postgres")]
    if let Some(database) = &config.database {
        let db = dolle_infra::database::connect(database).await?;
        return Ok(Arc::new(dolle_infra::PostgresUsageLedger::new(db)));
    }

    #[cfg(not(feature = "postgres"))]
    let _ = config;

    tracing::warn!("DATABASE_URL not set. Usage ledger is in-memory.");
    Ok(Arc::new(InMemoryUsageLedger::new()))
}

fn image_generator(config: &AppConfig) -> anyhow::Result<Arc<dyn ImageGenerator>> {
    #[cfg(feature = "openai")]
    if let Some(openai) = &config.openai {
        tracing::info!(model = %openai.model, "OpenAI image generation enabled");
        return Ok(Arc::new(dolle_infra::OpenAiImageGenerator::new(openai.clone())?));
    }

    #[cfg(not(feature = "openai"))]
    let _ = config;

    tracing::warn!("OPENAI_API_KEY not set. Generation commands will fail.");
    Ok(Arc::new(DisabledGenerator))
}

fn artifact_relay(config: &AppConfig) -> anyhow::Result<Arc<dyn ArtifactRelay>> {
    #[cfg(feature = "webhook")]
    if let Some(url) = &config.relay_webhook_url {
        return Ok(Arc::new(dolle_infra::WebhookRelay::new(url.as_str())?));
    }

    if config.relay_webhook_url.is_some() {
        tracing::warn!("RELAY_WEBHOOK_URL ignored: built without the webhook feature.");
    } else {
        tracing::warn!("RELAY_WEBHOOK_URL not set. Images are kept in memory.");
    }
    Ok(Arc::new(InMemoryRelay::new()))
}
