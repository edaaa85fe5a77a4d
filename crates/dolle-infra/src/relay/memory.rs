//! In-memory relay for local runs and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use dolle_core::ProviderError;
use dolle_core::ports::{ArtifactRelay, Destination};

/// Keeps relayed files in memory and hands out `memory://` URLs for them.
#[derive(Default)]
pub struct InMemoryRelay {
    files: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryRelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn fetch(&self, url: &str) -> Option<Vec<u8>> {
        self.files.read().await.get(url).cloned()
    }
}

#[async_trait]
impl ArtifactRelay for InMemoryRelay {
    async fn relay(
        &self,
        destination: &Destination,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<String, ProviderError> {
        let url = format!(
            "memory://{}/{}/{}",
            destination.server_id,
            Uuid::new_v4(),
            filename
        );
        self.files.write().await.insert(url.clone(), bytes);
        Ok(url)
    }
}
