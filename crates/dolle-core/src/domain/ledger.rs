use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Record of one successful generation, as shown in a portfolio.
///
/// Written once by the generation path and never updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: Uuid,
    /// Where the relayed image can be fetched (chat CDN URL).
    pub artifact_url: String,
    pub user_id: String,
    pub user_name: String,
    pub prompt: String,
    pub server_name: String,
    pub channel_name: String,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    pub fn new(
        artifact_url: impl Into<String>,
        user_id: impl Into<String>,
        user_name: impl Into<String>,
        prompt: impl Into<String>,
        server_name: impl Into<String>,
        channel_name: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            artifact_url: artifact_url.into(),
            user_id: user_id.into(),
            user_name: user_name.into(),
            prompt: prompt.into(),
            server_name: server_name.into(),
            channel_name: channel_name.into(),
            created_at,
        }
    }
}
