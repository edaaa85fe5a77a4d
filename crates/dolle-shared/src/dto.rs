//! Data Transfer Objects - command and reply types for the HTTP surface.

use serde::{Deserialize, Serialize};

/// `$dolle <prompt>` as forwarded by the chat gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateCommand {
    pub user_id: String,
    pub user_name: String,
    pub server_id: String,
    pub server_name: String,
    pub channel_name: String,
    pub prompt: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerateStatus {
    Completed,
    Denied,
    Failed,
}

/// Result of a generation command. `message` is what the bot says in chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateReply {
    pub status: GenerateStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_url: Option<String>,
}

/// Reply to `$usage` / `$server_usage`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageReply {
    pub scope: String,
    pub id: String,
    pub message: String,
    /// Absent when the user or server has never generated anything.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<UsageFigures>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageFigures {
    pub count: u64,
    pub limit: u64,
    pub remaining: u64,
    /// Negative once the window has lapsed.
    pub seconds_left: i64,
}

/// `$portfolio [modifiers...]` as forwarded by the chat gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioCommand {
    pub user_id: String,
    /// Server the command was issued in.
    pub server_name: String,
    /// Channel the command was issued in.
    pub channel_name: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// One line of a portfolio NDJSON stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioItem {
    pub artifact_url: String,
    pub prompt: String,
    pub server_name: String,
    pub channel_name: String,
    pub created_at: String,
}
