//! Chat-facing message text.

use dolle_core::domain::{LedgerEntry, Scope, UsageSummary};
use dolle_core::services::GenerationOutcome;
use dolle_shared::dto::{GenerateReply, GenerateStatus, PortfolioItem, UsageFigures, UsageReply};

pub fn generate_reply(outcome: GenerationOutcome) -> GenerateReply {
    match outcome {
        GenerationOutcome::Denied(reason) => GenerateReply {
            status: GenerateStatus::Denied,
            message: reason.to_string(),
            artifact_url: None,
        },
        GenerationOutcome::Completed(entry) => GenerateReply {
            status: GenerateStatus::Completed,
            message: entry.artifact_url.clone(),
            artifact_url: Some(entry.artifact_url),
        },
        GenerationOutcome::Failed(message) => GenerateReply {
            status: GenerateStatus::Failed,
            message,
            artifact_url: None,
        },
    }
}

pub fn usage_reply(scope: Scope, id: &str, summary: Option<UsageSummary>) -> UsageReply {
    let message = match (&summary, scope) {
        (None, Scope::User) => "You haven't used any image requests yet this week.".to_string(),
        (None, Scope::Server) => {
            "This server hasn't used any image requests yet this week.".to_string()
        }
        (Some(s), Scope::User) => format!(
            "You have used {} out of {} image requests this week.\n\
             You have {} requests remaining.\n{}",
            s.count,
            s.limit,
            s.remaining,
            time_until_reset(s.seconds_left)
        ),
        (Some(s), Scope::Server) => format!(
            "This server has used {} out of {} image requests this week.\n\
             There are {} requests remaining.\n{}",
            s.count,
            s.limit,
            s.remaining,
            time_until_reset(s.seconds_left)
        ),
    };

    UsageReply {
        scope: scope.to_string(),
        id: id.to_string(),
        message,
        usage: summary.map(|s| UsageFigures {
            count: s.count,
            limit: s.limit,
            remaining: s.remaining,
            seconds_left: s.seconds_left,
        }),
    }
}

/// A lapsed window reads as zero; the raw figure stays in [`UsageFigures`].
fn time_until_reset(seconds_left: i64) -> String {
    let secs = seconds_left.max(0);
    format!(
        "Time until reset: {} hours, {} minutes",
        secs / 3600,
        (secs % 3600) / 60
    )
}

pub fn portfolio_item(entry: LedgerEntry) -> PortfolioItem {
    PortfolioItem {
        artifact_url: entry.artifact_url,
        prompt: entry.prompt,
        server_name: entry.server_name,
        channel_name: entry.channel_name,
        created_at: entry.created_at.to_rfc3339(),
    }
}
