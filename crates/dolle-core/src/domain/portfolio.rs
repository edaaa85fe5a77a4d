use serde::{Deserialize, Serialize};

use super::ledger::LedgerEntry;
use crate::error::PortfolioQueryError;

const SAME_SERVER: &str = "-same-server";
const SERVER: &str = "-server";
const SAME_CHANNEL: &str = "-same-channel";
const CHANNEL: &str = "-channel";

/// Server restriction of a portfolio lookup.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ServerSelector {
    #[default]
    Any,
    /// The server the command was issued in.
    Current,
    Named(String),
}

/// Channel restriction of a portfolio lookup.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChannelSelector {
    #[default]
    Any,
    /// The channel the command was issued in.
    Current,
    Named(String),
}

/// Validated portfolio modifiers.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PortfolioQuery {
    pub server: ServerSelector,
    pub channel: ChannelSelector,
}

impl PortfolioQuery {
    /// Parse the modifier arguments of a portfolio command.
    ///
    /// Accepts `-same-server`, `-server <name>`, `-same-channel` and
    /// `-channel <name>`, each at most once, with at most one server and one
    /// channel selector.
    pub fn parse<I, S>(args: I) -> Result<Self, PortfolioQueryError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut query = Self::default();
        let mut args = args.into_iter().peekable();

        while let Some(arg) = args.next() {
            match arg.as_ref() {
                SAME_SERVER => {
                    query.set_server(ServerSelector::Current, SAME_SERVER)?;
                }
                SERVER => {
                    let name = take_value(&mut args, SERVER)?;
                    query.set_server(ServerSelector::Named(name), SERVER)?;
                }
                SAME_CHANNEL => {
                    query.set_channel(ChannelSelector::Current, SAME_CHANNEL)?;
                }
                CHANNEL => {
                    let name = take_value(&mut args, CHANNEL)?;
                    query.set_channel(ChannelSelector::Named(name), CHANNEL)?;
                }
                other if other.starts_with('-') => {
                    return Err(PortfolioQueryError::UnknownFlag(other.to_string()));
                }
                other => return Err(PortfolioQueryError::StrayValue(other.to_string())),
            }
        }

        Ok(query)
    }

    /// Bind the modifiers to the context the command was issued from.
    pub fn resolve(
        &self,
        user_id: &str,
        current_server: &str,
        current_channel: &str,
    ) -> PortfolioFilter {
        let server_name = match &self.server {
            ServerSelector::Any => None,
            ServerSelector::Current => Some(current_server.to_string()),
            ServerSelector::Named(name) => Some(name.clone()),
        };
        let channel_name = match &self.channel {
            ChannelSelector::Any => None,
            ChannelSelector::Current => Some(current_channel.to_string()),
            ChannelSelector::Named(name) => Some(name.clone()),
        };

        PortfolioFilter {
            user_id: user_id.to_string(),
            server_name,
            channel_name,
        }
    }

    fn set_server(
        &mut self,
        selector: ServerSelector,
        flag: &'static str,
    ) -> Result<(), PortfolioQueryError> {
        match &self.server {
            ServerSelector::Any => {
                self.server = selector;
                Ok(())
            }
            ServerSelector::Current if flag == SAME_SERVER => {
                Err(PortfolioQueryError::Repeated(flag))
            }
            ServerSelector::Named(_) if flag == SERVER => Err(PortfolioQueryError::Repeated(flag)),
            _ => Err(PortfolioQueryError::Conflict(SAME_SERVER, SERVER)),
        }
    }

    fn set_channel(
        &mut self,
        selector: ChannelSelector,
        flag: &'static str,
    ) -> Result<(), PortfolioQueryError> {
        match &self.channel {
            ChannelSelector::Any => {
                self.channel = selector;
                Ok(())
            }
            ChannelSelector::Current if flag == SAME_CHANNEL => {
                Err(PortfolioQueryError::Repeated(flag))
            }
            ChannelSelector::Named(_) if flag == CHANNEL => {
                Err(PortfolioQueryError::Repeated(flag))
            }
            _ => Err(PortfolioQueryError::Conflict(SAME_CHANNEL, CHANNEL)),
        }
    }
}

fn take_value<I, S>(
    args: &mut std::iter::Peekable<I>,
    flag: &'static str,
) -> Result<String, PortfolioQueryError>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    match args.next_if(|next| !next.as_ref().starts_with('-')) {
        Some(value) => Ok(value.as_ref().to_string()),
        None => Err(PortfolioQueryError::MissingValue(flag)),
    }
}

/// Conjunctive ledger filter: always the user, optionally server and channel names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioFilter {
    pub user_id: String,
    pub server_name: Option<String>,
    pub channel_name: Option<String>,
}

impl PortfolioFilter {
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            server_name: None,
            channel_name: None,
        }
    }

    pub fn in_server(mut self, server_name: impl Into<String>) -> Self {
        self.server_name = Some(server_name.into());
        self
    }

    pub fn in_channel(mut self, channel_name: impl Into<String>) -> Self {
        self.channel_name = Some(channel_name.into());
        self
    }

    pub fn matches(&self, entry: &LedgerEntry) -> bool {
        entry.user_id == self.user_id
            && self
                .server_name
                .as_ref()
                .is_none_or(|name| *name == entry.server_name)
            && self
                .channel_name
                .as_ref()
                .is_none_or(|name| *name == entry.channel_name)
    }
}
