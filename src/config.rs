use std::time::Duration;

use poise::serenity_prelude::ChannelId;

use crate::constants::{DEFAULT_DATABASE_URL, DEFAULT_QUOTE_SERVER_URL, DEFAULT_SYNC_INTERVAL_SECS};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub discord_token: String,
    pub database_url: String,
    pub quote_server_url: String,
    pub sync_enabled: bool,
    pub sync_interval: Duration,
    pub feed_channel_id: Option<ChannelId>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// reads every setting through `lookup`, so tests don't have to touch the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let discord_token = lookup("DISCORD_TOKEN")
            .filter(|token| !token.is_empty())
            .ok_or_else(|| anyhow::anyhow!("missing DISCORD_TOKEN"))?;

        let database_url = lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let quote_server_url =
            lookup("QUOTE_SERVER_URL").unwrap_or_else(|| DEFAULT_QUOTE_SERVER_URL.to_string());

        let sync_enabled = match lookup("QUOTE_SYNC_ENABLED").as_deref() {
            None => true,
            Some("1" | "true" | "yes" | "on") => true,
            Some("0" | "false" | "no" | "off") => false,
            Some(other) => anyhow::bail!("invalid QUOTE_SYNC_ENABLED: {other}"),
        };

        let sync_interval_secs = match lookup("QUOTE_SYNC_INTERVAL_SECS") {
            Some(secs) => secs
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| anyhow::anyhow!("invalid QUOTE_SYNC_INTERVAL_SECS: {secs}"))?,
            None => DEFAULT_SYNC_INTERVAL_SECS,
        };

        let feed_channel_id = lookup("QUOTE_FEED_CHANNEL_ID")
            .and_then(|id| id.parse::<u64>().ok())
            .filter(|id| *id != 0)
            .map(|id| {
                tracing::info!("sending quote sync updates to channel with id {}.", id);
                ChannelId::new(id)
            });

        if feed_channel_id.is_none() {
            tracing::warn!("no quote feed channel id found. sync updates will not be sent.");
        }

        Ok(Self {
            discord_token,
            database_url,
            quote_server_url,
            sync_enabled,
            sync_interval: Duration::from_secs(sync_interval_secs),
            feed_channel_id,
        })
    }
}
