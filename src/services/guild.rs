use async_trait::async_trait;

use crate::db::{Database, GuildSettingsRecord};
use crate::digest::DigestChannelSource;

/// Typed access to per-guild settings.
pub struct GuildService {
    db: Database,
}

impl GuildService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn settings(&self, guild_id: u64) -> anyhow::Result<Option<GuildSettingsRecord>> {
        let guild_id = guild_id.to_string();
        self.db
            .run_blocking(move |db| db.get_guild_settings(&guild_id))
            .await
    }

    pub async fn set_digest_channel(
        &self,
        guild_id: u64,
        channel: Option<u64>,
    ) -> anyhow::Result<()> {
        let guild_id = guild_id.to_string();
        let channel = channel.map(|id| id.to_string());
        self.db
            .run_blocking(move |db| db.set_digest_channel(&guild_id, channel.as_deref()))
            .await
    }

    pub async fn set_announcement_channel(
        &self,
        guild_id: u64,
        channel: Option<u64>,
    ) -> anyhow::Result<()> {
        let guild_id = guild_id.to_string();
        let channel = channel.map(|id| id.to_string());
        self.db
            .run_blocking(move |db| db.set_announcement_channel(&guild_id, channel.as_deref()))
            .await
    }

    pub async fn set_announcement_role(
        &self,
        guild_id: u64,
        role: Option<u64>,
    ) -> anyhow::Result<()> {
        let guild_id = guild_id.to_string();
        let role = role.map(|id| id.to_string());
        self.db
            .run_blocking(move |db| db.set_announcement_role(&guild_id, role.as_deref()))
            .await
    }

    pub async fn set_log_channel(&self, guild_id: u64, channel: Option<u64>) -> anyhow::Result<()> {
        let guild_id = guild_id.to_string();
        let channel = channel.map(|id| id.to_string());
        self.db
            .run_blocking(move |db| db.set_log_channel(&guild_id, channel.as_deref()))
            .await
    }

    pub async fn announcement_channel(&self, guild_id: u64) -> anyhow::Result<Option<u64>> {
        Ok(self
            .settings(guild_id)
            .await?
            .and_then(|s| s.announcement_channel)
            .and_then(|id| id.parse().ok()))
    }

    pub async fn announcement_role(&self, guild_id: u64) -> anyhow::Result<Option<u64>> {
        Ok(self
            .settings(guild_id)
            .await?
            .and_then(|s| s.announcement_role)
            .and_then(|id| id.parse().ok()))
    }

    pub async fn log_channel(&self, guild_id: u64) -> anyhow::Result<Option<u64>> {
        Ok(self
            .settings(guild_id)
            .await?
            .and_then(|s| s.log_channel)
            .and_then(|id| id.parse().ok()))
    }
}

#[async_trait]
impl DigestChannelSource for GuildService {
    async fn digest_channel(&self, guild_id: u64) -> anyhow::Result<Option<u64>> {
        Ok(self
            .settings(guild_id)
            .await?
            .and_then(|s| s.digest_channel)
            .and_then(|id| id.parse().ok()))
    }
}
