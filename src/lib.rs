pub mod clock;
pub mod commands;
pub mod config;
pub mod db;
pub mod digest;
pub mod discord;
pub mod embeds;
pub mod events;
pub mod notify;
pub mod services;

use std::sync::Arc;

/// Custom data passed to all commands
pub struct Data {
    pub config: config::Config,
    pub db: db::Database,
    pub guilds: Arc<services::guild::GuildService>,
    pub scheduler: Arc<digest::schedule::DigestScheduler>,
}

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;
