//! The weekly digest: one message per day of the current week, kept in sync
//! with the guild's scheduled events by periodic reconciliation.

pub mod bucket;
pub mod reconcile;
pub mod render;
pub mod schedule;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

use crate::events::ScheduledEvent;

pub const DAYS_PER_WEEK: usize = 7;

/// One calendar day of the target week plus its events, start-time ascending.
///
/// Built fresh each reconciliation run and discarded afterwards.
#[derive(Debug, Clone)]
pub struct DayBucket {
    pub date: NaiveDate,
    /// Local midnight of `date` as an instant, for rendering date stamps.
    pub midnight: DateTime<Utc>,
    pub events: Vec<ScheduledEvent>,
}

/// Rendered digest content for one day. Derived data, no identity of its own.
#[derive(Debug, Clone)]
pub struct DigestDocument {
    pub date: NaiveDate,
    /// Weekday name, used for log lines.
    pub title: String,
    pub body: String,
    pub is_header: bool,
    pub is_footer: bool,
}

/// An existing channel message re-associated with its day by parsing the
/// marker back out of the body. This is the only prior state the digest has.
#[derive(Debug, Clone, Copy)]
pub struct PostedMessageRef {
    pub message_id: u64,
    pub date: NaiveDate,
}

/// A channel message as seen by the reconciler.
#[derive(Debug, Clone)]
pub struct TranscriptMessage {
    pub id: u64,
    /// Authored by this bot.
    pub mine: bool,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum TranscriptError {
    /// The message vanished between fetch and mutation.
    #[error("message no longer exists")]
    NotFound,
    #[error("transport error: {0}")]
    Transport(String),
}

/// The digest channel's message history, with bounded reads and per-message
/// mutation. The channel is externally owned; no transactional guarantees.
#[async_trait]
pub trait ChannelTranscript: Send + Sync {
    /// Most recent messages, newest first.
    async fn fetch_recent(
        &self,
        channel_id: u64,
        limit: u8,
    ) -> Result<Vec<TranscriptMessage>, TranscriptError>;

    async fn create(
        &self,
        channel_id: u64,
        document: &DigestDocument,
    ) -> Result<u64, TranscriptError>;

    async fn edit_in_place(
        &self,
        channel_id: u64,
        message_id: u64,
        document: &DigestDocument,
    ) -> Result<(), TranscriptError>;

    async fn delete(&self, channel_id: u64, message_id: u64) -> Result<(), TranscriptError>;
}

/// Resolves where a guild wants its digest, if anywhere.
#[async_trait]
pub trait DigestChannelSource: Send + Sync {
    async fn digest_channel(&self, guild_id: u64) -> anyhow::Result<Option<u64>>;
}
