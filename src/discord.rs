//! Serenity-backed implementations of the digest's collaborator traits.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use serenity::all::{
    ChannelId, CreateEmbed, CreateEmbedAuthor, CreateEmbedFooter, CreateMessage, EditMessage,
    GetMessages, GuildId, MessageId, ScheduledEvent as DiscordScheduledEvent,
    ScheduledEventStatus, Timestamp,
};
use serenity::http::{Http, HttpError};

use crate::clock::zoned_midnight;
use crate::digest::{ChannelTranscript, DigestDocument, TranscriptError, TranscriptMessage};
use crate::events::{EventCatalog, EventStatus, FetchError, ScheduledEvent};

const DIGEST_COLOR: u32 = 0xFF2BF1;

/// Map a gateway/REST scheduled event into the domain model.
pub fn convert_event(event: &DiscordScheduledEvent) -> ScheduledEvent {
    ScheduledEvent {
        id: event.id.get(),
        guild_id: event.guild_id.get(),
        name: event.name.clone(),
        description: event.description.clone(),
        starts_at: timestamp_utc(event.start_time),
        ends_at: event.end_time.map(timestamp_utc),
        location: event.metadata.as_ref().and_then(|m| m.location.clone()),
        voice_channel: event.channel_id.map(|id| id.get()),
        status: convert_status(event.status),
        creator: event.creator_id.map(|id| id.get()),
        cover_image_url: event.image.map(|hash| {
            format!(
                "https://cdn.discordapp.com/guild-events/{}/{}.png",
                event.id, hash
            )
        }),
    }
}

fn convert_status(status: ScheduledEventStatus) -> EventStatus {
    match status {
        ScheduledEventStatus::Scheduled => EventStatus::Scheduled,
        ScheduledEventStatus::Active => EventStatus::Active,
        ScheduledEventStatus::Completed => EventStatus::Completed,
        ScheduledEventStatus::Canceled => EventStatus::Cancelled,
        _ => EventStatus::Scheduled,
    }
}

fn timestamp_utc(timestamp: Timestamp) -> DateTime<Utc> {
    DateTime::from_timestamp(timestamp.unix_timestamp(), 0).unwrap_or_default()
}

/// Scheduled events straight from the guild, windowed to one week.
pub struct DiscordEventCatalog {
    http: Arc<Http>,
    zone: Tz,
}

impl DiscordEventCatalog {
    pub fn new(http: Arc<Http>, zone: Tz) -> Self {
        Self { http, zone }
    }
}

#[async_trait]
impl EventCatalog for DiscordEventCatalog {
    async fn events_in_week(
        &self,
        guild_id: u64,
        week_start: NaiveDate,
    ) -> Result<Vec<ScheduledEvent>, FetchError> {
        let raw = GuildId::new(guild_id)
            .scheduled_events(&self.http, false)
            .await
            .map_err(|e| FetchError(e.to_string()))?;

        let window_start = zoned_midnight(week_start, self.zone);
        let window_end = zoned_midnight(week_start + Duration::days(7), self.zone);

        Ok(raw
            .iter()
            .map(convert_event)
            .filter(|event| event.starts_at >= window_start && event.starts_at < window_end)
            .collect())
    }
}

/// The digest channel, read and written through the REST API.
pub struct DiscordTranscript {
    http: Arc<Http>,
    bot_user: u64,
    bot_avatar: Option<String>,
}

impl DiscordTranscript {
    pub fn new(http: Arc<Http>, bot_user: u64, bot_avatar: Option<String>) -> Self {
        Self {
            http,
            bot_user,
            bot_avatar,
        }
    }

    /// Embed for one digest day. Header/footer chrome attaches here; the
    /// description is exactly the rendered body, day marker included.
    fn document_embed(&self, document: &DigestDocument) -> CreateEmbed {
        let mut embed = CreateEmbed::new()
            .color(DIGEST_COLOR)
            .description(document.body.as_str());

        if document.is_header {
            let mut author = CreateEmbedAuthor::new("Weekly event schedule");
            if let Some(avatar) = &self.bot_avatar {
                author = author.icon_url(avatar);
                embed = embed.thumbnail(avatar);
            }
            embed = embed.author(author);
        }
        if document.is_footer {
            embed = embed
                .footer(CreateEmbedFooter::new(concat!(
                    "herald v",
                    env!("CARGO_PKG_VERSION")
                )))
                .timestamp(Timestamp::now());
        }
        embed
    }
}

#[async_trait]
impl ChannelTranscript for DiscordTranscript {
    async fn fetch_recent(
        &self,
        channel_id: u64,
        limit: u8,
    ) -> Result<Vec<TranscriptMessage>, TranscriptError> {
        let messages = ChannelId::new(channel_id)
            .messages(&self.http, GetMessages::new().limit(limit))
            .await
            .map_err(classify)?;

        Ok(messages
            .into_iter()
            .map(|message| TranscriptMessage {
                id: message.id.get(),
                mine: message.author.id.get() == self.bot_user,
                body: message
                    .embeds
                    .first()
                    .and_then(|embed| embed.description.clone())
                    .unwrap_or(message.content),
            })
            .collect())
    }

    async fn create(
        &self,
        channel_id: u64,
        document: &DigestDocument,
    ) -> Result<u64, TranscriptError> {
        let message = ChannelId::new(channel_id)
            .send_message(
                &self.http,
                CreateMessage::new().embed(self.document_embed(document)),
            )
            .await
            .map_err(classify)?;
        Ok(message.id.get())
    }

    async fn edit_in_place(
        &self,
        channel_id: u64,
        message_id: u64,
        document: &DigestDocument,
    ) -> Result<(), TranscriptError> {
        ChannelId::new(channel_id)
            .edit_message(
                &self.http,
                MessageId::new(message_id),
                EditMessage::new().embed(self.document_embed(document)),
            )
            .await
            .map_err(classify)?;
        Ok(())
    }

    async fn delete(&self, channel_id: u64, message_id: u64) -> Result<(), TranscriptError> {
        ChannelId::new(channel_id)
            .delete_message(&self.http, MessageId::new(message_id))
            .await
            .map_err(classify)
    }
}

fn classify(error: serenity::Error) -> TranscriptError {
    if let serenity::Error::Http(HttpError::UnsuccessfulRequest(ref response)) = error {
        if response.status_code == 404 {
            return TranscriptError::NotFound;
        }
    }
    TranscriptError::Transport(error.to_string())
}
