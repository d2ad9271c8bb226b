use serenity::all::{CreateEmbed, CreateEmbedAuthor, Timestamp};

use crate::events::ScheduledEvent;

pub const CREATED_COLOR: u32 = 0x5865F2;
pub const STARTED_COLOR: u32 = 0x57F287;
pub const UPDATED_COLOR: u32 = 0xE67E22;
pub const CANCELLED_COLOR: u32 = 0xED4245;

/// Notification embed for a scheduled event lifecycle change.
pub fn scheduled_event(verb: &str, event: &ScheduledEvent, color: u32) -> CreateEmbed {
    let start = event.starts_at.timestamp();
    let mut embed = CreateEmbed::new()
        .author(CreateEmbedAuthor::new(verb))
        .title(format!("{} - {}", event.location_label(), event.name))
        .url(event.url())
        .color(color)
        .field("Starts", format!("<t:{start}:F> - <t:{start}:R>"), false);

    if let Some(description) = &event.description {
        embed = embed.description(description.as_str());
    }
    if let Some(ends_at) = event.ends_at {
        let end = ends_at.timestamp();
        embed = embed.field("Ends", format!("<t:{end}:F> - <t:{end}:R>"), false);
    }
    if let Some(channel) = event.voice_channel {
        embed = embed.field("Voice channel", format!("<#{channel}>"), false);
    }
    if let Some(creator) = event.creator {
        embed = embed.field("Hosted by", format!("<@{creator}>"), false);
    }
    if let Some(image) = &event.cover_image_url {
        embed = embed.image(image.as_str());
    }

    embed.timestamp(Timestamp::now())
}
