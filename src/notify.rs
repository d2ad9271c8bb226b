//! Per-event notifications: lifecycle changes mirrored into the guild's
//! configured channels. Decoupled from the weekly digest, which only ever
//! re-reads the catalog.

use poise::serenity_prelude as serenity;
use tracing::{debug, warn};

use crate::embeds;
use crate::events::{EventStatus, ScheduledEvent};
use crate::Data;

/// A new event appeared on the guild calendar.
pub async fn event_created(ctx: &serenity::Context, data: &Data, event: &ScheduledEvent) {
    post_to_log(ctx, data, event, "Event created", embeds::CREATED_COLOR).await;
}

/// An event changed. A transition into Active is announced as a start;
/// anything else lands in the log channel.
pub async fn event_updated(ctx: &serenity::Context, data: &Data, event: &ScheduledEvent) {
    if event.status == EventStatus::Active {
        announce_start(ctx, data, event).await;
    } else {
        post_to_log(ctx, data, event, "Event updated", embeds::UPDATED_COLOR).await;
    }
}

pub async fn event_cancelled(ctx: &serenity::Context, data: &Data, event: &ScheduledEvent) {
    post_to_log(ctx, data, event, "Event cancelled", embeds::CANCELLED_COLOR).await;
}

async fn announce_start(ctx: &serenity::Context, data: &Data, event: &ScheduledEvent) {
    let channel = match data.guilds.announcement_channel(event.guild_id).await {
        Ok(Some(channel)) => channel,
        Ok(None) => {
            debug!(
                "Guild {} has no announcement channel configured",
                event.guild_id
            );
            return;
        }
        Err(e) => {
            warn!(
                "Failed resolving announcement channel for guild {}: {}",
                event.guild_id, e
            );
            return;
        }
    };

    let role = data
        .guilds
        .announcement_role(event.guild_id)
        .await
        .ok()
        .flatten();

    let mut message = serenity::CreateMessage::new().embed(embeds::scheduled_event(
        "Event starting!",
        event,
        embeds::STARTED_COLOR,
    ));
    if let Some(role) = role {
        message = message.content(format!("<@&{role}>"));
    }

    if let Err(e) = serenity::ChannelId::new(channel)
        .send_message(&ctx.http, message)
        .await
    {
        warn!(
            "Failed announcing event {} in guild {}: {}",
            event.id, event.guild_id, e
        );
    }
}

async fn post_to_log(
    ctx: &serenity::Context,
    data: &Data,
    event: &ScheduledEvent,
    verb: &str,
    color: u32,
) {
    let channel = match data.guilds.log_channel(event.guild_id).await {
        Ok(Some(channel)) => channel,
        Ok(None) => {
            debug!("Guild {} has no event log channel configured", event.guild_id);
            return;
        }
        Err(e) => {
            warn!(
                "Failed resolving log channel for guild {}: {}",
                event.guild_id, e
            );
            return;
        }
    };

    let message =
        serenity::CreateMessage::new().embed(embeds::scheduled_event(verb, event, color));

    if let Err(e) = serenity::ChannelId::new(channel)
        .send_message(&ctx.http, message)
        .await
    {
        warn!(
            "Failed logging event {} in guild {}: {}",
            event.id, event.guild_id, e
        );
    }
}
