use crate::{Context, Error};
use poise::serenity_prelude as serenity;

/// Configure where herald posts digests, announcements, and event logs
#[poise::command(
    slash_command,
    subcommands("digest", "announcements", "role", "logging"),
    required_permissions = "MANAGE_GUILD",
    guild_only
)]
pub async fn configure(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Set or update the weekly digest channel
#[poise::command(slash_command)]
pub async fn digest(
    ctx: Context<'_>,
    #[description = "Channel the weekly digest is posted in"] channel: serenity::GuildChannel,
    #[description = "Setting this to true disables the weekly digest"] disable: Option<bool>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be run in a guild")?;
    if !is_text_channel(&channel) {
        ctx.say("❌ The digest channel must be a text or announcement channel.")
            .await?;
        return Ok(());
    }

    let disable = disable.unwrap_or(false);
    let value = if disable { None } else { Some(channel.id.get()) };
    ctx.data()
        .guilds
        .set_digest_channel(guild_id.get(), value)
        .await?;

    // A fresh channel gets its first digest on the next tick
    if !disable {
        ctx.data().scheduler.ensure_guild(guild_id.get());
    }

    confirm(ctx, "Weekly digest channel", disable, channel_mention(&channel, disable)).await
}

/// Set or update the channel where event announcements are posted
#[poise::command(slash_command)]
pub async fn announcements(
    ctx: Context<'_>,
    #[description = "Channel where starting events are announced"] channel: serenity::GuildChannel,
    #[description = "Setting this to true disables announcements"] disable: Option<bool>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be run in a guild")?;
    if !is_text_channel(&channel) {
        ctx.say("❌ The announcement channel must be a text or announcement channel.")
            .await?;
        return Ok(());
    }

    let disable = disable.unwrap_or(false);
    let value = if disable { None } else { Some(channel.id.get()) };
    ctx.data()
        .guilds
        .set_announcement_channel(guild_id.get(), value)
        .await?;

    confirm(
        ctx,
        "Announcement channel",
        disable,
        channel_mention(&channel, disable),
    )
    .await
}

/// Set or update the role pinged when an event starts
#[poise::command(slash_command)]
pub async fn role(
    ctx: Context<'_>,
    #[description = "Role mentioned in start announcements"] notify_role: serenity::Role,
    #[description = "Setting this to true disables role pings"] disable: Option<bool>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be run in a guild")?;

    let disable = disable.unwrap_or(false);
    let value = if disable {
        None
    } else {
        Some(notify_role.id.get())
    };
    ctx.data()
        .guilds
        .set_announcement_role(guild_id.get(), value)
        .await?;

    let shown = if disable {
        "Disabled".to_string()
    } else {
        format!("<@&{}>", notify_role.id)
    };
    confirm(ctx, "Announcement role", disable, shown).await
}

/// Set or update the event log channel, where event changes are posted
#[poise::command(slash_command)]
pub async fn logging(
    ctx: Context<'_>,
    #[description = "Channel where created, updated, and cancelled events are logged"]
    channel: serenity::GuildChannel,
    #[description = "Setting this to true disables event logging"] disable: Option<bool>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be run in a guild")?;
    if !is_text_channel(&channel) {
        ctx.say("❌ The log channel must be a text or announcement channel.")
            .await?;
        return Ok(());
    }

    let disable = disable.unwrap_or(false);
    let value = if disable { None } else { Some(channel.id.get()) };
    ctx.data()
        .guilds
        .set_log_channel(guild_id.get(), value)
        .await?;

    confirm(
        ctx,
        "Event log channel",
        disable,
        channel_mention(&channel, disable),
    )
    .await
}

fn is_text_channel(channel: &serenity::GuildChannel) -> bool {
    matches!(
        channel.kind,
        serenity::ChannelType::Text | serenity::ChannelType::News
    )
}

fn channel_mention(channel: &serenity::GuildChannel, disabled: bool) -> String {
    if disabled {
        "Disabled".to_string()
    } else {
        format!("<#{}>", channel.id)
    }
}

async fn confirm(ctx: Context<'_>, name: &str, disabled: bool, value: String) -> Result<(), Error> {
    let embed = serenity::CreateEmbed::new()
        .title("Updated guild settings")
        .field(name, value, true)
        .color(if disabled { 0x99AAB5 } else { 0x57F287 });

    ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
        .await?;
    Ok(())
}
