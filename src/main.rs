use std::sync::Arc;

use herald::clock::SystemClock;
use herald::commands::configure;
use herald::config::Config;
use herald::db::Database;
use herald::digest::reconcile::DigestEngine;
use herald::digest::schedule::DigestScheduler;
use herald::discord::{convert_event, DiscordEventCatalog, DiscordTranscript};
use herald::services::guild::GuildService;
use herald::{notify, Data};
use poise::serenity_prelude as serenity;
use tokio::sync::watch;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Load configuration
    let config = Config::from_env()?;
    let discord_token = config.discord_token.clone();
    let zone = config.reference_zone()?;

    // Flipped once on ctrl-c; every digest loop watches it
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![configure::configure()],
            event_handler: |ctx, event, _framework, data| {
                Box::pin(handle_event(ctx, event, data))
            },
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                if let Some(dev_guild) = config.dev_guild_id {
                    poise::builtins::register_in_guild(
                        ctx,
                        &framework.options().commands,
                        serenity::GuildId::new(dev_guild),
                    )
                    .await?;
                } else {
                    poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                }

                // Set bot status
                ctx.set_activity(Some(serenity::ActivityData::custom(&config.status_message)));

                let db = Database::new(&config)?;
                db.execute_init()?;

                let guilds = Arc::new(GuildService::new(db.clone()));
                let clock = Arc::new(SystemClock::new(zone));

                let catalog = Arc::new(DiscordEventCatalog::new(ctx.http.clone(), zone));
                let transcript = Arc::new(DiscordTranscript::new(
                    ctx.http.clone(),
                    ready.user.id.get(),
                    ready.user.avatar_url(),
                ));

                let engine = Arc::new(DigestEngine::new(
                    guilds.clone(),
                    catalog,
                    transcript,
                    clock.clone(),
                    config.digest_fetch_limit,
                ));
                let scheduler = Arc::new(DigestScheduler::new(
                    engine,
                    clock,
                    config.digest_cadence_mins,
                    std::time::Duration::from_secs(config.digest_backoff_secs),
                    shutdown_rx,
                ));

                Ok(Data {
                    config,
                    db,
                    guilds,
                    scheduler,
                })
            })
        })
        .build();

    let intents = serenity::GatewayIntents::non_privileged()
        | serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_SCHEDULED_EVENTS;

    let mut client = serenity::ClientBuilder::new(&discord_token, intents)
        .framework(framework)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create client: {}", e))?;

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received");
            let _ = shutdown_tx.send(true);
            shard_manager.shutdown_all().await;
        }
    });

    info!("Starting bot...");
    if let Err(why) = client.start().await {
        error!("Client error: {:?}", why);
    }

    Ok(())
}

async fn handle_event(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    data: &Data,
) -> Result<(), herald::Error> {
    match event {
        serenity::FullEvent::CacheReady { guilds } => {
            for guild in guilds {
                data.scheduler.ensure_guild(guild.get());
            }
        }
        serenity::FullEvent::GuildCreate { guild, .. } => {
            data.scheduler.ensure_guild(guild.id.get());
        }
        serenity::FullEvent::GuildDelete { incomplete, .. } => {
            // `unavailable` means an outage, not a removal
            if !incomplete.unavailable {
                data.scheduler.stop_guild(incomplete.id.get());
            }
        }
        serenity::FullEvent::GuildScheduledEventCreate { event } => {
            notify::event_created(ctx, data, &convert_event(event)).await;
        }
        serenity::FullEvent::GuildScheduledEventUpdate { event } => {
            notify::event_updated(ctx, data, &convert_event(event)).await;
        }
        serenity::FullEvent::GuildScheduledEventDelete { event } => {
            notify::event_cancelled(ctx, data, &convert_event(event)).await;
        }
        _ => {}
    }
    Ok(())
}
