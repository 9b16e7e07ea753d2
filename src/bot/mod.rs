pub mod channel;
pub mod checks;
pub mod commands;
pub mod handlers;

use crate::config::Config;
use crate::database;
use crate::tracker::CapTracker;
use crate::tracker::alog::{GameApi, HttpGameApi};
use crate::tracker::tick::BuildTickTracker;
use anyhow::Result;
use channel::DiscordChannel;
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use std::time::Duration;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

const CAP_REPORT_INTERVAL: Duration = Duration::from_secs(600);
const BUILD_TICK_INTERVAL: Duration = Duration::from_secs(3600);

#[derive(Clone)]
pub struct Data {
    pub config: Config,
    pub caps: Arc<CapTracker>,
    pub build_ticks: Arc<BuildTickTracker>,
}

pub async fn create_bot(config: Config) -> Result<serenity::Client> {
    let pool = database::create_connection(&config.database_url).await?;
    let build_ticks = Arc::new(BuildTickTracker::new(config.reset_file.clone())?);
    let api: Arc<dyn GameApi> = Arc::new(HttpGameApi::new(
        config.player_url.clone(),
        config.clan_url.clone(),
        config.clan_name.clone(),
    ));

    let token = config.discord_token.clone();
    let intents =
        serenity::GatewayIntents::non_privileged() | serenity::GatewayIntents::MESSAGE_CONTENT;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                commands::cap::cap(),
                commands::tick::tick(),
                commands::help(),
            ],
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some("$".into()),
                ..Default::default()
            },
            on_error: |error| Box::pin(handlers::on_error(error)),
            event_handler: |ctx, event, framework, data| {
                Box::pin(handlers::event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;

                let channel = Arc::new(DiscordChannel::new(
                    ctx.http.clone(),
                    serenity::ChannelId::new(config.cap_channel_id),
                    ready.user.id,
                ));
                let caps = Arc::new(CapTracker::new(
                    pool,
                    api,
                    channel,
                    build_ticks.subscribe(),
                ));

                tokio::spawn({
                    let build_ticks = build_ticks.clone();
                    async move { build_ticks.run(BUILD_TICK_INTERVAL).await }
                });
                tokio::spawn({
                    let caps = caps.clone();
                    async move { caps.run(CAP_REPORT_INTERVAL).await }
                });

                Ok(Data {
                    config,
                    caps,
                    build_ticks,
                })
            })
        })
        .build();

    let client = serenity::ClientBuilder::new(&token, intents)
        .framework(framework)
        .await?;

    Ok(client)
}
