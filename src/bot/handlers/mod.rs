use crate::bot::{Data, Error};
use crate::utils::format::format_error_message;
use poise::serenity_prelude as serenity;

pub async fn event_handler(
    _ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    _data: &Data,
) -> Result<(), Error> {
    if let serenity::FullEvent::Ready { data_about_bot } = event {
        tracing::info!("Bot logged in as {}", data_about_bot.user.name);
    }
    Ok(())
}

pub async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            tracing::error!("Failed to set up the bot: {:?}", error);
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            tracing::error!("Error in command `{}`: {:?}", ctx.command().name, error);
            if let Err(e) = ctx.say(format_error_message(&error.to_string())).await {
                tracing::error!("Failed to report command error: {:?}", e);
            }
        }
        // Checks fail silently, same as an unknown command.
        poise::FrameworkError::CommandCheckFailed { .. } => {}
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                tracing::error!("Error while handling error: {:?}", e);
            }
        }
    }
}
