use crate::bot::{Context, Error};
use crate::tracker::tick::MoveError;

/// Displays the last build tick
#[poise::command(prefix_command, slash_command, subcommands("move_tick"))]
pub async fn tick(ctx: Context<'_>) -> Result<(), Error> {
    ctx.say(format!(
        "Last build tick: {}",
        ctx.data().build_ticks.current()
    ))
    .await?;
    Ok(())
}

/// Moves the weekly build tick to a new day and hour (UTC)
#[poise::command(prefix_command, slash_command, rename = "move")]
pub async fn move_tick(
    ctx: Context<'_>,
    #[description = "Day of the week"] day: String,
    #[description = "Hour of the day, 0-23"] hour: String,
) -> Result<(), Error> {
    match ctx.data().build_ticks.move_rule(&day, &hour) {
        Ok(rule) => {
            tracing::info!("{} moved the build tick to {}", ctx.author().name, rule);
            ctx.say("Build tick changed.").await?;
        }
        Err(MoveError::Rule(e)) => {
            ctx.say(e.to_string()).await?;
        }
        Err(MoveError::Save(e)) => return Err(e.into()),
    }
    Ok(())
}
