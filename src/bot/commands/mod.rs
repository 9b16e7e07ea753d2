pub mod cap;
pub mod tick;

use crate::bot::{Context, Error};

/// Shows help for a command
#[poise::command(prefix_command, slash_command)]
pub async fn help(
    ctx: Context<'_>,
    #[description = "Command to show help for"]
    #[rest]
    command: Option<String>,
) -> Result<(), Error> {
    poise::builtins::help(
        ctx,
        command.as_deref(),
        poise::builtins::HelpConfiguration {
            extra_text_at_bottom: "Cap commands live under `$cap`, build tick commands under `$tick`.",
            ..Default::default()
        },
    )
    .await?;
    Ok(())
}
