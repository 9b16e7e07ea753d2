use crate::bot::checks::{cap_handler_and_channel, in_cap_channel};
use crate::bot::{Context, Error};
use crate::tracker::DeleteTarget;
use crate::utils::format::{
    chunk_message, format_cap_report, format_error_message, format_numbered_list,
    format_success_message,
};

const USAGE_HINT: &str = "Try '$help cap'.";

/// Citadel cap reporting
#[poise::command(
    prefix_command,
    slash_command,
    subcommands("list", "clan", "force", "del", "recheck")
)]
pub async fn cap(ctx: Context<'_>) -> Result<(), Error> {
    ctx.say(USAGE_HINT).await?;
    Ok(())
}

/// Lists the capped users
#[poise::command(prefix_command, slash_command, check = "in_cap_channel")]
pub async fn list(ctx: Context<'_>) -> Result<(), Error> {
    let names = ctx.data().caps.capped_users().await?;

    if names.is_empty() {
        ctx.say("Nobody has capped yet.").await?;
        return Ok(());
    }

    for chunk in chunk_message(&format_numbered_list(&names)) {
        ctx.say(chunk).await?;
    }
    Ok(())
}

/// Returns the number of people in the clan
#[poise::command(prefix_command, slash_command)]
pub async fn clan(ctx: Context<'_>) -> Result<(), Error> {
    let roster = ctx.data().caps.clan_members().await?;
    ctx.say(roster.len().to_string()).await?;
    Ok(())
}

/// Rechecks one member, or everyone on record with "all"
#[poise::command(prefix_command, slash_command, check = "cap_handler_and_channel")]
pub async fn force(
    ctx: Context<'_>,
    #[description = "Member name, or \"all\""]
    #[rest]
    target: String,
) -> Result<(), Error> {
    ctx.defer().await?;
    let records = ctx.data().caps.force(&target).await?;
    let report = format_cap_report(&records);

    if report.is_empty() {
        ctx.say("No cap records found.").await?;
        return Ok(());
    }

    for chunk in chunk_message(&report) {
        ctx.say(chunk).await?;
    }
    Ok(())
}

/// Deletes bot messages: "all", "noncap", or those before a message id
#[poise::command(prefix_command, slash_command, check = "cap_handler_and_channel")]
pub async fn del(
    ctx: Context<'_>,
    #[description = "\"all\", \"noncap\", or a message id"] which: String,
) -> Result<(), Error> {
    let Some(target) = DeleteTarget::parse(&which) else {
        ctx.say(format_error_message(
            "Use `all`, `noncap` or a message id.",
        ))
        .await?;
        return Ok(());
    };

    let deleted = ctx.data().caps.delete_bot_messages(target).await?;

    // A prefix invocation answers by deleting; slash commands still need a response.
    if let poise::Context::Application(_) = ctx {
        ctx.send(
            poise::CreateReply::default()
                .content(format_success_message(&format!(
                    "Deleted {} messages.",
                    deleted
                )))
                .ephemeral(true),
        )
        .await?;
    }
    Ok(())
}

/// Rechecks activity logs for caps, for the given names or the whole clan
#[poise::command(prefix_command, slash_command)]
pub async fn recheck(
    ctx: Context<'_>,
    #[description = "Comma separated names"]
    #[rest]
    names: Option<String>,
) -> Result<(), Error> {
    ctx.defer().await?;

    let names: Vec<String> = names
        .unwrap_or_default()
        .split(',')
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect();

    let caps = if names.is_empty() {
        ctx.data().caps.report_clan().await?
    } else {
        ctx.data().caps.report_caps(&names).await?
    };

    ctx.say(format!("Recheck complete: {} new cap(s) reported.", caps.len()))
        .await?;
    Ok(())
}
