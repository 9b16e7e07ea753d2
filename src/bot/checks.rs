use crate::bot::{Context, Error};

/// Passes only in the configured cap channel.
pub async fn in_cap_channel(ctx: Context<'_>) -> Result<bool, Error> {
    Ok(ctx.channel_id().get() == ctx.data().config.cap_channel_id)
}

/// Passes in the cap channel for members holding the cap handler role.
pub async fn cap_handler_and_channel(ctx: Context<'_>) -> Result<bool, Error> {
    if !in_cap_channel(ctx).await? {
        return Ok(false);
    }

    let Some(member) = ctx.author_member().await else {
        return Ok(false);
    };

    let role_name = &ctx.data().config.cap_handler_role;
    let is_handler = ctx.guild().is_some_and(|guild| {
        member
            .roles
            .iter()
            .filter_map(|role_id| guild.roles.get(role_id))
            .any(|role| role.name.eq_ignore_ascii_case(role_name))
    });

    Ok(is_handler)
}
