//! Turning chat messages into command invocations.
//!
//! A message is a command when it starts with the configured prefix followed by a command name or
//! alias, e.g. `!ping extra`.  Lookup is pure so it can double as the `message` event's check;
//! permission gating, invocation and error reporting happen in `dispatch`.

use crate::{
    command::{Command, CommandDescriptor},
    context::Context,
    event::{Event, SubHandler},
    helper::contain,
    platform::{Embed, IncomingMessage, Reply},
    registry::Registry,
};
use anyhow::Result;
use std::sync::Arc;

/// A located command and its arguments
pub struct Invocation<'a> {
    pub command: &'a Arc<dyn Command>,
    pub args: Vec<String>,
}

/// Find the command a message invokes, if any.  No I/O.
pub fn resolve<'a>(
    registry: &'a Registry,
    prefix: &str,
    msg: &IncomingMessage,
) -> Option<Invocation<'a>> {
    if msg.guild.is_some_and(|guild| !guild.available) {
        return None;
    }
    if !msg.content.starts_with(prefix) {
        return None;
    }

    let mut tokens = msg.content.split_whitespace();
    let key = tokens.next()?.strip_prefix(prefix)?;
    let command = registry.resolve(key)?;

    Some(Invocation {
        command,
        args: tokens.map(str::to_owned).collect(),
    })
}

/// Whether the command may run here.  In a guild both the author and the bot need the declared
/// permissions; in a DM the command has to allow DMs.
pub async fn permitted(
    ctx: &Context<'_>,
    msg: &IncomingMessage,
    descriptor: &CommandDescriptor,
) -> Result<bool> {
    let Some(guild) = msg.guild else {
        return Ok(descriptor.dm_allowed);
    };

    if !descriptor.user_permissions.is_empty() {
        let held = ctx
            .platform
            .member_permissions(guild.id, msg.author_id)
            .await?;
        if !held.contains(descriptor.user_permissions) {
            return Ok(false);
        }
    }

    if !descriptor.bot_permissions.is_empty() {
        let held = ctx
            .platform
            .member_permissions(guild.id, ctx.platform.bot_id())
            .await?;
        if !held.contains(descriptor.bot_permissions) {
            return Ok(false);
        }
    }

    Ok(true)
}

/// Resolve, gate and run the command a message invokes.  Returns true when a command was found,
/// allowed and attempted.
///
/// Denied permissions are silent.  A failing command never escapes: the failure is logged and the
/// channel gets a generic error message.
pub async fn dispatch(ctx: &Context<'_>, msg: &IncomingMessage) -> bool {
    let Some(Invocation { command, args }) = resolve(ctx.registry, ctx.prefix(), msg) else {
        return false;
    };
    let descriptor = command.descriptor();

    match permitted(ctx, msg, descriptor).await {
        Ok(true) => {}
        Ok(false) => return false,
        Err(err) => {
            ctx.log(
                "warn",
                &format!(
                    "Could not check permissions for '{}': {:#}",
                    descriptor.name, err
                ),
            );
            return false;
        }
    }

    if let Err(err) = contain(command.run(ctx, msg, &args)).await {
        ctx.log(
            "error",
            &format!("Command '{}' failed: {:#}", descriptor.name, err),
        );

        let reply = Reply::Embed(Embed {
            title: "» Unknown Error".to_owned(),
            description: "An unknown error occurred while running this command.".to_owned(),
            color: ctx.cfg.embeds.error_color,
        });
        if let Err(err) = ctx.platform.send(msg.channel_id, reply).await {
            ctx.log(
                "error",
                &format!(
                    "Could not report failure of '{}': {:#}",
                    descriptor.name, err
                ),
            );
        }
    }

    true
}

/// The `message` event's command handler
pub struct CommandHandler;

#[serenity::async_trait]
impl SubHandler for CommandHandler {
    fn name(&self) -> &'static str {
        "commandHandler"
    }

    async fn matches(&self, ctx: &Context<'_>, event: &Event) -> Result<bool> {
        let Event::Message(msg) = event else {
            return Ok(false);
        };

        Ok(resolve(ctx.registry, ctx.prefix(), msg).is_some())
    }

    async fn run(&self, ctx: &Context<'_>, event: &Event) -> Result<()> {
        if let Event::Message(msg) = event {
            dispatch(ctx, msg).await;
        }
        Ok(())
    }
}
