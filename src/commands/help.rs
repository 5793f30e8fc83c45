use crate::{
    command::{Command, CommandDescriptor},
    context::Context,
    platform::{IncomingMessage, Reply},
};
use anyhow::Result;
use std::collections::BTreeMap;
use std::sync::Arc;

pub struct Help {
    descriptor: CommandDescriptor,
}

impl Help {
    pub fn create() -> Result<Arc<dyn Command>> {
        Ok(Arc::new(Self {
            descriptor: CommandDescriptor::new("help", "show this help message")
                .usage("[command]")
                .aliases(&["commands"])
                .allow_dms(),
        }))
    }
}

#[serenity::async_trait]
impl Command for Help {
    fn descriptor(&self) -> &CommandDescriptor {
        &self.descriptor
    }

    async fn run(&self, ctx: &Context<'_>, msg: &IncomingMessage, args: &[String]) -> Result<()> {
        let prefix = ctx.prefix();

        let reply = match args.first() {
            Some(key) => match ctx.registry.resolve(key) {
                Some(command) => details(prefix, command.descriptor()),
                None => format!("No command named `{}`.", key),
            },
            None => overview(prefix, ctx.registry.commands().map(|c| c.descriptor())),
        };

        ctx.platform.send(msg.channel_id, Reply::Text(reply)).await?;
        Ok(())
    }
}

// Visible commands grouped by category
fn overview<'a>(prefix: &str, commands: impl Iterator<Item = &'a CommandDescriptor>) -> String {
    let mut categories: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for descriptor in commands.filter(|d| !d.hidden) {
        categories
            .entry(descriptor.category.as_str())
            .or_default()
            .push(descriptor.help_line(prefix));
    }

    let mut reply = String::new();
    reply.push_str("```\n");
    reply.push_str("Commands:\n");
    for (category, lines) in categories {
        reply.push_str(&format!("[{}]\n", category));
        for line in lines {
            reply.push_str(&line);
            reply.push('\n');
        }
    }
    reply.push_str("```\n");
    reply
}

fn details(prefix: &str, descriptor: &CommandDescriptor) -> String {
    let mut reply = String::new();
    reply.push_str("```\n");
    reply.push_str(&descriptor.help_line(prefix));
    reply.push('\n');
    reply.push_str(&format!("category: {}\n", descriptor.category));
    if !descriptor.aliases.is_empty() {
        reply.push_str(&format!("aliases: {}\n", descriptor.aliases.join(", ")));
    }
    if !descriptor.dm_allowed {
        reply.push_str("server only\n");
    }
    reply.push_str("```\n");
    reply
}
