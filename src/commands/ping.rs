use crate::{
    command::{Command, CommandDescriptor},
    context::Context,
    platform::{Embed, IncomingMessage, Reply},
};
use anyhow::Result;
use std::sync::Arc;
use tokio::time::Instant;

/// Measures how long a round trip to Discord takes
pub struct Ping {
    descriptor: CommandDescriptor,
}

impl Ping {
    pub fn create() -> Result<Arc<dyn Command>> {
        Ok(Arc::new(Self {
            descriptor: CommandDescriptor::new("ping", "Ping the bot.")
                .aliases(&["pong"])
                .allow_dms(),
        }))
    }
}

#[serenity::async_trait]
impl Command for Ping {
    fn descriptor(&self) -> &CommandDescriptor {
        &self.descriptor
    }

    async fn run(&self, ctx: &Context<'_>, msg: &IncomingMessage, _args: &[String]) -> Result<()> {
        let color = ctx.cfg.embeds.color;
        let start = Instant::now();

        let reply = ctx
            .platform
            .send(
                msg.channel_id,
                Reply::Embed(Embed {
                    title: "» Pinging...".to_owned(),
                    description: "Fetching client ping.".to_owned(),
                    color,
                }),
            )
            .await?;

        let took = start.elapsed().as_millis();
        let heartbeat = ctx
            .platform
            .heartbeat_latency()
            .await
            .map_or(0, |latency| latency.as_millis());

        ctx.platform
            .edit(
                msg.channel_id,
                reply,
                Reply::Embed(Embed {
                    title: "» Pong!".to_owned(),
                    description: format!("Took {}ms.\n❤ **Heartbeat:** {}ms", took, heartbeat),
                    color,
                }),
            )
            .await
    }
}
