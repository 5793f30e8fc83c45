use crate::{
    context::Context,
    dispatch::CommandHandler,
    event::{Event, EventKind, EventModule, SubHandler},
    log_event,
    logging::Color,
};
use anyhow::Result;
use std::sync::Arc;

/// Chat messages.  Commands are picked out by the command handler; every message is echoed to the
/// console.
pub struct Message {
    handlers: Vec<Box<dyn SubHandler>>,
}

impl Message {
    pub fn create() -> Result<Arc<dyn EventModule>> {
        Ok(Arc::new(Self {
            handlers: vec![Box::new(CommandHandler)],
        }))
    }
}

#[serenity::async_trait]
impl EventModule for Message {
    fn kind(&self) -> EventKind {
        EventKind::Message
    }

    fn sub_handlers(&self) -> &[Box<dyn SubHandler>] {
        &self.handlers
    }

    async fn run(&self, _ctx: &Context<'_>, event: &Event) -> Result<()> {
        let Event::Message(msg) = event else {
            return Ok(());
        };

        let location = match msg.guild {
            Some(guild) => guild.id.to_string(),
            None => "<direct-message>".to_owned(),
        };
        log_event!(
            "{}:{}:{}{}{} {}",
            location,
            msg.channel_id,
            Color::User,
            msg.author_id,
            Color::Default,
            msg.content,
        );
        Ok(())
    }
}
