use crate::{
    context::Context,
    event::{Event, EventKind, EventModule},
};
use anyhow::Result;
use std::sync::Arc;

/// Announces that the connection to Discord is up
pub struct Ready;

impl Ready {
    pub fn create() -> Result<Arc<dyn EventModule>> {
        Ok(Arc::new(Self))
    }
}

#[serenity::async_trait]
impl EventModule for Ready {
    fn kind(&self) -> EventKind {
        EventKind::Ready
    }

    async fn run(&self, ctx: &Context<'_>, event: &Event) -> Result<()> {
        let Event::Ready(ready) = event else {
            return Ok(());
        };

        ctx.log(
            "startup",
            &format!(
                "Ready! Connected to {} server(s) as {}.",
                ready.guild_count, ready.user_name
            ),
        );
        Ok(())
    }
}
