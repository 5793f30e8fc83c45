use crate::{
    client::Client,
    event::{Event, ReadyInfo},
    platform::IncomingMessage,
};
use serenity::all::{Message, Ready};

/// Discord event handler
pub struct Handler {
    client: Client,
}

impl Handler {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[serenity::async_trait]
impl serenity::all::EventHandler for Handler {
    async fn ready(&self, discord_ctx: serenity::all::Context, ready: Ready) {
        let event = Event::Ready(ReadyInfo {
            user_name: ready.user.name.clone(),
            guild_count: ready.guilds.len(),
        });
        self.client.fire(&discord_ctx, &event).await;
    }

    async fn message(&self, discord_ctx: serenity::all::Context, msg: Message) {
        let event = Event::Message(IncomingMessage::from_discord(&discord_ctx, &msg));
        self.client.fire(&discord_ctx, &event).await;
    }
}
