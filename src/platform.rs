//! The parts of the Discord connection the dispatch layer relies on.
//!
//! Serenity's `Context` is the real implementation.  Keeping the surface this narrow lets the
//! dispatch pipeline and the command modules run against an in-memory platform in tests.

use anyhow::{anyhow, Result};
use serenity::{
    all::{
        ChannelId, CreateEmbed, CreateMessage, EditMessage, GuildId, MessageId, Permissions,
        ShardManager, UserId,
    },
    prelude::TypeMapKey,
};
use std::sync::Arc;
use std::time::Duration;

/// A chat message as seen by the dispatch layer
#[derive(Clone, Debug)]
pub struct IncomingMessage {
    pub content: String,
    pub channel_id: ChannelId,
    pub author_id: UserId,
    /// None for direct messages
    pub guild: Option<GuildInfo>,
}

#[derive(Clone, Copy, Debug)]
pub struct GuildInfo {
    pub id: GuildId,
    /// False while Discord reports an outage for the guild
    pub available: bool,
}

impl IncomingMessage {
    pub fn from_discord(ctx: &serenity::all::Context, msg: &serenity::all::Message) -> Self {
        let guild = msg.guild_id.map(|id| GuildInfo {
            id,
            available: !ctx
                .cache
                .unavailable_guilds()
                .iter()
                .any(|guild| *guild.key() == id),
        });

        Self {
            content: msg.content.clone(),
            channel_id: msg.channel_id,
            author_id: msg.author.id,
            guild,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Embed {
    pub title: String,
    pub description: String,
    pub color: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    Embed(Embed),
}

#[serenity::async_trait]
pub trait Platform: Send + Sync {
    /// The bot's own user id
    fn bot_id(&self) -> UserId;
    /// Guild-level permissions held by a member
    async fn member_permissions(&self, guild_id: GuildId, user_id: UserId) -> Result<Permissions>;
    /// Post a new message, returning its id
    async fn send(&self, channel_id: ChannelId, reply: Reply) -> Result<MessageId>;
    /// Replace the content of a message the bot sent
    async fn edit(&self, channel_id: ChannelId, message_id: MessageId, reply: Reply) -> Result<()>;
    /// Latest gateway heartbeat round trip, if one has been measured
    async fn heartbeat_latency(&self) -> Option<Duration>;
}

/// Shard manager of the running client, so handlers can read gateway latency
pub struct ShardManagerKey;

impl TypeMapKey for ShardManagerKey {
    type Value = Arc<ShardManager>;
}

#[serenity::async_trait]
impl Platform for serenity::all::Context {
    fn bot_id(&self) -> UserId {
        self.cache.current_user().id
    }

    async fn member_permissions(&self, guild_id: GuildId, user_id: UserId) -> Result<Permissions> {
        let member = guild_id.member(self, user_id).await?;
        let guild = guild_id
            .to_guild_cached(&self.cache)
            .ok_or_else(|| anyhow!("Guild {} is not cached", guild_id))?;

        #[allow(deprecated)]
        Ok(guild.member_permissions(&member))
    }

    async fn send(&self, channel_id: ChannelId, reply: Reply) -> Result<MessageId> {
        let message = match reply {
            Reply::Text(text) => CreateMessage::new().content(text),
            Reply::Embed(embed) => CreateMessage::new().embed(embed.build()),
        };

        Ok(channel_id.send_message(self, message).await?.id)
    }

    async fn edit(&self, channel_id: ChannelId, message_id: MessageId, reply: Reply) -> Result<()> {
        let message = match reply {
            Reply::Text(text) => EditMessage::new().content(text),
            Reply::Embed(embed) => EditMessage::new().content("").embed(embed.build()),
        };

        channel_id.edit_message(self, message_id, message).await?;
        Ok(())
    }

    async fn heartbeat_latency(&self) -> Option<Duration> {
        let data = self.data.read().await;
        let shard_manager = data.get::<ShardManagerKey>()?;
        let runners = shard_manager.runners.lock().await;
        let latency = runners.get(&self.shard_id)?.latency;
        latency
    }
}

impl Embed {
    fn build(self) -> CreateEmbed {
        CreateEmbed::new()
            .title(self.title)
            .description(self.description)
            .colour(self.color)
    }
}
