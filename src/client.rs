//! The bot itself: configuration, loaded modules, log buffer and the Discord connection.

use crate::{
    config::Config,
    context::Context,
    event::{Event, EventKind},
    handler::Handler,
    log_buffer::{FlushOptions, LogBuffer},
    log_internal,
    manifest::{self, Manifest},
    platform::{Platform, ShardManagerKey},
    registry::{LoadError, LoadReport, Registry},
};
use anyhow::{anyhow, Result};
use serenity::all::GatewayIntents;
use std::num::NonZeroUsize;
use std::sync::Arc;

pub struct Client {
    cfg: Config,
    registry: Registry,
    logs: Arc<LogBuffer>,
}

impl Client {
    pub fn new(cfg: Config) -> Self {
        let logs = Arc::new(LogBuffer::new(
            cfg.general.log_limit.map(NonZeroUsize::get),
            cfg.general.log_dir.clone(),
        ));
        let client = Self {
            cfg,
            registry: Registry::default(),
            logs,
        };

        if client.cfg.general.log_limit.is_none() {
            client.log(
                "warn",
                "No saved log limit has been specified, this will eventually lead to memory issues.",
            );
        }
        if client.cfg.general.discord_token.is_none() {
            client.log(
                "warn",
                "No token provided - please give a token to Client::connect.",
            );
        }

        client
    }

    /// Log to the console and the log buffer
    pub fn log(&self, prefix: &str, message: &str) {
        self.logs.record(prefix, message, true);
    }

    pub fn logs(&self) -> &Arc<LogBuffer> {
        &self.logs
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The configured module manifest, or one selecting every built-in module
    pub async fn load_manifest(&self) -> Result<Manifest> {
        match &self.cfg.general.manifest {
            Some(path) => Manifest::load(path).await,
            None => Ok(Manifest::default()),
        }
    }

    pub fn load_events(&mut self, manifest: &Manifest) -> Result<LoadReport> {
        let (modules, unknown) =
            manifest::select(manifest.events.as_deref(), crate::events::modules());
        let mut report = self.registry.load_events(&modules, &self.logs)?;
        self.finish_load("event", &mut report, unknown);

        if !self.registry.router().is_bound(EventKind::Message) {
            self.log(
                "warn",
                "Nothing is listening for messages, commands will never run.",
            );
        }

        Ok(report)
    }

    pub fn load_commands(&mut self, manifest: &Manifest) -> Result<LoadReport> {
        let (modules, unknown) =
            manifest::select(manifest.commands.as_deref(), crate::commands::modules());
        let mut report = self.registry.load_commands(&modules, &self.logs)?;
        self.finish_load("command", &mut report, unknown);
        Ok(report)
    }

    fn finish_load(&self, kind: &str, report: &mut LoadReport, unknown: Vec<LoadError>) {
        for err in unknown {
            self.log("error", &err.to_string());
            report.failures.push(err);
        }
        self.log("startup", &report.summary(kind));
    }

    pub fn context<'a>(&'a self, platform: &'a dyn Platform) -> Context<'a> {
        Context {
            cfg: &self.cfg,
            registry: &self.registry,
            logs: &self.logs,
            platform,
        }
    }

    /// Hand an event to the module listening for it
    pub async fn fire(&self, platform: &dyn Platform, event: &Event) -> bool {
        self.registry
            .router()
            .fire(&self.context(platform), event)
            .await
    }

    /// Log in and process events until the connection ends.  `token` overrides the configured
    /// one.  Whatever is still buffered is flushed to disk on the way out.
    pub async fn connect(self, token: Option<String>) -> Result<()> {
        let Some(token) = token.or_else(|| self.cfg.general.discord_token.clone()) else {
            return Err(anyhow!(
                "A token is required either in the configuration or in Client::connect."
            ));
        };

        // Things we want discord to tell us about.
        let intents = GatewayIntents::DIRECT_MESSAGES
            | GatewayIntents::GUILDS
            | GatewayIntents::GUILD_MEMBERS
            | GatewayIntents::GUILD_MESSAGES
            | GatewayIntents::MESSAGE_CONTENT;

        let logs = Arc::clone(&self.logs);

        let result = async {
            let mut discord = serenity::Client::builder(&token, intents)
                .event_handler(Handler::new(self))
                .await?;
            discord
                .data
                .write()
                .await
                .insert::<ShardManagerKey>(Arc::clone(&discord.shard_manager));
            discord.start().await
        }
        .await;

        shut_down(&logs, result).await
    }
}

/// Write out whatever is still buffered once the connection has ended, then hand back how the
/// connection ended.  A failing flush is only reported, it never replaces the connection's error.
async fn shut_down(logs: &LogBuffer, result: serenity::Result<()>) -> Result<()> {
    logs.wait_for_auto_flush().await;

    if !logs.is_empty() {
        let options = FlushOptions::default().in_dir(logs.dir());
        match logs.flush(logs.started(), chrono::Local::now(), options).await {
            Ok(flushed) => log_internal!("Flushed {} log entries on shutdown", flushed.len()),
            Err(err) => log_internal!("Could not flush logs on shutdown: {:#}", err),
        }
    }

    result.map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{fake::*, Reply};

    fn client() -> Client {
        Client::new(Config::for_tests("!"))
    }

    #[tokio::test]
    async fn construction_warns_about_missing_token_and_limit() {
        let client = client();
        let warnings: Vec<_> = client
            .logs()
            .entries()
            .into_iter()
            .filter(|entry| entry.prefix == "warn")
            .collect();
        assert_eq!(warnings.len(), 2);
    }

    #[tokio::test]
    async fn connect_without_token_fails_before_login() {
        let err = client().connect(None).await.unwrap_err();
        assert!(err.to_string().contains("token is required"));
    }

    #[tokio::test]
    async fn loads_every_builtin_module_once() {
        let mut client = client();
        let manifest = client.load_manifest().await.unwrap();

        let events = client.load_events(&manifest).unwrap();
        assert_eq!(events.loaded, ["ready", "message"]);
        let commands = client.load_commands(&manifest).unwrap();
        assert_eq!(commands.loaded, ["ping", "help"]);
        assert!(commands.failures.is_empty());

        assert!(client.load_commands(&manifest).is_err());
        assert!(client.load_events(&manifest).is_err());
    }

    #[tokio::test]
    async fn manifest_narrows_modules() {
        let mut client = client();
        let manifest = Manifest {
            commands: Some(vec!["help".to_owned(), "nope".to_owned()]),
            events: None,
        };

        let report = client.load_commands(&manifest).unwrap();
        assert_eq!(report.loaded, ["help"]);
        assert!(matches!(
            report.failures.as_slice(),
            [LoadError::UnknownModule(id)] if id == "nope"
        ));
        assert!(client.registry().resolve("ping").is_none());
    }

    #[tokio::test]
    async fn message_event_runs_commands_end_to_end() {
        let mut client = client();
        let manifest = Manifest::default();
        client.load_events(&manifest).unwrap();
        client.load_commands(&manifest).unwrap();

        let platform = FakePlatform::default();
        assert!(
            client
                .fire(&platform, &Event::Message(guild_message("!ping")))
                .await
        );
        assert!(
            client
                .fire(&platform, &Event::Message(guild_message("just chatting")))
                .await
        );

        assert_eq!(platform.sent().len(), 1);
        let edits = platform.edits();
        assert!(matches!(&edits[0].1, Reply::Embed(embed) if embed.title == "» Pong!"));
    }

    fn scratch_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("cmdbot-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[tokio::test]
    async fn shutdown_keeps_connection_error_when_flush_fails() {
        let dir = scratch_dir("shutdown-fail");
        std::fs::create_dir_all(&dir).unwrap();
        let blocker = dir.join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();

        let logs = Arc::new(LogBuffer::new(None, &blocker));
        logs.record("info", "unsaved", true);

        let err = shut_down(&logs, Err(serenity::Error::Other("gateway closed")))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "gateway closed");
        assert_eq!(logs.len(), 1);
    }

    #[tokio::test]
    async fn shutdown_flushes_remaining_entries() {
        let dir = scratch_dir("shutdown-flush");
        let logs = Arc::new(LogBuffer::new(None, &dir));
        logs.record("info", "last words", true);

        shut_down(&logs, Ok(())).await.unwrap();

        assert!(logs.is_empty());
        assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn shutdown_waits_for_running_auto_flush() {
        let dir = scratch_dir("shutdown-wait");
        let logs = Arc::new(LogBuffer::new(Some(1), &dir));
        // Spawned but not yet polled on this single-threaded runtime
        let handle = logs.record("info", "at the limit", true).unwrap();

        shut_down(&logs, Ok(())).await.unwrap();
        handle.await.unwrap();

        assert!(logs.is_empty());
        assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 1);
    }
}
