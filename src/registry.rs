//! Registration of the command and event modules compiled into the bot.
//!
//! Modules come from a static table of factories (see `commands::modules` and
//! `events::modules`), optionally narrowed by a manifest.  A module that fails to build is logged
//! and skipped; the rest still load.

use crate::{
    command::Command,
    event::{EventKind, EventModule, EventRouter},
    log_buffer::LogBuffer,
};
use anyhow::Result;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// A named constructor in the module table
pub struct ModuleEntry<T: ?Sized> {
    pub id: &'static str,
    pub factory: fn() -> Result<Arc<T>>,
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("{0} modules have already been loaded")]
    AlreadyLoaded(&'static str),
    #[error("module `{id}` failed to initialize: {reason}")]
    Init { id: String, reason: String },
    #[error("command `{0}` is already registered")]
    DuplicateName(String),
    #[error("event `{0}` is already being listened for")]
    AlreadyBound(EventKind),
    #[error("no module named `{0}`")]
    UnknownModule(String),
}

/// Outcome of loading one table of modules
#[derive(Debug, Default)]
pub struct LoadReport {
    pub loaded: Vec<String>,
    pub failures: Vec<LoadError>,
}

impl LoadReport {
    /// Closing log line for a load of `kind` modules
    pub fn summary(&self, kind: &str) -> String {
        if self.failures.is_empty() {
            format!("All {}s have been loaded successfully.", kind)
        } else {
            format!(
                "Loaded {} {}(s), {} failed.",
                self.loaded.len(),
                kind,
                self.failures.len()
            )
        }
    }
}

#[derive(Default)]
pub struct Registry {
    commands: BTreeMap<String, Arc<dyn Command>>,
    /// alias -> command name
    aliases: HashMap<String, String>,
    router: EventRouter,
    commands_loaded: bool,
    events_loaded: bool,
}

impl Registry {
    /// Build and register every command in `modules`.  Only one load is allowed.
    pub fn load_commands(
        &mut self,
        modules: &[ModuleEntry<dyn Command>],
        logs: &Arc<LogBuffer>,
    ) -> Result<LoadReport, LoadError> {
        if std::mem::replace(&mut self.commands_loaded, true) {
            return Err(LoadError::AlreadyLoaded("command"));
        }

        let mut report = LoadReport::default();
        for module in modules {
            let registered = build(module).and_then(|command| self.register(command, logs));
            match registered {
                Ok(name) => {
                    let aliases = self.commands[&name].descriptor().aliases.len();
                    logs.record(
                        "startup",
                        &format!(
                            "Command '{}' is now loaded with {} alias(es).",
                            name, aliases
                        ),
                        true,
                    );
                    report.loaded.push(name);
                }
                Err(err) => {
                    logs.record("error", &err.to_string(), true);
                    report.failures.push(err);
                }
            }
        }

        Ok(report)
    }

    /// Build every event module in `modules` and bind a listener for it.  Only one load is
    /// allowed.
    pub fn load_events(
        &mut self,
        modules: &[ModuleEntry<dyn EventModule>],
        logs: &Arc<LogBuffer>,
    ) -> Result<LoadReport, LoadError> {
        if std::mem::replace(&mut self.events_loaded, true) {
            return Err(LoadError::AlreadyLoaded("event"));
        }

        let mut report = LoadReport::default();
        for module in modules {
            let bound = build(module).and_then(|event| {
                let kind = event.kind();
                self.router.bind(event).map(|_| kind)
            });
            match bound {
                Ok(kind) => {
                    logs.record(
                        "startup",
                        &format!("Event {} is now being listened for.", kind),
                        true,
                    );
                    report.loaded.push(kind.to_string());
                }
                Err(err) => {
                    logs.record("error", &err.to_string(), true);
                    report.failures.push(err);
                }
            }
        }

        Ok(report)
    }

    /// Add a command under its name and aliases.  A name that is already taken is rejected and the
    /// first registration kept.  Aliases are last-write-wins.
    pub fn register(
        &mut self,
        command: Arc<dyn Command>,
        logs: &Arc<LogBuffer>,
    ) -> Result<String, LoadError> {
        let descriptor = command.descriptor();
        let name = descriptor.name.clone();
        if self.commands.contains_key(&name) {
            return Err(LoadError::DuplicateName(name));
        }

        for alias in &descriptor.aliases {
            if let Some(previous) = self.aliases.insert(alias.clone(), name.clone()) {
                logs.record(
                    "warn",
                    &format!(
                        "Alias '{}' moved from command '{}' to '{}'.",
                        alias, previous, name
                    ),
                    true,
                );
            }
        }

        self.commands.insert(name.clone(), command);
        Ok(name)
    }

    pub fn command(&self, name: &str) -> Option<&Arc<dyn Command>> {
        self.commands.get(name)
    }

    /// Command name an alias points at
    pub fn alias(&self, alias: &str) -> Option<&str> {
        self.aliases.get(alias).map(String::as_str)
    }

    /// Look a key up as a command name, then as an alias
    pub fn resolve(&self, key: &str) -> Option<&Arc<dyn Command>> {
        self.command(key)
            .or_else(|| self.alias(key).and_then(|name| self.command(name)))
    }

    /// All commands, ordered by name
    pub fn commands(&self) -> impl Iterator<Item = &Arc<dyn Command>> {
        self.commands.values()
    }

    pub fn router(&self) -> &EventRouter {
        &self.router
    }
}

fn build<T: ?Sized>(module: &ModuleEntry<T>) -> Result<Arc<T>, LoadError> {
    (module.factory)().map_err(|e| LoadError::Init {
        id: module.id.to_owned(),
        reason: format!("{:#}", e),
    })
}
