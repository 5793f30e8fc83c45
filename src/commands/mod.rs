use crate::{command::Command, registry::ModuleEntry};

mod help;
mod ping;

/// Commands compiled into the bot, in registration order
pub fn modules() -> Vec<ModuleEntry<dyn Command>> {
    vec![
        ModuleEntry {
            id: "ping",
            factory: ping::Ping::create,
        },
        ModuleEntry {
            id: "help",
            factory: help::Help::create,
        },
    ]
}
