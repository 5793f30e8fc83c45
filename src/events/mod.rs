use crate::{event::EventModule, registry::ModuleEntry};

mod message;
mod ready;

/// Events the bot listens for
pub fn modules() -> Vec<ModuleEntry<dyn EventModule>> {
    vec![
        ModuleEntry {
            id: "ready",
            factory: ready::Ready::create,
        },
        ModuleEntry {
            id: "message",
            factory: message::Message::create,
        },
    ]
}
