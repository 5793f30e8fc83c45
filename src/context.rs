use crate::{config::Config, log_buffer::LogBuffer, platform::Platform, registry::Registry};
use std::sync::Arc;

/// Collection of data that is shared across events
pub struct Context<'a> {
    // Bot's own context types
    pub cfg: &'a Config,
    pub registry: &'a Registry,
    pub logs: &'a Arc<LogBuffer>,
    // Discord connection, or a stand-in during tests
    pub platform: &'a dyn Platform,
}

impl Context<'_> {
    /// Log to the console and the log buffer
    pub fn log(&self, prefix: &str, message: &str) {
        self.logs.record(prefix, message, true);
    }

    pub fn prefix(&self) -> &str {
        &self.cfg.general.command_prefix
    }
}
