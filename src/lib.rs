//! Command and event dispatch for a Discord bot.
//!
//! Command and event modules are registered from a static table at startup.  Incoming messages
//! are routed to commands by name or alias behind permission checks, and log lines are buffered
//! in memory and written to disk in batches.

pub mod client;
pub mod command;
pub mod commands;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod event;
pub mod events;
pub mod handler;
pub mod helper;
pub mod log_buffer;
pub mod logging;
pub mod manifest;
pub mod platform;
pub mod registry;
