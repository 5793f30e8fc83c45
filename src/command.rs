//! Chat commands: a static description plus the behavior that runs when invoked.

use crate::{context::Context, platform::IncomingMessage};
use anyhow::Result;
use serenity::all::Permissions;

/// Help text, lookup keys and gating for a command
#[derive(Clone, Debug)]
pub struct CommandDescriptor {
    pub name: String,
    pub description: String,
    pub category: String,
    /// Argument synopsis shown after the command name, e.g. `<user> [reason]`
    pub usage: String,
    /// Left out of `help`
    pub hidden: bool,
    pub aliases: Vec<String>,
    /// Permissions the invoking member needs in the guild
    pub user_permissions: Permissions,
    /// Permissions the bot needs in the guild
    pub bot_permissions: Permissions,
    pub dm_allowed: bool,
}

impl CommandDescriptor {
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_owned(),
            description: description.to_owned(),
            category: "info".to_owned(),
            usage: String::new(),
            hidden: false,
            aliases: Vec::new(),
            user_permissions: Permissions::empty(),
            bot_permissions: Permissions::empty(),
            dm_allowed: false,
        }
    }

    pub fn category(mut self, category: &str) -> Self {
        self.category = category.to_owned();
        self
    }

    pub fn usage(mut self, usage: &str) -> Self {
        self.usage = usage.to_owned();
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases = aliases.iter().map(|alias| (*alias).to_owned()).collect();
        self
    }

    pub fn user_permissions(mut self, permissions: Permissions) -> Self {
        self.user_permissions = permissions;
        self
    }

    pub fn bot_permissions(mut self, permissions: Permissions) -> Self {
        self.bot_permissions = permissions;
        self
    }

    pub fn allow_dms(mut self) -> Self {
        self.dm_allowed = true;
        self
    }

    /// Help message line, e.g. `!ban <user> - ban a member`
    pub fn help_line(&self, prefix: &str) -> String {
        let mut line = format!("{}{}", prefix, self.name);
        if !self.usage.is_empty() {
            line.push(' ');
            line.push_str(&self.usage);
        }
        line.push_str(" - ");
        line.push_str(&self.description);
        line
    }
}

#[serenity::async_trait]
pub trait Command: Sync + Send {
    fn descriptor(&self) -> &CommandDescriptor;
    /// Run the command.  `args` are the whitespace-separated tokens after the command name.
    async fn run(&self, ctx: &Context<'_>, msg: &IncomingMessage, args: &[String]) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_declaration_defaults() {
        let descriptor = CommandDescriptor::new("ping", "Ping the bot.");
        assert_eq!(descriptor.category, "info");
        assert!(descriptor.usage.is_empty());
        assert!(!descriptor.hidden);
        assert!(!descriptor.dm_allowed);
        assert!(descriptor.user_permissions.is_empty());
    }

    #[test]
    fn help_line_includes_usage_when_present() {
        let ban = CommandDescriptor::new("ban", "ban a member").usage("<user> [reason]");
        assert_eq!(ban.help_line("!"), "!ban <user> [reason] - ban a member");

        let ping = CommandDescriptor::new("ping", "Ping the bot.");
        assert_eq!(ping.help_line(";"), ";ping - Ping the bot.");
    }
}
