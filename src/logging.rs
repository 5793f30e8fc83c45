//! Logging to the terminal with colors

use std::io::IsTerminal;
use std::sync::LazyLock;

const DEFAULT: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const FG_BLUE: &str = "\x1b[38;5;33m";
const FG_GREEN: &str = "\x1b[32m";
const FG_MAGENTA: &str = "\x1b[35m";
const FG_ORANGE: &str = "\x1b[38;5;208m";
const FG_RED: &str = "\x1b[31m";
const FG_YELLOW: &str = "\x1b[33m";

pub enum Color {
    Default,
    Bold,
    Event,
    Internal,
    User,
    /// Arrow between prefix and message, picked from the prefix
    Prefix(&'static str),
}

impl Color {
    fn for_prefix(prefix: &str) -> Self {
        Color::Prefix(match prefix.to_ascii_lowercase().as_str() {
            "startup" => FG_GREEN,
            "warn" => FG_ORANGE,
            "error" => FG_RED,
            _ => FG_BLUE,
        })
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        // Only print colors when printing to a terminal
        //
        // This won't change during the program's execution, so we can cache it.
        static STDOUT_IS_TERMINAL: LazyLock<bool> =
            LazyLock::new(|| std::io::stdout().is_terminal());

        if !*STDOUT_IS_TERMINAL {
            return Ok(());
        }

        write!(
            f,
            "{}",
            match self {
                Color::Default => DEFAULT,
                Color::Bold => BOLD,
                Color::Event => FG_YELLOW,
                Color::Internal => FG_MAGENTA,
                Color::User => FG_GREEN,
                Color::Prefix(code) => *code,
            }
        )
    }
}

#[macro_export]
macro_rules! log_event {
    // Case: Only format string, no arguments
    ($fmtstr:expr) => {{
        println!(
            concat!("{}*{} ", $fmtstr),
            $crate::logging::Color::Event,
            $crate::logging::Color::Default
        )
    }};

    // Case: Format string with arguments, with optional trailing comma
    ($fmtstr:expr, $($args:expr),* $(,)?) => {{
        println!(
            concat!("{}*{} ", $fmtstr),
            $crate::logging::Color::Event,
            $crate::logging::Color::Default,
            $($args),*
        )
    }};
}

#[macro_export]
macro_rules! log_internal {
    // Case: Only format string, no arguments
    ($fmtstr:expr) => {{
        println!(
            concat!("{}+{} ", $fmtstr),
            $crate::logging::Color::Internal,
            $crate::logging::Color::Default
        )
    }};

    // Case: Format string with arguments, with optional trailing comma
    ($fmtstr:expr, $($args:expr),* $(,)?) => {{
        println!(
            concat!("{}+{} ", $fmtstr),
            $crate::logging::Color::Internal,
            $crate::logging::Color::Default,
            $($args),*
        )
    }};
}

/// Console line for a prefixed log call: `{PREFIX} >> {message}`
pub fn console_line(prefix: &str, message: &str) -> String {
    format!(
        "{}{}{} {}>>{} {}",
        Color::Bold,
        prefix.to_uppercase(),
        Color::Default,
        Color::for_prefix(prefix),
        Color::Default,
        message
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn console_line_uppercases_prefix() {
        // Colors depend on whether the test runner's stdout is a terminal
        let line = console_line("startup", "Ready!");
        assert!(line.contains("STARTUP"));
        assert!(line.ends_with(">> Ready!") || line.ends_with(&format!(">>{} Ready!", DEFAULT)));
    }
}
