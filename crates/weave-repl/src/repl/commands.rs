//! REPL command parsing and definitions
//!
//! Handles parsing of dot-commands (.help, .trace, .quit, etc.).

use anyhow::{anyhow, Result};

/// Available REPL commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    /// Show help information
    Help,
    /// Exit the REPL
    Quit,
    /// Clear the screen
    Clear,
    /// Toggle quiet mode
    Quiet,
    /// Show recorded trace events
    Trace,
    /// Clear recorded trace events
    ClearTrace,
}

/// Parse a command string into a ReplCommand
pub fn parse_command(input: &str) -> Result<ReplCommand> {
    let trimmed = input.trim();

    if !trimmed.starts_with('.') {
        return Err(anyhow!("Commands must start with '.'"));
    }

    let parts: Vec<&str> = trimmed[1..].split_whitespace().collect();

    if parts.is_empty() {
        return Err(anyhow!("Empty command"));
    }

    match parts[0] {
        "help" | "h" => Ok(ReplCommand::Help),
        "quit" | "q" | "exit" => Ok(ReplCommand::Quit),
        "clear" | "cls" => Ok(ReplCommand::Clear),
        "quiet" => Ok(ReplCommand::Quiet),
        "trace" => match parts.get(1) {
            None => Ok(ReplCommand::Trace),
            Some(&"clear") => Ok(ReplCommand::ClearTrace),
            Some(other) => Err(anyhow!("Usage: .trace [clear], got '{other}'")),
        },
        _ => Err(anyhow!("Unknown command: .{}", parts[0])),
    }
}
