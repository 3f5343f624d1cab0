//! REPL (Read-Eval-Print Loop) functionality for Weave
//!
//! This module provides interactive command-line interface components that
//! wrap the core Weave runtime with user-friendly features like:
//! - Command history and editing
//! - Multi-line input collection for keyword blocks
//! - REPL commands (.help, .trace, .quit, etc.)
//! - Trace event recording and inspection
//! - Output formatting and notifications

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use weave_core::{TraceEvent, TraceLog, Value, WeaveConfig, WeaveRuntime};

pub mod commands;
pub mod multiline;
pub mod notifier;

pub use commands::{parse_command, ReplCommand};
pub use multiline::{LineProcessResult, MultiLineCollector};
pub use notifier::{DefaultNotifier, ReplNotifier};

/// Interactive REPL for the Weave programming language
pub struct Repl {
    /// Core Weave runtime
    runtime: WeaveRuntime,
    /// Recorded trace events, shown by the .trace command
    trace_log: TraceLog,
    /// Current notifier for output
    notifier: Box<dyn ReplNotifier>,
    /// Whether the REPL is running
    running: bool,
    /// Quiet mode (suppress timing info)
    quiet: bool,
}

impl Repl {
    /// Create a new REPL with the given runtime
    pub fn new(mut runtime: WeaveRuntime) -> Result<Self> {
        let trace_log = TraceLog::new();
        let record = trace_log.callback();
        runtime.set_trace_callback(Arc::new(move |event| {
            record(event);
            println!("trace: {}{}", "  ".repeat(event.depth), event.callee);
        }));
        Ok(Self {
            runtime,
            trace_log,
            notifier: Box::new(DefaultNotifier::new()),
            running: true,
            quiet: false,
        })
    }

    /// Create a new REPL from a configuration (convenience for testing)
    pub fn with_config(config: WeaveConfig) -> Result<Self> {
        Self::new(WeaveRuntime::new(config)?)
    }

    /// Additionally emit every trace event as a JSON line on stdout
    pub fn enable_json_trace(&mut self) {
        let record = self.trace_log.callback();
        self.runtime.set_trace_callback(Arc::new(move |event| {
            record(event);
            if let Ok(line) = serde_json::to_string(event) {
                println!("{line}");
            }
        }));
    }

    /// Set the notifier for this REPL
    pub fn set_notifier(&mut self, notifier: Box<dyn ReplNotifier>) {
        self.notifier = notifier;
    }

    /// Get a reference to the current notifier
    pub fn notifier(&self) -> &dyn ReplNotifier {
        self.notifier.as_ref()
    }

    /// Check if the REPL is still running
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Whether timing info is suppressed
    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// Recorded trace events, in emission order
    pub fn trace_events(&self) -> Vec<TraceEvent> {
        self.trace_log.events()
    }

    /// Evaluate a complete chunk of Weave source.
    ///
    /// Returns the formatted result value and the evaluation time in
    /// milliseconds.
    pub fn execute(&mut self, source: &str) -> Result<(String, u64)> {
        let start = Instant::now();
        let value = self.runtime.eval_source(source)?;
        let duration_ms = start.elapsed().as_millis() as u64;
        tracing::debug!(duration_ms, "evaluated input");

        let output = match value {
            Value::Null => "null".to_string(),
            other => other.to_string(),
        };
        Ok((output, duration_ms))
    }

    /// Execute a REPL command and return its output message
    pub fn handle_command(&mut self, command: ReplCommand) -> Result<String> {
        match command {
            ReplCommand::Help => Ok(help_text()),
            ReplCommand::Quit => {
                self.running = false;
                Ok("Goodbye!".to_string())
            }
            ReplCommand::Clear => Ok("\x1B[2J\x1B[1;1H".to_string()),
            ReplCommand::Quiet => {
                self.quiet = !self.quiet;
                Ok(format!(
                    "Quiet mode: {}",
                    if self.quiet { "on" } else { "off" }
                ))
            }
            ReplCommand::Trace => {
                let events = self.trace_log.events();
                if events.is_empty() {
                    return Ok("No trace events recorded".to_string());
                }
                let mut lines = Vec::with_capacity(events.len());
                for event in &events {
                    lines.push(format!(
                        "{:>4}  {}{}",
                        event.sequence,
                        "  ".repeat(event.depth),
                        event.callee
                    ));
                }
                Ok(lines.join("\n"))
            }
            ReplCommand::ClearTrace => {
                self.trace_log.clear();
                Ok("Trace log cleared".to_string())
            }
        }
    }
}

fn help_text() -> String {
    [
        "Weave REPL commands:",
        "  .help          Show this help",
        "  .trace         Show recorded trace events",
        "  .trace clear   Clear recorded trace events",
        "  .quiet         Toggle timing output",
        "  .clear         Clear the screen",
        "  .quit          Exit the REPL",
        "",
        "Anything else is evaluated as Weave source. Blocks (fn, if, while,",
        "class) may span multiple lines. Wrap a callable with trace(f) or",
        "decorate a declaration with @trace to instrument it.",
    ]
    .join("\n")
}
