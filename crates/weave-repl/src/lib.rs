//! Weave REPL - Interactive command-line interface for the Weave
//! programming language
//!
//! This crate provides REPL (Read-Eval-Print Loop) functionality for Weave,
//! including command parsing, multi-line input handling, and trace event
//! inspection.

pub mod repl;

// Re-export commonly used types for convenience
pub use repl::{DefaultNotifier, Repl, ReplCommand, ReplNotifier};
