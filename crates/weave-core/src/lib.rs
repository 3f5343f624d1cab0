//! # Weave Core
//!
//! Core implementation of the Weave scripting language, including:
//! - Abstract Syntax Tree (AST) definitions
//! - Lexer and recursive descent parser
//! - Canonical source printer
//! - Tree-walking evaluator with closures, classes, and native primitives
//! - The self-propagating call tracer (`trace`)
//!
//! This crate provides the foundational components that can be used to build
//! various Weave interfaces (REPL, script runner, embedded runtime, etc.)

#![warn(clippy::all)]

pub mod ast;
pub mod evaluator;
pub mod parser;
pub mod printer;
pub mod runtime;
pub mod trace;

// Re-export commonly used types
pub use ast::{ClassDecl, Expr, FnDecl, Program, Stmt};
pub use evaluator::{EnvRef, Environment, FnKind, FunctionValue, Interpreter, Value};
pub use parser::{parse_program, ParseError};
pub use runtime::WeaveRuntime;
pub use trace::{OutputCallback, TraceCallback, TraceError, TraceEvent, TraceLog};

/// Weave language version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize tracing for Weave core components
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("weave_core=info".parse().unwrap()),
        )
        .init();
}

/// Core Weave runtime configuration
#[derive(Debug, Clone)]
pub struct WeaveConfig {
    /// Enable debug mode
    pub debug: bool,
    /// Maximum evaluation call depth
    pub max_call_depth: usize,
}

impl Default for WeaveConfig {
    fn default() -> Self {
        Self {
            debug: false,
            max_call_depth: 1000,
        }
    }
}

/// Error types for Weave core operations
#[derive(thiserror::Error, Debug)]
pub enum WeaveError {
    /// Parser error
    #[error("Parse error: {0}")]
    Parse(#[from] parser::ParseError),

    /// Evaluation error
    #[error("Evaluation error: {0}")]
    Evaluation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for Weave core operations
pub type Result<T> = std::result::Result<T, WeaveError>;
