//! Weave Runtime - High-level interface for Weave language execution
//!
//! Provides a simplified interface that wraps the parser and interpreter
//! for use by external components like the REPL and script runner.

use crate::{
    evaluator::{Interpreter, Value},
    parser,
    trace::{OutputCallback, TraceCallback},
    Program, Result, WeaveConfig, WeaveError,
};

/// High-level Weave runtime that combines parser and interpreter
pub struct WeaveRuntime {
    interpreter: Interpreter,
}

impl WeaveRuntime {
    /// Create a new Weave runtime with the given configuration
    pub fn new(config: WeaveConfig) -> Result<Self> {
        if config.max_call_depth == 0 {
            return Err(WeaveError::Config(
                "max_call_depth must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            interpreter: Interpreter::new(config),
        })
    }

    /// Parse Weave source into a program AST
    pub fn parse_program(&self, source: &str) -> Result<Program> {
        Ok(parser::parse_program(source)?)
    }

    /// Evaluate Weave source code and return the result
    pub fn eval_source(&mut self, source: &str) -> Result<Value> {
        let program = parser::parse_program(source)?;
        self.eval(&program)
    }

    /// Evaluate a parsed program in the global scope
    pub fn eval(&mut self, program: &Program) -> Result<Value> {
        self.interpreter
            .eval_program(program)
            .map_err(|e| WeaveError::Evaluation(e.to_string()))
    }

    /// Set the callback that receives trace events
    pub fn set_trace_callback(&mut self, callback: TraceCallback) {
        self.interpreter.set_trace_callback(callback);
    }

    /// Set the callback that receives `print` output
    pub fn set_output_callback(&mut self, callback: OutputCallback) {
        self.interpreter.set_output_callback(callback);
    }

    /// Access the underlying interpreter
    pub fn interpreter_mut(&mut self) -> &mut Interpreter {
        &mut self.interpreter
    }
}
