//! Self-propagating call instrumentation.
//!
//! `trace(value)` wraps any value; invoking the wrapper emits one trace
//! event and then, when the value is a function or bound method with
//! recoverable source, re-derives it: extract the stored source, rewrite
//! every eligible call site so its callee is routed back through `trace`,
//! locate the declaration, link it into the original defining scope, and
//! re-bind it to its receiver. Calls inside the replacement re-enter the
//! wrapper, so instrumentation propagates one call level at a time along
//! the live call graph.
//!
//! Instrumentation is best-effort: any pipeline failure degrades to a
//! direct, uninstrumented call and never reaches user code.

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;

use crate::evaluator::{EvalError, Interpreter, NativeFn, Value};
use crate::parser;

pub mod bind;
pub mod extract;
pub mod link;
pub mod locate;
pub mod rewrite;

mod errors;

#[cfg(test)]
mod tests;

pub use errors::TraceError;

/// The name the entry point is registered under; the rewriter strips this
/// marker from declarations and refuses to wrap calls to it.
pub const ENTRY_POINT_NAME: &str = "trace";

/// One observable instrumentation event, emitted per wrapper invocation
/// before the underlying call executes.
#[derive(Debug, Clone, Serialize)]
pub struct TraceEvent {
    pub sequence: u64,
    pub callee: String,
    pub depth: usize,
    pub timestamp: DateTime<Utc>,
}

/// Type alias for trace event callback functions
pub type TraceCallback = Arc<dyn Fn(&TraceEvent) + Send + Sync>;

/// Type alias for `print` output callback functions
pub type OutputCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// In-memory event recorder, usable as a [`TraceCallback`].
#[derive(Clone, Default)]
pub struct TraceLog {
    events: Arc<Mutex<Vec<TraceEvent>>>,
}

impl TraceLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn callback(&self) -> TraceCallback {
        let events = self.events.clone();
        Arc::new(move |event| events.lock().push(event.clone()))
    }

    pub fn events(&self) -> Vec<TraceEvent> {
        self.events.lock().clone()
    }

    /// Callee names in emission order.
    pub fn callees(&self) -> Vec<String> {
        self.events.lock().iter().map(|e| e.callee.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

/// The entry point as a value, registered in the global scope.
pub fn entry_point() -> Value {
    Value::Native(NativeFn {
        name: ENTRY_POINT_NAME,
        call: native_trace,
    })
}

fn native_trace(_interp: &mut Interpreter, mut args: Vec<Value>) -> Result<Value> {
    let arity = args.len();
    match args.pop() {
        Some(value) if arity == 1 => Ok(wrap(value)),
        _ => Err(EvalError::invalid_operation(format!(
            "{ENTRY_POINT_NAME}() takes exactly one argument, got {arity}"
        ))
        .into()),
    }
}

/// Wrap a value for instrumentation. Wrapping an existing wrapper returns
/// it unchanged, so `trace(trace(f))` never double-counts.
pub fn wrap(value: Value) -> Value {
    match value {
        already @ Value::Traced(_) => already,
        other => Value::Traced(Box::new(other)),
    }
}

/// Invoke a traced value: emit the event, then either run the freshly
/// re-derived replacement or fall back to the value as-is.
pub(crate) fn call_traced(
    interp: &mut Interpreter,
    inner: &Value,
    args: Vec<Value>,
    kwargs: Vec<(String, Value)>,
) -> Result<Value> {
    interp.emit_trace_event(&inner.display_name());
    match rebuild(inner) {
        Ok(bound) => interp.call_value(&bound, args, kwargs),
        Err(reason) => {
            tracing::debug!(
                callee = %inner.display_name(),
                %reason,
                "instrumentation degraded to a direct call"
            );
            interp.call_value(inner, args, kwargs)
        }
    }
}

/// Run the full pipeline: extract, rewrite, locate, link, bind.
fn rebuild(inner: &Value) -> Result<Value, TraceError> {
    let function = match inner {
        Value::Function(function) => function,
        Value::BoundMethod { function, .. } => function,
        // Natives, classes, and plain values are terminal: nothing to
        // extract, nothing to rewrite.
        other => {
            return Err(TraceError::SourceUnavailable {
                name: other.display_name(),
            });
        }
    };

    let source = extract::extract(function)?;
    let mut program = parser::parse_program(&source).map_err(|err| {
        tracing::debug!(function = %function.name, %err, "extracted source failed to parse");
        TraceError::SourceUnavailable {
            name: function.name.clone(),
        }
    })?;
    rewrite::rewrite_program(&mut program, ENTRY_POINT_NAME);
    let decl = locate::locate(&program, &function.name)?;
    let replacement = link::link(decl, function)?;
    bind::rebind(inner, replacement)
}
