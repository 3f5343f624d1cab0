//! Method binder.
//!
//! Reconstructs the original calling convention on the replacement: a
//! bound method must stay bound to the same receiver, a class-scoped
//! method to its class, and free or static functions stay plain.

use std::rc::Rc;

use crate::evaluator::{FnKind, FunctionValue, Value};

use super::TraceError;

/// Re-attach the replacement to the original value's receiver semantics.
pub fn rebind(original: &Value, replacement: Rc<FunctionValue>) -> Result<Value, TraceError> {
    match original {
        // Free functions, static methods, and unbound instance methods all
        // call without an implicit receiver.
        Value::Function(_) => Ok(Value::Function(replacement)),
        Value::BoundMethod { receiver, .. } => match (replacement.kind, &**receiver) {
            (FnKind::Instance, Value::Instance(_)) => Ok(Value::BoundMethod {
                receiver: receiver.clone(),
                function: replacement,
            }),
            (FnKind::Class, Value::Class(_)) => Ok(Value::BoundMethod {
                receiver: receiver.clone(),
                function: replacement,
            }),
            (kind, _) => Err(TraceError::UnsupportedReceiverBinding {
                function: replacement.name.clone(),
                kind,
            }),
        },
        _ => Err(TraceError::UnsupportedReceiverBinding {
            function: replacement.name.clone(),
            kind: replacement.kind,
        }),
    }
}
