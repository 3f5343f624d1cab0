//! Native primitives.
//!
//! These form the fixed namespace the call-site rewriter refuses to wrap:
//! they have no recoverable source, so routing them through the tracer
//! would only add noise. The tracer still accepts them as direct inputs
//! and falls back to an uninstrumented call.

use anyhow::Result;
use chrono::Utc;

use super::{EnvRef, Environment, EvalError, Interpreter, NativeFn, Value};

/// Names of every native primitive, consulted by the call-site rewriter.
pub const NAMES: &[&str] = &["print", "len", "str", "type_of", "abs", "clock"];

pub fn is_builtin(name: &str) -> bool {
    NAMES.contains(&name)
}

/// Register all native primitives in the given scope.
pub fn install(env: &EnvRef) {
    let natives: &[NativeFn] = &[
        NativeFn { name: "print", call: native_print },
        NativeFn { name: "len", call: native_len },
        NativeFn { name: "str", call: native_str },
        NativeFn { name: "type_of", call: native_type_of },
        NativeFn { name: "abs", call: native_abs },
        NativeFn { name: "clock", call: native_clock },
    ];
    for native in natives {
        Environment::define(env, native.name, Value::Native(*native));
    }
}

fn expect_one(name: &str, args: &[Value]) -> Result<()> {
    if args.len() == 1 {
        Ok(())
    } else {
        Err(EvalError::invalid_operation(format!(
            "{name}() takes exactly one argument, got {}",
            args.len()
        ))
        .into())
    }
}

fn native_print(interp: &mut Interpreter, args: Vec<Value>) -> Result<Value> {
    let line = args
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    interp.write_output(&line);
    Ok(Value::Null)
}

fn native_len(_interp: &mut Interpreter, args: Vec<Value>) -> Result<Value> {
    expect_one("len", &args)?;
    match &args[0] {
        Value::String(s) => Ok(Value::Integer(s.chars().count() as i64)),
        Value::List(items) => Ok(Value::Integer(items.len() as i64)),
        other => Err(EvalError::unary_type_error("len", "a string or list", other.type_name()).into()),
    }
}

fn native_str(_interp: &mut Interpreter, args: Vec<Value>) -> Result<Value> {
    expect_one("str", &args)?;
    Ok(Value::String(args[0].to_string()))
}

fn native_type_of(_interp: &mut Interpreter, args: Vec<Value>) -> Result<Value> {
    expect_one("type_of", &args)?;
    Ok(Value::String(args[0].type_name().to_string()))
}

fn native_abs(_interp: &mut Interpreter, args: Vec<Value>) -> Result<Value> {
    expect_one("abs", &args)?;
    match &args[0] {
        Value::Integer(n) => Ok(Value::Integer(n.abs())),
        Value::Float(f) => Ok(Value::Float(f.abs())),
        other => Err(EvalError::unary_type_error("abs", "a number", other.type_name()).into()),
    }
}

/// Seconds since the Unix epoch, as a float.
fn native_clock(_interp: &mut Interpreter, args: Vec<Value>) -> Result<Value> {
    if !args.is_empty() {
        return Err(
            EvalError::invalid_operation(format!("clock() takes no arguments, got {}", args.len()))
                .into(),
        );
    }
    Ok(Value::Float(Utc::now().timestamp_millis() as f64 / 1000.0))
}
