//! Source extraction.
//!
//! Function values store the canonical printed source of their own
//! declaration; methods carry the indentation of the class body they were
//! declared in. Extraction always de-indents so the fragment round-trips
//! through the printer as a standalone declaration.

use crate::evaluator::FunctionValue;

use super::TraceError;

/// Recover a parseable source fragment for a function value.
pub fn extract(function: &FunctionValue) -> Result<String, TraceError> {
    let source = function
        .source
        .as_deref()
        .ok_or_else(|| TraceError::SourceUnavailable {
            name: function.name.clone(),
        })?;
    Ok(dedent(source))
}

/// Strip the common leading whitespace of all non-blank lines.
pub(crate) fn dedent(source: &str) -> String {
    let margin = source
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);

    let mut out = String::with_capacity(source.len());
    for line in source.lines() {
        if line.trim().is_empty() {
            out.push('\n');
        } else {
            out.push_str(&line[margin..]);
            out.push('\n');
        }
    }
    out
}
