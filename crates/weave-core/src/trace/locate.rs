//! Definition locator.
//!
//! An extracted fragment can hold more than one top-level statement; the
//! locator picks out the declaration that corresponds to the original
//! callable without mutating its siblings.

use crate::ast::{FnDecl, Program, Stmt};

use super::TraceError;

/// Find the first top-level function declaration with the given name.
/// Ties are broken by declaration order; only a complete miss is an error.
pub fn locate<'a>(program: &'a Program, name: &str) -> Result<&'a FnDecl, TraceError> {
    program
        .statements
        .iter()
        .find_map(|stmt| match stmt {
            Stmt::Fn(decl) if decl.name == name => Some(decl),
            _ => None,
        })
        .ok_or_else(|| TraceError::AmbiguousDefinition {
            name: name.to_string(),
        })
}
