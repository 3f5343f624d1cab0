//! Recompiler/linker.
//!
//! Turns a rewritten declaration back into a live function value and binds
//! it into the original callable's defining scope, so the fresh body
//! resolves the same free variables the original did. The declaration name
//! is overwritten in that scope, mirroring the effect of re-executing a
//! definition in its home context.

use std::collections::HashSet;
use std::rc::Rc;

use crate::ast::{AssignTarget, Expr, FnDecl, Stmt};
use crate::evaluator::{builtins, Environment, FunctionId, FunctionValue, Value};
use crate::printer;

use super::TraceError;

/// Synthesize the replacement callable and link it into the original's
/// defining scope.
pub fn link(decl: &FnDecl, original: &FunctionValue) -> Result<Rc<FunctionValue>, TraceError> {
    check_free_names(decl, original)?;

    let source = printer::print_fn(decl, 0);
    let replacement = Rc::new(FunctionValue {
        id: FunctionId::new(),
        name: decl.name.clone(),
        params: decl.params.clone(),
        body: decl.body.clone(),
        // The kind comes from the handle, not from markers left on the
        // rewritten declaration.
        kind: original.kind,
        env: original.env.clone(),
        source: Some(source),
    });
    Environment::define(
        &original.env,
        &decl.name,
        Value::Function(replacement.clone()),
    );
    tracing::debug!(
        function = %decl.name,
        original = %original.id,
        replacement = %replacement.id,
        "linked rewritten declaration into defining scope"
    );
    Ok(replacement)
}

/// Verify that every free name the rewritten body references is visible
/// from the defining scope. Binding occurrences anywhere in the body
/// (parameters, `let` targets, nested declarations and their parameters)
/// count as bound, which keeps the check lenient; names that only resolve
/// at run time are left to the evaluator.
fn check_free_names(decl: &FnDecl, original: &FunctionValue) -> Result<(), TraceError> {
    let mut bound = HashSet::new();
    let mut refs = Vec::new();
    bound.insert(decl.name.clone());
    collect_fn(decl, &mut bound, &mut refs);

    for name in refs {
        if bound.contains(&name) || builtins::is_builtin(&name) {
            continue;
        }
        if !Environment::resolves(&original.env, &name) {
            return Err(TraceError::ContextResolution {
                name,
                function: decl.name.clone(),
            });
        }
    }
    Ok(())
}

fn collect_fn(decl: &FnDecl, bound: &mut HashSet<String>, refs: &mut Vec<String>) {
    for param in &decl.params {
        bound.insert(param.name.clone());
        if let Some(default) = &param.default {
            collect_expr(default, refs);
        }
    }
    for stmt in &decl.body {
        collect_stmt(stmt, bound, refs);
    }
}

fn collect_stmt(stmt: &Stmt, bound: &mut HashSet<String>, refs: &mut Vec<String>) {
    match stmt {
        Stmt::Let { name, value } => {
            bound.insert(name.clone());
            collect_expr(value, refs);
        }
        Stmt::Assign { target, value } => {
            match target {
                // A bare assignment mutates an existing binding, so the
                // target is a reference unless something in this body
                // declares it.
                AssignTarget::Name(name) => refs.push(name.clone()),
                AssignTarget::Attribute { object, .. } => collect_expr(object, refs),
            }
            collect_expr(value, refs);
        }
        Stmt::Expr(expr) => collect_expr(expr, refs),
        Stmt::Fn(decl) => {
            bound.insert(decl.name.clone());
            collect_fn(decl, bound, refs);
        }
        Stmt::Class(decl) => {
            bound.insert(decl.name.clone());
            for method in &decl.methods {
                bound.insert(method.name.clone());
                collect_fn(method, bound, refs);
            }
        }
        Stmt::If {
            condition,
            then_body,
            else_body,
        } => {
            collect_expr(condition, refs);
            for inner in then_body {
                collect_stmt(inner, bound, refs);
            }
            for inner in else_body {
                collect_stmt(inner, bound, refs);
            }
        }
        Stmt::While { condition, body } => {
            collect_expr(condition, refs);
            for inner in body {
                collect_stmt(inner, bound, refs);
            }
        }
        Stmt::Return(Some(expr)) => collect_expr(expr, refs),
        Stmt::Return(None) | Stmt::Break | Stmt::Continue => {}
    }
}

fn collect_expr(expr: &Expr, refs: &mut Vec<String>) {
    match expr {
        Expr::Name(name) => refs.push(name.clone()),
        Expr::List(elements) => {
            for element in elements {
                collect_expr(element, refs);
            }
        }
        Expr::Attribute { object, .. } => collect_expr(object, refs),
        Expr::Index { object, index } => {
            collect_expr(object, refs);
            collect_expr(index, refs);
        }
        Expr::Call {
            callee,
            args,
            kwargs,
        } => {
            collect_expr(callee, refs);
            for arg in args {
                collect_expr(arg, refs);
            }
            for kwarg in kwargs {
                collect_expr(&kwarg.value, refs);
            }
        }
        Expr::Unary { operand, .. } => collect_expr(operand, refs),
        Expr::Binary { left, right, .. } => {
            collect_expr(left, refs);
            collect_expr(right, refs);
        }
        Expr::Null
        | Expr::Boolean(_)
        | Expr::Integer(_)
        | Expr::Float(_)
        | Expr::String(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Param;
    use crate::evaluator::{EnvRef, FnKind};
    use crate::parser::parse_program;
    use crate::trace::locate::locate;

    fn function_in(env: &EnvRef, source: &str, name: &str) -> FunctionValue {
        let program = parse_program(source).unwrap();
        let decl = locate(&program, name).unwrap();
        FunctionValue {
            id: FunctionId::new(),
            name: decl.name.clone(),
            params: decl.params.clone(),
            body: decl.body.clone(),
            kind: FnKind::Free,
            env: env.clone(),
            source: Some(source.to_string()),
        }
    }

    #[test]
    fn links_replacement_under_original_name() {
        let env = Environment::root();
        let source = "fn f()\n  return 1\nendfn\n";
        let original = function_in(&env, source, "f");
        Environment::define(
            &env,
            "f",
            Value::Function(Rc::new(function_in(&env, source, "f"))),
        );

        let program = parse_program(source).unwrap();
        let decl = locate(&program, "f").unwrap();
        let replacement = link(decl, &original).unwrap();

        assert_eq!(replacement.name, "f");
        assert_ne!(replacement.id, original.id);
        match Environment::lookup(&env, "f") {
            Some(Value::Function(linked)) => assert_eq!(linked.id, replacement.id),
            other => panic!("expected function binding, got {other:?}"),
        }
    }

    #[test]
    fn replacement_source_is_the_rewritten_form() {
        let env = Environment::root();
        let source = "fn f()\n  return trace(g)()\nendfn\n";
        Environment::define(&env, "trace", Value::Null);
        Environment::define(&env, "g", Value::Null);
        let original = function_in(&env, source, "f");

        let program = parse_program(source).unwrap();
        let decl = locate(&program, "f").unwrap();
        let replacement = link(decl, &original).unwrap();
        assert_eq!(replacement.source.as_deref(), Some(source));
    }

    #[test]
    fn unresolvable_free_name_fails_the_link() {
        let env = Environment::root();
        let source = "fn f()\n  return ghost()\nendfn\n";
        let original = function_in(&env, source, "f");

        let program = parse_program(source).unwrap();
        let decl = locate(&program, "f").unwrap();
        let err = link(decl, &original).unwrap_err();
        assert!(matches!(err, TraceError::ContextResolution { ref name, .. } if name == "ghost"));
        // A failed link must not touch the scope.
        assert!(Environment::lookup(&env, "f").is_none());
    }

    #[test]
    fn locals_parameters_and_builtins_are_not_free() {
        let env = Environment::root();
        let source = "fn f(a, b=1)\n  let c = a + b\n  c = c + len(\"xy\")\n  return f\nendfn\n";
        let original = function_in(&env, source, "f");

        let program = parse_program(source).unwrap();
        let decl = locate(&program, "f").unwrap();
        assert!(link(decl, &original).is_ok());
    }

    #[test]
    fn kind_is_taken_from_the_handle() {
        let env = Environment::root();
        let source = "fn bump(self, by=1)\n  return by\nendfn\n";
        let mut original = function_in(&env, source, "bump");
        original.kind = FnKind::Instance;
        original.params = vec![
            Param {
                name: "self".to_string(),
                default: None,
            },
            Param {
                name: "by".to_string(),
                default: Some(crate::ast::Expr::Integer(1)),
            },
        ];

        let program = parse_program(source).unwrap();
        let decl = locate(&program, "bump").unwrap();
        let replacement = link(decl, &original).unwrap();
        assert_eq!(replacement.kind, FnKind::Instance);
    }
}
