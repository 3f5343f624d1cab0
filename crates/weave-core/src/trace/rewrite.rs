//! Call-site rewriter.
//!
//! Walks a parsed tree in pre-order and wraps every eligible call so its
//! callee is routed back through the tracer: `bar(x, k=1)` becomes
//! `trace(bar)(x, k=1)`. A node is transformed before its children are
//! visited, so nested calls are wrapped at every depth.
//!
//! The pass is idempotent: the wrapping it produces is made of call nodes
//! it refuses to touch (the outer call's callee is itself a call, the
//! inner call's callee is the entry point), and decorator stripping finds
//! nothing on a second run.

use crate::ast::{AssignTarget, Expr, FnDecl, Program, Stmt};
use crate::evaluator::builtins;

/// Rewrite every eligible call site in the program.
pub fn rewrite_program(program: &mut Program, entry_point: &str) {
    let mut rewriter = CallRewriter { entry_point };
    for stmt in &mut program.statements {
        rewriter.rewrite_stmt(stmt);
    }
}

struct CallRewriter<'a> {
    entry_point: &'a str,
}

impl CallRewriter<'_> {
    fn rewrite_stmt(&mut self, stmt: &mut Stmt) {
        match stmt {
            Stmt::Fn(decl) => self.rewrite_fn(decl),
            Stmt::Class(decl) => {
                for method in &mut decl.methods {
                    self.rewrite_fn(method);
                }
            }
            Stmt::Let { value, .. } => self.rewrite_expr(value),
            Stmt::Assign { target, value } => {
                if let AssignTarget::Attribute { object, .. } = target {
                    self.rewrite_expr(object);
                }
                self.rewrite_expr(value);
            }
            Stmt::Expr(expr) => self.rewrite_expr(expr),
            Stmt::If {
                condition,
                then_body,
                else_body,
            } => {
                self.rewrite_expr(condition);
                for inner in then_body {
                    self.rewrite_stmt(inner);
                }
                for inner in else_body {
                    self.rewrite_stmt(inner);
                }
            }
            Stmt::While { condition, body } => {
                self.rewrite_expr(condition);
                for inner in body {
                    self.rewrite_stmt(inner);
                }
            }
            Stmt::Return(Some(expr)) => self.rewrite_expr(expr),
            Stmt::Return(None) | Stmt::Break | Stmt::Continue => {}
        }
    }

    fn rewrite_fn(&mut self, decl: &mut FnDecl) {
        // Strip the marker matching the entry point so the rewritten
        // declaration does not re-wrap itself when it is executed. Other
        // decorators stay.
        decl.decorators.retain(|d| d != self.entry_point);
        for param in &mut decl.params {
            if let Some(default) = &mut param.default {
                self.rewrite_expr(default);
            }
        }
        for stmt in &mut decl.body {
            self.rewrite_stmt(stmt);
        }
    }

    fn rewrite_expr(&mut self, expr: &mut Expr) {
        // Transform this node first, then descend.
        if let Expr::Call { callee, .. } = expr {
            if self.should_wrap(callee) {
                let original = std::mem::replace(&mut **callee, Expr::Null);
                **callee = Expr::Call {
                    callee: Box::new(Expr::Name(self.entry_point.to_string())),
                    args: vec![original],
                    kwargs: Vec::new(),
                };
            }
        }

        match expr {
            Expr::List(elements) => {
                for element in elements {
                    self.rewrite_expr(element);
                }
            }
            Expr::Attribute { object, .. } => self.rewrite_expr(object),
            Expr::Index { object, index } => {
                self.rewrite_expr(object);
                self.rewrite_expr(index);
            }
            Expr::Call {
                callee,
                args,
                kwargs,
            } => {
                self.rewrite_expr(callee);
                for arg in args {
                    self.rewrite_expr(arg);
                }
                for kwarg in kwargs {
                    self.rewrite_expr(&mut kwarg.value);
                }
            }
            Expr::Unary { operand, .. } => self.rewrite_expr(operand),
            Expr::Binary { left, right, .. } => {
                self.rewrite_expr(left);
                self.rewrite_expr(right);
            }
            Expr::Null
            | Expr::Boolean(_)
            | Expr::Integer(_)
            | Expr::Float(_)
            | Expr::String(_)
            | Expr::Name(_) => {}
        }
    }

    /// A callee is wrapped only when it is a plain name that is neither the
    /// entry point itself nor a native primitive. Attribute-qualified
    /// callees pass through: bound methods are instrumented by handing the
    /// method value to the entry point, not by rewriting call syntax.
    fn should_wrap(&self, callee: &Expr) -> bool {
        match callee {
            Expr::Name(name) => name != self.entry_point && !builtins::is_builtin(name),
            _ => false,
        }
    }
}
