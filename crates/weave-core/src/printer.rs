//! Canonical source printer.
//!
//! The runtime stores the printed form of every declaration it evaluates,
//! and the tracer prints rewritten declarations back to text before
//! re-linking them. Round-tripping is lossy on purpose: comments and
//! original formatting are not preserved, but `parse(print(ast))` always
//! yields the same tree.

use crate::ast::{AssignTarget, BinaryOp, ClassDecl, Expr, FnDecl, Program, Stmt, UnaryOp};

const INDENT: &str = "  ";

pub fn print_program(program: &Program) -> String {
    let mut out = String::new();
    for stmt in &program.statements {
        write_stmt(&mut out, stmt, 0);
    }
    out
}

/// Print a single declaration at the given indent level.
///
/// Methods are printed at class-body depth so their stored source carries
/// the enclosing indentation, exactly as a source-level extraction would
/// see it.
pub fn print_fn(decl: &FnDecl, indent: usize) -> String {
    let mut out = String::new();
    write_fn(&mut out, decl, indent);
    out
}

fn pad(out: &mut String, indent: usize) {
    for _ in 0..indent {
        out.push_str(INDENT);
    }
}

fn write_fn(out: &mut String, decl: &FnDecl, indent: usize) {
    for decorator in &decl.decorators {
        pad(out, indent);
        out.push('@');
        out.push_str(decorator);
        out.push('\n');
    }
    pad(out, indent);
    out.push_str("fn ");
    out.push_str(&decl.name);
    out.push('(');
    for (i, param) in decl.params.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&param.name);
        if let Some(default) = &param.default {
            out.push('=');
            write_expr(out, default, 1);
        }
    }
    out.push_str(")\n");
    for stmt in &decl.body {
        write_stmt(out, stmt, indent + 1);
    }
    pad(out, indent);
    out.push_str("endfn\n");
}

fn write_class(out: &mut String, decl: &ClassDecl, indent: usize) {
    pad(out, indent);
    out.push_str("class ");
    out.push_str(&decl.name);
    out.push('\n');
    for (i, method) in decl.methods.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        write_fn(out, method, indent + 1);
    }
    pad(out, indent);
    out.push_str("endclass\n");
}

fn write_stmt(out: &mut String, stmt: &Stmt, indent: usize) {
    match stmt {
        Stmt::Let { name, value } => {
            pad(out, indent);
            out.push_str("let ");
            out.push_str(name);
            out.push_str(" = ");
            write_expr(out, value, 1);
            out.push('\n');
        }
        Stmt::Assign { target, value } => {
            pad(out, indent);
            match target {
                AssignTarget::Name(name) => out.push_str(name),
                AssignTarget::Attribute { object, name } => {
                    write_expr(out, object, 8);
                    out.push('.');
                    out.push_str(name);
                }
            }
            out.push_str(" = ");
            write_expr(out, value, 1);
            out.push('\n');
        }
        Stmt::Expr(expr) => {
            pad(out, indent);
            write_expr(out, expr, 1);
            out.push('\n');
        }
        Stmt::Fn(decl) => write_fn(out, decl, indent),
        Stmt::Class(decl) => write_class(out, decl, indent),
        Stmt::If {
            condition,
            then_body,
            else_body,
        } => {
            pad(out, indent);
            out.push_str("if ");
            write_expr(out, condition, 1);
            out.push('\n');
            for inner in then_body {
                write_stmt(out, inner, indent + 1);
            }
            if !else_body.is_empty() {
                pad(out, indent);
                out.push_str("else\n");
                for inner in else_body {
                    write_stmt(out, inner, indent + 1);
                }
            }
            pad(out, indent);
            out.push_str("endif\n");
        }
        Stmt::While { condition, body } => {
            pad(out, indent);
            out.push_str("while ");
            write_expr(out, condition, 1);
            out.push('\n');
            for inner in body {
                write_stmt(out, inner, indent + 1);
            }
            pad(out, indent);
            out.push_str("endwhile\n");
        }
        Stmt::Return(value) => {
            pad(out, indent);
            out.push_str("return");
            if let Some(expr) = value {
                out.push(' ');
                write_expr(out, expr, 1);
            }
            out.push('\n');
        }
        Stmt::Break => {
            pad(out, indent);
            out.push_str("break\n");
        }
        Stmt::Continue => {
            pad(out, indent);
            out.push_str("continue\n");
        }
    }
}

/// Binding strength of an expression, used to decide parenthesization.
fn expr_prec(expr: &Expr) -> u8 {
    match expr {
        Expr::Binary { op, .. } => match op {
            BinaryOp::Or => 1,
            BinaryOp::And => 2,
            BinaryOp::Eq
            | BinaryOp::Ne
            | BinaryOp::Lt
            | BinaryOp::Le
            | BinaryOp::Gt
            | BinaryOp::Ge => 4,
            BinaryOp::Add | BinaryOp::Sub => 5,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => 6,
        },
        Expr::Unary { op: UnaryOp::Not, .. } => 3,
        Expr::Unary { op: UnaryOp::Neg, .. } => 7,
        Expr::Attribute { .. } | Expr::Index { .. } | Expr::Call { .. } => 8,
        _ => 9,
    }
}

fn write_expr(out: &mut String, expr: &Expr, required: u8) {
    if expr_prec(expr) < required {
        out.push('(');
        write_expr_raw(out, expr);
        out.push(')');
    } else {
        write_expr_raw(out, expr);
    }
}

fn write_expr_raw(out: &mut String, expr: &Expr) {
    match expr {
        Expr::Null => out.push_str("null"),
        Expr::Boolean(true) => out.push_str("true"),
        Expr::Boolean(false) => out.push_str("false"),
        Expr::Integer(n) => out.push_str(&n.to_string()),
        Expr::Float(f) => out.push_str(&format_float(*f)),
        Expr::String(text) => {
            out.push('"');
            out.push_str(&escape_string(text));
            out.push('"');
        }
        Expr::List(elements) => {
            out.push('[');
            for (i, element) in elements.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_expr(out, element, 1);
            }
            out.push(']');
        }
        Expr::Name(name) => out.push_str(name),
        Expr::Attribute { object, name } => {
            write_expr(out, object, 8);
            out.push('.');
            out.push_str(name);
        }
        Expr::Index { object, index } => {
            write_expr(out, object, 8);
            out.push('[');
            write_expr(out, index, 1);
            out.push(']');
        }
        Expr::Call {
            callee,
            args,
            kwargs,
        } => {
            write_expr(out, callee, 8);
            out.push('(');
            let mut first = true;
            for arg in args {
                if !first {
                    out.push_str(", ");
                }
                first = false;
                write_expr(out, arg, 1);
            }
            for kwarg in kwargs {
                if !first {
                    out.push_str(", ");
                }
                first = false;
                out.push_str(&kwarg.name);
                out.push('=');
                write_expr(out, &kwarg.value, 1);
            }
            out.push(')');
        }
        Expr::Unary { op, operand } => match op {
            UnaryOp::Neg => {
                out.push('-');
                write_expr(out, operand, 7);
            }
            UnaryOp::Not => {
                out.push_str("not ");
                write_expr(out, operand, 3);
            }
        },
        Expr::Binary { op, left, right } => {
            let prec = expr_prec(expr);
            write_expr(out, left, prec);
            out.push(' ');
            out.push_str(op.symbol());
            out.push(' ');
            write_expr(out, right, prec + 1);
        }
    }
}

/// Format a float so it re-lexes as a float, never an integer.
pub(crate) fn format_float(f: f64) -> String {
    let text = f.to_string();
    if text.contains('.') || text.contains('e') || text.contains("inf") || text.contains("NaN") {
        text
    } else {
        format!("{text}.0")
    }
}

pub(crate) fn escape_string(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\t' => escaped.push_str("\\t"),
            '\r' => escaped.push_str("\\r"),
            other => escaped.push(other),
        }
    }
    escaped
}
