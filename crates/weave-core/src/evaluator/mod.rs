//! Tree-walking evaluator for Weave.
//!
//! Environments form a parent chain of shared mutable scopes. Function
//! values keep a live reference to their defining scope and the canonical
//! printed source of their own declaration; both are what the tracer in
//! [`crate::trace`] relies on to re-extract, re-link, and re-bind
//! callables at run time.

use std::{cell::RefCell, fmt, rc::Rc};

use anyhow::{anyhow, Result};
use chrono::Utc;
use indexmap::IndexMap;
use uuid::Uuid;

use crate::{
    ast::{AssignTarget, BinaryOp, ClassDecl, Expr, FnDecl, Param, Program, Stmt, UnaryOp},
    printer,
    trace::{self, OutputCallback, TraceCallback, TraceEvent},
    WeaveConfig,
};

pub mod builtins;
pub mod errors;


pub use errors::EvalError;

pub type EnvRef = Rc<RefCell<Environment>>;

/// One lexical scope: an insertion-ordered variable map plus a parent link.
pub struct Environment {
    variables: IndexMap<String, Value>,
    parent: Option<EnvRef>,
}

impl Environment {
    pub fn root() -> EnvRef {
        Rc::new(RefCell::new(Environment {
            variables: IndexMap::new(),
            parent: None,
        }))
    }

    pub fn child(parent: &EnvRef) -> EnvRef {
        Rc::new(RefCell::new(Environment {
            variables: IndexMap::new(),
            parent: Some(parent.clone()),
        }))
    }

    /// Create or overwrite a binding in this scope.
    pub fn define(env: &EnvRef, name: &str, value: Value) {
        env.borrow_mut().variables.insert(name.to_string(), value);
    }

    /// Resolve a name through the scope chain.
    pub fn lookup(env: &EnvRef, name: &str) -> Option<Value> {
        let scope = env.borrow();
        if let Some(value) = scope.variables.get(name) {
            return Some(value.clone());
        }
        match &scope.parent {
            Some(parent) => Self::lookup(parent, name),
            None => None,
        }
    }

    /// Overwrite the nearest existing binding. Returns false if no scope in
    /// the chain defines the name.
    pub fn assign(env: &EnvRef, name: &str, value: Value) -> bool {
        let mut scope = env.borrow_mut();
        if scope.variables.contains_key(name) {
            scope.variables.insert(name.to_string(), value);
            return true;
        }
        let parent = scope.parent.clone();
        drop(scope);
        match parent {
            Some(parent) => Self::assign(&parent, name, value),
            None => false,
        }
    }

    pub fn resolves(env: &EnvRef, name: &str) -> bool {
        let scope = env.borrow();
        if scope.variables.contains_key(name) {
            return true;
        }
        match &scope.parent {
            Some(parent) => Self::resolves(parent, name),
            None => false,
        }
    }
}

/// Stable identity for a function value, in the style of an object id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FunctionId(pub Uuid);

impl FunctionId {
    pub fn new() -> Self {
        FunctionId(Uuid::new_v4())
    }
}

impl Default for FunctionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Declaration kind of a function, recorded when it is defined and used by
/// the tracer's method binder to reconstruct the calling convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FnKind {
    Free,
    Instance,
    Class,
    Static,
}

pub struct FunctionValue {
    pub id: FunctionId,
    pub name: String,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
    pub kind: FnKind,
    /// The defining scope; the tracer re-links replacements into it.
    pub env: EnvRef,
    /// Canonical printed source of the declaration, decorators included.
    /// Methods carry their class-body indentation. `None` means the
    /// callable has no recoverable source.
    pub source: Option<String>,
}

impl fmt::Debug for FunctionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The env link is cyclic; never derive this.
        f.debug_struct("FunctionValue")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub struct ClassValue {
    pub name: String,
    pub methods: IndexMap<String, Rc<FunctionValue>>,
}

#[derive(Debug)]
pub struct InstanceValue {
    pub class: Rc<ClassValue>,
    pub fields: IndexMap<String, Value>,
}

/// A primitive implemented in Rust. These have no recoverable source and
/// are the base case of the tracer's recursion.
#[derive(Debug, Clone, Copy)]
pub struct NativeFn {
    pub name: &'static str,
    pub call: fn(&mut Interpreter, Vec<Value>) -> Result<Value>,
}

#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Function(Rc<FunctionValue>),
    BoundMethod {
        receiver: Box<Value>,
        function: Rc<FunctionValue>,
    },
    Class(Rc<ClassValue>),
    Instance(Rc<RefCell<InstanceValue>>),
    Native(NativeFn),
    /// The instrumentation wrapper produced by `trace(value)`.
    Traced(Box<Value>),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(l), Value::Boolean(r)) => l == r,
            (Value::Integer(l), Value::Integer(r)) => l == r,
            (Value::Float(l), Value::Float(r)) => l == r,
            (Value::Integer(l), Value::Float(r)) => (*l as f64) == *r,
            (Value::Float(l), Value::Integer(r)) => *l == (*r as f64),
            (Value::String(l), Value::String(r)) => l == r,
            (Value::List(l), Value::List(r)) => l == r,
            (Value::Function(l), Value::Function(r)) => l.id == r.id,
            (
                Value::BoundMethod {
                    receiver: lr,
                    function: lf,
                },
                Value::BoundMethod {
                    receiver: rr,
                    function: rf,
                },
            ) => lf.id == rf.id && lr == rr,
            (Value::Class(l), Value::Class(r)) => Rc::ptr_eq(l, r),
            (Value::Instance(l), Value::Instance(r)) => Rc::ptr_eq(l, r),
            (Value::Native(l), Value::Native(r)) => l.name == r.name,
            (Value::Traced(l), Value::Traced(r)) => l == r,
            _ => false,
        }
    }
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Function(_) => "function",
            Value::BoundMethod { .. } => "bound method",
            Value::Class(_) => "class",
            Value::Instance(_) => "instance",
            Value::Native(_) => "native function",
            Value::Traced(_) => "traced callable",
        }
    }

    /// The name reported in trace events for this callee.
    pub fn display_name(&self) -> String {
        match self {
            Value::Function(function) => function.name.clone(),
            Value::BoundMethod { receiver, function } => match &**receiver {
                Value::Instance(instance) => {
                    format!("{}.{}", instance.borrow().class.name, function.name)
                }
                Value::Class(class) => format!("{}.{}", class.name, function.name),
                _ => function.name.clone(),
            },
            Value::Native(native) => native.name.to_string(),
            Value::Class(class) => class.name.clone(),
            Value::Traced(inner) => inner.display_name(),
            other => other.type_name().to_string(),
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Integer(n) => *n != 0,
            Value::Float(f) => *f != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            _ => true,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Integer(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{}", printer::format_float(*x)),
            Value::String(s) => write!(f, "{s}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    match item {
                        Value::String(s) => write!(f, "\"{}\"", printer::escape_string(s))?,
                        other => write!(f, "{other}")?,
                    }
                }
                write!(f, "]")
            }
            Value::Function(function) => write!(f, "<fn {}>", function.name),
            Value::BoundMethod { .. } => write!(f, "<bound fn {}>", self.display_name()),
            Value::Class(class) => write!(f, "<class {}>", class.name),
            Value::Instance(instance) => {
                write!(f, "<{} instance>", instance.borrow().class.name)
            }
            Value::Native(native) => write!(f, "<native {}>", native.name),
            Value::Traced(_) => write!(f, "<traced {}>", self.display_name()),
        }
    }
}

/// Control flow result for handling break/continue/return
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Normal(Value),
    Return(Value),
    Break,
    Continue,
}

impl Flow {
    fn into_value(self) -> Result<Value> {
        match self {
            Flow::Normal(value) => Ok(value),
            Flow::Return(_) => Err(anyhow!("Unexpected return outside of function")),
            Flow::Break => Err(anyhow!("Unexpected break outside of loop")),
            Flow::Continue => Err(anyhow!("Unexpected continue outside of loop")),
        }
    }
}

pub struct Interpreter {
    globals: EnvRef,
    config: WeaveConfig,
    depth: usize,
    sequence: u64,
    trace_callback: Option<TraceCallback>,
    output_callback: Option<OutputCallback>,
}

impl Interpreter {
    pub fn new(config: WeaveConfig) -> Self {
        let globals = Environment::root();
        builtins::install(&globals);
        Environment::define(&globals, trace::ENTRY_POINT_NAME, trace::entry_point());
        Self {
            globals,
            config,
            depth: 0,
            sequence: 0,
            trace_callback: None,
            output_callback: None,
        }
    }

    pub fn globals(&self) -> &EnvRef {
        &self.globals
    }

    /// Set the callback that receives trace events
    pub fn set_trace_callback(&mut self, callback: TraceCallback) {
        self.trace_callback = Some(callback);
    }

    /// Set the callback that receives `print` output
    pub fn set_output_callback(&mut self, callback: OutputCallback) {
        self.output_callback = Some(callback);
    }

    pub(crate) fn emit_trace_event(&mut self, callee: &str) {
        self.sequence += 1;
        let event = TraceEvent {
            sequence: self.sequence,
            callee: callee.to_string(),
            depth: self.depth,
            timestamp: Utc::now(),
        };
        tracing::trace!(callee = %event.callee, sequence = event.sequence, "call boundary");
        if let Some(callback) = &self.trace_callback {
            callback(&event);
        }
    }

    pub(crate) fn write_output(&mut self, line: &str) {
        match &self.output_callback {
            Some(callback) => callback(line),
            None => println!("{line}"),
        }
    }

    /// Evaluate a program in the global scope
    pub fn eval_program(&mut self, program: &Program) -> Result<Value> {
        let globals = self.globals.clone();
        self.eval_program_in(program, &globals)
    }

    pub fn eval_program_in(&mut self, program: &Program, env: &EnvRef) -> Result<Value> {
        self.exec_block(&program.statements, env)?.into_value()
    }

    fn exec_block(&mut self, statements: &[Stmt], env: &EnvRef) -> Result<Flow> {
        let mut last = Value::Null;
        for stmt in statements {
            match self.exec_stmt(stmt, env)? {
                Flow::Normal(value) => last = value,
                other => return Ok(other),
            }
        }
        Ok(Flow::Normal(last))
    }

    fn exec_stmt(&mut self, stmt: &Stmt, env: &EnvRef) -> Result<Flow> {
        match stmt {
            Stmt::Let { name, value } => {
                let value = self.eval_expr(value, env)?;
                Environment::define(env, name, value.clone());
                Ok(Flow::Normal(value))
            }
            Stmt::Assign { target, value } => {
                let value = self.eval_expr(value, env)?;
                match target {
                    AssignTarget::Name(name) => {
                        if !Environment::assign(env, name, value.clone()) {
                            return Err(EvalError::variable_not_found(name).into());
                        }
                    }
                    AssignTarget::Attribute { object, name } => {
                        let object = self.eval_expr(object, env)?;
                        match object {
                            Value::Instance(instance) => {
                                instance
                                    .borrow_mut()
                                    .fields
                                    .insert(name.clone(), value.clone());
                            }
                            other => {
                                return Err(EvalError::unary_type_error(
                                    "attribute assignment",
                                    "an instance",
                                    other.type_name(),
                                )
                                .into());
                            }
                        }
                    }
                }
                Ok(Flow::Normal(value))
            }
            Stmt::Expr(expr) => Ok(Flow::Normal(self.eval_expr(expr, env)?)),
            Stmt::Fn(decl) => {
                self.define_function(decl, env)?;
                Ok(Flow::Normal(Value::Null))
            }
            Stmt::Class(decl) => {
                self.define_class(decl, env)?;
                Ok(Flow::Normal(Value::Null))
            }
            Stmt::If {
                condition,
                then_body,
                else_body,
            } => {
                if self.eval_expr(condition, env)?.is_truthy() {
                    self.exec_block(then_body, env)
                } else {
                    self.exec_block(else_body, env)
                }
            }
            Stmt::While { condition, body } => {
                while self.eval_expr(condition, env)?.is_truthy() {
                    match self.exec_block(body, env)? {
                        Flow::Normal(_) | Flow::Continue => {}
                        Flow::Break => break,
                        flow @ Flow::Return(_) => return Ok(flow),
                    }
                }
                Ok(Flow::Normal(Value::Null))
            }
            Stmt::Return(value) => {
                let value = match value {
                    Some(expr) => self.eval_expr(expr, env)?,
                    None => Value::Null,
                };
                Ok(Flow::Return(value))
            }
            Stmt::Break => Ok(Flow::Break),
            Stmt::Continue => Ok(Flow::Continue),
        }
    }

    /// Define a function and apply its decorators, innermost first.
    fn define_function(&mut self, decl: &FnDecl, env: &EnvRef) -> Result<()> {
        let source = printer::print_fn(decl, 0);
        let function = Rc::new(FunctionValue {
            id: FunctionId::new(),
            name: decl.name.clone(),
            params: decl.params.clone(),
            body: decl.body.clone(),
            kind: FnKind::Free,
            env: env.clone(),
            source: Some(source),
        });
        Environment::define(env, &decl.name, Value::Function(function));

        for decorator in decl.decorators.iter().rev() {
            let decorator_value = Environment::lookup(env, decorator)
                .ok_or_else(|| EvalError::variable_not_found(decorator))?;
            let current = Environment::lookup(env, &decl.name)
                .ok_or_else(|| EvalError::variable_not_found(&decl.name))?;
            let decorated = self.call_value(&decorator_value, vec![current], Vec::new())?;
            Environment::define(env, &decl.name, decorated);
        }
        Ok(())
    }

    fn define_class(&mut self, decl: &ClassDecl, env: &EnvRef) -> Result<()> {
        let mut methods = IndexMap::new();
        for method in &decl.methods {
            let mut kind = FnKind::Instance;
            for decorator in &method.decorators {
                match decorator.as_str() {
                    "classmethod" => kind = FnKind::Class,
                    "staticmethod" => kind = FnKind::Static,
                    other => {
                        return Err(EvalError::invalid_operation(format!(
                            "unsupported decorator '@{other}' on method '{}'",
                            method.name
                        ))
                        .into());
                    }
                }
            }
            // Methods store their source at class-body indentation.
            let source = printer::print_fn(method, 1);
            let function = Rc::new(FunctionValue {
                id: FunctionId::new(),
                name: method.name.clone(),
                params: method.params.clone(),
                body: method.body.clone(),
                kind,
                env: env.clone(),
                source: Some(source),
            });
            methods.insert(method.name.clone(), function);
        }
        let class = Rc::new(ClassValue {
            name: decl.name.clone(),
            methods,
        });
        Environment::define(env, &decl.name, Value::Class(class));
        Ok(())
    }

    fn eval_expr(&mut self, expr: &Expr, env: &EnvRef) -> Result<Value> {
        match expr {
            Expr::Null => Ok(Value::Null),
            Expr::Boolean(b) => Ok(Value::Boolean(*b)),
            Expr::Integer(n) => Ok(Value::Integer(*n)),
            Expr::Float(f) => Ok(Value::Float(*f)),
            Expr::String(s) => Ok(Value::String(s.clone())),
            Expr::List(elements) => {
                let mut items = Vec::with_capacity(elements.len());
                for element in elements {
                    items.push(self.eval_expr(element, env)?);
                }
                Ok(Value::List(items))
            }
            Expr::Name(name) => Environment::lookup(env, name)
                .ok_or_else(|| EvalError::variable_not_found(name).into()),
            Expr::Attribute { object, name } => {
                let object = self.eval_expr(object, env)?;
                self.eval_attribute(&object, name)
            }
            Expr::Index { object, index } => {
                let object = self.eval_expr(object, env)?;
                let index = self.eval_expr(index, env)?;
                match (object, index) {
                    (Value::List(items), Value::Integer(i)) => {
                        if i < 0 || i as usize >= items.len() {
                            return Err(EvalError::IndexOutOfRange {
                                index: i,
                                len: items.len(),
                            }
                            .into());
                        }
                        Ok(items[i as usize].clone())
                    }
                    (Value::List(_), other) => Err(EvalError::unary_type_error(
                        "indexing",
                        "an integer index",
                        other.type_name(),
                    )
                    .into()),
                    (other, _) => Err(EvalError::unary_type_error(
                        "indexing",
                        "a list",
                        other.type_name(),
                    )
                    .into()),
                }
            }
            Expr::Call {
                callee,
                args,
                kwargs,
            } => {
                let callee = self.eval_expr(callee, env)?;
                let mut arg_values = Vec::with_capacity(args.len());
                for arg in args {
                    arg_values.push(self.eval_expr(arg, env)?);
                }
                let mut kwarg_values = Vec::with_capacity(kwargs.len());
                for kwarg in kwargs {
                    kwarg_values.push((kwarg.name.clone(), self.eval_expr(&kwarg.value, env)?));
                }
                self.call_value(&callee, arg_values, kwarg_values)
            }
            Expr::Unary { op, operand } => {
                let value = self.eval_expr(operand, env)?;
                match op {
                    UnaryOp::Not => Ok(Value::Boolean(!value.is_truthy())),
                    UnaryOp::Neg => match value {
                        Value::Integer(n) => Ok(Value::Integer(-n)),
                        Value::Float(f) => Ok(Value::Float(-f)),
                        other => Err(EvalError::unary_type_error(
                            "negation",
                            "a number",
                            other.type_name(),
                        )
                        .into()),
                    },
                }
            }
            Expr::Binary { op, left, right } => match op {
                BinaryOp::And => {
                    let left = self.eval_expr(left, env)?;
                    if !left.is_truthy() {
                        return Ok(Value::Boolean(false));
                    }
                    let right = self.eval_expr(right, env)?;
                    Ok(Value::Boolean(right.is_truthy()))
                }
                BinaryOp::Or => {
                    let left = self.eval_expr(left, env)?;
                    if left.is_truthy() {
                        return Ok(Value::Boolean(true));
                    }
                    let right = self.eval_expr(right, env)?;
                    Ok(Value::Boolean(right.is_truthy()))
                }
                _ => {
                    let left = self.eval_expr(left, env)?;
                    let right = self.eval_expr(right, env)?;
                    self.eval_binary(*op, left, right)
                }
            },
        }
    }

    fn eval_attribute(&mut self, object: &Value, name: &str) -> Result<Value> {
        match object {
            Value::Instance(instance) => {
                let (class, method) = {
                    let inst = instance.borrow();
                    if let Some(value) = inst.fields.get(name) {
                        return Ok(value.clone());
                    }
                    (inst.class.clone(), inst.class.methods.get(name).cloned())
                };
                match method {
                    Some(function) => Ok(match function.kind {
                        FnKind::Instance => Value::BoundMethod {
                            receiver: Box::new(Value::Instance(instance.clone())),
                            function,
                        },
                        FnKind::Class => Value::BoundMethod {
                            receiver: Box::new(Value::Class(class)),
                            function,
                        },
                        FnKind::Static | FnKind::Free => Value::Function(function),
                    }),
                    None => Err(EvalError::attribute_not_found(
                        name,
                        &format!("{} instance", class.name),
                    )
                    .into()),
                }
            }
            Value::Class(class) => match class.methods.get(name).cloned() {
                Some(function) => Ok(match function.kind {
                    FnKind::Class => Value::BoundMethod {
                        receiver: Box::new(Value::Class(class.clone())),
                        function,
                    },
                    // An instance method reached through the class is
                    // unbound; the caller supplies the receiver explicitly.
                    FnKind::Instance | FnKind::Static | FnKind::Free => Value::Function(function),
                }),
                None => Err(EvalError::attribute_not_found(
                    name,
                    &format!("class {}", class.name),
                )
                .into()),
            },
            other => Err(EvalError::unary_type_error(
                "attribute access",
                "an instance or class",
                other.type_name(),
            )
            .into()),
        }
    }

    fn eval_binary(&mut self, op: BinaryOp, left: Value, right: Value) -> Result<Value> {
        match op {
            BinaryOp::Eq => Ok(Value::Boolean(left == right)),
            BinaryOp::Ne => Ok(Value::Boolean(left != right)),
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
                self.eval_comparison(op, left, right)
            }
            BinaryOp::Add => match (left, right) {
                (Value::Integer(l), Value::Integer(r)) => Ok(Value::Integer(l + r)),
                (Value::String(l), Value::String(r)) => Ok(Value::String(l + &r)),
                (Value::List(mut l), Value::List(r)) => {
                    l.extend(r);
                    Ok(Value::List(l))
                }
                (l, r) => self.numeric_op(op, l, r),
            },
            BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
                match (&left, &right) {
                    (Value::Integer(l), Value::Integer(r)) => {
                        let (l, r) = (*l, *r);
                        match op {
                            BinaryOp::Sub => Ok(Value::Integer(l - r)),
                            BinaryOp::Mul => Ok(Value::Integer(l * r)),
                            BinaryOp::Div => {
                                if r == 0 {
                                    Err(EvalError::DivisionByZero.into())
                                } else {
                                    Ok(Value::Integer(l / r))
                                }
                            }
                            BinaryOp::Mod => {
                                if r == 0 {
                                    Err(EvalError::DivisionByZero.into())
                                } else {
                                    Ok(Value::Integer(l % r))
                                }
                            }
                            _ => unreachable!(),
                        }
                    }
                    _ => self.numeric_op(op, left, right),
                }
            }
            BinaryOp::And | BinaryOp::Or => unreachable!("short-circuit ops handled in eval_expr"),
        }
    }

    fn numeric_op(&self, op: BinaryOp, left: Value, right: Value) -> Result<Value> {
        let pair = match (&left, &right) {
            (Value::Integer(l), Value::Float(r)) => Some((*l as f64, *r)),
            (Value::Float(l), Value::Integer(r)) => Some((*l, *r as f64)),
            (Value::Float(l), Value::Float(r)) => Some((*l, *r)),
            _ => None,
        };
        let Some((l, r)) = pair else {
            return Err(EvalError::binary_type_error(
                op.symbol(),
                left.type_name(),
                right.type_name(),
            )
            .into());
        };
        let result = match op {
            BinaryOp::Add => l + r,
            BinaryOp::Sub => l - r,
            BinaryOp::Mul => l * r,
            BinaryOp::Div => l / r,
            BinaryOp::Mod => l % r,
            _ => unreachable!(),
        };
        Ok(Value::Float(result))
    }

    fn eval_comparison(&self, op: BinaryOp, left: Value, right: Value) -> Result<Value> {
        let ordering = match (&left, &right) {
            (Value::Integer(l), Value::Integer(r)) => l.partial_cmp(r),
            (Value::Float(l), Value::Float(r)) => l.partial_cmp(r),
            (Value::Integer(l), Value::Float(r)) => (*l as f64).partial_cmp(r),
            (Value::Float(l), Value::Integer(r)) => l.partial_cmp(&(*r as f64)),
            (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
            _ => {
                return Err(EvalError::binary_type_error(
                    op.symbol(),
                    left.type_name(),
                    right.type_name(),
                )
                .into());
            }
        };
        let Some(ordering) = ordering else {
            return Ok(Value::Boolean(false));
        };
        let result = match op {
            BinaryOp::Lt => ordering.is_lt(),
            BinaryOp::Le => ordering.is_le(),
            BinaryOp::Gt => ordering.is_gt(),
            BinaryOp::Ge => ordering.is_ge(),
            _ => unreachable!(),
        };
        Ok(Value::Boolean(result))
    }

    /// Invoke any callable value with evaluated arguments.
    pub fn call_value(
        &mut self,
        callee: &Value,
        args: Vec<Value>,
        kwargs: Vec<(String, Value)>,
    ) -> Result<Value> {
        match callee {
            Value::Native(native) => {
                if !kwargs.is_empty() {
                    return Err(EvalError::invalid_operation(format!(
                        "{}() takes no keyword arguments",
                        native.name
                    ))
                    .into());
                }
                (native.call)(self, args)
            }
            Value::Function(function) => self.call_function(function, None, args, kwargs),
            Value::BoundMethod { receiver, function } => {
                self.call_function(function, Some((**receiver).clone()), args, kwargs)
            }
            Value::Class(class) => self.construct(class, args, kwargs),
            Value::Traced(inner) => trace::call_traced(self, inner, args, kwargs),
            other => Err(EvalError::NotCallable {
                actual: other.type_name(),
            }
            .into()),
        }
    }

    fn call_function(
        &mut self,
        function: &Rc<FunctionValue>,
        receiver: Option<Value>,
        args: Vec<Value>,
        kwargs: Vec<(String, Value)>,
    ) -> Result<Value> {
        if self.depth >= self.config.max_call_depth {
            return Err(EvalError::DepthExceeded {
                limit: self.config.max_call_depth,
            }
            .into());
        }

        let local = Environment::child(&function.env);
        let mut params: &[Param] = &function.params;
        if let Some(receiver) = receiver {
            let Some((first, rest)) = params.split_first() else {
                return Err(EvalError::invalid_operation(format!(
                    "method '{}' takes no parameters but is bound to a receiver",
                    function.name
                ))
                .into());
            };
            Environment::define(&local, &first.name, receiver);
            params = rest;
        }

        if args.len() > params.len() {
            return Err(EvalError::TooManyArguments {
                function: function.name.clone(),
                expected: params.len(),
                got: args.len(),
            }
            .into());
        }

        let mut slots: Vec<Option<Value>> = params.iter().map(|_| None).collect();
        for (i, value) in args.into_iter().enumerate() {
            slots[i] = Some(value);
        }
        for (name, value) in kwargs {
            match params.iter().position(|p| p.name == name) {
                Some(i) => {
                    if slots[i].is_some() {
                        return Err(EvalError::DuplicateArgument {
                            function: function.name.clone(),
                            name,
                        }
                        .into());
                    }
                    slots[i] = Some(value);
                }
                None => {
                    return Err(EvalError::UnknownKeyword {
                        function: function.name.clone(),
                        name,
                    }
                    .into());
                }
            }
        }

        for (param, slot) in params.iter().zip(slots) {
            let value = match slot {
                Some(value) => value,
                // Defaults are evaluated at call time in the callee scope,
                // so they may reference earlier parameters.
                None => match &param.default {
                    Some(default) => self.eval_expr(default, &local)?,
                    None => {
                        return Err(EvalError::MissingArgument {
                            function: function.name.clone(),
                            name: param.name.clone(),
                        }
                        .into());
                    }
                },
            };
            Environment::define(&local, &param.name, value);
        }

        self.depth += 1;
        let flow = self.exec_block(&function.body, &local);
        self.depth -= 1;
        match flow? {
            Flow::Return(value) => Ok(value),
            Flow::Normal(_) => Ok(Value::Null),
            Flow::Break => Err(anyhow!("Unexpected break outside of loop")),
            Flow::Continue => Err(anyhow!("Unexpected continue outside of loop")),
        }
    }

    fn construct(
        &mut self,
        class: &Rc<ClassValue>,
        args: Vec<Value>,
        kwargs: Vec<(String, Value)>,
    ) -> Result<Value> {
        let instance = Rc::new(RefCell::new(InstanceValue {
            class: class.clone(),
            fields: IndexMap::new(),
        }));
        let value = Value::Instance(instance);
        match class.methods.get("init").cloned() {
            Some(init) => {
                if init.kind != FnKind::Instance {
                    return Err(EvalError::invalid_operation(format!(
                        "init of class '{}' must be an instance method",
                        class.name
                    ))
                    .into());
                }
                self.call_function(&init, Some(value.clone()), args, kwargs)?;
            }
            None => {
                if !args.is_empty() || !kwargs.is_empty() {
                    return Err(EvalError::TooManyArguments {
                        function: class.name.clone(),
                        expected: 0,
                        got: args.len() + kwargs.len(),
                    }
                    .into());
                }
            }
        }
        Ok(value)
    }
}
