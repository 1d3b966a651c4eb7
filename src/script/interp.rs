//! Tree-walking interpreter for parsed programs
//!
//! Bare identifiers resolve in this order:
//!
//! 1. render-local variables, innermost scope first
//! 2. the reserved names `context` (the data hash) and `helpers`
//! 3. members of the data hash
//! 4. the helper set
//!
//! Anything else is [`RenderError::Undefined`]. `helpers.name(...)` always
//! reaches the helper set, even when data shadows `name`.

use super::ast::{AssignOp, BinaryOp, Expr, PathSegment, Place, Program, Stmt, UnaryOp};
use crate::error::RenderError;
use crate::helpers::{Helper, HelperContext, HelperSet};
use crate::options::RenderOptions;
use crate::template::compiler::DISPLAY_FN;
use crate::value::Value;
use hashbrown::HashMap;
use std::borrow::Cow;
use std::cmp::Ordering;

/// Reserved name bound to the data hash
pub const CONTEXT_VAR: &str = "context";

/// Reserved name bound to the helper set
pub const HELPERS_VAR: &str = "helpers";

static NIL: Value = Value::Nil;

type Result<T> = std::result::Result<T, RenderError>;
type Scope = HashMap<String, Value>;

/// How a statement finished
enum Flow {
    Normal,
    Break,
    Continue,
    Return(Value),
}

/// Evaluated step of an assignment path
enum Key {
    Name(String),
    Index(Value),
}

/// One execution of a program against data and helpers
pub struct Interpreter<'a> {
    data: &'a Value,
    helpers: &'a HelperSet,
    options: &'a RenderOptions,
    depth: usize,
    scopes: Vec<Scope>,
}

impl<'a> Interpreter<'a> {
    /// Create an interpreter for a render at nesting `depth`
    pub fn new(
        data: &'a Value,
        helpers: &'a HelperSet,
        options: &'a RenderOptions,
        depth: usize,
    ) -> Result<Self> {
        if depth > options.max_depth {
            return Err(RenderError::DepthExceeded(options.max_depth));
        }
        Ok(Self {
            data,
            helpers,
            options,
            depth,
            scopes: vec![Scope::new()],
        })
    }

    /// Execute the program and return the value it returned (nil if none)
    pub fn run(mut self, program: &Program) -> Result<Value> {
        match self.exec_all(&program.body)? {
            Flow::Return(value) => Ok(value),
            _ => Ok(Value::Nil),
        }
    }

    fn is_local(&self, name: &str) -> bool {
        self.scopes.iter().any(|scope| scope.contains_key(name))
    }

    fn helper_context(&self) -> HelperContext<'a> {
        HelperContext {
            data: self.data,
            helpers: self.helpers,
            options: self.options,
            depth: self.depth,
        }
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn exec_all(&mut self, stmts: &[Stmt]) -> Result<Flow> {
        for stmt in stmts {
            match self.exec(stmt)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    /// Run `stmts` in a fresh scope holding `bindings`
    fn exec_scoped(&mut self, stmts: &[Stmt], bindings: Vec<(String, Value)>) -> Result<Flow> {
        self.scopes.push(bindings.into_iter().collect());
        let flow = self.exec_all(stmts);
        self.scopes.pop();
        flow
    }

    fn exec(&mut self, stmt: &Stmt) -> Result<Flow> {
        match stmt {
            Stmt::Empty => Ok(Flow::Normal),
            Stmt::Block(body) => self.exec_scoped(body, Vec::new()),
            Stmt::Expr(expr) => {
                self.eval(expr)?;
                Ok(Flow::Normal)
            }
            Stmt::Declare {
                function_scoped,
                bindings,
            } => {
                for (name, init) in bindings {
                    let value = match init {
                        Some(expr) => self.eval(expr)?.into_owned(),
                        None => Value::Nil,
                    };
                    let index = if *function_scoped {
                        0
                    } else {
                        self.scopes.len() - 1
                    };
                    self.scopes[index].insert(name.clone(), value);
                }
                Ok(Flow::Normal)
            }
            Stmt::Assign { target, op, value } => {
                let rhs = self.eval(value)?.into_owned();
                let keys = self.eval_path(&target.path)?;
                self.assign(target, keys, *op, rhs)?;
                Ok(Flow::Normal)
            }
            Stmt::If {
                branches,
                otherwise,
            } => {
                for (test, body) in branches {
                    if self.eval(test)?.is_truthy() {
                        return self.exec_scoped(body, Vec::new());
                    }
                }
                match otherwise {
                    Some(body) => self.exec_scoped(body, Vec::new()),
                    None => Ok(Flow::Normal),
                }
            }
            Stmt::ForIn {
                first,
                second,
                iterable,
                body,
            } => self.exec_for_in(first, second.as_deref(), iterable, body),
            Stmt::ForLoop {
                init,
                test,
                update,
                body,
            } => {
                self.scopes.push(Scope::new());
                let flow = self.exec_for_loop(init.as_deref(), test.as_ref(), update.as_deref(), body);
                self.scopes.pop();
                flow
            }
            Stmt::While { test, body } => {
                let mut iterations = 0;
                while self.eval(test)?.is_truthy() {
                    self.count_iteration(&mut iterations)?;
                    match self.exec_scoped(body, Vec::new())? {
                        Flow::Break => break,
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                        Flow::Normal | Flow::Continue => {}
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::Break => Ok(Flow::Break),
            Stmt::Continue => Ok(Flow::Continue),
            Stmt::Return(expr) => {
                let value = match expr {
                    Some(expr) => self.eval(expr)?.into_owned(),
                    None => Value::Nil,
                };
                Ok(Flow::Return(value))
            }
        }
    }

    fn count_iteration(&self, iterations: &mut usize) -> Result<()> {
        *iterations += 1;
        let max = self.options.max_loop_iterations;
        if max != 0 && *iterations > max {
            return Err(RenderError::LoopLimitExceeded(max));
        }
        Ok(())
    }

    fn exec_for_in(
        &mut self,
        first: &str,
        second: Option<&str>,
        iterable: &Expr,
        body: &[Stmt],
    ) -> Result<Flow> {
        let iterable = self.eval(iterable)?.into_owned();
        // With one binding, hashes yield keys and everything else yields elements
        let keys_only = matches!(iterable, Value::Hash(_));

        let entries: Vec<(Value, Value)> = match iterable {
            Value::Nil => Vec::new(),
            Value::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, v)| (Value::Int(i as i64), v))
                .collect(),
            Value::Hash(map) => map.into_iter().map(|(k, v)| (Value::String(k), v)).collect(),
            Value::String(s) => s
                .chars()
                .enumerate()
                .map(|(i, c)| (Value::Int(i as i64), Value::String(c.to_string())))
                .collect(),
            other => return Err(RenderError::type_mismatch("iterable", other.type_name())),
        };

        for (key, value) in entries {
            let bindings = match second {
                Some(name) => vec![(first.to_string(), key), (name.to_string(), value)],
                None if keys_only => vec![(first.to_string(), key)],
                None => vec![(first.to_string(), value)],
            };
            match self.exec_scoped(body, bindings)? {
                Flow::Break => break,
                Flow::Return(value) => return Ok(Flow::Return(value)),
                Flow::Normal | Flow::Continue => {}
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_for_loop(
        &mut self,
        init: Option<&Stmt>,
        test: Option<&Expr>,
        update: Option<&Stmt>,
        body: &[Stmt],
    ) -> Result<Flow> {
        if let Some(init) = init {
            self.exec(init)?;
        }
        let mut iterations = 0;
        loop {
            if let Some(test) = test {
                if !self.eval(test)?.is_truthy() {
                    break;
                }
            }
            self.count_iteration(&mut iterations)?;
            match self.exec_scoped(body, Vec::new())? {
                Flow::Break => break,
                Flow::Return(value) => return Ok(Flow::Return(value)),
                Flow::Normal | Flow::Continue => {}
            }
            if let Some(update) = update {
                self.exec(update)?;
            }
        }
        Ok(Flow::Normal)
    }

    fn eval_path(&self, path: &[PathSegment]) -> Result<Vec<Key>> {
        path.iter()
            .map(|segment| match segment {
                PathSegment::Name(name) => Ok(Key::Name(name.clone())),
                PathSegment::Index(expr) => Ok(Key::Index(self.eval(expr)?.into_owned())),
            })
            .collect()
    }

    fn assign(&mut self, place: &Place, keys: Vec<Key>, op: AssignOp, rhs: Value) -> Result<()> {
        let found = self
            .scopes
            .iter()
            .rposition(|scope| scope.contains_key(&place.root));

        let index = match found {
            Some(index) => index,
            None if keys.is_empty()
                && place.root != CONTEXT_VAR
                && place.root != HELPERS_VAR =>
            {
                // Undeclared names become render-wide locals
                self.scopes[0].insert(place.root.clone(), Value::Nil);
                0
            }
            None => return Err(RenderError::InvalidAssignment(place.root.clone())),
        };

        let mut slot = self.scopes[index]
            .get_mut(&place.root)
            .ok_or_else(|| RenderError::InvalidAssignment(place.root.clone()))?;
        for key in keys {
            slot = step_into(slot, key)?;
        }

        match op {
            AssignOp::Assign => *slot = rhs,
            AssignOp::AddAssign => match slot {
                // In place, so accumulating output stays linear
                Value::String(s) => match rhs {
                    Value::String(r) => s.push_str(&r),
                    other => s.push_str(&other.to_string()),
                },
                _ => *slot = add(slot, &rhs)?,
            },
            AssignOp::SubAssign => *slot = arith(BinaryOp::Sub, slot, &rhs)?,
        }
        Ok(())
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn eval<'s>(&'s self, expr: &'s Expr) -> Result<Cow<'s, Value>> {
        match expr {
            Expr::Literal(value) => Ok(Cow::Borrowed(value)),
            Expr::Ident(name) => self.lookup(name),
            Expr::Array(items) => {
                let values = items
                    .iter()
                    .map(|item| self.eval(item).map(Cow::into_owned))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Cow::Owned(Value::Array(values)))
            }
            Expr::Object(entries) => {
                let map = entries
                    .iter()
                    .map(|(key, value)| -> Result<(String, Value)> {
                        Ok((key.clone(), self.eval(value)?.into_owned()))
                    })
                    .collect::<Result<_>>()?;
                Ok(Cow::Owned(Value::Hash(map)))
            }
            Expr::Member { object, name } => member(self.eval(object)?, name),
            Expr::Index { object, index } => {
                let target = self.eval(object)?;
                let key = self.eval(index)?;
                index_into(target, &key)
            }
            Expr::Call { callee, args } => self.call(callee, args),
            Expr::Unary { op, operand } => self.unary(*op, operand),
            Expr::Binary { op, left, right } => {
                let left = self.eval(left)?;
                match op {
                    BinaryOp::And if !left.is_truthy() => Ok(left),
                    BinaryOp::Or if left.is_truthy() => Ok(left),
                    BinaryOp::And | BinaryOp::Or => self.eval(right),
                    _ => {
                        let right = self.eval(right)?;
                        binary(*op, &left, &right).map(Cow::Owned)
                    }
                }
            }
            Expr::Conditional {
                test,
                consequent,
                alternate,
            } => {
                if self.eval(test)?.is_truthy() {
                    self.eval(consequent)
                } else {
                    self.eval(alternate)
                }
            }
        }
    }

    fn lookup<'s>(&'s self, name: &str) -> Result<Cow<'s, Value>> {
        for scope in self.scopes.iter().rev() {
            if let Some(value) = scope.get(name) {
                return Ok(Cow::Borrowed(value));
            }
        }
        match name {
            CONTEXT_VAR => return Ok(Cow::Borrowed(self.data)),
            HELPERS_VAR => return Err(RenderError::type_mismatch("value", "helper scope")),
            _ => {}
        }
        if let Some(value) = self.data.get(name) {
            return Ok(Cow::Borrowed(value));
        }
        match self.helpers.get(name) {
            Some(Helper::Value(value)) => Ok(Cow::Borrowed(value)),
            Some(Helper::Function(_)) => Err(RenderError::type_mismatch("value", "function")),
            None => Err(RenderError::Undefined(name.to_string())),
        }
    }

    fn eval_args(&self, args: &[Expr]) -> Result<Vec<Value>> {
        args.iter()
            .map(|arg| self.eval(arg).map(Cow::into_owned))
            .collect()
    }

    fn call<'s>(&'s self, callee: &'s Expr, args: &'s [Expr]) -> Result<Cow<'s, Value>> {
        match callee {
            Expr::Ident(name) if name == DISPLAY_FN && !self.is_local(name) => {
                let value = match args.first() {
                    Some(arg) => self.eval(arg)?,
                    None => Cow::Borrowed(&NIL),
                };
                Ok(Cow::Owned(Value::String(
                    value.display_with(&self.options.null_text),
                )))
            }
            Expr::Ident(name) => {
                if self.is_local(name) || name == CONTEXT_VAR || self.data.get(name).is_some() {
                    return Err(RenderError::NotCallable(name.clone()));
                }
                self.call_helper(name, args)
            }
            Expr::Member { object, name } => {
                if matches!(object.as_ref(), Expr::Ident(root) if root == HELPERS_VAR)
                    && !self.is_local(HELPERS_VAR)
                {
                    return self.call_helper(name, args);
                }
                let receiver = self.eval(object)?;
                let args = self.eval_args(args)?;
                call_method(&receiver, name, &args).map(Cow::Owned)
            }
            _ => Err(RenderError::NotCallable("expression".to_string())),
        }
    }

    fn call_helper<'s>(&'s self, name: &str, args: &[Expr]) -> Result<Cow<'s, Value>> {
        match self.helpers.get(name) {
            Some(Helper::Function(function)) => {
                let args = self.eval_args(args)?;
                function(&self.helper_context(), &args).map(Cow::Owned)
            }
            Some(Helper::Value(_)) => Err(RenderError::NotCallable(name.to_string())),
            None => Err(RenderError::Undefined(name.to_string())),
        }
    }

    fn unary<'s>(&'s self, op: UnaryOp, operand: &'s Expr) -> Result<Cow<'s, Value>> {
        let result = match op {
            UnaryOp::TypeOf => Value::string(self.type_of(operand)?),
            UnaryOp::Not => Value::Bool(!self.eval(operand)?.is_truthy()),
            UnaryOp::Neg => match self.eval(operand)?.as_ref() {
                Value::Int(n) => n
                    .checked_neg()
                    .map(Value::Int)
                    .unwrap_or(Value::Float(-(*n as f64))),
                other => Value::Float(-number(other)?),
            },
            UnaryOp::Plus => match self.eval(operand)?.as_ref() {
                Value::Int(n) => Value::Int(*n),
                other => Value::Float(number(other)?),
            },
        };
        Ok(Cow::Owned(result))
    }

    fn type_of(&self, operand: &Expr) -> Result<&'static str> {
        if let Expr::Ident(name) = operand {
            if !self.is_local(name)
                && self.data.get(name).is_none()
                && matches!(self.helpers.get(name), Some(Helper::Function(_)))
            {
                return Ok("function");
            }
        }
        match self.eval(operand) {
            Ok(value) => Ok(match value.as_ref() {
                Value::Nil => "undefined",
                Value::Bool(_) => "boolean",
                Value::Int(_) | Value::Float(_) => "number",
                Value::String(_) => "string",
                Value::Array(_) | Value::Hash(_) | Value::Date(_) => "object",
            }),
            Err(RenderError::Undefined(_)) => Ok("undefined"),
            Err(e) => Err(e),
        }
    }
}

// ============================================================================
// Value operations
// ============================================================================

/// Numeric view of a value: nil is 0, booleans are 0/1, numeric strings parse
fn to_number(value: &Value) -> Option<f64> {
    match value {
        Value::Nil => Some(0.0),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Int(n) => Some(*n as f64),
        Value::Float(f) => Some(*f),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                Some(0.0)
            } else {
                s.parse().ok()
            }
        }
        Value::Array(_) | Value::Hash(_) | Value::Date(_) => None,
    }
}

fn number(value: &Value) -> Result<f64> {
    to_number(value).ok_or_else(|| RenderError::type_mismatch("number", value.type_name()))
}

fn binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value> {
    Ok(match op {
        BinaryOp::Eq => Value::Bool(left.loose_eq(right)),
        BinaryOp::Ne => Value::Bool(!left.loose_eq(right)),
        BinaryOp::Lt => Value::Bool(compare(left, right) == Some(Ordering::Less)),
        BinaryOp::Le => Value::Bool(matches!(
            compare(left, right),
            Some(Ordering::Less | Ordering::Equal)
        )),
        BinaryOp::Gt => Value::Bool(compare(left, right) == Some(Ordering::Greater)),
        BinaryOp::Ge => Value::Bool(matches!(
            compare(left, right),
            Some(Ordering::Greater | Ordering::Equal)
        )),
        BinaryOp::Add => add(left, right)?,
        BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => arith(op, left, right)?,
        BinaryOp::And if left.is_truthy() => right.clone(),
        BinaryOp::Or if !left.is_truthy() => right.clone(),
        BinaryOp::And | BinaryOp::Or => left.clone(),
    })
}

fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        _ => to_number(left)?.partial_cmp(&to_number(right)?),
    }
}

/// `+`: concatenation when either side is textual, numeric addition otherwise
fn add(left: &Value, right: &Value) -> Result<Value> {
    let textual = |v: &Value| {
        matches!(
            v,
            Value::String(_) | Value::Array(_) | Value::Hash(_) | Value::Date(_)
        )
    };
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Ok(a
            .checked_add(*b)
            .map(Value::Int)
            .unwrap_or(Value::Float(*a as f64 + *b as f64))),
        _ if textual(left) || textual(right) => Ok(Value::String(format!("{}{}", left, right))),
        _ => Ok(Value::Float(number(left)? + number(right)?)),
    }
}

/// `-`, `*`, `/` and `%`
fn arith(op: BinaryOp, left: &Value, right: &Value) -> Result<Value> {
    if let (Value::Int(a), Value::Int(b)) = (left, right) {
        let (a, b) = (*a, *b);
        let exact = match op {
            BinaryOp::Sub => a.checked_sub(b),
            BinaryOp::Mul => a.checked_mul(b),
            BinaryOp::Div if b == 0 => return Err(RenderError::DivisionByZero),
            BinaryOp::Div if a.checked_rem(b) == Some(0) => a.checked_div(b),
            BinaryOp::Div => None,
            BinaryOp::Rem if b == 0 => return Err(RenderError::DivisionByZero),
            BinaryOp::Rem => a.checked_rem(b),
            _ => None,
        };
        if let Some(n) = exact {
            return Ok(Value::Int(n));
        }
    }

    let (a, b) = (number(left)?, number(right)?);
    let result = match op {
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div | BinaryOp::Rem if b == 0.0 => return Err(RenderError::DivisionByZero),
        BinaryOp::Div => a / b,
        _ => a % b,
    };
    Ok(Value::Float(result))
}

fn length(value: &Value) -> Option<i64> {
    match value {
        Value::String(s) => Some(s.chars().count() as i64),
        Value::Array(items) => Some(items.len() as i64),
        Value::Hash(map) if !map.contains_key("length") => Some(map.len() as i64),
        _ => None,
    }
}

fn member<'v>(target: Cow<'v, Value>, name: &str) -> Result<Cow<'v, Value>> {
    if name == "length" {
        if let Some(n) = length(&target) {
            return Ok(Cow::Owned(Value::Int(n)));
        }
    }
    match target {
        Cow::Borrowed(Value::Nil) | Cow::Owned(Value::Nil) => {
            Err(RenderError::type_mismatch("object", "null"))
        }
        Cow::Borrowed(Value::Hash(map)) => Ok(Cow::Borrowed(map.get(name).unwrap_or(&NIL))),
        Cow::Owned(Value::Hash(mut map)) => Ok(Cow::Owned(map.remove(name).unwrap_or_default())),
        _ => Ok(Cow::Borrowed(&NIL)),
    }
}

fn index_into<'v>(target: Cow<'v, Value>, key: &Value) -> Result<Cow<'v, Value>> {
    let position = match key {
        Value::Int(n) => usize::try_from(*n).ok(),
        Value::Float(f) if f.fract() == 0.0 && *f >= 0.0 => Some(*f as usize),
        Value::String(name) => return member(target, name),
        _ => None,
    };

    match (target, position) {
        (Cow::Borrowed(Value::Nil) | Cow::Owned(Value::Nil), _) => {
            Err(RenderError::type_mismatch("object", "null"))
        }
        (Cow::Borrowed(Value::Array(items)), Some(i)) => {
            Ok(Cow::Borrowed(items.get(i).unwrap_or(&NIL)))
        }
        (Cow::Owned(Value::Array(mut items)), Some(i)) if i < items.len() => {
            Ok(Cow::Owned(items.swap_remove(i)))
        }
        (target, Some(i)) if target.as_str().is_some() => Ok(Cow::Owned(
            target
                .as_str()
                .and_then(|s| s.chars().nth(i))
                .map(|c| Value::String(c.to_string()))
                .unwrap_or_default(),
        )),
        (target @ Cow::Borrowed(Value::Hash(_)), _) | (target @ Cow::Owned(Value::Hash(_)), _) => {
            member(target, &key.to_string())
        }
        _ => Ok(Cow::Borrowed(&NIL)),
    }
}

/// Follow one assignment path step, creating hash members as needed
fn step_into(slot: &mut Value, key: Key) -> Result<&mut Value> {
    match (slot, key) {
        (Value::Hash(map), Key::Name(name)) => Ok(map.entry(name).or_default()),
        (Value::Hash(map), Key::Index(index)) => Ok(map.entry(index.to_string()).or_default()),
        (Value::Array(items), Key::Index(Value::Int(i))) => {
            let len = items.len();
            match usize::try_from(i) {
                Ok(i) if i < len => Ok(&mut items[i]),
                Ok(i) if i == len => {
                    items.push(Value::Nil);
                    Ok(&mut items[i])
                }
                _ => Err(RenderError::invalid_argument(
                    "[]",
                    format!("index {} out of bounds for length {}", i, len),
                )),
            }
        }
        (other, _) => Err(RenderError::type_mismatch("object", other.type_name())),
    }
}

// ============================================================================
// Builtin methods
// ============================================================================

fn str_arg<'v>(method: &str, args: &'v [Value], index: usize) -> Result<&'v str> {
    match args.get(index) {
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(RenderError::invalid_argument(
            method,
            format!("expected a string, got {}", other.type_name()),
        )),
        None => Err(RenderError::invalid_argument(method, "missing argument")),
    }
}

fn call_method(receiver: &Value, method: &str, args: &[Value]) -> Result<Value> {
    if method == "toString" {
        return Ok(Value::String(receiver.to_string()));
    }

    let result = match (receiver, method) {
        (Value::String(s), "toUpperCase") => Value::String(s.to_uppercase()),
        (Value::String(s), "toLowerCase") => Value::String(s.to_lowercase()),
        (Value::String(s), "trim") => Value::string(s.trim()),
        (Value::String(s), "includes") => Value::Bool(s.contains(str_arg(method, args, 0)?)),
        (Value::String(s), "startsWith") => Value::Bool(s.starts_with(str_arg(method, args, 0)?)),
        (Value::String(s), "endsWith") => Value::Bool(s.ends_with(str_arg(method, args, 0)?)),
        (Value::String(s), "indexOf") => {
            let needle = str_arg(method, args, 0)?;
            Value::Int(
                s.find(needle)
                    .map(|byte| s[..byte].chars().count() as i64)
                    .unwrap_or(-1),
            )
        }
        (Value::String(s), "split") => {
            let separator = str_arg(method, args, 0)?;
            let parts: Vec<Value> = if separator.is_empty() {
                s.chars().map(|c| Value::String(c.to_string())).collect()
            } else {
                s.split(separator).map(Value::string).collect()
            };
            Value::Array(parts)
        }
        (Value::String(s), "replace") => {
            let from = str_arg(method, args, 0)?;
            let to = str_arg(method, args, 1)?;
            Value::String(s.replacen(from, to, 1))
        }
        (Value::Array(items), "join") => {
            let separator = match args.first() {
                None | Some(Value::Nil) => ",",
                Some(_) => str_arg(method, args, 0)?,
            };
            Value::String(
                items
                    .iter()
                    .map(|item| item.to_string())
                    .collect::<Vec<_>>()
                    .join(separator),
            )
        }
        (Value::Array(items), "includes") => {
            let needle = args.first().unwrap_or(&NIL);
            Value::Bool(items.iter().any(|item| item.loose_eq(needle)))
        }
        (Value::Array(items), "indexOf") => {
            let needle = args.first().unwrap_or(&NIL);
            Value::Int(
                items
                    .iter()
                    .position(|item| item.loose_eq(needle))
                    .map(|i| i as i64)
                    .unwrap_or(-1),
            )
        }
        (Value::Hash(map), "keys") => Value::Array(map.keys().map(Value::string).collect()),
        (Value::Hash(map), "values") => Value::Array(map.values().cloned().collect()),
        (Value::Hash(map), "hasOwnProperty") => {
            Value::Bool(map.contains_key(str_arg(method, args, 0)?))
        }
        (Value::Int(_) | Value::Float(_), "toFixed") => {
            let digits = match args.first() {
                None => 0,
                Some(Value::Int(d)) if (0..=100).contains(d) => *d as usize,
                Some(_) => {
                    return Err(RenderError::invalid_argument(
                        method,
                        "digits must be an integer between 0 and 100",
                    ))
                }
            };
            Value::String(format!("{:.*}", digits, number(receiver)?))
        }
        _ => {
            return Err(RenderError::UnknownMethod {
                type_name: receiver.type_name(),
                method: method.to_string(),
            })
        }
    };
    Ok(result)
}
