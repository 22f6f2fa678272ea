// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Tree-walking evaluation of parsed expressions.
//!
//! Name lookup goes innermost local first, then the context bindings
//! (`hass`, `states`, ...), then the helper namespace. A local named like a
//! helper therefore hides the helper.

use std::collections::HashMap;
use std::rc::Rc;

use serde_json::{Map, Value};

use crate::error::TemplateError;

use super::ast::{BinaryOp, Expr, LogicalOp, Stmt, TemplatePart, UnaryOp};
use super::context::TemplateContext;
use super::helpers::{self, decimals};
use super::value::{
    format_number, loose_equals, number, strict_equals, to_display, to_number, truthy,
};

type EvalResult<T> = Result<T, TemplateError>;

/// Control flow out of a statement.
enum Flow {
    Next,
    Return(Value),
}

/// Evaluation state for one run of one program.
pub(crate) struct Interpreter<'ctx> {
    ctx: &'ctx TemplateContext,
    frames: Vec<HashMap<String, Value>>,
    bindings: HashMap<&'static str, Rc<Value>>,
}

impl<'ctx> Interpreter<'ctx> {
    pub(crate) fn new(ctx: &'ctx TemplateContext) -> Self {
        Self {
            ctx,
            frames: vec![HashMap::new()],
            bindings: HashMap::new(),
        }
    }

    /// Runs a block body; `null` if it never returns.
    pub(crate) fn run(&mut self, program: &[Stmt]) -> EvalResult<Value> {
        for stmt in program {
            if let Flow::Return(value) = self.exec(stmt)? {
                return Ok(value);
            }
        }
        Ok(Value::Null)
    }

    /// Renders template parts into one string.
    pub(crate) fn render(&mut self, parts: &[TemplatePart]) -> EvalResult<String> {
        let mut out = String::new();
        for part in parts {
            match part {
                TemplatePart::Text(text) => out.push_str(text),
                TemplatePart::Expr(expr) => out.push_str(&to_display(&self.eval(expr)?)),
            }
        }
        Ok(out)
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn exec(&mut self, stmt: &Stmt) -> EvalResult<Flow> {
        match stmt {
            Stmt::Declare { name, init } => {
                let value = match init {
                    Some(expr) => self.eval(expr)?,
                    None => Value::Null,
                };
                if let Some(frame) = self.frames.last_mut() {
                    frame.insert(name.clone(), value);
                }
                Ok(Flow::Next)
            }
            Stmt::Assign { name, value } => {
                let value = self.eval(value)?;
                let slot = self
                    .frames
                    .iter_mut()
                    .rev()
                    .find_map(|frame| frame.get_mut(name))
                    .ok_or_else(|| TemplateError::Undefined(name.clone()))?;
                *slot = value;
                Ok(Flow::Next)
            }
            Stmt::Expr(expr) => {
                self.eval(expr)?;
                Ok(Flow::Next)
            }
            Stmt::If {
                test,
                then,
                otherwise,
            } => {
                if truthy(&self.eval(test)?) {
                    self.exec(then)
                } else if let Some(otherwise) = otherwise {
                    self.exec(otherwise)
                } else {
                    Ok(Flow::Next)
                }
            }
            Stmt::Block(body) => {
                self.frames.push(HashMap::new());
                let mut flow = Ok(Flow::Next);
                for stmt in body {
                    flow = self.exec(stmt);
                    if !matches!(flow, Ok(Flow::Next)) {
                        break;
                    }
                }
                self.frames.pop();
                flow
            }
            Stmt::Return(expr) => {
                let value = match expr {
                    Some(expr) => self.eval(expr)?,
                    None => Value::Null,
                };
                Ok(Flow::Return(value))
            }
            Stmt::Empty => Ok(Flow::Next),
        }
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    pub(crate) fn eval(&mut self, expr: &Expr) -> EvalResult<Value> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Template(parts) => Ok(Value::String(self.render(parts)?)),
            Expr::Ident(name) => self.lookup(name),
            Expr::Array(items) => items
                .iter()
                .map(|item| self.eval(item))
                .collect::<EvalResult<Vec<_>>>()
                .map(Value::Array),
            Expr::Object(entries) => {
                let mut object = Map::new();
                for (key, value) in entries {
                    let value = self.eval(value)?;
                    object.insert(key.clone(), value);
                }
                Ok(Value::Object(object))
            }
            Expr::Member {
                object,
                property,
                optional,
            } => {
                let target = self.target(object)?;
                member(&target, property, *optional)
            }
            Expr::Index {
                object,
                index,
                optional,
            } => {
                let target = self.target(object)?;
                let index = self.eval(index)?;
                element(&target, &index, *optional)
            }
            Expr::Call { callee, args } => self.call(callee, args),
            Expr::Unary { op, operand } => {
                let value = self.eval(operand)?;
                Ok(match op {
                    UnaryOp::Not => Value::Bool(!truthy(&value)),
                    UnaryOp::Neg => number(-to_number(&value)),
                    UnaryOp::Plus => number(to_number(&value)),
                })
            }
            Expr::Binary { op, left, right } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                Ok(binary(*op, &left, &right))
            }
            Expr::Logical { op, left, right } => {
                let left = self.eval(left)?;
                let short_circuit = match op {
                    LogicalOp::And => !truthy(&left),
                    LogicalOp::Or => truthy(&left),
                    LogicalOp::Nullish => !left.is_null(),
                };
                if short_circuit {
                    Ok(left)
                } else {
                    self.eval(right)
                }
            }
            Expr::Conditional {
                test,
                consequent,
                alternate,
            } => {
                if truthy(&self.eval(test)?) {
                    self.eval(consequent)
                } else {
                    self.eval(alternate)
                }
            }
        }
    }

    fn local(&self, name: &str) -> Option<&Value> {
        self.frames.iter().rev().find_map(|frame| frame.get(name))
    }

    /// Resolves a context binding, built once per run and shared after.
    fn binding(&mut self, name: &str) -> Option<Rc<Value>> {
        let key = super::context::CONTEXT_BINDINGS
            .iter()
            .copied()
            .find(|b| *b == name)?;
        if let Some(value) = self.bindings.get(key) {
            return Some(Rc::clone(value));
        }
        let value = Rc::new(self.ctx.binding(key)?);
        self.bindings.insert(key, Rc::clone(&value));
        Some(value)
    }

    /// Evaluates the object of a member or index access.
    ///
    /// A binding is shared rather than copied, so `states['x']` clones one
    /// entity instead of the whole snapshot.
    fn target(&mut self, expr: &Expr) -> EvalResult<Rc<Value>> {
        if let Expr::Ident(name) = expr
            && self.local(name).is_none()
            && let Some(value) = self.binding(name)
        {
            return Ok(value);
        }
        self.eval(expr).map(Rc::new)
    }

    fn lookup(&mut self, name: &str) -> EvalResult<Value> {
        if let Some(value) = self.local(name) {
            return Ok(value.clone());
        }
        if let Some(value) = self.binding(name) {
            return Ok(Rc::unwrap_or_clone(value));
        }
        if helpers::is_helper(name) {
            return Err(TemplateError::eval(format!(
                "helper {name} can only be called"
            )));
        }
        Err(TemplateError::Undefined(name.to_string()))
    }

    fn call(&mut self, callee: &Expr, args: &[Expr]) -> EvalResult<Value> {
        match callee {
            Expr::Ident(name) => {
                if self.local(name).is_some() || self.binding(name).is_some() {
                    return Err(TemplateError::NotCallable(name.clone()));
                }
                let args = self.eval_args(args)?;
                helpers::call(name, &args, self.ctx)
                    .unwrap_or_else(|| Err(TemplateError::Undefined(name.clone())))
            }
            Expr::Member {
                object,
                property,
                optional,
            } => {
                let receiver = self.target(object)?;
                if receiver.is_null() {
                    if *optional {
                        return Ok(Value::Null);
                    }
                    return Err(null_access(property));
                }
                let args = self.eval_args(args)?;
                method(&receiver, property, &args)
            }
            _ => Err(TemplateError::NotCallable("expression".to_string())),
        }
    }

    fn eval_args(&mut self, args: &[Expr]) -> EvalResult<Vec<Value>> {
        args.iter().map(|arg| self.eval(arg)).collect()
    }
}

fn null_access(property: &str) -> TemplateError {
    TemplateError::eval(format!(
        "cannot read properties of null (reading '{property}')"
    ))
}

fn member(target: &Value, property: &str, optional: bool) -> EvalResult<Value> {
    Ok(match target {
        Value::Null if optional => Value::Null,
        Value::Null => return Err(null_access(property)),
        Value::Object(map) => map.get(property).cloned().unwrap_or(Value::Null),
        Value::Array(items) if property == "length" => Value::from(items.len()),
        Value::String(s) if property == "length" => Value::from(s.chars().count()),
        _ => Value::Null,
    })
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn element(target: &Value, index: &Value, optional: bool) -> EvalResult<Value> {
    let position = || {
        let n = to_number(index);
        // Safe: only non-negative integral values are converted.
        (n >= 0.0 && n.fract() == 0.0).then_some(n as usize)
    };
    Ok(match target {
        Value::Null if optional => Value::Null,
        Value::Null => return Err(null_access(&to_display(index))),
        Value::Object(map) => map.get(&to_display(index)).cloned().unwrap_or(Value::Null),
        Value::Array(items) => match index {
            Value::String(s) if s == "length" => Value::from(items.len()),
            _ => position()
                .and_then(|i| items.get(i))
                .cloned()
                .unwrap_or(Value::Null),
        },
        Value::String(s) => match index {
            Value::String(key) if key == "length" => Value::from(s.chars().count()),
            _ => position()
                .and_then(|i| s.chars().nth(i))
                .map_or(Value::Null, |c| Value::String(c.to_string())),
        },
        _ => Value::Null,
    })
}

fn method(receiver: &Value, name: &str, args: &[Value]) -> EvalResult<Value> {
    let arg = |i: usize| args.get(i).unwrap_or(&Value::Null);

    let result = match (receiver, name) {
        (_, "toString") => Value::String(to_display(receiver)),
        (Value::Number(n), "toFixed") => {
            let n = n.as_f64().unwrap_or(f64::NAN);
            let text = if n.is_finite() {
                format!("{n:.prec$}", prec = decimals(args.first()))
            } else {
                format_number(n)
            };
            Value::String(text)
        }
        (Value::String(s), "toUpperCase") => Value::String(s.to_uppercase()),
        (Value::String(s), "toLowerCase") => Value::String(s.to_lowercase()),
        (Value::String(s), "trim") => Value::String(s.trim().to_string()),
        (Value::String(s), "includes") => Value::Bool(s.contains(to_display(arg(0)).as_str())),
        (Value::String(s), "startsWith") => {
            Value::Bool(s.starts_with(to_display(arg(0)).as_str()))
        }
        (Value::String(s), "endsWith") => Value::Bool(s.ends_with(to_display(arg(0)).as_str())),
        (Value::String(s), "split") => {
            let separator = to_display(arg(0));
            Value::Array(
                s.split(separator.as_str())
                    .map(|part| Value::String(part.to_string()))
                    .collect(),
            )
        }
        (Value::Array(items), "includes") => {
            Value::Bool(items.iter().any(|item| strict_equals(item, arg(0))))
        }
        (Value::Array(items), "join") => {
            let separator = match arg(0) {
                Value::Null => ",".to_string(),
                other => to_display(other),
            };
            let parts: Vec<String> = items
                .iter()
                .map(|item| match item {
                    Value::Null => String::new(),
                    other => to_display(other),
                })
                .collect();
            Value::String(parts.join(&separator))
        }
        _ => return Err(TemplateError::NotCallable(format!(".{name}"))),
    };
    Ok(result)
}

fn binary(op: BinaryOp, left: &Value, right: &Value) -> Value {
    let numeric = |f: fn(f64, f64) -> f64| number(f(to_number(left), to_number(right)));

    match op {
        BinaryOp::Add => {
            let textual = |v: &Value| {
                matches!(v, Value::String(_) | Value::Array(_) | Value::Object(_))
            };
            if textual(left) || textual(right) {
                Value::String(to_display(left) + &to_display(right))
            } else {
                numeric(|a, b| a + b)
            }
        }
        BinaryOp::Sub => numeric(|a, b| a - b),
        BinaryOp::Mul => numeric(|a, b| a * b),
        BinaryOp::Div => numeric(|a, b| a / b),
        BinaryOp::Rem => numeric(|a, b| a % b),
        BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => {
            Value::Bool(compare(op, left, right))
        }
        BinaryOp::LooseEq => Value::Bool(loose_equals(left, right)),
        BinaryOp::LooseNotEq => Value::Bool(!loose_equals(left, right)),
        BinaryOp::StrictEq => Value::Bool(strict_equals(left, right)),
        BinaryOp::StrictNotEq => Value::Bool(!strict_equals(left, right)),
    }
}

fn compare(op: BinaryOp, left: &Value, right: &Value) -> bool {
    let ordering = match (left, right) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => to_number(left).partial_cmp(&to_number(right)),
    };
    let Some(ordering) = ordering else {
        return false;
    };
    match op {
        BinaryOp::Lt => ordering.is_lt(),
        BinaryOp::LtEq => ordering.is_le(),
        BinaryOp::Gt => ordering.is_gt(),
        _ => ordering.is_ge(),
    }
}
