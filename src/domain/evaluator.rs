//! Partial Evaluator
//!
//! Best-effort folding of expression nodes against the simulated
//! environment. Nothing is executed: calls are rendered as text, and any
//! shape that cannot be folded degrades to a [`Placeholder`] instead of
//! failing the surrounding statement.

use std::collections::HashMap;

use thiserror::Error;

use crate::domain::ast::{BinOp, Constant, Expr};
use crate::domain::value::{Placeholder, Value, MAX_RENDER_LEN};

/// Flat name-to-value mapping shared by a whole trace; last write wins.
pub type Environment = HashMap<String, Value>;

/// Largest [`Value::weight`] a binary operation or a literal may build
/// before it is left unfolded.
pub const MAX_SEQUENCE_LEN: usize = 1_000_000;

/// Deepest container nesting a literal may build.
pub const MAX_CONTAINER_DEPTH: usize = 100;

/// Failure to fold one node. Surfaces as `<error: ...>` for mappings and as
/// the `(left op right)` text for binary operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("unhashable type: '{0}'")]
    Unhashable(&'static str),
    #[error("unsupported operand type(s) for {op}: '{left}' and '{right}'")]
    UnsupportedOperands {
        op: &'static str,
        left: &'static str,
        right: &'static str,
    },
    #[error("operand is not resolved")]
    Unresolved,
    #[error("unknown operator")]
    UnknownOperator,
    #[error("division by zero")]
    DivisionByZero,
    #[error("integer overflow")]
    Overflow,
    #[error("result exceeds {} elements", MAX_SEQUENCE_LEN)]
    TooLarge,
    #[error("result nests deeper than {} levels", MAX_CONTAINER_DEPTH)]
    TooDeep,
    #[error("complex result")]
    ComplexResult,
}

/// Fold `expr` against `env`. Never fails: an expression that cannot be
/// resolved yields a placeholder describing why.
pub fn evaluate(expr: &Expr, env: &Environment) -> Value {
    try_evaluate(expr, env).unwrap_or_else(|e| Placeholder::Error(e.to_string()).into())
}

fn try_evaluate(expr: &Expr, env: &Environment) -> Result<Value, EvalError> {
    let value = match expr {
        Expr::Constant(constant) => constant_value(constant),
        Expr::Name(name) => env
            .get(name)
            .cloned()
            .unwrap_or_else(|| Placeholder::Unresolved(name.clone()).into()),
        Expr::BinOp { left, op, right } => {
            let left = evaluate(left, env);
            let right = evaluate(right, env);
            fold_binop(*op, &left, &right)
        }
        Expr::List(elements) => {
            let items: Vec<Value> = elements.iter().map(|e| evaluate(e, env)).collect();
            check_container(Value::List(items))?
        }
        Expr::Dict { keys, values } => {
            let mut entries: Vec<(Value, Value)> = Vec::new();
            for (key, value) in keys.iter().zip(values) {
                let key = evaluate(key, env);
                if matches!(key, Value::List(_) | Value::Dict(_)) {
                    return Err(EvalError::Unhashable(key.type_name()));
                }
                let value = evaluate(value, env);
                match entries.iter_mut().find(|(k, _)| k.key_eq(&key)) {
                    Some(entry) => entry.1 = value,
                    None => entries.push((key, value)),
                }
            }
            check_container(Value::Dict(entries))?
        }
        Expr::Subscript { value, index } => {
            let base = evaluate(value, env);
            let index = evaluate(index, env);
            subscript(&base, &index)
        }
        Expr::Call { func, args, .. } => {
            let name = func.as_name().unwrap_or("<unknown>");
            let rendered: Vec<String> = args
                .iter()
                .map(|a| evaluate(a, env).render_bounded(MAX_RENDER_LEN))
                .collect();
            Placeholder::Call(format!("{}({})", name, rendered.join(", "))).into()
        }
        Expr::UnaryOp { .. }
        | Expr::BoolOp { .. }
        | Expr::Compare { .. }
        | Expr::IfExp { .. }
        | Expr::Attribute { .. }
        | Expr::Slice { .. }
        | Expr::Tuple(_)
        | Expr::Set(_)
        | Expr::Comprehension { .. }
        | Expr::Lambda { .. }
        | Expr::Starred(_)
        | Expr::FormattedString(_)
        | Expr::NamedExpr { .. }
        | Expr::Await(_)
        | Expr::Yield(_)
        | Expr::Unsupported(_) => Placeholder::ComplexExpression.into(),
    };
    Ok(value)
}

fn constant_value(constant: &Constant) -> Value {
    match constant {
        Constant::None => Value::None,
        Constant::Bool(b) => Value::Bool(*b),
        Constant::Int(i) => Value::Int(*i),
        Constant::Float(x) => Value::Float(*x),
        Constant::Str(s) => Value::Str(s.clone()),
    }
}

/// Compute `left op right`, or fall back to the `(left op right)` text.
pub fn fold_binop(op: BinOp, left: &Value, right: &Value) -> Value {
    match compute_binop(op, left, right) {
        Ok(value) => value,
        Err(_) => Placeholder::Folded(format!(
            "({} {} {})",
            left.render_bounded(MAX_RENDER_LEN),
            op.symbol(),
            right.render_bounded(MAX_RENDER_LEN)
        ))
        .into(),
    }
}

fn check_container(value: Value) -> Result<Value, EvalError> {
    check_len(value.weight())?;
    if value.depth() > MAX_CONTAINER_DEPTH {
        return Err(EvalError::TooDeep);
    }
    Ok(value)
}

fn subscript(base: &Value, index: &Value) -> Value {
    let position = match index {
        Value::Int(i) => *i,
        Value::Bool(b) => *b as i64,
        _ => return Placeholder::ComplexSubscript.into(),
    };
    let Value::List(items) = base else {
        return Placeholder::ComplexSubscript.into();
    };
    let len = items.len() as i64;
    let resolved = if position < 0 { position + len } else { position };
    if (0..len).contains(&resolved) {
        items[resolved as usize].clone()
    } else {
        Placeholder::IndexError.into()
    }
}

#[derive(Debug, Clone, Copy)]
enum Number {
    Int(i64),
    Float(f64),
}

fn as_number(value: &Value) -> Option<Number> {
    match value {
        Value::Bool(b) => Some(Number::Int(*b as i64)),
        Value::Int(i) => Some(Number::Int(*i)),
        Value::Float(x) => Some(Number::Float(*x)),
        _ => None,
    }
}

fn as_count(value: &Value) -> Option<i64> {
    match value {
        Value::Bool(b) => Some(*b as i64),
        Value::Int(i) => Some(*i),
        _ => None,
    }
}

fn compute_binop(op: BinOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    if op.symbol() == "?" {
        return Err(EvalError::UnknownOperator);
    }
    if left.is_placeholder() || right.is_placeholder() {
        return Err(EvalError::Unresolved);
    }
    if let (Some(l), Some(r)) = (as_number(left), as_number(right)) {
        return match (l, r) {
            (Number::Int(l), Number::Int(r)) => int_binop(op, l, r),
            (Number::Int(l), Number::Float(r)) => float_binop(op, l as f64, r),
            (Number::Float(l), Number::Int(r)) => float_binop(op, l, r as f64),
            (Number::Float(l), Number::Float(r)) => float_binop(op, l, r),
        };
    }
    match (op, left, right) {
        (BinOp::Add, Value::Str(l), Value::Str(r)) => {
            check_len(l.len() + r.len())?;
            Ok(Value::Str(format!("{}{}", l, r)))
        }
        (BinOp::Add, Value::List(l), Value::List(r)) => {
            check_len(left.weight().saturating_add(right.weight()))?;
            Ok(Value::List(l.iter().chain(r).cloned().collect()))
        }
        (BinOp::Mult, Value::Str(s), count) | (BinOp::Mult, count, Value::Str(s)) if as_count(count).is_some() => {
            let times = repeat_count(as_count(count), s.len())?;
            Ok(Value::Str(s.repeat(times)))
        }
        (BinOp::Mult, Value::List(items), count) | (BinOp::Mult, count, Value::List(items))
            if as_count(count).is_some() =>
        {
            let unit = items.iter().fold(items.len(), |acc, item| acc.saturating_add(item.weight()));
            let times = repeat_count(as_count(count), unit)?;
            let mut out = Vec::with_capacity(items.len() * times);
            for _ in 0..times {
                out.extend(items.iter().cloned());
            }
            Ok(Value::List(out))
        }
        _ => Err(EvalError::UnsupportedOperands {
            op: op.symbol(),
            left: left.type_name(),
            right: right.type_name(),
        }),
    }
}

fn check_len(len: usize) -> Result<(), EvalError> {
    if len > MAX_SEQUENCE_LEN {
        Err(EvalError::TooLarge)
    } else {
        Ok(())
    }
}

fn repeat_count(count: Option<i64>, unit: usize) -> Result<usize, EvalError> {
    let times = count.unwrap_or(0).max(0) as usize;
    let total = unit.checked_mul(times).ok_or(EvalError::TooLarge)?;
    check_len(total)?;
    Ok(times)
}

fn int_binop(op: BinOp, l: i64, r: i64) -> Result<Value, EvalError> {
    let result = match op {
        BinOp::Add => l.checked_add(r),
        BinOp::Sub => l.checked_sub(r),
        BinOp::Mult => l.checked_mul(r),
        BinOp::Div => {
            if r == 0 {
                return Err(EvalError::DivisionByZero);
            }
            return Ok(Value::Float(l as f64 / r as f64));
        }
        BinOp::FloorDiv => {
            if r == 0 {
                return Err(EvalError::DivisionByZero);
            }
            l.checked_div(r).map(|q| {
                if l % r != 0 && ((l < 0) != (r < 0)) {
                    q - 1
                } else {
                    q
                }
            })
        }
        BinOp::Mod => {
            if r == 0 {
                return Err(EvalError::DivisionByZero);
            }
            l.checked_rem(r).map(|m| if m != 0 && ((m < 0) != (r < 0)) { m + r } else { m })
        }
        BinOp::Pow => {
            if r < 0 {
                return float_binop(op, l as f64, r as f64);
            }
            u32::try_from(r).ok().and_then(|exp| l.checked_pow(exp))
        }
        _ => return Err(EvalError::UnknownOperator),
    };
    result.map(Value::Int).ok_or(EvalError::Overflow)
}

fn float_binop(op: BinOp, l: f64, r: f64) -> Result<Value, EvalError> {
    let result = match op {
        BinOp::Add => l + r,
        BinOp::Sub => l - r,
        BinOp::Mult => l * r,
        BinOp::Div => {
            if r == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            l / r
        }
        BinOp::FloorDiv => {
            if r == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            (l / r).floor()
        }
        BinOp::Mod => {
            if r == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            let m = l % r;
            if m != 0.0 && ((m < 0.0) != (r < 0.0)) {
                m + r
            } else {
                m
            }
        }
        BinOp::Pow => {
            if l == 0.0 && r < 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            if l < 0.0 && r.fract() != 0.0 {
                return Err(EvalError::ComplexResult);
            }
            let p = l.powf(r);
            if p.is_infinite() && l.is_finite() && r.is_finite() {
                return Err(EvalError::Overflow);
            }
            p
        }
        _ => return Err(EvalError::UnknownOperator),
    };
    Ok(Value::Float(result))
}
