//! Evaluation of parsed expressions over JSON values.
//!
//! Arithmetic follows Python rules: `/` always yields a float, `//` and `%` floor
//! toward negative infinity, `**` on integers stays integral for non-negative
//! exponents. Integer overflow and non-finite float results are errors.

use std::cmp::Ordering;

use serde_json::{Map, Number, Value};
use tracing::trace;
use uuid::Uuid;

use super::parser::{parse, BinaryOp, Expr, UnaryOp};
use super::EvalError;
use crate::domain::path::{kind_name, resolve_index};

type EvalResult<T> = Result<T, EvalError>;

/// Names visible to an expression, searched layer by layer.
#[derive(Debug, Default, Clone)]
pub struct Scope<'a> {
    layers: Vec<&'a Map<String, Value>>,
}

impl<'a> Scope<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a layer of bindings. Earlier layers shadow later ones.
    pub fn with_layer(mut self, layer: &'a Map<String, Value>) -> Self {
        self.layers.push(layer);
        self
    }

    fn lookup(&self, name: &str) -> Option<&'a Value> {
        self.layers.iter().copied().find_map(|layer| layer.get(name))
    }
}

/// Parse and evaluate `source` against `scope`.
///
/// Besides the scope's bindings, `uid` names a fresh 12 character hex identifier
/// for this evaluation.
pub fn evaluate(source: &str, scope: &Scope<'_>) -> EvalResult<Value> {
    let expr = parse(source)?;
    trace!(source, "evaluating expression");
    Evaluator {
        scope,
        uid: fresh_uid(),
    }
    .eval(&expr)
}

fn fresh_uid() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    hex[hex.len() - 12..].to_string()
}

struct Evaluator<'s, 'a> {
    scope: &'s Scope<'a>,
    uid: String,
}

impl Evaluator<'_, '_> {
    fn eval(&self, expr: &Expr) -> EvalResult<Value> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Name(name) => self.name(name),
            Expr::List(items) => self.eval_all(items).map(Value::Array),
            Expr::Dict(entries) => {
                let mut map = Map::with_capacity(entries.len());
                for (key, value) in entries {
                    let key = match self.eval(key)? {
                        Value::String(key) => key,
                        other => {
                            return Err(EvalError::Type(format!(
                                "mapping keys must be strings, not {}",
                                kind_name(&other)
                            )))
                        }
                    };
                    map.insert(key, self.eval(value)?);
                }
                Ok(Value::Object(map))
            }
            Expr::Unary(op, operand) => unary(*op, self.eval(operand)?),
            Expr::Binary(BinaryOp::And, lhs, rhs) => {
                let left = self.eval(lhs)?;
                if truthy(&left) {
                    self.eval(rhs)
                } else {
                    Ok(left)
                }
            }
            Expr::Binary(BinaryOp::Or, lhs, rhs) => {
                let left = self.eval(lhs)?;
                if truthy(&left) {
                    Ok(left)
                } else {
                    self.eval(rhs)
                }
            }
            Expr::Binary(op, lhs, rhs) => binary(*op, self.eval(lhs)?, self.eval(rhs)?),
            Expr::Attribute(target, name) => attribute(self.eval(target)?, name),
            Expr::Index(target, key) => index(self.eval(target)?, &self.eval(key)?),
            Expr::Method(target, name, args) => {
                let receiver = self.eval(target)?;
                method(&receiver, name, &self.eval_all(args)?)
            }
            Expr::Call(name, args) => call(name, &self.eval_all(args)?),
        }
    }

    fn eval_all(&self, exprs: &[Expr]) -> EvalResult<Vec<Value>> {
        exprs.iter().map(|e| self.eval(e)).collect()
    }

    fn name(&self, name: &str) -> EvalResult<Value> {
        if let Some(value) = self.scope.lookup(name) {
            return Ok(value.clone());
        }
        if name == "uid" {
            return Ok(Value::String(self.uid.clone()));
        }
        Err(EvalError::UnknownName(name.to_string()))
    }
}

#[derive(Debug, Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn as_f64(self) -> f64 {
        match self {
            Num::Int(i) => i as f64,
            Num::Float(f) => f,
        }
    }
}

fn num(value: &Value) -> Option<Num> {
    match value {
        Value::Bool(b) => Some(Num::Int(i64::from(*b))),
        Value::Number(n) => n
            .as_i64()
            .map(Num::Int)
            .or_else(|| n.as_f64().map(Num::Float)),
        _ => None,
    }
}

fn as_int(value: &Value) -> Option<i64> {
    match num(value)? {
        Num::Int(i) => Some(i),
        Num::Float(_) => None,
    }
}

fn float_value(f: f64) -> EvalResult<Value> {
    Number::from_f64(f)
        .map(Value::Number)
        .ok_or_else(|| EvalError::Invalid(format!("result {} is not a finite number", f)))
}

fn overflow(op: &str) -> EvalError {
    EvalError::Invalid(format!("integer overflow in '{}'", op))
}

fn zero_division() -> EvalError {
    EvalError::Invalid("division by zero".to_string())
}

pub(crate) fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn symbol(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Or => "or",
        BinaryOp::And => "and",
        BinaryOp::Eq => "==",
        BinaryOp::Ne => "!=",
        BinaryOp::Lt => "<",
        BinaryOp::Le => "<=",
        BinaryOp::Gt => ">",
        BinaryOp::Ge => ">=",
        BinaryOp::In => "in",
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::FloorDiv => "//",
        BinaryOp::Rem => "%",
        BinaryOp::Pow => "**",
    }
}

fn unsupported(op: BinaryOp, left: &Value, right: &Value) -> EvalError {
    EvalError::Type(format!(
        "unsupported operand types for {}: {} and {}",
        symbol(op),
        kind_name(left),
        kind_name(right)
    ))
}

fn unary(op: UnaryOp, operand: Value) -> EvalResult<Value> {
    match (op, num(&operand)) {
        (UnaryOp::Not, _) => Ok(Value::Bool(!truthy(&operand))),
        (UnaryOp::Neg, Some(Num::Int(i))) => i.checked_neg().map(Value::from).ok_or_else(|| overflow("-")),
        (UnaryOp::Neg, Some(Num::Float(f))) => float_value(-f),
        (UnaryOp::Pos, Some(Num::Int(i))) => Ok(Value::from(i)),
        (UnaryOp::Pos, Some(Num::Float(f))) => float_value(f),
        (_, None) => Err(EvalError::Type(format!(
            "bad operand type for unary operator: {}",
            kind_name(&operand)
        ))),
    }
}

fn binary(op: BinaryOp, left: Value, right: Value) -> EvalResult<Value> {
    match op {
        BinaryOp::And => Ok(if truthy(&left) { right } else { left }),
        BinaryOp::Or => Ok(if truthy(&left) { left } else { right }),
        BinaryOp::Eq => Ok(Value::Bool(equals(&left, &right))),
        BinaryOp::Ne => Ok(Value::Bool(!equals(&left, &right))),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ordering = compare(&left, &right)?;
            Ok(Value::Bool(match op {
                BinaryOp::Lt => ordering == Ordering::Less,
                BinaryOp::Le => ordering != Ordering::Greater,
                BinaryOp::Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            }))
        }
        BinaryOp::In => contains(&right, &left).map(Value::Bool),
        BinaryOp::Add => match (left, right) {
            (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
            (Value::Array(mut a), Value::Array(b)) => {
                a.extend(b);
                Ok(Value::Array(a))
            }
            (left, right) => numeric(op, &left, &right),
        },
        BinaryOp::Mul => match (&left, &right) {
            (Value::String(s), count) | (count, Value::String(s)) if as_int(count).is_some() => {
                Ok(Value::String(s.repeat(repeat_count(count, s.len())?)))
            }
            (Value::Array(items), count) | (count, Value::Array(items))
                if as_int(count).is_some() =>
            {
                if items.is_empty() {
                    return Ok(Value::Array(Vec::new()));
                }
                let unit = items.len().saturating_mul(std::mem::size_of::<Value>());
                let times = repeat_count(count, unit)?;
                Ok(Value::Array(
                    std::iter::repeat(items.iter().cloned())
                        .take(times)
                        .flatten()
                        .collect(),
                ))
            }
            _ => numeric(op, &left, &right),
        },
        _ => numeric(op, &left, &right),
    }
}

/// Repetitions for `sequence * count`; negative counts repeat zero times.
///
/// `unit` is the byte size of one repetition; the total must fit an allocation.
fn repeat_count(count: &Value, unit: usize) -> EvalResult<usize> {
    let times = as_int(count)
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(0);
    unit.checked_mul(times)
        .filter(|&total| isize::try_from(total).is_ok())
        .map(|_| times)
        .ok_or_else(|| overflow("*"))
}

fn numeric(op: BinaryOp, left: &Value, right: &Value) -> EvalResult<Value> {
    match (num(left), num(right)) {
        (Some(a), Some(b)) => arithmetic(op, a, b),
        _ => Err(unsupported(op, left, right)),
    }
}

fn arithmetic(op: BinaryOp, a: Num, b: Num) -> EvalResult<Value> {
    use Num::Int;
    match (op, a, b) {
        (BinaryOp::Add, Int(x), Int(y)) => x.checked_add(y).map(Value::from).ok_or_else(|| overflow("+")),
        (BinaryOp::Sub, Int(x), Int(y)) => x.checked_sub(y).map(Value::from).ok_or_else(|| overflow("-")),
        (BinaryOp::Mul, Int(x), Int(y)) => x.checked_mul(y).map(Value::from).ok_or_else(|| overflow("*")),
        (BinaryOp::FloorDiv, Int(x), Int(y)) => {
            if y == 0 {
                return Err(zero_division());
            }
            let quotient = x.checked_div(y).ok_or_else(|| overflow("//"))?;
            let floored = if x % y != 0 && ((x < 0) != (y < 0)) {
                quotient - 1
            } else {
                quotient
            };
            Ok(Value::from(floored))
        }
        (BinaryOp::Rem, Int(x), Int(y)) => {
            if y == 0 {
                return Err(zero_division());
            }
            let remainder = x.checked_rem(y).ok_or_else(|| overflow("%"))?;
            let floored = if remainder != 0 && ((remainder < 0) != (y < 0)) {
                remainder + y
            } else {
                remainder
            };
            Ok(Value::from(floored))
        }
        (BinaryOp::Pow, Int(x), Int(y)) if y >= 0 => u32::try_from(y)
            .ok()
            .and_then(|exp| x.checked_pow(exp))
            .map(Value::from)
            .ok_or_else(|| overflow("**")),
        (op, a, b) => float_arithmetic(op, a.as_f64(), b.as_f64()),
    }
}

fn float_arithmetic(op: BinaryOp, x: f64, y: f64) -> EvalResult<Value> {
    let result = match op {
        BinaryOp::Add => x + y,
        BinaryOp::Sub => x - y,
        BinaryOp::Mul => x * y,
        BinaryOp::Div | BinaryOp::FloorDiv | BinaryOp::Rem if y == 0.0 => {
            return Err(zero_division())
        }
        BinaryOp::Div => x / y,
        BinaryOp::FloorDiv => (x / y).floor(),
        BinaryOp::Rem => {
            let remainder = x % y;
            if remainder != 0.0 && ((remainder < 0.0) != (y < 0.0)) {
                remainder + y
            } else {
                remainder
            }
        }
        BinaryOp::Pow if x == 0.0 && y < 0.0 => return Err(zero_division()),
        BinaryOp::Pow => x.powf(y),
        other => {
            return Err(EvalError::Type(format!(
                "'{}' is not an arithmetic operator",
                symbol(other)
            )))
        }
    };
    float_value(result)
}

/// Structural equality where numbers compare by value (`1 == 1.0`).
fn equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(p, q)| equals(p, q))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .all(|(key, p)| y.get(key).is_some_and(|q| equals(p, q)))
        }
        _ => match (num(a), num(b)) {
            (Some(Num::Int(x)), Some(Num::Int(y))) => x == y,
            (Some(x), Some(y)) => x.as_f64() == y.as_f64(),
            _ => a == b,
        },
    }
}

fn compare(a: &Value, b: &Value) -> EvalResult<Ordering> {
    match (a, b) {
        (Value::String(x), Value::String(y)) => Ok(x.cmp(y)),
        (Value::Array(x), Value::Array(y)) => {
            for (p, q) in x.iter().zip(y) {
                let ordering = compare(p, q)?;
                if ordering != Ordering::Equal {
                    return Ok(ordering);
                }
            }
            Ok(x.len().cmp(&y.len()))
        }
        _ => match (num(a), num(b)) {
            (Some(Num::Int(x)), Some(Num::Int(y))) => Ok(x.cmp(&y)),
            (Some(x), Some(y)) => x
                .as_f64()
                .partial_cmp(&y.as_f64())
                .ok_or_else(|| EvalError::Invalid("cannot order NaN".to_string())),
            _ => Err(EvalError::Type(format!(
                "ordering not supported between {} and {}",
                kind_name(a),
                kind_name(b)
            ))),
        },
    }
}

fn contains(container: &Value, needle: &Value) -> EvalResult<bool> {
    match (container, needle) {
        (Value::String(haystack), Value::String(needle)) => Ok(haystack.contains(needle.as_str())),
        (Value::String(_), other) => Err(EvalError::Type(format!(
            "'in <string>' requires a string, not {}",
            kind_name(other)
        ))),
        (Value::Array(items), needle) => Ok(items.iter().any(|item| equals(item, needle))),
        (Value::Object(map), Value::String(key)) => Ok(map.contains_key(key)),
        (Value::Object(_), _) => Ok(false),
        (other, _) => Err(EvalError::Type(format!(
            "argument of type {} is not a container",
            kind_name(other)
        ))),
    }
}

fn attribute(target: Value, name: &str) -> EvalResult<Value> {
    match target {
        Value::Object(mut map) => map
            .remove(name)
            .ok_or_else(|| EvalError::Invalid(format!("mapping has no key '{}'", name))),
        other => Err(EvalError::Type(format!(
            "{} has no attribute '{}'",
            kind_name(&other),
            name
        ))),
    }
}

fn index(target: Value, key: &Value) -> EvalResult<Value> {
    match (target, key) {
        (Value::Array(mut items), key) if as_int(key).is_some() => {
            let position = as_int(key).unwrap_or_default();
            resolve_index(position, items.len())
                .map(|i| items.swap_remove(i))
                .ok_or_else(|| EvalError::Invalid(format!("index {} out of range", position)))
        }
        (Value::String(s), key) if as_int(key).is_some() => {
            let position = as_int(key).unwrap_or_default();
            let chars: Vec<char> = s.chars().collect();
            resolve_index(position, chars.len())
                .map(|i| Value::String(chars[i].to_string()))
                .ok_or_else(|| EvalError::Invalid(format!("index {} out of range", position)))
        }
        (Value::Object(mut map), Value::String(key)) => map
            .remove(key)
            .ok_or_else(|| EvalError::Invalid(format!("key '{}' not found", key))),
        (target, key) => Err(EvalError::Type(format!(
            "{} cannot be indexed by {}",
            kind_name(&target),
            kind_name(key)
        ))),
    }
}

fn call(name: &str, args: &[Value]) -> EvalResult<Value> {
    match (name, args) {
        ("len", [value]) => match value {
            Value::String(s) => Ok(Value::from(s.chars().count())),
            Value::Array(items) => Ok(Value::from(items.len())),
            Value::Object(map) => Ok(Value::from(map.len())),
            other => Err(bad_argument(name, other)),
        },
        ("str", [value]) => Ok(Value::String(to_text(value))),
        ("int", [value]) => to_int(value),
        ("float", [value]) => match (value, num(value)) {
            (_, Some(n)) => float_value(n.as_f64()),
            (Value::String(s), None) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| EvalError::Invalid(format!("could not convert '{}' to float", s)))
                .and_then(float_value),
            (other, None) => Err(bad_argument(name, other)),
        },
        ("bool", [value]) => Ok(Value::Bool(truthy(value))),
        ("abs", [value]) => match num(value) {
            Some(Num::Int(i)) => i.checked_abs().map(Value::from).ok_or_else(|| overflow("abs")),
            Some(Num::Float(f)) => float_value(f.abs()),
            None => Err(bad_argument(name, value)),
        },
        ("min", _) => extremum(name, args, Ordering::Less),
        ("max", _) => extremum(name, args, Ordering::Greater),
        ("pow", [base, exp]) => binary(BinaryOp::Pow, base.clone(), exp.clone()),
        ("round", [value]) => round(value, None),
        ("round", [value, digits]) => round(value, Some(digits)),
        ("sum", [items]) => sum(items, Value::from(0)),
        ("sum", [items, start]) => sum(items, start.clone()),
        ("len" | "str" | "int" | "float" | "bool" | "abs" | "pow" | "round" | "sum", _) => {
            Err(EvalError::Type(format!(
                "{}() does not take {} arguments",
                name,
                args.len()
            )))
        }
        _ => Err(EvalError::UnknownName(name.to_string())),
    }
}

fn bad_argument(function: &str, value: &Value) -> EvalError {
    EvalError::Type(format!("bad argument type for {}(): {}", function, kind_name(value)))
}

fn to_int(value: &Value) -> EvalResult<Value> {
    match (value, num(value)) {
        (_, Some(Num::Int(i))) => Ok(Value::from(i)),
        (_, Some(Num::Float(f))) => float_to_int(f.trunc()),
        (Value::String(s), None) => s
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| EvalError::Invalid(format!("invalid literal for int(): '{}'", s))),
        (other, None) => Err(bad_argument("int", other)),
    }
}

fn float_to_int(f: f64) -> EvalResult<Value> {
    if f.is_finite() && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Ok(Value::from(f as i64))
    } else {
        Err(EvalError::Invalid(format!("cannot convert {} to integer", f)))
    }
}

fn extremum(name: &str, args: &[Value], wanted: Ordering) -> EvalResult<Value> {
    let items: &[Value] = match args {
        [Value::Array(items)] => items.as_slice(),
        _ => args,
    };
    let mut iter = items.iter();
    let mut best = iter
        .next()
        .ok_or_else(|| EvalError::Invalid(format!("{}() arg is an empty sequence", name)))?;
    for item in iter {
        if compare(item, best)? == wanted {
            best = item;
        }
    }
    Ok(best.clone())
}

fn round(value: &Value, digits: Option<&Value>) -> EvalResult<Value> {
    let digits = match digits {
        None => None,
        Some(d) => Some(as_int(d).ok_or_else(|| bad_argument("round", d))?),
    };
    match (num(value), digits) {
        (Some(Num::Int(i)), None) => Ok(Value::from(i)),
        (Some(Num::Int(i)), Some(d)) if d >= 0 => Ok(Value::from(i)),
        (Some(Num::Float(f)), None) => float_to_int(f.round_ties_even()),
        (Some(n), Some(d)) => {
            let exponent = i32::try_from(d).map_err(|_| overflow("round"))?;
            let scale = 10f64.powi(exponent);
            let rounded = (n.as_f64() * scale).round_ties_even() / scale;
            match n {
                Num::Int(_) => float_to_int(rounded),
                Num::Float(_) => float_value(rounded),
            }
        }
        (None, _) => Err(bad_argument("round", value)),
    }
}

fn sum(items: &Value, start: Value) -> EvalResult<Value> {
    let Value::Array(items) = items else {
        return Err(bad_argument("sum", items));
    };
    items
        .iter()
        .try_fold(start, |acc, item| binary(BinaryOp::Add, acc, item.clone()))
}

fn method(receiver: &Value, name: &str, args: &[Value]) -> EvalResult<Value> {
    match (receiver, name, args) {
        (Value::String(s), "split", [] | [Value::Null]) => Ok(strings(s.split_whitespace())),
        (Value::String(s), "split", [sep]) => Ok(strings(s.split(separator(sep)?))),
        (Value::String(s), "split", [sep, limit]) => {
            let sep = separator(sep)?;
            match as_int(limit).map(usize::try_from) {
                Some(Ok(limit)) => Ok(strings(s.splitn(limit + 1, sep))),
                Some(Err(_)) => Ok(strings(s.split(sep))),
                None => Err(bad_argument("split", limit)),
            }
        }
        (Value::String(s), "join", [Value::Array(items)]) => {
            let parts = items
                .iter()
                .map(|item| match item {
                    Value::String(part) => Ok(part.as_str()),
                    other => Err(EvalError::Type(format!(
                        "join expects strings, found {}",
                        kind_name(other)
                    ))),
                })
                .collect::<EvalResult<Vec<&str>>>()?;
            Ok(Value::String(parts.join(s)))
        }
        (Value::String(s), "upper", []) => Ok(Value::String(s.to_uppercase())),
        (Value::String(s), "lower", []) => Ok(Value::String(s.to_lowercase())),
        (Value::String(s), "strip", []) => Ok(Value::String(s.trim().to_string())),
        (Value::String(s), "lstrip", []) => Ok(Value::String(s.trim_start().to_string())),
        (Value::String(s), "rstrip", []) => Ok(Value::String(s.trim_end().to_string())),
        (Value::String(s), "strip", [chars]) => {
            let chars = text(chars)?;
            Ok(Value::String(s.trim_matches(|c: char| chars.contains(c)).to_string()))
        }
        (Value::String(s), "lstrip", [chars]) => {
            let chars = text(chars)?;
            Ok(Value::String(s.trim_start_matches(|c: char| chars.contains(c)).to_string()))
        }
        (Value::String(s), "rstrip", [chars]) => {
            let chars = text(chars)?;
            Ok(Value::String(s.trim_end_matches(|c: char| chars.contains(c)).to_string()))
        }
        (Value::String(s), "replace", [old, new]) => {
            Ok(Value::String(s.replace(text(old)?, text(new)?)))
        }
        (Value::String(s), "startswith", [prefix]) => Ok(Value::Bool(s.starts_with(text(prefix)?))),
        (Value::String(s), "endswith", [suffix]) => Ok(Value::Bool(s.ends_with(text(suffix)?))),
        (Value::String(s), "count", [sub]) => Ok(Value::from(s.matches(text(sub)?).count())),
        (Value::Object(map), "get", [key]) => Ok(map.get(text(key)?).cloned().unwrap_or(Value::Null)),
        (Value::Object(map), "get", [key, default]) => Ok(map
            .get(text(key)?)
            .cloned()
            .unwrap_or_else(|| default.clone())),
        (Value::Object(map), "keys", []) => Ok(Value::Array(
            map.keys().map(|k| Value::String(k.clone())).collect(),
        )),
        (Value::Object(map), "values", []) => Ok(Value::Array(map.values().cloned().collect())),
        (Value::Object(map), "items", []) => Ok(Value::Array(
            map.iter()
                .map(|(k, v)| Value::Array(vec![Value::String(k.clone()), v.clone()]))
                .collect(),
        )),
        (Value::Array(items), "index", [needle]) => items
            .iter()
            .position(|item| equals(item, needle))
            .map(Value::from)
            .ok_or_else(|| EvalError::Invalid(format!("{} is not in list", to_text(needle)))),
        (Value::Array(items), "count", [needle]) => Ok(Value::from(
            items.iter().filter(|item| equals(item, needle)).count(),
        )),
        _ => Err(EvalError::Type(format!(
            "{} has no method '{}' taking {} argument(s)",
            kind_name(receiver),
            name,
            args.len()
        ))),
    }
}

fn strings<'s>(parts: impl Iterator<Item = &'s str>) -> Value {
    Value::Array(parts.map(|p| Value::String(p.to_string())).collect())
}

fn text(value: &Value) -> EvalResult<&str> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(EvalError::Type(format!("expected a string, found {}", kind_name(other)))),
    }
}

fn separator(value: &Value) -> EvalResult<&str> {
    let sep = text(value)?;
    if sep.is_empty() {
        return Err(EvalError::Invalid("empty separator".to_string()));
    }
    Ok(sep)
}

/// Render a value the way `str()` shows it.
pub(crate) fn to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => repr(other),
    }
}

fn repr(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(n) => match n.as_i64() {
            Some(i) => i.to_string(),
            None => format_float(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'")),
        Value::Array(items) => format!(
            "[{}]",
            items.iter().map(repr).collect::<Vec<_>>().join(", ")
        ),
        Value::Object(map) => format!(
            "{{{}}}",
            map.iter()
                .map(|(k, v)| format!("'{}': {}", k, repr(v)))
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}

fn format_float(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e16 {
        format!("{:.1}", f)
    } else {
        format!("{}", f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn eval(source: &str) -> EvalResult<Value> {
        evaluate(source, &Scope::new())
    }

    #[test]
    fn floor_division_rounds_toward_negative_infinity() {
        assert_eq!(eval("-7 // 2").unwrap(), json!(-4));
        assert_eq!(eval("-7 % 3").unwrap(), json!(2));
        assert_eq!(eval("7 % -3").unwrap(), json!(-2));
    }

    #[test]
    fn true_division_yields_float() {
        assert_eq!(eval("4 / 2").unwrap(), json!(2.0));
    }

    #[test]
    fn overflow_is_an_error() {
        assert!(matches!(
            eval("9223372036854775807 + 1"),
            Err(EvalError::Invalid(_))
        ));
        assert!(matches!(
            eval("'ab' * 9223372036854775807"),
            Err(EvalError::Invalid(_))
        ));
        assert_eq!(eval("[] * 9223372036854775807").unwrap(), json!([]));
    }

    #[test]
    fn float_repr_keeps_decimal_point() {
        assert_eq!(to_text(&json!(2.0)), "2.0");
        assert_eq!(to_text(&json!([1, "a", null])), "[1, 'a', None]");
    }

    #[test]
    fn uid_is_twelve_hex_chars() {
        let uid = eval("uid").unwrap();
        let uid = uid.as_str().unwrap();
        assert_eq!(uid.len(), 12);
        assert!(uid.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
