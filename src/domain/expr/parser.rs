//! Expression parsing: pest grammar plus a Pratt pass for operator precedence.

use lazy_static::lazy_static;
use pest::iterators::{Pair, Pairs};
use pest::pratt_parser::{Assoc, Op, PrattParser};
use pest::Parser;
use serde_json::{Number, Value};

use super::EvalError;

#[derive(pest_derive::Parser)]
#[grammar = "domain/expr/grammar.pest"]
struct ExprParser;

lazy_static! {
    static ref PRATT: PrattParser<Rule> = PrattParser::new()
        .op(Op::infix(Rule::or, Assoc::Left))
        .op(Op::infix(Rule::and, Assoc::Left))
        .op(Op::prefix(Rule::not))
        .op(Op::infix(Rule::eq, Assoc::Left)
            | Op::infix(Rule::ne, Assoc::Left)
            | Op::infix(Rule::lt, Assoc::Left)
            | Op::infix(Rule::le, Assoc::Left)
            | Op::infix(Rule::gt, Assoc::Left)
            | Op::infix(Rule::ge, Assoc::Left)
            | Op::infix(Rule::in_op, Assoc::Left))
        .op(Op::infix(Rule::add, Assoc::Left) | Op::infix(Rule::sub, Assoc::Left))
        .op(Op::infix(Rule::mul, Assoc::Left)
            | Op::infix(Rule::div, Assoc::Left)
            | Op::infix(Rule::floor_div, Assoc::Left)
            | Op::infix(Rule::rem, Assoc::Left))
        .op(Op::prefix(Rule::neg) | Op::prefix(Rule::pos))
        .op(Op::infix(Rule::pow, Assoc::Right))
        .op(Op::postfix(Rule::method_call)
            | Op::postfix(Rule::attribute)
            | Op::postfix(Rule::index)
            | Op::postfix(Rule::call));
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Pos,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Rem,
    Pow,
}

/// Parsed expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Name(String),
    List(Vec<Expr>),
    Dict(Vec<(Expr, Expr)>),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Attribute(Box<Expr>, String),
    Index(Box<Expr>, Box<Expr>),
    Method(Box<Expr>, String, Vec<Expr>),
    Call(String, Vec<Expr>),
}

/// Parse `source` into an [`Expr`].
pub fn parse(source: &str) -> Result<Expr, EvalError> {
    let mut pairs = ExprParser::parse(Rule::expression, source)
        .map_err(|e| EvalError::Syntax(e.to_string()))?;
    let expression = pairs
        .next()
        .ok_or_else(|| EvalError::Syntax("empty expression".to_string()))?;
    let expr = expression
        .into_inner()
        .next()
        .ok_or_else(|| EvalError::Syntax("empty expression".to_string()))?;
    build_expr(expr.into_inner())
}

fn build_expr(pairs: Pairs<'_, Rule>) -> Result<Expr, EvalError> {
    PRATT
        .map_primary(build_primary)
        .map_prefix(|op, rhs| {
            let op = match op.as_rule() {
                Rule::neg => UnaryOp::Neg,
                Rule::pos => UnaryOp::Pos,
                Rule::not => UnaryOp::Not,
                rule => return Err(unexpected(rule)),
            };
            Ok(Expr::Unary(op, Box::new(rhs?)))
        })
        .map_infix(|lhs, op, rhs| {
            let op = match op.as_rule() {
                Rule::or => BinaryOp::Or,
                Rule::and => BinaryOp::And,
                Rule::eq => BinaryOp::Eq,
                Rule::ne => BinaryOp::Ne,
                Rule::lt => BinaryOp::Lt,
                Rule::le => BinaryOp::Le,
                Rule::gt => BinaryOp::Gt,
                Rule::ge => BinaryOp::Ge,
                Rule::in_op => BinaryOp::In,
                Rule::add => BinaryOp::Add,
                Rule::sub => BinaryOp::Sub,
                Rule::mul => BinaryOp::Mul,
                Rule::div => BinaryOp::Div,
                Rule::floor_div => BinaryOp::FloorDiv,
                Rule::rem => BinaryOp::Rem,
                Rule::pow => BinaryOp::Pow,
                rule => return Err(unexpected(rule)),
            };
            Ok(Expr::Binary(op, Box::new(lhs?), Box::new(rhs?)))
        })
        .map_postfix(|lhs, op| {
            let lhs = lhs?;
            match op.as_rule() {
                Rule::attribute => Ok(Expr::Attribute(Box::new(lhs), first_ident(op)?)),
                Rule::index => {
                    let inner = op
                        .into_inner()
                        .next()
                        .ok_or_else(|| EvalError::Syntax("empty index".to_string()))?;
                    Ok(Expr::Index(Box::new(lhs), Box::new(build_expr(inner.into_inner())?)))
                }
                Rule::method_call => {
                    let mut inner = op.into_inner();
                    let name = inner
                        .next()
                        .map(|p| p.as_str().to_string())
                        .ok_or_else(|| EvalError::Syntax("missing method name".to_string()))?;
                    let args = match inner.next() {
                        Some(args) => build_args(args)?,
                        None => Vec::new(),
                    };
                    Ok(Expr::Method(Box::new(lhs), name, args))
                }
                Rule::call => {
                    let Expr::Name(function) = lhs else {
                        return Err(EvalError::Type(
                            "only named functions can be called".to_string(),
                        ));
                    };
                    let args = match op.into_inner().next() {
                        Some(args) => build_args(args)?,
                        None => Vec::new(),
                    };
                    Ok(Expr::Call(function, args))
                }
                rule => Err(unexpected(rule)),
            }
        })
        .parse(pairs)
}

fn build_primary(pair: Pair<'_, Rule>) -> Result<Expr, EvalError> {
    match pair.as_rule() {
        Rule::expr => build_expr(pair.into_inner()),
        Rule::integer => pair
            .as_str()
            .parse::<i64>()
            .map(|n| Expr::Literal(Value::from(n)))
            .map_err(|e| EvalError::Syntax(format!("integer '{}': {}", pair.as_str(), e))),
        Rule::float => {
            let parsed: f64 = pair
                .as_str()
                .parse()
                .map_err(|e| EvalError::Syntax(format!("float '{}': {}", pair.as_str(), e)))?;
            Number::from_f64(parsed)
                .map(|n| Expr::Literal(Value::Number(n)))
                .ok_or_else(|| EvalError::Syntax(format!("float '{}' is not finite", pair.as_str())))
        }
        Rule::string => {
            let raw = pair.into_inner().next().map(|p| p.as_str()).unwrap_or("");
            Ok(Expr::Literal(Value::String(unescape(raw)?)))
        }
        Rule::boolean => Ok(Expr::Literal(Value::Bool(matches!(
            pair.as_str(),
            "True" | "true"
        )))),
        Rule::null => Ok(Expr::Literal(Value::Null)),
        Rule::ident => Ok(Expr::Name(pair.as_str().to_string())),
        Rule::list => pair
            .into_inner()
            .map(|item| build_expr(item.into_inner()))
            .collect::<Result<Vec<_>, _>>()
            .map(Expr::List),
        Rule::dict => pair
            .into_inner()
            .map(|entry| {
                let mut sides = entry.into_inner();
                match (sides.next(), sides.next()) {
                    (Some(key), Some(value)) => {
                        Ok((build_expr(key.into_inner())?, build_expr(value.into_inner())?))
                    }
                    _ => Err(EvalError::Syntax("incomplete dict entry".to_string())),
                }
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Expr::Dict),
        rule => Err(unexpected(rule)),
    }
}

fn build_args(pair: Pair<'_, Rule>) -> Result<Vec<Expr>, EvalError> {
    pair.into_inner()
        .map(|arg| build_expr(arg.into_inner()))
        .collect()
}

fn first_ident(pair: Pair<'_, Rule>) -> Result<String, EvalError> {
    pair.into_inner()
        .next()
        .map(|p| p.as_str().to_string())
        .ok_or_else(|| EvalError::Syntax("missing attribute name".to_string()))
}

fn unexpected(rule: Rule) -> EvalError {
    EvalError::Syntax(format!("unexpected {:?}", rule))
}

/// Resolve backslash escapes inside a quoted string literal.
fn unescape(raw: &str) -> Result<String, EvalError> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('0') => out.push('\0'),
            Some('u') => {
                let code: String = chars.by_ref().take(4).collect();
                let scalar = u32::from_str_radix(&code, 16)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| EvalError::Syntax(format!("invalid escape \\u{}", code)))?;
                out.push(scalar);
            }
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn power_binds_tighter_than_negation() {
        let expr = parse("-2 ** 2").unwrap();
        assert!(matches!(expr, Expr::Unary(UnaryOp::Neg, _)));
    }

    #[test]
    fn method_calls_attach_to_receiver() {
        let expr = parse("'a b'.split(' ')").unwrap();
        assert_eq!(
            expr,
            Expr::Method(
                Box::new(Expr::Literal(json!("a b"))),
                "split".to_string(),
                vec![Expr::Literal(json!(" "))]
            )
        );
    }

    #[test]
    fn keywords_do_not_swallow_identifiers() {
        assert_eq!(parse("notes").unwrap(), Expr::Name("notes".to_string()));
        assert_eq!(parse("order").unwrap(), Expr::Name("order".to_string()));
    }

    #[test]
    fn unescape_handles_json_escapes() {
        assert_eq!(unescape(r#"a\"b\nA"#).unwrap(), "a\"b\nA");
    }

    #[test]
    fn calling_a_non_name_is_rejected() {
        assert!(parse("(1)(2)").is_err());
    }
}
