//! Row expressions used by filter predicates and projections.
//!
//! Expressions are resolved by *name* against a schema at evaluation time
//! (case-insensitive), so the same tree can be typed against a node's input
//! schema by the planner and evaluated by the reference runner.
//!
//! Supported surface syntax (see `parse_expr`):
//! `col`, `42`, `4.2`, `'text'`, `TRUE`, `NULL`, `+ - * /`,
//! `= == != <> < <= > >=`, `AND`, `OR`, `NOT`, `IS [NOT] NULL`, parentheses.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::schema::{DataType, Schema};
use crate::types::{Row, Scalar};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
    Plus,
    Minus,
    Multiply,
    Divide,
}

impl BinaryOp {
    fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::NotEq | BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq
        )
    }

    fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinaryOp::Plus | BinaryOp::Minus | BinaryOp::Multiply | BinaryOp::Divide
        )
    }

    fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Eq => "=",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::And => "AND",
            BinaryOp::Or => "OR",
            BinaryOp::Plus => "+",
            BinaryOp::Minus => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Column(String),
    Literal(Scalar),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Not(Box<Expr>),
    IsNull {
        expr: Box<Expr>,
        negated: bool,
    },
}

impl Expr {
    pub fn col(name: impl Into<String>) -> Expr {
        Expr::Column(name.into())
    }

    pub fn lit(value: Scalar) -> Expr {
        Expr::Literal(value)
    }

    pub fn binary(self, op: BinaryOp, right: Expr) -> Expr {
        Expr::Binary {
            op,
            left: Box::new(self),
            right: Box::new(right),
        }
    }

    pub fn gt(self, right: Expr) -> Expr {
        self.binary(BinaryOp::Gt, right)
    }

    pub fn lt(self, right: Expr) -> Expr {
        self.binary(BinaryOp::Lt, right)
    }

    pub fn and(self, right: Expr) -> Expr {
        self.binary(BinaryOp::And, right)
    }

    pub fn or(self, right: Expr) -> Expr {
        self.binary(BinaryOp::Or, right)
    }

    /// Column names referenced anywhere in the tree, in visit order.
    pub fn columns(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_columns(&mut out);
        out
    }

    fn collect_columns<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Expr::Column(name) => out.push(name),
            Expr::Literal(_) => {}
            Expr::Binary { left, right, .. } => {
                left.collect_columns(out);
                right.collect_columns(out);
            }
            Expr::Not(inner) | Expr::IsNull { expr: inner, .. } => inner.collect_columns(out),
        }
    }

    /// Infer the result type of this expression over `schema`.
    pub fn data_type(&self, schema: &Schema) -> Result<DataType> {
        match self {
            Expr::Column(name) => schema
                .field_by_name(name)
                .map(|f| f.data_type)
                .ok_or_else(|| Error::Expr(format!("unknown column '{}' in {}", name, schema))),
            Expr::Literal(v) => Ok(v.data_type().unwrap_or(DataType::Utf8)),
            Expr::Not(_) | Expr::IsNull { .. } => Ok(DataType::Boolean),
            Expr::Binary { op, left, right } => {
                let lt = left.data_type(schema)?;
                let rt = right.data_type(schema)?;
                if op.is_arithmetic() {
                    if !lt.is_numeric() || !rt.is_numeric() {
                        return Err(Error::Expr(format!(
                            "operator {} needs numeric operands, got {} and {}",
                            op.symbol(),
                            lt,
                            rt
                        )));
                    }
                    Ok(if lt.is_float() || rt.is_float() {
                        DataType::Float64
                    } else if lt == DataType::Int32 && rt == DataType::Int32 {
                        DataType::Int32
                    } else {
                        DataType::Int64
                    })
                } else {
                    Ok(DataType::Boolean)
                }
            }
        }
    }

    /// Evaluate against one row laid out by `schema`.
    pub fn eval(&self, schema: &Schema, row: &Row) -> Result<Scalar> {
        match self {
            Expr::Column(name) => {
                let idx = schema
                    .index_of_ignore_case(name)
                    .ok_or_else(|| Error::Expr(format!("unknown column '{}'", name)))?;
                Ok(row.get(idx).cloned().unwrap_or(Scalar::Null))
            }
            Expr::Literal(v) => Ok(v.clone()),
            Expr::Not(inner) => Ok(match inner.eval(schema, row)? {
                Scalar::Null => Scalar::Null,
                v => Scalar::Bool(!truthy(&v)?),
            }),
            Expr::IsNull { expr, negated } => {
                let is_null = expr.eval(schema, row)?.is_null();
                Ok(Scalar::Bool(is_null != *negated))
            }
            Expr::Binary { op, left, right } => {
                let l = left.eval(schema, row)?;
                let r = right.eval(schema, row)?;
                eval_binary(*op, &l, &r)
            }
        }
    }

    /// Evaluate as a filter predicate: null and false both reject the row.
    pub fn eval_predicate(&self, schema: &Schema, row: &Row) -> Result<bool> {
        match self.eval(schema, row)? {
            Scalar::Null => Ok(false),
            v => truthy(&v),
        }
    }
}

fn truthy(v: &Scalar) -> Result<bool> {
    v.as_bool()
        .ok_or_else(|| Error::Expr(format!("expected a boolean, got '{}'", v)))
}

fn eval_binary(op: BinaryOp, l: &Scalar, r: &Scalar) -> Result<Scalar> {
    match op {
        BinaryOp::And => {
            let (a, b) = (l.as_bool(), r.as_bool());
            Ok(match (a, b) {
                (Some(false), _) | (_, Some(false)) => Scalar::Bool(false),
                (Some(true), Some(true)) => Scalar::Bool(true),
                _ => Scalar::Null,
            })
        }
        BinaryOp::Or => {
            let (a, b) = (l.as_bool(), r.as_bool());
            Ok(match (a, b) {
                (Some(true), _) | (_, Some(true)) => Scalar::Bool(true),
                (Some(false), Some(false)) => Scalar::Bool(false),
                _ => Scalar::Null,
            })
        }
        _ if l.is_null() || r.is_null() => Ok(Scalar::Null),
        _ if op.is_comparison() => {
            let ord = l.compare(r).ok_or_else(|| {
                Error::Expr(format!("cannot compare '{}' {} '{}'", l, op.symbol(), r))
            })?;
            Ok(Scalar::Bool(match op {
                BinaryOp::Eq => ord == Ordering::Equal,
                BinaryOp::NotEq => ord != Ordering::Equal,
                BinaryOp::Lt => ord == Ordering::Less,
                BinaryOp::LtEq => ord != Ordering::Greater,
                BinaryOp::Gt => ord == Ordering::Greater,
                _ => ord != Ordering::Less,
            }))
        }
        _ => eval_arithmetic(op, l, r),
    }
}

fn eval_arithmetic(op: BinaryOp, l: &Scalar, r: &Scalar) -> Result<Scalar> {
    let int_pair = match (l, r) {
        (Scalar::F32(_) | Scalar::F64(_), _) | (_, Scalar::F32(_) | Scalar::F64(_)) => None,
        _ => l.as_i64().zip(r.as_i64()),
    };
    if let Some((a, b)) = int_pair {
        let out = match op {
            BinaryOp::Plus => a.checked_add(b),
            BinaryOp::Minus => a.checked_sub(b),
            BinaryOp::Multiply => a.checked_mul(b),
            _ if b == 0 => return Err(Error::Expr("division by zero".into())),
            _ => a.checked_div(b),
        }
        .ok_or_else(|| Error::Expr(format!("integer overflow in {} {} {}", a, op.symbol(), b)))?;
        return match (l, r) {
            // Int32 op Int32 is typed Int32, so the result must fit.
            (Scalar::I32(_), Scalar::I32(_)) => i32::try_from(out).map(Scalar::I32).map_err(|_| {
                Error::Expr(format!("Int32 overflow in {} {} {}", a, op.symbol(), b))
            }),
            _ => Ok(Scalar::I64(out)),
        };
    }
    let (a, b) = l.as_f64().zip(r.as_f64()).ok_or_else(|| {
        Error::Expr(format!("operator {} needs numeric operands: '{}', '{}'", op.symbol(), l, r))
    })?;
    Ok(Scalar::F64(match op {
        BinaryOp::Plus => a + b,
        BinaryOp::Minus => a - b,
        BinaryOp::Multiply => a * b,
        _ => a / b,
    }))
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Column(name) => f.write_str(name),
            Expr::Literal(Scalar::Str(s)) => write!(f, "'{}'", s),
            Expr::Literal(v) => write!(f, "{}", v),
            Expr::Binary { op, left, right } => write!(f, "({} {} {})", left, op.symbol(), right),
            Expr::Not(inner) => write!(f, "(NOT {})", inner),
            Expr::IsNull { expr, negated: false } => write!(f, "({} IS NULL)", expr),
            Expr::IsNull { expr, negated: true } => write!(f, "({} IS NOT NULL)", expr),
        }
    }
}

// --- parsing ---

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Int(i64),
    Float(f64),
    Str(String),
    Op(&'static str),
    LParen,
    RParen,
}

fn tokenize(src: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = src.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
        } else if c == '(' {
            tokens.push(Token::LParen);
            i += 1;
        } else if c == ')' {
            tokens.push(Token::RParen);
            i += 1;
        } else if c == '\'' || c == '"' {
            let quote = c;
            let start = i + 1;
            let end = chars[start..]
                .iter()
                .position(|&ch| ch == quote)
                .map(|p| start + p)
                .ok_or_else(|| Error::Expr(format!("unterminated quote in '{}'", src)))?;
            let text: String = chars[start..end].iter().collect();
            // Single quotes are string literals, double quotes are identifiers.
            tokens.push(if quote == '\'' {
                Token::Str(text)
            } else {
                Token::Ident(text)
            });
            i = end + 1;
        } else if c.is_ascii_digit() {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                i += 1;
            }
            let text: String = chars[start..i].iter().collect();
            tokens.push(if text.contains('.') {
                Token::Float(
                    text.parse()
                        .map_err(|_| Error::Expr(format!("bad number '{}'", text)))?,
                )
            } else {
                Token::Int(
                    text.parse()
                        .map_err(|_| Error::Expr(format!("bad number '{}'", text)))?,
                )
            });
        } else if c.is_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '.') {
                i += 1;
            }
            tokens.push(Token::Ident(chars[start..i].iter().collect()));
        } else {
            let two: String = chars[i..(i + 2).min(chars.len())].iter().collect();
            let op = match two.as_str() {
                "==" => Some("="),
                "!=" | "<>" => Some("!="),
                "<=" => Some("<="),
                ">=" => Some(">="),
                _ => None,
            };
            if let Some(op) = op {
                tokens.push(Token::Op(op));
                i += 2;
                continue;
            }
            let op = match c {
                '=' => "=",
                '<' => "<",
                '>' => ">",
                '+' => "+",
                '-' => "-",
                '*' => "*",
                '/' => "/",
                other => {
                    return Err(Error::Expr(format!(
                        "unexpected character '{}' in '{}'",
                        other, src
                    )))
                }
            };
            tokens.push(Token::Op(op));
            i += 1;
        }
    }
    Ok(tokens)
}

struct Parser<'a> {
    src: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        t
    }

    fn peek_keyword(&self, kw: &str) -> bool {
        matches!(self.peek(), Some(Token::Ident(s)) if s.eq_ignore_ascii_case(kw))
    }

    fn eat_keyword(&mut self, kw: &str) -> bool {
        if self.peek_keyword(kw) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_op(&mut self, ops: &[&'static str]) -> Option<&'static str> {
        match self.peek() {
            Some(Token::Op(op)) if ops.contains(op) => {
                let op = *op;
                self.pos += 1;
                Some(op)
            }
            _ => None,
        }
    }

    fn error(&self, what: &str) -> Error {
        Error::Expr(format!("{} at token {} in '{}'", what, self.pos, self.src))
    }

    fn or(&mut self) -> Result<Expr> {
        let mut left = self.and()?;
        while self.eat_keyword("OR") {
            left = left.or(self.and()?);
        }
        Ok(left)
    }

    fn and(&mut self) -> Result<Expr> {
        let mut left = self.not()?;
        while self.eat_keyword("AND") {
            left = left.and(self.not()?);
        }
        Ok(left)
    }

    fn not(&mut self) -> Result<Expr> {
        if self.eat_keyword("NOT") {
            return Ok(Expr::Not(Box::new(self.not()?)));
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Expr> {
        let mut left = self.additive()?;
        if let Some(op) = self.eat_op(&["=", "!=", "<", "<=", ">", ">="]) {
            let op = match op {
                "=" => BinaryOp::Eq,
                "!=" => BinaryOp::NotEq,
                "<" => BinaryOp::Lt,
                "<=" => BinaryOp::LtEq,
                ">" => BinaryOp::Gt,
                _ => BinaryOp::GtEq,
            };
            left = left.binary(op, self.additive()?);
        }
        if self.eat_keyword("IS") {
            let negated = self.eat_keyword("NOT");
            if !self.eat_keyword("NULL") {
                return Err(self.error("expected NULL after IS"));
            }
            left = Expr::IsNull {
                expr: Box::new(left),
                negated,
            };
        }
        Ok(left)
    }

    fn additive(&mut self) -> Result<Expr> {
        let mut left = self.multiplicative()?;
        while let Some(op) = self.eat_op(&["+", "-"]) {
            let op = if op == "+" { BinaryOp::Plus } else { BinaryOp::Minus };
            left = left.binary(op, self.multiplicative()?);
        }
        Ok(left)
    }

    fn multiplicative(&mut self) -> Result<Expr> {
        let mut left = self.unary()?;
        while let Some(op) = self.eat_op(&["*", "/"]) {
            let op = if op == "*" { BinaryOp::Multiply } else { BinaryOp::Divide };
            left = left.binary(op, self.unary()?);
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<Expr> {
        if self.eat_op(&["-"]).is_some() {
            return Ok(match self.unary()? {
                Expr::Literal(Scalar::I64(v)) => Expr::Literal(Scalar::I64(-v)),
                Expr::Literal(Scalar::F64(v)) => Expr::Literal(Scalar::F64(-v)),
                other => Expr::Literal(Scalar::I64(0)).binary(BinaryOp::Minus, other),
            });
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr> {
        match self.next() {
            Some(Token::Int(v)) => Ok(Expr::Literal(Scalar::I64(v))),
            Some(Token::Float(v)) => Ok(Expr::Literal(Scalar::F64(v))),
            Some(Token::Str(s)) => Ok(Expr::Literal(Scalar::Str(s))),
            Some(Token::LParen) => {
                let inner = self.or()?;
                match self.next() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(self.error("expected ')'")),
                }
            }
            Some(Token::Ident(name)) => Ok(match name.to_ascii_uppercase().as_str() {
                "TRUE" => Expr::Literal(Scalar::Bool(true)),
                "FALSE" => Expr::Literal(Scalar::Bool(false)),
                "NULL" => Expr::Literal(Scalar::Null),
                _ => Expr::Column(name),
            }),
            Some(_) => Err(self.error("unexpected token")),
            None => Err(self.error("unexpected end of expression")),
        }
    }
}

/// Parse an expression string.
pub fn parse_expr(src: &str) -> Result<Expr> {
    let tokens = tokenize(src)?;
    if tokens.is_empty() {
        return Err(Error::Expr("empty expression".into()));
    }
    let mut parser = Parser {
        src,
        tokens,
        pos: 0,
    };
    let expr = parser.or()?;
    if parser.pos < parser.tokens.len() {
        return Err(parser.error("trailing input"));
    }
    Ok(expr)
}
