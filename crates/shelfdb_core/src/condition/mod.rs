//! Condition parsing and evaluation.
//!
//! Conditions are small boolean expressions over a record's fields:
//! comparisons (`==`, `!=`, `>`, `<`, `>=`, `<=`) combined with `&` and
//! `|`, where `&` binds tighter than `|`. The grammar is deliberately
//! flat; there is no host-language evaluation behind it.
//!
//! An empty condition matches every record. A malformed condition, or a
//! condition naming a field the record does not have, is an evaluation
//! error, never a silent `false`.

mod token;

use crate::record::{compare_values, values_equal, Record};
use serde_json::Value;
use std::cmp::Ordering;
use thiserror::Error;
use token::{tokenize, Token};

/// A condition parse or evaluation failure.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ConditionError {
    message: String,
}

impl ConditionError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CmpOp {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
}

#[derive(Debug, Clone)]
enum Expr {
    Or(Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Cmp {
        field: String,
        op: CmpOp,
        literal: Value,
    },
}

/// A parsed condition, ready to be evaluated against records.
///
/// # Example
///
/// ```rust
/// use shelfdb_core::Condition;
/// use serde_json::json;
///
/// let condition = Condition::parse("views > 200 & id == 2").unwrap();
/// let record = match json!({"id": 2, "views": 250}) {
///     serde_json::Value::Object(map) => map,
///     _ => unreachable!(),
/// };
/// assert!(condition.matches(&record).unwrap());
/// ```
#[derive(Debug, Clone)]
pub struct Condition {
    text: String,
    // None for the empty condition, which matches everything.
    expr: Option<Expr>,
}

impl Condition {
    /// Parses a condition string.
    ///
    /// An empty (or whitespace-only) condition parses to a condition
    /// that matches every record.
    ///
    /// # Errors
    ///
    /// Returns a [`ConditionError`] describing the first syntax problem.
    pub fn parse(input: &str) -> Result<Self, ConditionError> {
        if input.trim().is_empty() {
            return Ok(Self {
                text: input.to_string(),
                expr: None,
            });
        }
        let tokens = tokenize(input)?;
        let mut parser = Parser { tokens, pos: 0 };
        let expr = parser.parse_or()?;
        if let Some(extra) = parser.peek() {
            return Err(ConditionError::new(format!(
                "unexpected trailing token '{extra}'"
            )));
        }
        Ok(Self {
            text: input.to_string(),
            expr: Some(expr),
        })
    }

    /// The original condition text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Evaluates the condition against a record.
    ///
    /// Evaluation is pure; the record is never mutated.
    ///
    /// # Errors
    ///
    /// Returns a [`ConditionError`] if the condition names a field the
    /// record does not have.
    pub fn matches(&self, record: &Record) -> Result<bool, ConditionError> {
        match &self.expr {
            None => Ok(true),
            Some(expr) => eval(expr, record),
        }
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    // or := and ('|' and)*
    fn parse_or(&mut self) -> Result<Expr, ConditionError> {
        let mut left = self.parse_and()?;
        while self.peek() == Some(&Token::Or) {
            self.next();
            let right = self.parse_and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    // and := cmp ('&' cmp)*
    fn parse_and(&mut self) -> Result<Expr, ConditionError> {
        let mut left = self.parse_cmp()?;
        while self.peek() == Some(&Token::And) {
            self.next();
            let right = self.parse_cmp()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    // cmp := IDENT op literal
    fn parse_cmp(&mut self) -> Result<Expr, ConditionError> {
        let field = match self.next() {
            Some(Token::Ident(name)) => name,
            Some(other) => {
                return Err(ConditionError::new(format!(
                    "expected a field name, found '{other}'"
                )))
            }
            None => return Err(ConditionError::new("expected a field name")),
        };

        let op = match self.next() {
            Some(Token::Eq) => CmpOp::Eq,
            Some(Token::Ne) => CmpOp::Ne,
            Some(Token::Gt) => CmpOp::Gt,
            Some(Token::Lt) => CmpOp::Lt,
            Some(Token::Ge) => CmpOp::Ge,
            Some(Token::Le) => CmpOp::Le,
            Some(other) => {
                return Err(ConditionError::new(format!(
                    "expected a comparison operator after '{field}', found '{other}'"
                )))
            }
            None => {
                return Err(ConditionError::new(format!(
                    "expected a comparison operator after '{field}'"
                )))
            }
        };

        let literal = match self.next() {
            Some(token) => token.literal().ok_or_else(|| {
                ConditionError::new(format!("expected a literal, found '{token}'"))
            })?,
            None => {
                return Err(ConditionError::new(format!(
                    "missing comparison value for field '{field}'"
                )))
            }
        };

        Ok(Expr::Cmp { field, op, literal })
    }
}

fn eval(expr: &Expr, record: &Record) -> Result<bool, ConditionError> {
    match expr {
        Expr::Or(a, b) => Ok(eval(a, record)? || eval(b, record)?),
        Expr::And(a, b) => Ok(eval(a, record)? && eval(b, record)?),
        Expr::Cmp { field, op, literal } => {
            let value = record.get(field).ok_or_else(|| {
                ConditionError::new(format!("field '{field}' is not present in the record"))
            })?;
            Ok(match op {
                CmpOp::Eq => values_equal(value, literal),
                CmpOp::Ne => !values_equal(value, literal),
                CmpOp::Gt => compare_values(value, literal) == Ordering::Greater,
                CmpOp::Lt => compare_values(value, literal) == Ordering::Less,
                CmpOp::Ge => compare_values(value, literal) != Ordering::Less,
                CmpOp::Le => compare_values(value, literal) != Ordering::Greater,
            })
        }
    }
}
