//! Tokenizer for the condition grammar.

use super::ConditionError;
use serde_json::Value;
use std::fmt;

/// A single token of a condition string.
#[derive(Debug, Clone, PartialEq)]
pub(super) enum Token {
    /// A field name or bare word.
    Ident(String),
    /// A quoted string literal.
    Str(String),
    /// A numeric literal.
    Number(f64),
    /// A `true`/`false` literal.
    Bool(bool),
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `>`
    Gt,
    /// `<`
    Lt,
    /// `>=`
    Ge,
    /// `<=`
    Le,
    /// `&` (also accepts `&&`)
    And,
    /// `|` (also accepts `||`)
    Or,
}

impl Token {
    /// The literal value this token stands for, if it is a literal.
    ///
    /// Bare words are string literals; `count == active` compares the
    /// `count` field against the string `"active"`.
    pub(super) fn literal(&self) -> Option<Value> {
        match self {
            Token::Str(s) | Token::Ident(s) => Some(Value::String(s.clone())),
            Token::Number(n) => serde_json::Number::from_f64(*n).map(Value::Number),
            Token::Bool(b) => Some(Value::Bool(*b)),
            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(s) => write!(f, "{s}"),
            Token::Str(s) => write!(f, "\"{s}\""),
            Token::Number(n) => write!(f, "{n}"),
            Token::Bool(b) => write!(f, "{b}"),
            Token::Eq => f.write_str("=="),
            Token::Ne => f.write_str("!="),
            Token::Gt => f.write_str(">"),
            Token::Lt => f.write_str("<"),
            Token::Ge => f.write_str(">="),
            Token::Le => f.write_str("<="),
            Token::And => f.write_str("&"),
            Token::Or => f.write_str("|"),
        }
    }
}

/// Splits a condition string into tokens.
pub(super) fn tokenize(input: &str) -> Result<Vec<Token>, ConditionError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' | '\n' | '\r' => {
                chars.next();
            }
            '&' => {
                chars.next();
                if chars.peek() == Some(&'&') {
                    chars.next();
                }
                tokens.push(Token::And);
            }
            '|' => {
                chars.next();
                if chars.peek() == Some(&'|') {
                    chars.next();
                }
                tokens.push(Token::Or);
            }
            '=' => {
                chars.next();
                if chars.next() == Some('=') {
                    tokens.push(Token::Eq);
                } else {
                    return Err(ConditionError::new("'=' is not an operator, use '=='"));
                }
            }
            '!' => {
                chars.next();
                if chars.next() == Some('=') {
                    tokens.push(Token::Ne);
                } else {
                    return Err(ConditionError::new("'!' is not an operator, use '!='"));
                }
            }
            '>' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::Ge);
                } else {
                    tokens.push(Token::Gt);
                }
            }
            '<' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::Le);
                } else {
                    tokens.push(Token::Lt);
                }
            }
            '"' | '\'' => {
                let quote = c;
                chars.next();
                let mut text = String::new();
                let mut closed = false;
                while let Some(c) = chars.next() {
                    match c {
                        '\\' => match chars.next() {
                            Some(escaped) => text.push(escaped),
                            None => break,
                        },
                        c if c == quote => {
                            closed = true;
                            break;
                        }
                        c => text.push(c),
                    }
                }
                if !closed {
                    return Err(ConditionError::new("unterminated string literal"));
                }
                tokens.push(Token::Str(text));
            }
            c if c.is_ascii_digit() || c == '-' || c == '+' || c == '.' => {
                let mut text = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E') {
                        text.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let number: f64 = text
                    .parse()
                    .map_err(|_| ConditionError::new(format!("invalid number '{text}'")))?;
                if !number.is_finite() {
                    return Err(ConditionError::new(format!("invalid number '{text}'")));
                }
                tokens.push(Token::Number(number));
            }
            c if c.is_alphanumeric() || c == '_' => {
                let mut text = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_alphanumeric() || c == '_' || c == '.' {
                        text.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                match text.as_str() {
                    "true" => tokens.push(Token::Bool(true)),
                    "false" => tokens.push(Token::Bool(false)),
                    _ => tokens.push(Token::Ident(text)),
                }
            }
            other => {
                return Err(ConditionError::new(format!(
                    "unexpected character '{other}'"
                )));
            }
        }
    }

    Ok(tokens)
}
